//! End-to-end orchestration of module registration batches.

use crate::config::DescriptorSource;
use crate::container::Container;
use crate::contracts::Module;
use crate::descriptor::ModuleDescriptor;
use crate::resolve::{ModuleResolver, Resolution, ResolveError, SkipReason};

/// How a batch reacts to a descriptor that fails to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the batch on the first failure; remaining descriptors are not
    /// processed. The conservative default.
    #[default]
    FailFast,
    /// Record the failure in the report and continue with the remaining
    /// descriptors.
    BestEffort,
}

/// Summary of one registration batch.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Names of modules registered by this batch, in processing order.
    pub registered: Vec<String>,
    /// Descriptors skipped silently, with the classified reason.
    pub skipped: Vec<(String, SkipReason)>,
    /// Failures recorded under [`ErrorPolicy::BestEffort`].
    pub failed: Vec<(String, ResolveError)>,
}

impl RegistrationReport {
    /// True when the batch registered nothing and recorded no failures.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.registered.is_empty() && self.failed.is_empty()
    }
}

/// Registrar failure.
#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Orchestrates descriptor batches against a container.
///
/// Each descriptor is processed fully before the next; there is no
/// interleaving and no rollback.
pub struct ModuleRegistrar {
    resolver: ModuleResolver,
    policy: ErrorPolicy,
}

impl Default for ModuleRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistrar {
    /// Registrar over the default (link-time registry) resolver, fail-fast.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(ModuleResolver::default())
    }

    /// Registrar over a custom resolver, usually one with a custom loader.
    #[must_use]
    pub fn with_resolver(resolver: ModuleResolver) -> Self {
        Self {
            resolver,
            policy: ErrorPolicy::FailFast,
        }
    }

    /// Set the batch failure policy.
    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register every enabled descriptor of the batch.
    ///
    /// Disabled descriptors are filtered out first; an empty or fully
    /// disabled batch leaves the container unchanged.
    ///
    /// # Errors
    /// Under [`ErrorPolicy::FailFast`], the first resolution failure;
    /// remaining descriptors are not processed. Under
    /// [`ErrorPolicy::BestEffort`], resolution failures land in the report
    /// and the call succeeds.
    pub fn add_modules(
        &self,
        container: &dyn Container,
        descriptors: impl IntoIterator<Item = ModuleDescriptor>,
    ) -> Result<RegistrationReport, RegistrarError> {
        let enabled: Vec<ModuleDescriptor> = descriptors
            .into_iter()
            .filter(|descriptor| descriptor.enabled)
            .collect();

        let mut report = RegistrationReport::default();
        if enabled.is_empty() {
            return Ok(report);
        }

        for descriptor in enabled {
            match self
                .resolver
                .resolve_descriptor(container, Some(&descriptor))
            {
                Ok(Resolution::Registered(module)) => {
                    report.registered.push(module.info().name.clone());
                }
                Ok(Resolution::Skipped(reason)) => {
                    report.skipped.push((descriptor.name.clone(), reason));
                }
                Err(error) => match self.policy {
                    ErrorPolicy::FailFast => return Err(error.into()),
                    ErrorPolicy::BestEffort => {
                        tracing::warn!(
                            module = %descriptor.name,
                            error = %error,
                            "module registration failed, continuing"
                        );
                        report.failed.push((descriptor.name.clone(), error));
                    }
                },
            }
        }

        Ok(report)
    }

    /// Materialize descriptors from a configuration section and register
    /// them. An absent section yields zero descriptors and leaves the
    /// container unchanged.
    ///
    /// # Errors
    /// Configuration extraction failures, plus everything
    /// [`ModuleRegistrar::add_modules`] reports.
    pub fn add_modules_from_source(
        &self,
        container: &dyn Container,
        source: &dyn DescriptorSource,
        section: &str,
    ) -> Result<RegistrationReport, RegistrarError> {
        let descriptors = source.descriptors(section)?;
        self.add_modules(container, descriptors)
    }

    /// Materialize a single descriptor from a configuration section and
    /// register it; an absent section is a no-op.
    ///
    /// # Errors
    /// Configuration extraction failures and resolution failures.
    pub fn add_module_from_source(
        &self,
        container: &dyn Container,
        source: &dyn DescriptorSource,
        section: &str,
    ) -> Result<Resolution, RegistrarError> {
        let descriptor = source.descriptor(section)?;
        Ok(self
            .resolver
            .resolve_descriptor(container, descriptor.as_ref())?)
    }

    /// Register a single module whose type is known at compile time.
    ///
    /// # Errors
    /// [`ResolveError::RegisterServices`] if the module's hook fails.
    pub fn add_module<M: Module + Default>(
        &self,
        container: &dyn Container,
    ) -> Result<Resolution, RegistrarError> {
        Ok(self.resolver.resolve_static::<M>(container)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::container::{ContainerExt, MemoryContainer};
    use crate::contracts::ModuleBase;
    use crate::units::{UnitHandle, UnitLoadError, UnitLoader};
    use parking_lot::Mutex;
    use std::any::Any;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Probe {
        base: ModuleBase,
        hook_calls: Arc<AtomicUsize>,
    }

    impl Module for Probe {
        fn info(&self) -> &ModuleBase {
            &self.base
        }
        fn info_mut(&mut self) -> &mut ModuleBase {
            &mut self.base
        }
        fn register_services(&self, _container: &dyn Container) -> anyhow::Result<()> {
            self.hook_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn probe_unit(unit: &str, module_name: &str, calls: &Arc<AtomicUsize>) -> UnitHandle {
        let module_name = module_name.to_owned();
        let calls = Arc::clone(calls);
        UnitHandle::with_module(unit.to_owned(), move || {
            Box::new(Probe {
                base: ModuleBase {
                    name: module_name.clone(),
                    code_unit: String::new(),
                    enabled: false,
                },
                hook_calls: calls.clone(),
            })
        })
    }

    #[derive(Default)]
    struct MockLoader {
        available: HashMap<String, UnitHandle>,
        loaded: Mutex<Vec<UnitHandle>>,
    }

    impl MockLoader {
        fn with_unit(mut self, handle: UnitHandle) -> Self {
            self.available.insert(handle.name().to_owned(), handle);
            self
        }
    }

    impl UnitLoader for MockLoader {
        fn loaded_units(&self) -> Vec<UnitHandle> {
            self.loaded.lock().clone()
        }

        fn load(&self, name: &str) -> Result<UnitHandle, UnitLoadError> {
            let handle = self
                .available
                .values()
                .find(|unit| unit.name().eq_ignore_ascii_case(name))
                .cloned()
                .ok_or_else(|| UnitLoadError::NotFound {
                    unit: name.to_owned(),
                })?;
            self.loaded.lock().push(handle.clone());
            Ok(handle)
        }
    }

    fn registrar_with(loader: MockLoader) -> ModuleRegistrar {
        ModuleRegistrar::with_resolver(ModuleResolver::new(Arc::new(loader)))
    }

    #[test]
    fn empty_batch_is_a_noop() {
        let registrar = registrar_with(MockLoader::default());
        let container = MemoryContainer::new();

        let report = registrar.add_modules(&container, Vec::new()).unwrap();
        assert!(report.is_noop());
        assert!(container.is_empty());
    }

    #[test]
    fn fully_disabled_batch_leaves_container_unchanged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = MockLoader::default().with_unit(probe_unit("billing", "Billing", &calls));
        let registrar = registrar_with(loader);
        let container = MemoryContainer::new();

        let descriptors = vec![ModuleDescriptor {
            name: "Billing".to_owned(),
            code_unit: "billing".to_owned(),
            enabled: false,
        }];
        let report = registrar.add_modules(&container, descriptors).unwrap();

        assert!(report.is_noop());
        assert!(report.skipped.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(container.is_empty());
    }

    #[test]
    fn registers_enabled_descriptors_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = MockLoader::default()
            .with_unit(probe_unit("billing", "Billing", &calls))
            .with_unit(probe_unit("shipping", "Shipping", &calls));
        let registrar = registrar_with(loader);
        let container = MemoryContainer::new();

        let descriptors = vec![
            ModuleDescriptor::enabled("Billing", "billing"),
            ModuleDescriptor::enabled("Shipping", "shipping"),
        ];
        let report = registrar.add_modules(&container, descriptors).unwrap();

        assert_eq!(report.registered, vec!["Billing", "Shipping"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(container.has::<dyn Module>(Some("Billing")));
        assert!(container.has::<dyn Module>(Some("Shipping")));
    }

    #[test]
    fn duplicate_names_register_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = MockLoader::default().with_unit(probe_unit("billing", "Billing", &calls));
        let registrar = registrar_with(loader);
        let container = MemoryContainer::new();

        let descriptors = vec![
            ModuleDescriptor::enabled("Billing", "billing"),
            ModuleDescriptor::enabled("billing", "billing"),
        ];
        let report = registrar.add_modules(&container, descriptors).unwrap();

        assert_eq!(report.registered, vec!["Billing"]);
        assert_eq!(
            report.skipped,
            vec![("billing".to_owned(), SkipReason::AlreadyRegistered)]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fail_fast_stops_at_the_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = MockLoader::default().with_unit(probe_unit("billing", "Billing", &calls));
        let registrar = registrar_with(loader);
        let container = MemoryContainer::new();

        let descriptors = vec![
            ModuleDescriptor::enabled("Ghost", "ghost-unit"),
            ModuleDescriptor::enabled("Billing", "billing"),
        ];
        let err = registrar.add_modules(&container, descriptors).unwrap_err();

        assert!(matches!(
            err,
            RegistrarError::Resolve(ResolveError::UnitLoad { ref unit, .. })
                if unit == "ghost-unit"
        ));
        // The descriptor after the failure was never processed.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(container.is_empty());
    }

    #[test]
    fn best_effort_records_failures_and_continues() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = MockLoader::default().with_unit(probe_unit("billing", "Billing", &calls));
        let registrar = registrar_with(loader).error_policy(ErrorPolicy::BestEffort);
        let container = MemoryContainer::new();

        let descriptors = vec![
            ModuleDescriptor::enabled("Ghost", "ghost-unit"),
            ModuleDescriptor::enabled("Billing", "billing"),
        ];
        let report = registrar.add_modules(&container, descriptors).unwrap();

        assert_eq!(report.registered, vec!["Billing"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "Ghost");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn repeated_batches_are_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = MockLoader::default().with_unit(probe_unit("billing", "Billing", &calls));
        let registrar = registrar_with(loader);
        let container = MemoryContainer::new();

        let descriptors = vec![ModuleDescriptor::enabled("Billing", "billing")];
        registrar
            .add_modules(&container, descriptors.clone())
            .unwrap();
        let second = registrar.add_modules(&container, descriptors).unwrap();

        assert!(second.registered.is_empty());
        assert_eq!(
            second.skipped,
            vec![("Billing".to_owned(), SkipReason::AlreadyRegistered)]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(container.len(), 1);
    }
}
