//! Descriptor-to-instance resolution.
//!
//! The resolution pipeline for one descriptor: unit lookup → entry-point
//! discovery → instantiation → identity check → duplicate check →
//! registration. Expected no-ops (disabled descriptor, unit without a module,
//! name mismatch, duplicate) are classified in [`SkipReason`] and logged at
//! debug; only unit-load failures and failing service-registration hooks
//! surface as errors.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::container::{Container, ContainerExt};
use crate::contracts::Module;
use crate::descriptor::ModuleDescriptor;
use crate::units::{StaticUnitLoader, UnitHandle, UnitLoadError, UnitLoader};

/// Outcome of resolving one descriptor.
pub enum Resolution {
    /// Instance registered and its services wired.
    Registered(Arc<dyn Module>),
    /// Expected silent no-op; the container is unchanged.
    Skipped(SkipReason),
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered(module) => f
                .debug_tuple("Registered")
                .field(&module.info().name)
                .finish(),
            Self::Skipped(reason) => f.debug_tuple("Skipped").field(reason).finish(),
        }
    }
}

/// Why a descriptor was skipped without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Descriptor absent or its `enabled` flag false.
    Disabled,
    /// The unit materialized but declares no module entry point.
    NoModuleInUnit,
    /// The instance self-reported a name that does not match the descriptor.
    NameMismatch {
        descriptor: String,
        instance: String,
    },
    /// An instance is already registered under this name.
    AlreadyRegistered,
}

/// Resolution failure.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The descriptor's code unit does not exist or could not be loaded.
    #[error("failed to load code unit '{unit}' for module '{module}'")]
    UnitLoad {
        module: String,
        unit: String,
        #[source]
        source: UnitLoadError,
    },

    /// The module's service-registration hook failed.
    #[error("register_services failed for module '{module}'")]
    RegisterServices {
        module: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Turns module descriptors into live, validated, registered instances.
///
/// The duplicate-check-then-register sequence is guarded by a resolver-owned
/// mutex: callers that share one resolver per container get a race-free
/// check-then-act even when the entry points are invoked from several
/// threads. Using several resolvers against one container forfeits that
/// protection.
pub struct ModuleResolver {
    loader: Arc<dyn UnitLoader>,
    registration: Mutex<()>,
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new(Arc::new(StaticUnitLoader::new()))
    }
}

impl ModuleResolver {
    #[must_use]
    pub fn new(loader: Arc<dyn UnitLoader>) -> Self {
        Self {
            loader,
            registration: Mutex::new(()),
        }
    }

    /// Resolve and register a module whose type is known at compile time.
    ///
    /// Default-constructs `M`. If an instance is already registered under the
    /// module's own name, the fresh instance is discarded — construction is
    /// side-effect-free by contract. Otherwise the instance is enabled, its
    /// services are registered, and it is stored under its name.
    ///
    /// # Errors
    /// [`ResolveError::RegisterServices`] if the module's hook fails.
    pub fn resolve_static<M: Module + Default>(
        &self,
        container: &dyn Container,
    ) -> Result<Resolution, ResolveError> {
        let mut module = M::default();
        let _guard = self.registration.lock();
        if container.has::<dyn Module>(Some(&module.info().name)) {
            tracing::debug!(module = %module.info().name, "module already registered, skipping");
            return Ok(Resolution::Skipped(SkipReason::AlreadyRegistered));
        }
        module.info_mut().enabled = true;
        self.register(container, Box::new(module))
    }

    /// Resolve a descriptor through the full pipeline.
    ///
    /// An absent or disabled descriptor is a no-op, not an error.
    ///
    /// # Errors
    /// [`ResolveError::UnitLoad`] when the descriptor's code unit cannot be
    /// materialized; [`ResolveError::RegisterServices`] when the module's
    /// hook fails.
    pub fn resolve_descriptor(
        &self,
        container: &dyn Container,
        descriptor: Option<&ModuleDescriptor>,
    ) -> Result<Resolution, ResolveError> {
        let Some(descriptor) = descriptor else {
            return Ok(Resolution::Skipped(SkipReason::Disabled));
        };
        if !descriptor.enabled {
            tracing::debug!(module = %descriptor.name, "descriptor disabled, skipping");
            return Ok(Resolution::Skipped(SkipReason::Disabled));
        }

        let unit = self.lookup_or_load(descriptor)?;

        let Some(mut module) = unit.instantiate() else {
            tracing::debug!(unit = %unit.name(), "unit declares no module entry point, skipping");
            return Ok(Resolution::Skipped(SkipReason::NoModuleInUnit));
        };

        if !descriptor.matches_name(&module.info().name) {
            tracing::debug!(
                descriptor = %descriptor.name,
                instance = %module.info().name,
                "module name mismatch, skipping"
            );
            return Ok(Resolution::Skipped(SkipReason::NameMismatch {
                descriptor: descriptor.name.clone(),
                instance: module.info().name.clone(),
            }));
        }

        let _guard = self.registration.lock();
        if container.has::<dyn Module>(Some(&module.info().name)) {
            tracing::debug!(module = %module.info().name, "module already registered, skipping");
            return Ok(Resolution::Skipped(SkipReason::AlreadyRegistered));
        }

        // Descriptor values win over self-derived defaults.
        module.info_mut().enabled = descriptor.enabled;
        module.info_mut().code_unit = descriptor.code_unit.clone();
        self.register(container, module)
    }

    /// Reuse an already-materialized unit when one matches by name, load
    /// fresh otherwise.
    fn lookup_or_load(&self, descriptor: &ModuleDescriptor) -> Result<UnitHandle, ResolveError> {
        let already = self
            .loader
            .loaded_units()
            .into_iter()
            .find(|unit| unit.name().eq_ignore_ascii_case(&descriptor.code_unit));
        match already {
            Some(unit) => Ok(unit),
            None => {
                self.loader
                    .load(&descriptor.code_unit)
                    .map_err(|source| ResolveError::UnitLoad {
                        module: descriptor.name.clone(),
                        unit: descriptor.code_unit.clone(),
                        source,
                    })
            }
        }
    }

    /// Run the module's hook, then store the instance keyed by its name.
    /// Callers hold the registration guard.
    fn register(
        &self,
        container: &dyn Container,
        module: Box<dyn Module>,
    ) -> Result<Resolution, ResolveError> {
        module
            .register_services(container)
            .map_err(|source| ResolveError::RegisterServices {
                module: module.info().name.clone(),
                source,
            })?;

        let name = module.info().name.clone();
        let unit = module.info().code_unit.clone();
        let module: Arc<dyn Module> = Arc::from(module);
        container.register_keyed::<dyn Module>(&name, Arc::clone(&module));
        tracing::info!(module = %name, unit = %unit, "module registered");
        Ok(Resolution::Registered(module))
    }
}
