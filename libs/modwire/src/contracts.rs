//! Module contract and the reusable descriptor-shaped base state.

use std::any::Any;

use crate::container::Container;

/// Capability contract for a loadable module.
///
/// A module exposes its descriptor-shaped identity through [`ModuleBase`] and
/// contributes services to the container through
/// [`register_services`](Module::register_services), which the orchestration
/// layer invokes at most once per registered instance.
pub trait Module: Send + Sync + 'static {
    /// Descriptor-shaped identity of this module.
    fn info(&self) -> &ModuleBase;

    /// Mutable identity; the resolver uses this to apply descriptor overrides
    /// before registration.
    fn info_mut(&mut self) -> &mut ModuleBase;

    /// Register this module's services into the container.
    ///
    /// # Errors
    /// Whatever the module implementation reports. The kit does not interpret
    /// the error beyond aborting this module's registration and propagating
    /// it to the orchestration caller.
    fn register_services(&self, container: &dyn Container) -> anyhow::Result<()>;

    /// Concrete-type escape hatch for embedders and tests.
    fn as_any(&self) -> &dyn Any;
}

/// Reusable identity half of the module contract.
///
/// [`ModuleBase::of`] derives `name` from the concrete type's unqualified
/// type name and `code_unit` from the crate that physically contains the
/// type, so concrete modules hand-type neither. Both stay overridable: the
/// resolver overwrites `enabled` and `code_unit` from the descriptor when it
/// registers the instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleBase {
    /// Logical module name; compared case-insensitively.
    pub name: String,
    /// Identifier of the code unit containing the module implementation.
    pub code_unit: String,
    /// Stays `false` until the registrar applies the descriptor (or the
    /// typed registration path enables it).
    pub enabled: bool,
}

impl ModuleBase {
    /// Derive identity from the concrete module type `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        let path = std::any::type_name::<T>();
        Self {
            name: unqualified(path).to_owned(),
            code_unit: crate_of(path).to_owned(),
            enabled: false,
        }
    }
}

/// Last path segment of a fully-qualified type name.
fn unqualified(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// First path segment, i.e. the crate the type lives in.
fn crate_of(path: &str) -> &str {
    path.split("::").next().unwrap_or(path)
}
