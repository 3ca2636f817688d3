//! Code units: statically-declared module entry points and the loader
//! collaborator that materializes them.
//!
//! A code unit is the loadable artifact containing a module's implementation.
//! Instead of scanning a loaded unit for candidate types, every unit declares
//! its single module entry point up front with [`module_unit!`]; declarations
//! are collected into a link-time registry and materialized lazily into a
//! process-scoped unit table. One unit declares at most one module; if
//! several declarations share a unit name, the first one in registry order
//! wins and the rest are never consulted.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::contracts::Module;

/// Statically-declared entry point of a code unit.
///
/// Collected through the link-time registry; declare one per crate with
/// [`module_unit!`].
pub struct CodeUnit {
    name: &'static str,
    factory: Option<fn() -> Box<dyn Module>>,
}

impl CodeUnit {
    /// Unit exporting a module built by `factory`.
    #[must_use]
    pub const fn with_module(name: &'static str, factory: fn() -> Box<dyn Module>) -> Self {
        Self {
            name,
            factory: Some(factory),
        }
    }

    /// Unit that links against the kit but exports no module.
    #[must_use]
    pub const fn empty(name: &'static str) -> Self {
        Self { name, factory: None }
    }

    /// Simple unit name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for CodeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeUnit")
            .field("name", &self.name)
            .field("has_module", &self.factory.is_some())
            .finish()
    }
}

inventory::collect!(CodeUnit);

/// Declare the module entry point of the current crate's code unit.
///
/// The single-argument form names the unit after the crate
/// (`CARGO_PKG_NAME`); the `unit = "..."` form sets an explicit unit name.
/// The module type must implement [`Module`](crate::Module) and [`Default`],
/// and construction must be side-effect-free — the resolver may discard a
/// constructed instance without registering it.
#[macro_export]
macro_rules! module_unit {
    ($ty:ty) => {
        $crate::module_unit!($ty, unit = env!("CARGO_PKG_NAME"));
    };
    ($ty:ty, unit = $name:expr) => {
        const _: () = {
            fn factory() -> ::std::boxed::Box<dyn $crate::Module> {
                ::std::boxed::Box::new(<$ty as ::core::default::Default>::default())
            }
            $crate::inventory::submit! {
                $crate::CodeUnit::with_module($name, factory)
            }
        };
    };
}

/// Live handle to a materialized code unit.
#[derive(Clone)]
pub struct UnitHandle {
    name: Arc<str>,
    factory: Option<Arc<dyn Fn() -> Box<dyn Module> + Send + Sync>>,
}

impl UnitHandle {
    /// Handle with a module entry point; for loader implementations.
    pub fn with_module(
        name: impl Into<Arc<str>>,
        factory: impl Fn() -> Box<dyn Module> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            factory: Some(Arc::new(factory)),
        }
    }

    /// Handle without a module entry point.
    pub fn empty(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            factory: None,
        }
    }

    /// Simple unit name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instantiate the unit's module, if it declares one.
    #[must_use]
    pub fn instantiate(&self) -> Option<Box<dyn Module>> {
        self.factory.as_ref().map(|factory| factory())
    }

    fn from_entry(entry: &CodeUnit) -> Self {
        Self {
            name: Arc::from(entry.name),
            factory: entry
                .factory
                .map(|f| Arc::new(f) as Arc<dyn Fn() -> Box<dyn Module> + Send + Sync>),
        }
    }
}

impl fmt::Debug for UnitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitHandle")
            .field("name", &self.name)
            .field("has_module", &self.factory.is_some())
            .finish()
    }
}

/// Unit loading failure.
#[derive(Debug, thiserror::Error)]
pub enum UnitLoadError {
    /// No unit with the given simple name exists in this process.
    #[error("code unit '{unit}' not found")]
    NotFound { unit: String },
}

/// Code-unit loader collaborator.
///
/// Identifiers are simple names, not paths, and match case-insensitively.
pub trait UnitLoader: Send + Sync {
    /// Units already materialized in this process.
    fn loaded_units(&self) -> Vec<UnitHandle>;

    /// Materialize a unit by simple name.
    ///
    /// # Errors
    /// [`UnitLoadError::NotFound`] if no unit with that name exists; loading
    /// a nonexistent unit fails loudly by contract.
    fn load(&self, name: &str) -> Result<UnitHandle, UnitLoadError>;
}

/// Default loader over the link-time registry.
///
/// Owns an explicit process-scoped unit table (unit id → handle), populated
/// lazily on first load and never evicted.
#[derive(Default)]
pub struct StaticUnitLoader {
    table: RwLock<HashMap<String, UnitHandle>>,
}

impl StaticUnitLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for StaticUnitLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticUnitLoader")
            .field("loaded", &self.table.read().len())
            .finish()
    }
}

impl UnitLoader for StaticUnitLoader {
    fn loaded_units(&self) -> Vec<UnitHandle> {
        self.table.read().values().cloned().collect()
    }

    fn load(&self, name: &str) -> Result<UnitHandle, UnitLoadError> {
        let key = name.to_ascii_lowercase();
        if let Some(handle) = self.table.read().get(&key) {
            return Ok(handle.clone());
        }

        let entry = inventory::iter::<CodeUnit>
            .into_iter()
            .find(|unit| unit.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| UnitLoadError::NotFound {
                unit: name.to_owned(),
            })?;

        let handle = UnitHandle::from_entry(entry);
        tracing::debug!(unit = %handle.name(), "code unit loaded");
        self.table
            .write()
            .entry(key)
            .or_insert_with(|| handle.clone());
        Ok(handle)
    }
}
