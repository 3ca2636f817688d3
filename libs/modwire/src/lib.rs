//! Module resolution and registration for dependency-injection containers.
//!
//! Feature modules are described declaratively — a name, the code unit that
//! contains their implementation, and an enabled flag — then resolved to live
//! instances exactly once, identity-checked, and wired into a shared container
//! under a unique key.
//!
//! The container and the configuration source are collaborators behind traits
//! ([`Container`], [`DescriptorSource`]); the kit ships an in-process
//! [`MemoryContainer`] and a figment-backed [`FigmentSource`] for embedders
//! without their own.
//!
//! A module whose type is known at compile time registers directly:
//!
//! ```
//! use std::sync::Arc;
//! use modwire::{Container, ContainerExt, MemoryContainer, Module, ModuleBase, ModuleRegistrar};
//!
//! struct Greeter {
//!     base: ModuleBase,
//! }
//!
//! impl Default for Greeter {
//!     fn default() -> Self {
//!         Self { base: ModuleBase::of::<Self>() }
//!     }
//! }
//!
//! impl Module for Greeter {
//!     fn info(&self) -> &ModuleBase {
//!         &self.base
//!     }
//!     fn info_mut(&mut self) -> &mut ModuleBase {
//!         &mut self.base
//!     }
//!     fn register_services(&self, container: &dyn Container) -> anyhow::Result<()> {
//!         container.register(Arc::new(String::from("hello")));
//!         Ok(())
//!     }
//!     fn as_any(&self) -> &dyn std::any::Any {
//!         self
//!     }
//! }
//!
//! let container = MemoryContainer::new();
//! let registrar = ModuleRegistrar::new();
//! registrar.add_module::<Greeter>(&container)?;
//!
//! assert_eq!(*container.get::<String>(None)?, "hello");
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Configuration-driven modules live in their own crates, declare a code unit
//! with [`module_unit!`], and are resolved by name through
//! [`ModuleRegistrar::add_modules`].

pub mod config;
pub mod container;
pub mod contracts;
pub mod descriptor;
pub mod registrar;
pub mod resolve;
pub mod units;

pub use config::{ConfigError, DescriptorSource, FigmentSource, JsonSource};
pub use container::{Container, ContainerError, ContainerExt, MemoryContainer, TypeKey};
pub use contracts::{Module, ModuleBase};
pub use descriptor::ModuleDescriptor;
pub use registrar::{ErrorPolicy, ModuleRegistrar, RegistrarError, RegistrationReport};
pub use resolve::{ModuleResolver, Resolution, ResolveError, SkipReason};
pub use units::{CodeUnit, StaticUnitLoader, UnitHandle, UnitLoadError, UnitLoader};

// Re-exported for `module_unit!` expansion; not part of the public API.
#[doc(hidden)]
pub use inventory;
