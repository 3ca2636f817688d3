//! The DI container collaborator surface and an in-process reference registry.
//!
//! Implementation details:
//! - Slot key = (type, optional string key). Types are identified by
//!   `type_name::<T>()`, which works for `T = dyn Trait`.
//! - Values are `Arc<T>` stored as `Box<dyn Any + Send + Sync>` and downcast
//!   on read.
//! - The registration protocol depends only on the [`Container`] trait;
//!   [`MemoryContainer`] exists for tests and for embedders that do not bring
//!   a registry of their own.

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;

/// Stable type key for slots — uses fully-qualified `type_name::<T>()`.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct TypeKey(&'static str);

impl TypeKey {
    /// Key of type `T`, including trait-object types.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(std::any::type_name::<T>())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Opaque registry that modules populate and that stores module instances.
///
/// Both operations are synchronous. Implementations treat the (type, key)
/// pair as the identity of a slot. The registration protocol guarantees it
/// never stores two module instances under one pair, but performs the
/// check-then-register sequence itself, so concurrent callers need an
/// external mutual-exclusion boundary — the resolver provides one.
pub trait Container: Send + Sync {
    /// Whether a slot exists under the given type and key.
    fn is_registered(&self, ty: TypeKey, key: Option<&str>) -> bool;

    /// Store `slot` (a boxed `Arc<T>`) under the given type and key,
    /// replacing any previous occupant.
    fn register_slot(&self, ty: TypeKey, key: Option<&str>, slot: Box<dyn Any + Send + Sync>);
}

/// Typed convenience layer over the object-safe [`Container`] core.
pub trait ContainerExt: Container {
    /// Register an unkeyed service instance.
    fn register<T: ?Sized + Send + Sync + 'static>(&self, instance: Arc<T>) {
        self.register_slot(TypeKey::of::<T>(), None, Box::new(instance));
    }

    /// Register a service instance under a string key.
    fn register_keyed<T: ?Sized + Send + Sync + 'static>(&self, key: &str, instance: Arc<T>) {
        self.register_slot(TypeKey::of::<T>(), Some(key), Box::new(instance));
    }

    /// Typed existence check.
    fn has<T: ?Sized + Send + Sync + 'static>(&self, key: Option<&str>) -> bool {
        self.is_registered(TypeKey::of::<T>(), key)
    }
}

impl<C: Container + ?Sized> ContainerExt for C {}

/// Resolution failure of the in-process registry.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// No slot under the requested type and key.
    #[error("instance not found: type={ty:?}, key={key:?}")]
    NotFound { ty: TypeKey, key: Option<String> },

    /// A slot exists but does not hold an `Arc` of the requested type.
    #[error("type mismatch in container for type={ty:?}, key={key:?}")]
    TypeMismatch { ty: TypeKey, key: Option<String> },
}

type Slot = Box<dyn Any + Send + Sync>;

/// In-process reference container: (type, key) → boxed `Arc<T>`.
#[derive(Default)]
pub struct MemoryContainer {
    slots: RwLock<HashMap<(TypeKey, Option<Arc<str>>), Slot>>,
}

impl MemoryContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a previously registered instance.
    ///
    /// # Errors
    /// [`ContainerError::NotFound`] if no slot exists under (T, `key`);
    /// [`ContainerError::TypeMismatch`] if the slot holds something other
    /// than an `Arc<T>`.
    pub fn get<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: Option<&str>,
    ) -> Result<Arc<T>, ContainerError> {
        let ty = TypeKey::of::<T>();
        let slots = self.slots.read();
        let slot = slots
            .get(&(ty, key.map(Arc::from)))
            .ok_or_else(|| ContainerError::NotFound {
                ty,
                key: key.map(str::to_owned),
            })?;
        slot.downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| ContainerError::TypeMismatch {
                ty,
                key: key.map(str::to_owned),
            })
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl Container for MemoryContainer {
    fn is_registered(&self, ty: TypeKey, key: Option<&str>) -> bool {
        self.slots.read().contains_key(&(ty, key.map(Arc::from)))
    }

    fn register_slot(&self, ty: TypeKey, key: Option<&str>, slot: Slot) {
        self.slots.write().insert((ty, key.map(Arc::from)), slot);
    }
}

impl fmt::Debug for MemoryContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContainer")
            .field("slots", &self.len())
            .finish()
    }
}
