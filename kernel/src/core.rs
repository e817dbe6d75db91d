//! Core, mostly non-public data structures shared by the kernel and bindings.

use crate::error::ResolveError;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A concrete, type-erased instance produced by a binding.
///
/// The allocation always holds the concrete target type, never a trait object.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// A type-erased `Arc<T>` for some requested type `T`, which may be a trait
/// object. `Kernel::resolve_type` hands these out.
pub type Shared = Box<dyn Any + Send + Sync>;

thread_local! {
  // Bindings currently being resolved on this thread, keyed by address.
  static RESOLVING_STACK: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());
}

/// An RAII guard to detect dependency cycles.
///
/// While alive, the guarded binding is marked as "resolving" on the current
/// thread. Entering the same binding again before the guard drops means the
/// dependency graph loops back on itself.
pub(crate) struct ResolutionGuard {
  id: Option<usize>,
}

impl ResolutionGuard {
  pub(crate) fn enter(id: usize, type_name: &'static str) -> Result<Self, ResolveError> {
    RESOLVING_STACK.with(|stack| {
      // `insert` returns `false` if the value was already present.
      if stack.borrow_mut().insert(id) {
        Ok(Self { id: Some(id) })
      } else {
        Err(ResolveError::CircularDependency(type_name))
      }
    })
  }

  /// A guard that tracks nothing, used when cycle detection is switched off.
  pub(crate) fn disabled() -> Self {
    Self { id: None }
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    if let Some(id) = self.id {
      RESOLVING_STACK.with(|stack| {
        stack.borrow_mut().remove(&id);
      });
    }
  }
}

/// The identity of a type as the kernel sees it.
///
/// Equality and hashing only consider the `TypeId`; the name is carried along
/// for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
}

impl TypeKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeKey({})", self.name)
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}
