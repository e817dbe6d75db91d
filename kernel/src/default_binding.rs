//! Implicit bindings for concrete types nobody bound explicitly.

use crate::binding::{InstanceTracker, Resolved};
use crate::constructor::{self, Arg};
use crate::core::TypeKey;
use crate::describe::{TypeHandle, TypeInfo};
use crate::error::{ConfigError, ResolveError};
use crate::kernel::Kernel;
use std::fmt;
use std::sync::Arc;

/// Always transient and unconstrained; resolves exactly the type it was
/// created for through greedy constructor resolution.
pub(crate) struct DefaultBinding {
  info: Arc<TypeInfo>,
  tracker: InstanceTracker,
}

impl DefaultBinding {
  /// Fails for abstract types, i.e. types without a declared constructor.
  pub(crate) fn create(handle: &TypeHandle) -> Result<Self, ConfigError> {
    let info = handle.describe();
    if !info.is_concrete() {
      return Err(ConfigError::AbstractTarget(handle.key().name()));
    }
    Ok(Self {
      info: Arc::new(info),
      tracker: InstanceTracker::default(),
    })
  }

  pub(crate) fn bound(&self) -> TypeKey {
    self.info.key()
  }

  pub(crate) fn can_resolve(&self, key: &TypeKey) -> bool {
    self.info.key() == *key
  }

  pub(crate) fn resolve(self: &Arc<Self>, kernel: &Kernel, args: &[Arg]) -> Result<Resolved, ResolveError> {
    let _guard = kernel.enter(Arc::as_ptr(self) as usize, self.info.key().name())?;
    let instance = constructor::construct(kernel, &self.info, args)?;
    let resolved = Resolved {
      instance,
      info: self.info.clone(),
    };
    self.tracker.record_transient(&resolved);
    Ok(resolved)
  }

  pub(crate) fn tracked_transients(&self) -> usize {
    self.tracker.tracked_transients()
  }

  pub(crate) fn dispose(&self) {
    self.tracker.dispose(self.info.key());
  }
}

impl fmt::Debug for DefaultBinding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DefaultBinding")
      .field("bound", &self.info.key())
      .finish()
  }
}
