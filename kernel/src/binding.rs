//! Explicit bindings: resolution strategy, scope and instance tracking.

use crate::constructor::{self, Arg};
use crate::core::{Instance, TypeKey};
use crate::describe::TypeInfo;
use crate::error::{DisposeError, ResolveError};
use crate::kernel::Kernel;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Lifetime policy for the instances a binding produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Scope {
  /// A new instance on every resolution.
  #[default]
  Transient,
  /// One instance per binding, created on first resolution.
  Singleton,
}

/// Restricts a binding to dependencies of one injection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionConstraint {
  pub target: TypeKey,
  /// When `false`, subtypes of `target` match as well.
  pub exact: bool,
}

impl InjectionConstraint {
  pub(crate) fn admits(&self, injected_into: Option<&TypeInfo>) -> bool {
    match injected_into {
      None => false,
      Some(context) if self.exact => context.key() == self.target,
      Some(context) => context.is_assignable_to(&self.target),
    }
  }
}

/// A concrete instance together with the metadata of its type.
#[derive(Clone)]
pub(crate) struct Resolved {
  pub(crate) instance: Instance,
  pub(crate) info: Arc<TypeInfo>,
}

struct Tracked {
  instance: Weak<dyn std::any::Any + Send + Sync>,
  info: Arc<TypeInfo>,
}

/// Keeps what a binding produced so it can be torn down later.
///
/// The singleton is owned; transients are only observed, dead entries are
/// purged whenever a new one is recorded.
#[derive(Default)]
pub(crate) struct InstanceTracker {
  singleton: Mutex<Option<Resolved>>,
  transients: Mutex<Vec<Tracked>>,
  disposing: AtomicBool,
}

impl InstanceTracker {
  pub(crate) fn record_transient(&self, resolved: &Resolved) {
    let mut transients = self.transients.lock();
    transients.retain(|tracked| tracked.instance.strong_count() > 0);
    transients.push(Tracked {
      instance: Arc::downgrade(&resolved.instance),
      info: resolved.info.clone(),
    });
  }

  pub(crate) fn tracked_transients(&self) -> usize {
    self
      .transients
      .lock()
      .iter()
      .filter(|tracked| tracked.instance.strong_count() > 0)
      .count()
  }

  /// Idempotent. Releases the singleton and disposes every instance that is
  /// still alive; one failing instance never blocks the rest.
  pub(crate) fn dispose(&self, bound: TypeKey) {
    if self.disposing.swap(true, Ordering::SeqCst) {
      return;
    }

    let singleton = self.singleton.lock().take();
    let transients = std::mem::take(&mut *self.transients.lock());

    let alive = singleton.into_iter().chain(transients.into_iter().filter_map(|tracked| {
      tracked.instance.upgrade().map(|instance| Resolved {
        instance,
        info: tracked.info,
      })
    }));

    for resolved in alive {
      match resolved.info.dispose(&resolved.instance) {
        Ok(()) => {}
        Err(DisposeError::AlreadyDisposed) => {
          tracing::trace!(bound = bound.name(), "Instance was already disposed.");
        }
        Err(error) => {
          tracing::warn!(
            bound = bound.name(),
            instance = resolved.info.key().name(),
            %error,
            "Failed to dispose instance, continuing with the rest."
          );
        }
      }
    }
  }
}

type Factory = Arc<dyn Fn() -> Instance + Send + Sync>;

/// The mutable part of a binding, set through the configuration syntax
/// before first resolution.
#[derive(Clone)]
pub(crate) struct BindingConfig {
  pub(crate) target: Arc<TypeInfo>,
  pub(crate) factory: Option<Factory>,
  pub(crate) scope: Scope,
  pub(crate) constraint: Option<InjectionConstraint>,
}

/// A declared rule for producing instances of one bound type.
pub(crate) struct Binding {
  bound: TypeKey,
  config: RwLock<BindingConfig>,
  tracker: InstanceTracker,
}

impl Binding {
  pub(crate) fn new(bound: TypeKey, target: TypeInfo, scope: Scope) -> Self {
    Self {
      bound,
      config: RwLock::new(BindingConfig {
        target: Arc::new(target),
        factory: None,
        scope,
        constraint: None,
      }),
      tracker: InstanceTracker::default(),
    }
  }

  pub(crate) fn bound(&self) -> TypeKey {
    self.bound
  }

  pub(crate) fn constraint(&self) -> Option<InjectionConstraint> {
    self.config.read().constraint
  }

  pub(crate) fn configure(&self, update: impl FnOnce(&mut BindingConfig)) {
    update(&mut *self.config.write());
  }

  /// Seeds the singleton slot with a ready-made instance.
  pub(crate) fn seed(&self, instance: Instance) {
    let info = self.config.read().target.clone();
    *self.tracker.singleton.lock() = Some(Resolved { instance, info });
  }

  pub(crate) fn can_resolve(&self, key: &TypeKey, injected_into: Option<&TypeInfo>) -> bool {
    if let Some(constraint) = self.constraint() {
      if !constraint.admits(injected_into) {
        return false;
      }
    }
    self.bound == *key
  }

  pub(crate) fn resolve(self: &Arc<Self>, kernel: &Kernel, args: &[Arg]) -> Result<Resolved, ResolveError> {
    let plan = self.config.read().clone();
    // Entered before the singleton slot is locked, so a cycle through a
    // singleton is reported instead of deadlocking.
    let _guard = kernel.enter(Arc::as_ptr(self) as usize, self.bound.name())?;

    match plan.scope {
      Scope::Singleton => {
        let mut slot = self.tracker.singleton.lock();
        if let Some(existing) = slot.as_ref() {
          tracing::trace!(bound = self.bound.name(), "Reusing singleton instance.");
          return Ok(existing.clone());
        }
        let resolved = self.produce(kernel, &plan, args)?;
        *slot = Some(resolved.clone());
        Ok(resolved)
      }
      Scope::Transient => {
        let resolved = self.produce(kernel, &plan, args)?;
        self.tracker.record_transient(&resolved);
        Ok(resolved)
      }
    }
  }

  fn produce(&self, kernel: &Kernel, plan: &BindingConfig, args: &[Arg]) -> Result<Resolved, ResolveError> {
    let instance = match &plan.factory {
      Some(factory) => factory(),
      None => constructor::construct(kernel, &plan.target, args)?,
    };
    Ok(Resolved {
      instance,
      info: plan.target.clone(),
    })
  }

  pub(crate) fn tracked_transients(&self) -> usize {
    self.tracker.tracked_transients()
  }

  pub(crate) fn dispose(&self) {
    self.tracker.dispose(self.bound);
  }
}

impl fmt::Debug for Binding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let config = self.config.read();
    f.debug_struct("Binding")
      .field("bound", &self.bound)
      .field("target", &config.target.key())
      .field("factory", &config.factory.is_some())
      .field("scope", &config.scope)
      .field("constraint", &config.constraint)
      .finish()
  }
}
