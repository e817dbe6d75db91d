//! Fluent binding configuration returned by `Kernel::bind`.
//!
//! ```
//! use fibre_kernel::{Constructor, Describe, Kernel, Service};
//! use std::sync::Arc;
//!
//! trait Vehicle: Send + Sync {
//!   fn name(&self) -> &'static str;
//! }
//! impl Service for dyn Vehicle {}
//!
//! struct Car;
//! impl Vehicle for Car {
//!   fn name(&self) -> &'static str {
//!     "car"
//!   }
//! }
//! impl Service for Car {
//!   fn describe(ty: &mut Describe<Self>) {
//!     ty.constructor(Constructor::new(|_| Ok(Car)))
//!       .implements::<dyn Vehicle>(|car| car as Arc<dyn Vehicle>);
//!   }
//! }
//!
//! let kernel = Kernel::new();
//! kernel.bind::<dyn Vehicle>().to::<Car>().unwrap().in_singleton_scope();
//!
//! let vehicle = kernel.resolve::<dyn Vehicle>().unwrap();
//! assert_eq!(vehicle.name(), "car");
//! ```

use crate::binding::{Binding, InjectionConstraint, Scope};
use crate::core::{Instance, TypeKey};
use crate::describe::TypeInfo;
use crate::error::ConfigError;
use crate::service::Service;
use std::marker::PhantomData;
use std::sync::Arc;

fn target_for<T: ?Sized + Service, C: Service>(require_constructor: bool) -> Result<TypeInfo, ConfigError> {
  let info = TypeInfo::concrete::<C>();
  if require_constructor && !info.is_concrete() {
    return Err(ConfigError::AbstractTarget(info.key().name()));
  }
  let bound = TypeKey::of::<T>();
  if !info.can_cast_to(&bound) {
    return Err(ConfigError::NotAssignable {
      bound: bound.name(),
      target: info.key().name(),
    });
  }
  Ok(info)
}

/// First step: what the binding resolves to.
#[must_use = "a binding without a target resolves the bound type itself"]
pub struct BindingTo<T: ?Sized> {
  binding: Arc<Binding>,
  _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized + Service> BindingTo<T> {
  pub(crate) fn new(binding: Arc<Binding>) -> Self {
    Self {
      binding,
      _marker: PhantomData,
    }
  }

  /// Resolves the bound type by constructing `C`.
  ///
  /// `C` must declare a constructor and be viewable as `T`, either by being
  /// `T` or by declaring `implements::<T>`.
  pub fn to<C: Service>(self) -> Result<BindingInScope<T>, ConfigError> {
    let target = target_for::<T, C>(true)?;
    self.binding.configure(|config| {
      config.target = Arc::new(target);
      config.factory = None;
    });
    Ok(BindingInScope::new(self.binding))
  }

  /// Resolves the bound type by constructing it.
  pub fn to_self(self) -> Result<BindingInScope<T>, ConfigError>
  where
    T: Sized,
  {
    self.to::<T>()
  }

  /// Resolves the bound type by calling `factory` instead of a constructor.
  pub fn to_factory<C: Service>(
    self,
    factory: impl Fn() -> C + Send + Sync + 'static,
  ) -> Result<BindingInScope<T>, ConfigError> {
    let target = target_for::<T, C>(false)?;
    self.binding.configure(|config| {
      config.target = Arc::new(target);
      config.factory = Some(Arc::new(move || Arc::new(factory()) as Instance));
    });
    Ok(BindingInScope::new(self.binding))
  }

  /// Binds a ready-made instance. The binding becomes a singleton that owns
  /// `value` and disposes it with the kernel.
  pub fn to_constant<C: Service>(self, value: C) -> Result<BindingWhen<T>, ConfigError> {
    let target = target_for::<T, C>(false)?;
    self.binding.configure(|config| {
      config.target = Arc::new(target);
      config.factory = None;
      config.scope = Scope::Singleton;
    });
    self.binding.seed(Arc::new(value));
    Ok(BindingWhen::new(self.binding))
  }
}

/// Second step: the lifetime of produced instances.
pub struct BindingInScope<T: ?Sized> {
  binding: Arc<Binding>,
  _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized + Service> BindingInScope<T> {
  fn new(binding: Arc<Binding>) -> Self {
    Self {
      binding,
      _marker: PhantomData,
    }
  }

  pub fn in_scope(self, scope: Scope) -> BindingWhen<T> {
    self.binding.configure(|config| config.scope = scope);
    BindingWhen::new(self.binding)
  }

  pub fn in_transient_scope(self) -> BindingWhen<T> {
    self.in_scope(Scope::Transient)
  }

  pub fn in_singleton_scope(self) -> BindingWhen<T> {
    self.in_scope(Scope::Singleton)
  }

  /// Keeps the current scope and restricts the binding, see
  /// `BindingWhen::when_injected_into`.
  pub fn when_injected_into<X: ?Sized + Service>(self) {
    BindingWhen::<T>::new(self.binding).when_injected_into::<X>();
  }

  /// Keeps the current scope and restricts the binding, see
  /// `BindingWhen::when_injected_exactly_into`.
  pub fn when_injected_exactly_into<X: ?Sized + Service>(self) -> Result<(), ConfigError> {
    BindingWhen::<T>::new(self.binding).when_injected_exactly_into::<X>()
  }
}

/// Last step: an optional injection constraint.
pub struct BindingWhen<T: ?Sized> {
  binding: Arc<Binding>,
  _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized + Service> BindingWhen<T> {
  fn new(binding: Arc<Binding>) -> Self {
    Self {
      binding,
      _marker: PhantomData,
    }
  }

  /// Only use this binding for dependencies of `X` or of a type declaring
  /// itself a subtype of `X`.
  pub fn when_injected_into<X: ?Sized + Service>(self) {
    self.constrain(TypeKey::of::<X>(), false);
  }

  /// Only use this binding for dependencies of exactly `X`.
  pub fn when_injected_exactly_into<X: ?Sized + Service>(self) -> Result<(), ConfigError> {
    let target = TypeInfo::of::<X>();
    if !target.is_concrete() {
      return Err(ConfigError::AbstractInjectionTarget(target.key().name()));
    }
    self.constrain(target.key(), true);
    Ok(())
  }

  fn constrain(&self, target: TypeKey, exact: bool) {
    self.binding.configure(|config| {
      config.constraint = Some(InjectionConstraint { target, exact });
    });
  }
}
