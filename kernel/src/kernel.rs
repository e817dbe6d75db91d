//! The main `Kernel` struct: binding registry, precedence and resolution.

use crate::binding::{Binding, InjectionConstraint, Resolved};
use crate::constructor::Arg;
use crate::core::{ResolutionGuard, Shared, TypeKey};
use crate::default_binding::DefaultBinding;
use crate::describe::{TypeHandle, TypeInfo};
use crate::error::{ResolveError, Result};
use crate::service::Service;
use crate::settings::KernelSettings;
use crate::syntax::BindingTo;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A registry entry.
#[derive(Clone)]
pub(crate) enum Entry {
  Explicit(Arc<Binding>),
  Default(Arc<DefaultBinding>),
}

impl Entry {
  fn can_resolve(&self, key: &TypeKey, injected_into: Option<&TypeInfo>) -> bool {
    match self {
      Entry::Explicit(binding) => binding.can_resolve(key, injected_into),
      Entry::Default(binding) => binding.can_resolve(key),
    }
  }

  /// Lower ranks win: exact constraints, then subtype constraints, then
  /// unconstrained bindings, then default bindings.
  fn precedence(&self) -> u8 {
    match self {
      Entry::Explicit(binding) => match binding.constraint() {
        Some(InjectionConstraint { exact: true, .. }) => 0,
        Some(InjectionConstraint { exact: false, .. }) => 1,
        None => 2,
      },
      Entry::Default(_) => 3,
    }
  }

  fn bound(&self) -> TypeKey {
    match self {
      Entry::Explicit(binding) => binding.bound(),
      Entry::Default(binding) => binding.bound(),
    }
  }

  fn resolve(&self, kernel: &Kernel, args: &[Arg]) -> Result<Resolved> {
    match self {
      Entry::Explicit(binding) => binding.resolve(kernel, args),
      Entry::Default(binding) => binding.resolve(kernel, args),
    }
  }

  fn dispose(&self) {
    match self {
      Entry::Explicit(binding) => binding.dispose(),
      Entry::Default(binding) => binding.dispose(),
    }
  }
}

/// The dependency injection kernel.
///
/// Holds an insertion-ordered registry of bindings and resolves requested
/// types by recursively satisfying constructor dependencies. Bindings are
/// meant to be declared before the kernel is shared; registry access is
/// nonetheless synchronized, so a `Kernel` can be used from several threads.
///
/// Dropping the kernel disposes every instance it is still tracking.
pub struct Kernel {
  registry: RwLock<Vec<Entry>>,
  defaults: DashMap<TypeKey, Arc<DefaultBinding>>,
  settings: KernelSettings,
  disposing: AtomicBool,
}

impl Default for Kernel {
  fn default() -> Self {
    Self::with_settings(KernelSettings::default())
  }
}

impl Kernel {
  /// Creates a new, empty `Kernel` with default settings.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_settings(settings: KernelSettings) -> Self {
    Self {
      registry: RwLock::new(Vec::new()),
      defaults: DashMap::new(),
      settings,
      disposing: AtomicBool::new(false),
    }
  }

  pub fn settings(&self) -> &KernelSettings {
    &self.settings
  }

  // --- Registration ---

  /// Registers a new binding for `T` and returns its configuration syntax.
  ///
  /// Until configured otherwise, the binding resolves `T` itself with the
  /// default scope from `KernelSettings`.
  pub fn bind<T: ?Sized + Service>(&self) -> BindingTo<T> {
    let key = TypeKey::of::<T>();
    let binding = Arc::new(Binding::new(
      key,
      TypeInfo::of::<T>(),
      self.settings.default_scope,
    ));
    self.registry.write().push(Entry::Explicit(binding.clone()));
    tracing::debug!(bound = key.name(), "Registered binding.");
    BindingTo::new(binding)
  }

  // --- Resolution ---

  /// Resolves `T` with no explicit constructor arguments.
  pub fn resolve<T: ?Sized + Service>(&self) -> Result<Arc<T>> {
    self.resolve_with::<T>(&[])
  }

  /// Resolves `T`, offering `args` to its constructor before the kernel is
  /// asked for each parameter.
  pub fn resolve_with<T: ?Sized + Service>(&self, args: &[Arg]) -> Result<Arc<T>> {
    let handle = TypeHandle::of::<T>();
    let (shared, produced) = self.resolve_request(&handle, None, args)?;
    shared
      .downcast::<Arc<T>>()
      .map(|boxed| *boxed)
      .map_err(|_| ResolveError::IncompatibleInstance {
        requested: handle.key().name(),
        produced: produced.name(),
      })
  }

  /// The untyped form of `resolve_with`.
  ///
  /// Returns a boxed `Arc<T>` for the requested type `T`. `injected_into`
  /// names the type whose constructor the value is meant for, which lets
  /// constrained bindings take part.
  pub fn resolve_type(
    &self,
    ty: &TypeHandle,
    injected_into: Option<&TypeHandle>,
    args: &[Arg],
  ) -> Result<Shared> {
    let context = injected_into.map(TypeHandle::describe);
    self
      .resolve_request(ty, context.as_ref(), args)
      .map(|(shared, _)| shared)
  }

  /// Resolves one constructor parameter of `injected_into`.
  pub(crate) fn resolve_dependency(&self, ty: &TypeHandle, injected_into: &TypeInfo) -> Result<Shared> {
    self
      .resolve_request(ty, Some(injected_into), &[])
      .map(|(shared, _)| shared)
  }

  /// Resolves `ty` and views the instance as it. Also returns the concrete
  /// type that was produced, for diagnostics.
  fn resolve_request(
    &self,
    ty: &TypeHandle,
    injected_into: Option<&TypeInfo>,
    args: &[Arg],
  ) -> Result<(Shared, TypeKey)> {
    if self.disposing.load(Ordering::SeqCst) {
      return Err(ResolveError::Disposed);
    }

    let key = ty.key();
    let entry = self
      .find_matching_binding(ty, injected_into)
      .ok_or(ResolveError::NoMatchingBinding(key.name()))?;
    let resolved = entry.resolve(self, args)?;
    let produced = resolved.info.key();
    resolved
      .info
      .cast(&key, resolved.instance)
      .map(|shared| (shared, produced))
      .ok_or(ResolveError::IncompatibleInstance {
        requested: key.name(),
        produced: produced.name(),
      })
  }

  /// Finds the best binding for `ty` in the given injection context, creating
  /// a default binding when nothing is registered and the type is concrete.
  pub(crate) fn find_matching_binding(
    &self,
    ty: &TypeHandle,
    injected_into: Option<&TypeInfo>,
  ) -> Option<Entry> {
    let key = ty.key();
    let matched = {
      let registry = self.registry.read();
      registry
        .iter()
        .filter(|entry| entry.can_resolve(&key, injected_into))
        // `min_by_key` keeps the first of equal ranks: registry order breaks ties.
        .min_by_key(|entry| entry.precedence())
        .cloned()
    };

    if let Some(entry) = matched {
      tracing::trace!(
        requested = key.name(),
        injected_into = injected_into.map(|context| context.key().name()),
        precedence = entry.precedence(),
        "Matched binding."
      );
      return Some(entry);
    }

    if !self.settings.implicit_bindings {
      return None;
    }
    self.default_binding(ty).map(Entry::Default)
  }

  fn default_binding(&self, ty: &TypeHandle) -> Option<Arc<DefaultBinding>> {
    let key = ty.key();
    let binding = self
      .defaults
      .entry(key)
      .or_try_insert_with(|| {
        let binding = Arc::new(DefaultBinding::create(ty)?);
        self
          .registry
          .write()
          .push(Entry::Default(binding.clone()));
        tracing::debug!(bound = key.name(), "Created default binding.");
        Ok::<_, crate::error::ConfigError>(binding)
      });

    match binding {
      Ok(binding) => Some(binding.value().clone()),
      Err(error) => {
        tracing::trace!(requested = key.name(), %error, "No default binding possible.");
        None
      }
    }
  }

  pub(crate) fn enter(&self, id: usize, type_name: &'static str) -> Result<ResolutionGuard> {
    if self.settings.detect_cycles {
      ResolutionGuard::enter(id, type_name)
    } else {
      Ok(ResolutionGuard::disabled())
    }
  }

  // --- Introspection ---

  /// Number of registered bindings, default bindings included.
  pub fn binding_count(&self) -> usize {
    self.registry.read().len()
  }

  /// Number of transient instances produced for `T` that are still alive
  /// somewhere and would be disposed with the kernel.
  pub fn tracked_instances<T: ?Sized + Service>(&self) -> usize {
    let key = TypeKey::of::<T>();
    self
      .registry
      .read()
      .iter()
      .filter(|entry| entry.bound() == key)
      .map(|entry| match entry {
        Entry::Explicit(binding) => binding.tracked_transients(),
        Entry::Default(binding) => binding.tracked_transients(),
      })
      .sum()
  }

  // --- Teardown ---

  /// Disposes every binding, and through them every instance they produced.
  ///
  /// Idempotent: calls after the first, including re-entrant calls made from
  /// an instance's own `dispose`, return immediately.
  pub fn dispose(&self) {
    if self.disposing.swap(true, Ordering::SeqCst) {
      return;
    }

    let entries = std::mem::take(&mut *self.registry.write());
    self.defaults.clear();
    tracing::debug!(bindings = entries.len(), "Disposing kernel.");

    for entry in entries {
      entry.dispose();
    }
  }

  pub fn is_disposed(&self) -> bool {
    self.disposing.load(Ordering::SeqCst)
  }
}

impl Drop for Kernel {
  fn drop(&mut self) {
    self.dispose();
  }
}

impl std::fmt::Debug for Kernel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Kernel")
      .field("bindings", &self.binding_count())
      .field("settings", &self.settings)
      .field("disposed", &self.is_disposed())
      .finish()
  }
}
