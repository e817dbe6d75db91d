//! Type metadata tables built from `Service::describe`.

use crate::constructor::{Constructor, ErasedConstructor};
use crate::core::{Instance, Shared, TypeKey};
use crate::error::DisposeError;
use crate::service::{Disposable, Service};
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type Caster = Arc<dyn Fn(Instance) -> Option<Shared> + Send + Sync>;
type Disposer = Arc<dyn Fn(&Instance) -> Result<(), DisposeError> + Send + Sync>;

fn caster<T: Service, I: ?Sized + Service>(view: fn(Arc<T>) -> Arc<I>) -> Caster {
  Arc::new(move |instance: Instance| {
    instance
      .downcast::<T>()
      .ok()
      .map(|this| Box::new(view(this)) as Shared)
  })
}

thread_local! {
  // Types whose `describe` is running on this thread.
  static DESCRIBING: RefCell<HashSet<TypeId>> = RefCell::new(HashSet::new());
}

/// Marks a type as being described until dropped.
struct Describing(Option<TypeId>);

impl Describing {
  fn enter(id: TypeId) -> Self {
    let inserted = DESCRIBING.with(|set| set.borrow_mut().insert(id));
    Self(inserted.then_some(id))
  }
}

impl Drop for Describing {
  fn drop(&mut self) {
    if let Some(id) = self.0 {
      DESCRIBING.with(|set| {
        set.borrow_mut().remove(&id);
      });
    }
  }
}

/// Every ancestor `X` declares. Empty when `X` is already being described
/// further up, which cuts `extends` loops short.
fn ancestors_of<X: ?Sized + Service>() -> Vec<TypeKey> {
  let id = TypeId::of::<X>();
  if DESCRIBING.with(|set| set.borrow().contains(&id)) {
    return Vec::new();
  }
  TypeInfo::of::<X>().supertypes
}

/// The erased metadata table of one type.
#[derive(Clone)]
pub struct TypeInfo {
  key: TypeKey,
  constructors: Vec<Arc<ErasedConstructor>>,
  casts: Vec<(TypeKey, Caster)>,
  supertypes: Vec<TypeKey>,
  disposer: Option<Disposer>,
}

impl TypeInfo {
  fn empty(key: TypeKey) -> Self {
    Self {
      key,
      constructors: Vec::new(),
      casts: Vec::new(),
      supertypes: Vec::new(),
      disposer: None,
    }
  }

  /// Builds the table for any service, sized or not.
  pub fn of<T: ?Sized + Service>() -> Self {
    let mut describe = Describe::<T>::new();
    let _describing = Describing::enter(TypeId::of::<T>());
    T::describe(&mut describe);
    describe.info
  }

  /// Builds the table for a sized service, which can always be viewed as
  /// itself even when it declares nothing.
  pub fn concrete<T: Service>() -> Self {
    let mut describe = Describe::<T>::new();
    describe.ensure_identity();
    let _describing = Describing::enter(TypeId::of::<T>());
    T::describe(&mut describe);
    describe.info
  }

  pub fn key(&self) -> TypeKey {
    self.key
  }

  /// A type is concrete once it declares at least one constructor.
  pub fn is_concrete(&self) -> bool {
    !self.constructors.is_empty()
  }

  /// The "is-assignable-to" query: `true` for the type itself and for every
  /// capability or supertype it declares, directly or through its ancestors.
  pub fn is_assignable_to(&self, key: &TypeKey) -> bool {
    self.key == *key || self.supertypes.contains(key)
  }

  /// Whether an instance of this type can be handed out as `key`.
  pub(crate) fn can_cast_to(&self, key: &TypeKey) -> bool {
    self.casts.iter().any(|(target, _)| target == key)
  }

  pub(crate) fn constructors(&self) -> &[Arc<ErasedConstructor>] {
    &self.constructors
  }

  /// Views a concrete instance of this type as `Arc<K>`, boxed.
  pub(crate) fn cast(&self, key: &TypeKey, instance: Instance) -> Option<Shared> {
    self
      .casts
      .iter()
      .find(|(target, _)| target == key)
      .and_then(|(_, cast)| cast(instance))
  }

  pub(crate) fn dispose(&self, instance: &Instance) -> Result<(), DisposeError> {
    match &self.disposer {
      Some(disposer) => disposer(instance),
      None => Ok(()),
    }
  }

  pub(crate) fn is_disposable(&self) -> bool {
    self.disposer.is_some()
  }
}

impl fmt::Debug for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TypeInfo")
      .field("key", &self.key)
      .field("constructors", &self.constructors.len())
      .field("supertypes", &self.supertypes)
      .field("disposable", &self.is_disposable())
      .finish()
  }
}

/// Builder handed to `Service::describe`.
pub struct Describe<T: ?Sized> {
  info: TypeInfo,
  _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized + Service> Describe<T> {
  fn new() -> Self {
    Self {
      info: TypeInfo::empty(TypeKey::of::<T>()),
      _marker: PhantomData,
    }
  }

  /// Declares `T` a subtype of `X` for injection-target matching.
  ///
  /// Unlike `implements`, no conversion is recorded, so an instance of `T` can
  /// not stand in for an `X` parameter.
  pub fn extends<X: ?Sized + Service>(&mut self) -> &mut Self {
    self.inherit::<X>();
    self
  }

  /// Records `X` and everything `X` itself is assignable to.
  fn inherit<X: ?Sized + Service>(&mut self) {
    self.add_supertype(TypeKey::of::<X>());
    for key in ancestors_of::<X>() {
      self.add_supertype(key);
    }
  }

  fn add_supertype(&mut self, key: TypeKey) {
    if key != self.info.key && !self.info.supertypes.contains(&key) {
      self.info.supertypes.push(key);
    }
  }
}

impl<T: Service> Describe<T> {
  fn ensure_identity(&mut self) {
    let key = self.info.key;
    if !self.info.casts.iter().any(|(target, _)| *target == key) {
      self.info.casts.push((key, caster::<T, T>(|this| this)));
    }
  }

  /// Declares a constructor. Declaration order breaks ties between
  /// constructors of equal arity.
  pub fn constructor(&mut self, constructor: Constructor<T>) -> &mut Self {
    self.ensure_identity();
    self.info.constructors.push(Arc::new(constructor.erase()));
    self
  }

  /// Declares that `T` can be viewed as `I`, usually a trait object.
  pub fn implements<I: ?Sized + Service>(&mut self, view: fn(Arc<T>) -> Arc<I>) -> &mut Self {
    self.ensure_identity();
    let key = TypeKey::of::<I>();
    self.inherit::<I>();
    self.info.casts.retain(|(target, _)| *target != key);
    self.info.casts.push((key, caster(view)));
    self
  }

  /// Declares that instances must be torn down through `Disposable`.
  pub fn disposable(&mut self) -> &mut Self
  where
    T: Disposable,
  {
    self.ensure_identity();
    self.info.disposer = Some(Arc::new(|instance: &Instance| {
      match (**instance).downcast_ref::<T>() {
        Some(this) => this.dispose(),
        None => Ok(()),
      }
    }));
    self
  }
}

/// A type identity together with the way to read its metadata table.
///
/// Constructor parameters and resolution requests carry handles so the kernel
/// can synthesize a default binding for a type it has never seen.
#[derive(Clone, Copy)]
pub struct TypeHandle {
  key: TypeKey,
  describe: fn() -> TypeInfo,
}

impl TypeHandle {
  pub fn of<T: ?Sized + Service>() -> Self {
    Self {
      key: TypeKey::of::<T>(),
      describe: TypeInfo::of::<T>,
    }
  }

  pub fn key(&self) -> TypeKey {
    self.key
  }

  pub fn describe(&self) -> TypeInfo {
    (self.describe)()
  }
}

impl fmt::Debug for TypeHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeHandle({})", self.key.name())
  }
}
