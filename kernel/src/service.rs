//! The `Service` trait: what the kernel needs to know about a type.

use crate::describe::Describe;
use crate::error::DisposeError;
use std::any::Any;

/// A type the kernel can resolve.
///
/// Rust has no runtime reflection, so every type taking part in resolution
/// describes itself: its constructors, the capabilities (trait objects) it can
/// be viewed as, the types it counts as a subtype of, and whether it carries a
/// disposal contract. Types that describe no constructor are *abstract*: they
/// can only be produced by an explicit binding.
///
/// Trait objects implement it with an empty body:
///
/// ```
/// use fibre_kernel::Service;
///
/// trait Vehicle: Send + Sync {
///   fn name(&self) -> &'static str;
/// }
///
/// impl Service for dyn Vehicle {}
/// ```
pub trait Service: Any + Send + Sync {
  /// Fills in the metadata table for `Self`. Declares nothing by default.
  fn describe(ty: &mut Describe<Self>) {
    let _ = ty;
  }
}

/// A teardown contract for instances the kernel produced.
///
/// Implementations take `&self` because instances are shared; use interior
/// mutability to record the disposed state.
pub trait Disposable {
  /// Releases whatever the instance holds. Returning
  /// `DisposeError::AlreadyDisposed` is expected and silently ignored.
  fn dispose(&self) -> Result<(), DisposeError>;
}

// Plain values have no injectable constructor. They are supplied through
// bindings, explicit arguments or parameter defaults.
macro_rules! value_services {
  ($($ty:ty),* $(,)?) => {
    $(impl Service for $ty {})*
  };
}

value_services!(
  String,
  &'static str,
  bool,
  char,
  u8,
  u16,
  u32,
  u64,
  u128,
  usize,
  i8,
  i16,
  i32,
  i64,
  i128,
  isize,
  f32,
  f64,
);
