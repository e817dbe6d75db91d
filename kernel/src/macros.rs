//! Public macros for ergonomic service resolution.

/// Resolves a service from a kernel, panicking if it cannot be resolved.
///
/// Use it where a missing service is a bug. For a non-panicking version, call
/// `Kernel::resolve` or `Kernel::resolve_with` directly.
///
/// # Panics
///
/// Panics with the `ResolveError` message if resolution fails.
///
/// # Examples
///
/// ```
/// use fibre_kernel::{resolve, Constructor, Describe, Kernel, Service};
///
/// struct Engine;
/// impl Service for Engine {
///   fn describe(ty: &mut Describe<Self>) {
///     ty.constructor(Constructor::new(|_| Ok(Engine)));
///   }
/// }
///
/// struct Badge {
///   label: String,
/// }
/// impl Service for Badge {
///   fn describe(ty: &mut Describe<Self>) {
///     ty.constructor(Constructor::new(|args| Ok(Badge { label: args.value()? })).param::<String>("label"));
///   }
/// }
///
/// let kernel = Kernel::new();
/// let _engine = resolve!(kernel, Engine);
///
/// // Explicit constructor arguments follow the type.
/// let badge = resolve!(kernel, Badge, "guest".to_string());
/// assert_eq!(badge.label, "guest");
/// ```
///
/// ```
/// use fibre_kernel::{resolve, Kernel, Service};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// impl Service for dyn Greeter {}
///
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
/// impl Service for EnglishGreeter {
///   fn describe(ty: &mut fibre_kernel::Describe<Self>) {
///     ty.implements::<dyn Greeter>(|this| this as Arc<dyn Greeter>);
///   }
/// }
///
/// let kernel = Kernel::new();
/// kernel.bind::<dyn Greeter>().to_factory(|| EnglishGreeter).unwrap();
///
/// // Resolve the trait object.
/// let greeter = resolve!(kernel, trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for resolving a trait object: resolve!(kernel, trait MyTrait)
    ($kernel:expr, trait $trait_ident:ident) => {
        $kernel
            .resolve::<dyn $trait_ident>()
            .unwrap_or_else(|error| {
                panic!(
                    "Failed to resolve required trait service {}: {}",
                    std::any::type_name::<dyn $trait_ident>(),
                    error
                )
            })
    };

    // Arm for resolving a type: resolve!(kernel, MyService)
    ($kernel:expr, $type:ty) => {
        $kernel
            .resolve::<$type>()
            .unwrap_or_else(|error| {
                panic!(
                    "Failed to resolve required service {}: {}",
                    std::any::type_name::<$type>(),
                    error
                )
            })
    };

    // Arm for resolving with explicit constructor arguments:
    // resolve!(kernel, MyService, arg1, arg2)
    ($kernel:expr, $type:ty, $($arg:expr),+ $(,)?) => {
        $kernel
            .resolve_with::<$type>(&[$($crate::Arg::new($arg)),+])
            .unwrap_or_else(|error| {
                panic!(
                    "Failed to resolve required service {}: {}",
                    std::any::type_name::<$type>(),
                    error
                )
            })
    };
}
