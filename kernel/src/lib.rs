//! # Fibre Kernel
//!
//! A dependency injection kernel for Rust.
//!
//! The kernel keeps an ordered registry of bindings and, given a requested
//! type, produces a fully constructed instance by recursively resolving the
//! dependencies of its constructors.
//!
//! ## Core Concepts
//!
//! - **Service**: every type taking part in resolution implements `Service`
//!   and describes its constructors, the capabilities it can be viewed as and
//!   its disposal contract. Trait objects implement it with an empty body and
//!   are therefore abstract.
//! - **Binding**: declared through `Kernel::bind`, it picks a target type or a
//!   factory, a scope (transient or singleton) and optionally an injection
//!   constraint (`when_injected_into`, `when_injected_exactly_into`).
//! - **Default binding**: concrete types nobody bound are resolved through an
//!   implicitly created, transient binding.
//! - **Constructor resolution**: constructors are tried greedily, largest
//!   arity first, falling back to smaller ones when a parameter can not be
//!   satisfied.
//! - **Teardown**: `Kernel::dispose` (or dropping the kernel) disposes every
//!   singleton and every transient instance that is still alive.
//!
//! ## Quick Start
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
//! struct Person {
//!   vehicle: Arc<dyn Vehicle>,
//! }
//! impl Service for Person {
//!   fn describe(ty: &mut Describe<Self>) {
//!     ty.constructor(
//!       Constructor::new(|args| Ok(Person { vehicle: args.next::<dyn Vehicle>()? }))
//!         .param::<dyn Vehicle>("vehicle"),
//!     );
//!   }
//! }
//!
//! let kernel = Kernel::new();
//! kernel.bind::<dyn Vehicle>().to::<Car>().unwrap();
//!
//! // `Person` has no binding, a default binding is created on demand.
//! let person = kernel.resolve::<Person>().unwrap();
//! assert_eq!(person.vehicle.name(), "car");
//! ```

mod binding;
mod constructor;
mod core;
mod default_binding;
mod describe;
mod error;
mod kernel;
mod macros;
mod service;
mod settings;
mod syntax;

pub use binding::{InjectionConstraint, Scope};
pub use constructor::{Arg, Arguments, Constructor};
pub use crate::core::{Shared, TypeKey};
pub use describe::{Describe, TypeHandle, TypeInfo};
pub use error::{ConfigError, DisposeError, InvokeError, RejectedConstructor, ResolveError, Result};
pub use kernel::Kernel;
pub use service::{Disposable, Service};
pub use settings::KernelSettings;
pub use syntax::{BindingInScope, BindingTo, BindingWhen};
