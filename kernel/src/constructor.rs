//! Constructor declarations, explicit arguments and the greedy constructor
//! resolution shared by explicit and default bindings.

use crate::core::{Instance, Shared, TypeKey};
use crate::describe::{TypeHandle, TypeInfo};
use crate::error::{InvokeError, RejectedConstructor, ResolveError};
use crate::kernel::Kernel;
use crate::service::Service;
use std::fmt;
use std::sync::Arc;

type Invoke<T> = Box<dyn Fn(&mut Arguments) -> Result<T, InvokeError> + Send + Sync>;
type DefaultValue = Arc<dyn Fn() -> Shared + Send + Sync>;

/// One declared constructor parameter.
#[derive(Clone)]
pub(crate) struct Parameter {
  name: &'static str,
  handle: TypeHandle,
  default: Option<DefaultValue>,
}

impl fmt::Debug for Parameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.name, self.handle.key().name())
  }
}

/// A typed constructor declaration for `T`.
///
/// Parameters are declared in the order `invoke` consumes them:
///
/// ```
/// use fibre_kernel::{Constructor, Describe, Service};
///
/// struct Greeting {
///   text: String,
/// }
///
/// impl Service for Greeting {
///   fn describe(ty: &mut Describe<Self>) {
///     ty.constructor(
///       Constructor::new(|args| Ok(Greeting { text: args.value()? }))
///         .param_or::<String>("text", "hello".to_string()),
///     );
///   }
/// }
/// ```
pub struct Constructor<T> {
  params: Vec<Parameter>,
  invoke: Invoke<T>,
}

impl<T: Service> Constructor<T> {
  pub fn new(invoke: impl Fn(&mut Arguments) -> Result<T, InvokeError> + Send + Sync + 'static) -> Self {
    Self {
      params: Vec::new(),
      invoke: Box::new(invoke),
    }
  }

  /// Declares a parameter resolved through the kernel.
  pub fn param<P: ?Sized + Service>(mut self, name: &'static str) -> Self {
    self.params.push(Parameter {
      name,
      handle: TypeHandle::of::<P>(),
      default: None,
    });
    self
  }

  /// Declares a parameter with a default value, used when the kernel can not
  /// supply one.
  pub fn param_or<P: Service>(mut self, name: &'static str, default: P) -> Self {
    let default = Arc::new(default);
    self.params.push(Parameter {
      name,
      handle: TypeHandle::of::<P>(),
      default: Some(Arc::new(move || Box::new(default.clone()) as Shared)),
    });
    self
  }

  pub(crate) fn erase(self) -> ErasedConstructor {
    let invoke = self.invoke;
    ErasedConstructor {
      params: self.params,
      invoke: Box::new(move |args: &mut Arguments| {
        invoke(args).map(|value| Arc::new(value) as Instance)
      }),
    }
  }
}

pub(crate) struct ErasedConstructor {
  params: Vec<Parameter>,
  invoke: Invoke<Instance>,
}

impl ErasedConstructor {
  fn arity(&self) -> usize {
    self.params.len()
  }

  fn signature(&self) -> String {
    let params = self
      .params
      .iter()
      .map(|param| format!("{param:?}"))
      .collect::<Vec<_>>();
    format!("({})", params.join(", "))
  }
}

/// The resolved argument list handed to a constructor, consumed in
/// declaration order.
pub struct Arguments {
  values: Vec<Option<Shared>>,
  position: usize,
}

impl Arguments {
  fn new(values: Vec<Shared>) -> Self {
    Self {
      values: values.into_iter().map(Some).collect(),
      position: 0,
    }
  }

  /// Takes the next argument as a shared `Arc<P>`.
  pub fn next<P: ?Sized + Service>(&mut self) -> Result<Arc<P>, InvokeError> {
    let index = self.position;
    let available = self.values.len();
    let value = self
      .values
      .get_mut(index)
      .and_then(Option::take)
      .ok_or(InvokeError::MissingArgument { index, available })?;
    self.position += 1;
    value
      .downcast::<Arc<P>>()
      .map(|boxed| *boxed)
      .map_err(|_| InvokeError::ArgumentMismatch {
        index,
        expected: std::any::type_name::<P>(),
      })
  }

  /// Takes the next argument and clones the value out of it.
  pub fn value<P: Service + Clone>(&mut self) -> Result<P, InvokeError> {
    self.next::<P>().map(|shared| (*shared).clone())
  }

  pub fn remaining(&self) -> usize {
    self.values.len().saturating_sub(self.position)
  }
}

/// A caller-supplied constructor argument for `Kernel::resolve_with`.
///
/// It satisfies every parameter whose type it is assignable to.
#[derive(Clone)]
pub struct Arg {
  instance: Instance,
  info: Arc<TypeInfo>,
}

impl Arg {
  pub fn new<V: Service>(value: V) -> Self {
    Self::shared(Arc::new(value))
  }

  pub fn shared<V: Service>(value: Arc<V>) -> Self {
    Self {
      instance: value,
      info: Arc::new(TypeInfo::concrete::<V>()),
    }
  }

  pub fn type_key(&self) -> TypeKey {
    self.info.key()
  }

  fn cast_to(&self, key: &TypeKey) -> Option<Shared> {
    self.info.cast(key, self.instance.clone())
  }
}

impl fmt::Debug for Arg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Arg({})", self.info.key().name())
  }
}

enum Attempt {
  Rejected(String),
  Fatal(ResolveError),
}

/// Greedy constructor resolution for `target`.
///
/// Constructors are tried from the largest arity down. A candidate is rejected
/// as soon as one parameter can not be satisfied, or when invoking it fails;
/// only fatal errors (cycles, a disposed kernel) stop the scan early.
pub(crate) fn construct(kernel: &Kernel, target: &TypeInfo, args: &[Arg]) -> Result<Instance, ResolveError> {
  let mut candidates = target.constructors().iter().collect::<Vec<_>>();
  // Stable, so constructors of equal arity keep declaration order.
  candidates.sort_by(|a, b| b.arity().cmp(&a.arity()));

  let mut attempts = Vec::new();
  for constructor in candidates {
    match attempt(kernel, target, constructor, args) {
      Ok(instance) => return Ok(instance),
      Err(Attempt::Fatal(error)) => return Err(error),
      Err(Attempt::Rejected(reason)) => {
        let signature = constructor.signature();
        tracing::debug!(
          target_type = target.key().name(),
          %signature,
          %reason,
          "Constructor candidate rejected."
        );
        attempts.push(RejectedConstructor { signature, reason });
      }
    }
  }

  Err(ResolveError::NoValidConstructor {
    type_name: target.key().name(),
    attempts,
  })
}

fn attempt(
  kernel: &Kernel,
  target: &TypeInfo,
  constructor: &ErasedConstructor,
  args: &[Arg],
) -> Result<Instance, Attempt> {
  let mut values = Vec::with_capacity(constructor.arity());

  for param in &constructor.params {
    let key = param.handle.key();
    if let Some(value) = args.iter().find_map(|arg| arg.cast_to(&key)) {
      values.push(value);
      continue;
    }

    match kernel.resolve_dependency(&param.handle, target) {
      Ok(value) => values.push(value),
      Err(error) if error.is_fatal() => return Err(Attempt::Fatal(error)),
      Err(error) => match &param.default {
        Some(default) => values.push(default()),
        None => {
          return Err(Attempt::Rejected(format!(
            "parameter `{}` could not be resolved: {error}",
            param.name
          )))
        }
      },
    }
  }

  (constructor.invoke)(&mut Arguments::new(values))
    .map_err(|error| Attempt::Rejected(format!("invocation failed: {error}")))
}
