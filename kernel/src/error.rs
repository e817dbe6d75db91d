//! Error types for binding configuration, resolution and teardown.

use std::fmt;
use thiserror::Error;

/// Raised synchronously while a binding is being configured.
///
/// These are programmer errors; nothing about them is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("Resolving type `{0}` must not be abstract (it declares no constructor).")]
  AbstractTarget(&'static str),

  #[error("Resolving type `{target}` is not assignable to bound type `{bound}`.")]
  NotAssignable {
    bound: &'static str,
    target: &'static str,
  },

  #[error("Type injected into `{0}` must not be abstract.")]
  AbstractInjectionTarget(&'static str),
}

/// A single constructor candidate that was tried and rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedConstructor {
  /// Human readable signature, e.g. `(name: alloc::string::String)`.
  pub signature: String,
  /// Why the candidate did not produce an instance.
  pub reason: String,
}

impl fmt::Display for RejectedConstructor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} => {}", self.signature, self.reason)
  }
}

fn describe_attempts(attempts: &[RejectedConstructor]) -> String {
  if attempts.is_empty() {
    return "no constructors declared".to_string();
  }
  attempts
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

/// Errors surfaced by `Kernel::resolve` and friends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  #[error("No matching binding found for `{0}`.")]
  NoMatchingBinding(&'static str),

  #[error(
    "No valid constructor for resolving `{type_name}` found (tried: {}).",
    describe_attempts(.attempts)
  )]
  NoValidConstructor {
    type_name: &'static str,
    attempts: Vec<RejectedConstructor>,
  },

  #[error("Instance of `{produced}` cannot be viewed as `{requested}`.")]
  IncompatibleInstance {
    requested: &'static str,
    produced: &'static str,
  },

  #[error("Circular dependency detected while resolving `{0}`.")]
  CircularDependency(&'static str),

  #[error("The kernel has been disposed.")]
  Disposed,
}

impl ResolveError {
  /// Fatal errors abort the whole resolution instead of rejecting a single
  /// constructor candidate.
  pub(crate) fn is_fatal(&self) -> bool {
    matches!(
      self,
      ResolveError::CircularDependency(_) | ResolveError::Disposed
    )
  }
}

/// Failure while invoking a constructor with a fully resolved argument list.
#[derive(Debug, Error)]
pub enum InvokeError {
  #[error("Constructor asked for argument {index}, but only {available} were supplied.")]
  MissingArgument { index: usize, available: usize },

  #[error("Argument {index} is not a `{expected}`.")]
  ArgumentMismatch { index: usize, expected: &'static str },

  #[error("Constructor failed: {0}")]
  Failed(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl InvokeError {
  /// Wraps any error raised by the constructed type's own initialization.
  pub fn failed<E>(error: E) -> Self
  where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
  {
    InvokeError::Failed(error.into())
  }
}

/// Raised by `Disposable::dispose`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisposeError {
  #[error("Instance has already been disposed.")]
  AlreadyDisposed,

  #[error("Disposal failed: {0}")]
  Failed(String),
}

/// A specialized `Result` type for resolution.
pub type Result<T, E = ResolveError> = std::result::Result<T, E>;
