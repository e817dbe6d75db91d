//! Kernel-wide settings.

use crate::binding::Scope;

/// Behavior switches for a `Kernel`.
///
/// With the `serde` feature the struct deserializes from any config format;
/// missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct KernelSettings {
  /// Fail with `ResolveError::CircularDependency` when a binding is entered
  /// again while it is still being resolved on the same thread. When off, a
  /// cycle of transient bindings recurses until the stack is exhausted, and a
  /// cycle through a singleton deadlocks on the singleton's own slot.
  pub detect_cycles: bool,
  /// Synthesize default bindings for unbound concrete types.
  pub implicit_bindings: bool,
  /// Scope of bindings that never call `in_scope`.
  pub default_scope: Scope,
}

impl Default for KernelSettings {
  fn default() -> Self {
    Self {
      detect_cycles: true,
      implicit_bindings: true,
      default_scope: Scope::Transient,
    }
  }
}

impl KernelSettings {
  pub fn detect_cycles(mut self, enabled: bool) -> Self {
    self.detect_cycles = enabled;
    self
  }

  pub fn implicit_bindings(mut self, enabled: bool) -> Self {
    self.implicit_bindings = enabled;
    self
  }

  pub fn default_scope(mut self, scope: Scope) -> Self {
    self.default_scope = scope;
    self
  }
}
