use fibre_kernel::{Constructor, Describe, Kernel, KernelSettings, ResolveError, Scope, Service};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Clock;
impl Service for Clock {
  fn describe(ty: &mut Describe<Self>) {
    ty.constructor(Constructor::new(|_| Ok(Clock)));
  }
}

// --- Loading Tests ---

#[test]
fn test_load_full_settings_from_yaml() {
  // Arrange
  let yaml = r#"
detect_cycles: false
implicit_bindings: false
default_scope: singleton
"#;

  // Act
  let settings: KernelSettings = serde_yaml::from_str(yaml).unwrap();

  // Assert
  assert_eq!(
    settings,
    KernelSettings::default()
      .detect_cycles(false)
      .implicit_bindings(false)
      .default_scope(Scope::Singleton)
  );
}

#[test]
fn test_missing_fields_fall_back_to_defaults() {
  // Arrange
  let yaml = "default_scope: transient\n";

  // Act
  let settings: KernelSettings = serde_yaml::from_str(yaml).unwrap();

  // Assert
  assert_eq!(settings, KernelSettings::default());
}

#[test]
fn test_unknown_fields_are_rejected() {
  let yaml = "detect_cycles: true\nlazy_singletons: true\n";
  let result = serde_yaml::from_str::<KernelSettings>(yaml);
  assert!(result.is_err());
}

#[test]
fn test_unknown_scope_is_rejected() {
  let result = serde_yaml::from_str::<KernelSettings>("default_scope: request\n");
  assert!(result.is_err());
}

// --- Behavior Tests ---

#[test]
fn test_without_implicit_bindings_unbound_types_fail() {
  // Arrange
  let kernel = Kernel::with_settings(KernelSettings::default().implicit_bindings(false));

  // Act
  let result = kernel.resolve::<Clock>();

  // Assert
  assert_eq!(
    result.err(),
    Some(ResolveError::NoMatchingBinding(std::any::type_name::<Clock>()))
  );

  // An explicit binding still works.
  kernel.bind::<Clock>().to_self().unwrap();
  assert!(kernel.resolve::<Clock>().is_ok());
}

#[test]
fn test_default_scope_applies_to_unscoped_bindings() {
  // Arrange
  let kernel = Kernel::with_settings(KernelSettings::default().default_scope(Scope::Singleton));
  kernel.bind::<Clock>().to_self().unwrap();

  // Act
  let c1 = kernel.resolve::<Clock>().unwrap();
  let c2 = kernel.resolve::<Clock>().unwrap();

  // Assert
  assert!(Arc::ptr_eq(&c1, &c2));
  assert_eq!(kernel.settings().default_scope, Scope::Singleton);
}

#[test]
fn test_default_bindings_stay_transient() {
  let kernel = Kernel::with_settings(KernelSettings::default().default_scope(Scope::Singleton));
  let c1 = kernel.resolve::<Clock>().unwrap();
  let c2 = kernel.resolve::<Clock>().unwrap();
  assert!(!Arc::ptr_eq(&c1, &c2));
}

#[test]
fn test_acyclic_graph_resolves_without_cycle_detection() {
  // Arrange
  struct Wall {
    clock: Arc<Clock>,
  }
  impl Service for Wall {
    fn describe(ty: &mut Describe<Self>) {
      ty.constructor(
        Constructor::new(|args| {
          Ok(Wall {
            clock: args.next::<Clock>()?,
          })
        })
        .param::<Clock>("clock"),
      );
    }
  }
  let kernel = Kernel::with_settings(KernelSettings::default().detect_cycles(false));
  kernel.bind::<Clock>().to_self().unwrap().in_singleton_scope();
  kernel.bind::<Wall>().to_self().unwrap().in_singleton_scope();

  // Act
  let w1 = kernel.resolve::<Wall>().unwrap();
  let w2 = kernel.resolve::<Wall>().unwrap();

  // Assert
  assert!(Arc::ptr_eq(&w1, &w2));
  assert!(Arc::ptr_eq(&w1.clock, &kernel.resolve::<Clock>().unwrap()));
}
