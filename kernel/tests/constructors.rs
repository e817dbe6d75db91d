use fibre_kernel::{
  resolve, Arg, Constructor, Describe, InvokeError, Kernel, RejectedConstructor, ResolveError,
  Service,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

// --- Test Fixtures ---

trait Vehicle: Send + Sync {
  fn name(&self) -> &'static str;
}
impl Service for dyn Vehicle {}

struct Car;
impl Vehicle for Car {
  fn name(&self) -> &'static str {
    "car"
  }
}
impl Service for Car {
  fn describe(ty: &mut Describe<Self>) {
    ty.constructor(Constructor::new(|_| Ok(Car)))
      .implements::<dyn Vehicle>(|car| car as Arc<dyn Vehicle>);
  }
}

struct Motorcycle;
impl Vehicle for Motorcycle {
  fn name(&self) -> &'static str {
    "motorcycle"
  }
}
impl Service for Motorcycle {
  fn describe(ty: &mut Describe<Self>) {
    ty.constructor(Constructor::new(|_| Ok(Motorcycle)))
      .implements::<dyn Vehicle>(|motorcycle| motorcycle as Arc<dyn Vehicle>);
  }
}

// Two constructors: `(vehicle)` and `(name, vehicle)`.
struct NamedPerson {
  name: Option<String>,
  vehicle: Arc<dyn Vehicle>,
}
impl Service for NamedPerson {
  fn describe(ty: &mut Describe<Self>) {
    ty.constructor(
      Constructor::new(|args| {
        Ok(NamedPerson {
          name: None,
          vehicle: args.next::<dyn Vehicle>()?,
        })
      })
      .param::<dyn Vehicle>("vehicle"),
    )
    .constructor(
      Constructor::new(|args| {
        Ok(NamedPerson {
          name: Some(args.value::<String>()?),
          vehicle: args.next::<dyn Vehicle>()?,
        })
      })
      .param::<String>("name")
      .param::<dyn Vehicle>("vehicle"),
    );
  }
}

fn vehicle_kernel() -> Kernel {
  let kernel = Kernel::new();
  kernel.bind::<dyn Vehicle>().to::<Car>().unwrap();
  kernel
}

// --- Constructor Selection Tests ---

#[test]
fn test_greedy_selection_falls_back_to_smaller_constructor() {
  // Arrange: there is no binding for `String`.
  let kernel = vehicle_kernel();

  // Act
  let person = kernel.resolve::<NamedPerson>().unwrap();

  // Assert
  assert_eq!(person.name, None);
  assert_eq!(person.vehicle.name(), "car");
}

#[test]
fn test_explicit_argument_selects_larger_constructor() {
  // Arrange
  let kernel = vehicle_kernel();

  // Act
  let person = kernel
    .resolve_with::<NamedPerson>(&[Arg::new("Bob".to_string())])
    .unwrap();

  // Assert
  assert_eq!(person.name.as_deref(), Some("Bob"));
  assert_eq!(person.vehicle.name(), "car");
}

#[test]
fn test_explicit_argument_through_macro() {
  let kernel = vehicle_kernel();
  let person = resolve!(kernel, NamedPerson, "Alice".to_string());
  assert_eq!(person.name.as_deref(), Some("Alice"));
}

#[test]
fn test_bound_value_also_satisfies_larger_constructor() {
  // Arrange
  let kernel = vehicle_kernel();
  kernel.bind::<String>().to_constant("Carol".to_string()).unwrap();

  // Act
  let person = kernel.resolve::<NamedPerson>().unwrap();

  // Assert
  assert_eq!(person.name.as_deref(), Some("Carol"));
}

#[test]
fn test_explicit_argument_matches_by_capability() {
  // Arrange: the kernel would supply a car.
  let kernel = vehicle_kernel();

  // Act: an explicit motorcycle is assignable to `dyn Vehicle`.
  let person = kernel
    .resolve_with::<NamedPerson>(&[Arg::new(Motorcycle)])
    .unwrap();

  // Assert
  assert_eq!(person.vehicle.name(), "motorcycle");
  assert_eq!(person.name, None);
}

#[test]
fn test_explicit_arguments_do_not_reach_nested_dependencies() {
  // Arrange
  struct Household {
    resident: Arc<NamedPerson>,
  }
  impl Service for Household {
    fn describe(ty: &mut Describe<Self>) {
      ty.constructor(
        Constructor::new(|args| {
          Ok(Household {
            resident: args.next::<NamedPerson>()?,
          })
        })
        .param::<NamedPerson>("resident"),
      );
    }
  }
  let kernel = vehicle_kernel();

  // Act
  let household = kernel
    .resolve_with::<Household>(&[Arg::new("Dave".to_string())])
    .unwrap();

  // Assert
  assert_eq!(household.resident.name, None);
}

// --- Defaults and Failures ---

struct Endpoint {
  port: u16,
}
impl Service for Endpoint {
  fn describe(ty: &mut Describe<Self>) {
    ty.constructor(
      Constructor::new(|args| {
        Ok(Endpoint {
          port: args.value::<u16>()?,
        })
      })
      .param_or::<u16>("port", 8080),
    );
  }
}

#[test]
fn test_parameter_default_is_used_when_unresolvable() {
  let kernel = Kernel::new();
  let endpoint = kernel.resolve::<Endpoint>().unwrap();
  assert_eq!(endpoint.port, 8080);
}

#[test]
fn test_binding_takes_priority_over_parameter_default() {
  let kernel = Kernel::new();
  kernel.bind::<u16>().to_constant(9090_u16).unwrap();
  let endpoint = kernel.resolve::<Endpoint>().unwrap();
  assert_eq!(endpoint.port, 9090);
}

#[test]
fn test_failed_invocation_moves_on_to_next_constructor() {
  // Arrange
  struct Flaky {
    via: &'static str,
  }
  impl Service for Flaky {
    fn describe(ty: &mut Describe<Self>) {
      ty.constructor(
        Constructor::new(|_| Err(InvokeError::failed("connection refused")))
          .param_or::<u32>("retries", 3),
      )
      .constructor(Constructor::new(|_| Ok(Flaky { via: "fallback" })));
    }
  }
  let kernel = Kernel::new();

  // Act
  let flaky = kernel.resolve::<Flaky>().unwrap();

  // Assert
  assert_eq!(flaky.via, "fallback");
}

#[test]
fn test_argument_shape_mismatch_rejects_candidate() {
  // Arrange: the invoke closure reads a different type than it declared.
  struct Confused;
  impl Service for Confused {
    fn describe(ty: &mut Describe<Self>) {
      ty.constructor(
        Constructor::new(|args| {
          args.next::<String>()?;
          Ok(Confused)
        })
        .param_or::<u32>("count", 1),
      );
    }
  }
  let kernel = Kernel::new();

  // Act
  let result = kernel.resolve::<Confused>();

  // Assert
  match result {
    Err(ResolveError::NoValidConstructor { attempts, .. }) => {
      assert_eq!(attempts.len(), 1);
      assert!(attempts[0].reason.starts_with("invocation failed"));
    }
    other => panic!("unexpected result: {:?}", other.map(|_| ())),
  }
}

#[test]
fn test_all_constructors_failing_reports_every_attempt() {
  // Arrange
  struct Greeter {
    _name: String,
  }
  impl Service for Greeter {
    fn describe(ty: &mut Describe<Self>) {
      ty.constructor(
        Constructor::new(|args| {
          Ok(Greeter {
            _name: args.value::<String>()?,
          })
        })
        .param::<String>("name"),
      );
    }
  }
  let kernel = Kernel::new();

  // Act
  let error = kernel.resolve::<Greeter>().err().unwrap();

  // Assert
  let string = std::any::type_name::<String>();
  assert_eq!(
    error,
    ResolveError::NoValidConstructor {
      type_name: std::any::type_name::<Greeter>(),
      attempts: vec![RejectedConstructor {
        signature: format!("(name: {string})"),
        reason: format!(
          "parameter `name` could not be resolved: No matching binding found for `{string}`."
        ),
      }],
    }
  );
  assert!(error.to_string().starts_with("No valid constructor"));
}

#[test]
fn test_missing_nested_dependency_fails_the_outer_type() {
  // Arrange: nothing is bound to `dyn Vehicle`.
  let kernel = Kernel::new();

  // Act
  let result = kernel.resolve::<NamedPerson>();

  // Assert
  assert!(matches!(
    result,
    Err(ResolveError::NoValidConstructor { attempts, .. }) if attempts.len() == 2
  ));
}

// --- Cycles ---

struct Chicken {
  _egg: Arc<Egg>,
}
struct Egg {
  _chicken: Arc<Chicken>,
}
impl Service for Chicken {
  fn describe(ty: &mut Describe<Self>) {
    ty.constructor(
      Constructor::new(|args| {
        Ok(Chicken {
          _egg: args.next::<Egg>()?,
        })
      })
      .param::<Egg>("egg"),
    );
  }
}
impl Service for Egg {
  fn describe(ty: &mut Describe<Self>) {
    ty.constructor(
      Constructor::new(|args| {
        Ok(Egg {
          _chicken: args.next::<Chicken>()?,
        })
      })
      .param::<Chicken>("chicken"),
    );
  }
}

#[test]
fn test_circular_dependency_is_reported() {
  let kernel = Kernel::new();
  assert_eq!(
    kernel.resolve::<Chicken>().err(),
    Some(ResolveError::CircularDependency(
      std::any::type_name::<Chicken>()
    ))
  );
}

#[test]
fn test_circular_dependency_through_singleton_does_not_deadlock() {
  let kernel = Kernel::new();
  kernel
    .bind::<Chicken>()
    .to_self()
    .unwrap()
    .in_singleton_scope();
  assert!(matches!(
    kernel.resolve::<Egg>(),
    Err(ResolveError::CircularDependency(_))
  ));
}
