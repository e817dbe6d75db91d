use fibre_kernel::{resolve, Arg, Constructor, Describe, Kernel, Service};
use std::fmt;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

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

struct Person {
  vehicle: Arc<dyn Vehicle>,
}
impl Service for Person {
  fn describe(ty: &mut Describe<Self>) {
    ty.constructor(
      Constructor::new(|args| {
        Ok(Person {
          vehicle: args.next::<dyn Vehicle>()?,
        })
      })
      .param::<dyn Vehicle>("vehicle"),
    );
  }
}
impl fmt::Display for Person {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "The person is driving a {}.", self.vehicle.name())
  }
}

struct SuperCoolPerson {
  vehicle: Arc<dyn Vehicle>,
}
impl Service for SuperCoolPerson {
  fn describe(ty: &mut Describe<Self>) {
    ty.constructor(
      Constructor::new(|args| {
        Ok(SuperCoolPerson {
          vehicle: args.next::<dyn Vehicle>()?,
        })
      })
      .param::<dyn Vehicle>("vehicle"),
    )
    .extends::<Person>();
  }
}
impl fmt::Display for SuperCoolPerson {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "The super cool person is driving a {}.", self.vehicle.name())
  }
}

// The one-argument constructor shows that the larger one is picked whenever a
// name is available.
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
    )
    .extends::<Person>();
  }
}
impl fmt::Display for NamedPerson {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = self.name.as_deref().unwrap_or("Somebody");
    write!(f, "{} is driving a {}.", name, self.vehicle.name())
  }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  // Set RUST_LOG=fibre_kernel=trace to watch bindings being matched.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let kernel = Kernel::new();

  kernel.bind::<dyn Vehicle>().to::<Car>()?;
  // Obviously super cool people drive motorcycles.
  kernel
    .bind::<dyn Vehicle>()
    .to::<Motorcycle>()?
    .in_transient_scope()
    .when_injected_into::<SuperCoolPerson>();

  let person = kernel.resolve::<Person>()?;
  let super_cool_person = kernel.resolve::<SuperCoolPerson>()?;
  let named_person = kernel.resolve_with::<NamedPerson>(&[Arg::new("Bob".to_string())])?;
  let anonymous_person = resolve!(kernel, NamedPerson);

  println!("{person}");
  println!("{super_cool_person}");
  println!("{named_person}");
  println!("{anonymous_person}");

  kernel.dispose();
  Ok(())
}
