//! Classes, class factories and composition entry points for Barman (Layer 2).
//!
//! This crate turns the object-level algebra of [`barman_object`] into a
//! class system:
//!
//! - [`registry`] - The class arena and the root `Nil` class
//! - [`factory`] - Default, abstract, trait-composing and custom class factories
//! - [`spec`] - The [`ClassSpec`] builder
//! - [`convenience`] - `create` / `extend` / `include` entry points and [`ClassExt`]
//!
//! # Example
//!
//! ```
//! use barman_class::prelude::*;
//!
//! let mut registry = ClassRegistry::new();
//!
//! let base = create(
//!     &mut registry,
//!     ClassSpec::new().with_method("greet", Method::new("greet", |_ctx, _args| Ok(Value::from("hi")))),
//! )
//! .unwrap();
//!
//! let child = base
//!     .extend(
//!         &mut registry,
//!         ClassSpec::new().with_method(
//!             "greet",
//!             Method::new("greet", |ctx, args| {
//!                 let parent = ctx.call_super("greet", args)?;
//!                 Ok(Value::from(format!("{parent}, hello")))
//!             }),
//!         ),
//!     )
//!     .unwrap();
//!
//! let mut instance = child.instantiate(&registry, &[]).unwrap();
//! let greeting = instance.context(&registry).call("greet", &[]).unwrap();
//! assert_eq!(greeting, Value::from("hi, hello"));
//! ```

/// Entry points.
pub mod convenience;

/// Class factories.
pub mod factory;

/// The class arena.
pub mod registry;

/// Class specifications.
pub mod spec;

pub use convenience::{ClassExt, create, extend, include, include_values, subclass_of, with_traits};
pub use factory::{
    AbstractClassFactory, ClassFactory, ConflictPolicy, CreateClass, CreateClassFn, DefaultClassFactory,
    FactoryConfig, TraitsClassFactory,
};
pub use registry::{Ancestors, ClassDescriptor, ClassRegistry, NIL_NAME};
pub use spec::ClassSpec;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use barman_object::prelude::*;

    pub use crate::convenience::{
        ClassExt, create, extend, include, include_values, subclass_of, with_traits,
    };
    pub use crate::factory::{
        AbstractClassFactory, ClassFactory, ConflictPolicy, CreateClass, DefaultClassFactory,
        FactoryConfig, TraitsClassFactory,
    };
    pub use crate::registry::{ClassDescriptor, ClassRegistry};
    pub use crate::spec::ClassSpec;
}
