//! Property sets, trait merging and member dispatch for Barman (Layer 1).
//!
//! `barman_object` provides the object-level primitives the class layer is
//! built from:
//!
//! - [`value`] - Dynamic values and identity-compared methods
//! - [`property`] - Property descriptors and the `required` / `conflict` markers
//! - [`set`] - Property sets and reflection helpers
//! - [`flatten`] - Nestable merge inputs
//! - [`merge`] - Conflict-aware merging of property sets
//! - [`mix`] - Layering parent, traits and class body into a prototype
//! - [`dispatch`] - Instances, invocation contexts and super delegation
//! - [`error`] - Error taxonomy
//!
//! # Architecture
//!
//! - **Layer 1** (`barman_object`): object model and composition algebra (this crate)
//! - **Layer 2** (`barman_class`): class arena, class factories, entry points
//!
//! # Example
//!
//! ```
//! use barman_object::merge::{assert_no_conflict, merge};
//! use barman_object::property::required;
//! use barman_object::{Fragment, property_set};
//!
//! let sized = property_set! { "area" => required(), "unit" => "cm" };
//! let square = property_set! { "area" => 4, "unit" => "cm" };
//!
//! let shape = merge(&[Fragment::from(sized), Fragment::from(square)]);
//! assert!(assert_no_conflict(&shape).is_ok());
//! ```

/// Member dispatch and super delegation.
pub mod dispatch;

/// Error types.
pub mod error;

/// Nestable merge inputs.
pub mod flatten;

/// The merge engine.
pub mod merge;

/// The mix engine.
pub mod mix;

/// Property descriptors.
pub mod property;

/// Property sets and reflection helpers.
pub mod set;

/// Dynamic values.
pub mod value;

pub use dispatch::{BoundMethod, ClassResolver, Context, Instance, Receiver, SuperMember};
pub use error::{ClassError, ErrorKind};
pub use flatten::{Flatten, Fragment, flatten};
pub use merge::{assert_no_conflict, merge, merge_sets};
pub use mix::{compose, mix};
pub use property::{Attributes, ConflictInfo, Property, Slot, conflict, required};
pub use set::{PropertySet, extend, has, shallow_clone};
pub use value::{ClassId, Method, Value};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::dispatch::*;
    pub use crate::error::*;
    pub use crate::flatten::*;
    pub use crate::merge::*;
    pub use crate::mix::*;
    pub use crate::property::*;
    pub use crate::set::*;
    pub use crate::value::*;
    pub use crate::property_set;
}
