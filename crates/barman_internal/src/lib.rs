//! # Barman Internal Library
//!
//! Re-exports the core Barman crates for convenience.

/// Layer 1: Property sets, merging and member dispatch.
pub use barman_object;

/// Layer 2: Classes, class factories and entry points.
pub use barman_class;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use barman_class::prelude::*;
}
