//! Class and trait composition with deterministic conflict resolution.
//!

pub use barman_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use barman_internal::prelude::*;
}
