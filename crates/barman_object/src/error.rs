//! Error types for composition and dispatch.

use thiserror::Error;

use crate::value::ClassId;

/// Broad category of a [`ClassError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid class definition; fatal, raised while creating the class.
    Configuration,
    /// Two merged fragments disagree and nothing overrode the property.
    Conflict,
    /// A `required` placeholder was never implemented.
    Required,
    /// A member or class does not exist.
    Reference,
    /// A member exists but has the wrong shape for the operation.
    Type,
    /// Raised by user code inside a method body.
    Application,
}

/// Errors raised while composing classes or dispatching members.
///
/// Nothing is recovered internally: every error propagates to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassError {
    /// The class body defines `constructor` as something other than a function.
    #[error("The constructor property must be a function")]
    ConstructorNotCallable,

    /// One or more conflict markers survived composition.
    #[error(
        "There is a merge conflict for the following properties: {}",
        .properties.join(",")
    )]
    UnresolvedConflicts {
        /// Conflicted member names, sorted ascending.
        properties: Vec<String>,
    },

    /// A conflicted member was invoked.
    #[error(
        "This property was defined by multiple merged objects, override it with the proper implementation: {property}"
    )]
    MergeConflict {
        /// The conflicted member.
        property: String,
        /// Labels of the fragments that defined it.
        contributors: Vec<String>,
    },

    /// A `required` placeholder was invoked.
    #[error("An implementation is required")]
    RequiredImplementation,

    /// Lookup of a member that does not exist.
    #[error("The property {name} is not defined")]
    PropertyNotDefined {
        /// The missing member.
        name: String,
    },

    /// A data member was invoked as a method.
    #[error("The property {name} is not a function")]
    NotCallable {
        /// The member.
        name: String,
    },

    /// A mixin argument was neither an object nor absent.
    #[error("A mixin must be an object, found {found}")]
    InvalidMixin {
        /// Type name of the rejected value.
        found: &'static str,
    },

    /// Assignment to a read-only member.
    #[error("The property {name} is read-only")]
    ReadOnly {
        /// The member.
        name: String,
    },

    /// A class ID that the registry does not know.
    #[error("Unknown class: {0}")]
    UnknownClass(ClassId),

    /// Error raised by a method body.
    #[error("{0}")]
    Thrown(String),
}

impl ClassError {
    /// Creates an [`UnresolvedConflicts`](Self::UnresolvedConflicts), sorting the names.
    pub fn unresolved_conflicts<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut properties: Vec<String> = properties.into_iter().map(Into::into).collect();
        properties.sort();
        Self::UnresolvedConflicts { properties }
    }

    /// Creates a [`MergeConflict`](Self::MergeConflict).
    pub fn merge_conflict(property: impl Into<String>, contributors: &[String]) -> Self {
        Self::MergeConflict {
            property: property.into(),
            contributors: contributors.to_vec(),
        }
    }

    /// Creates a [`PropertyNotDefined`](Self::PropertyNotDefined).
    pub fn property_not_defined(name: impl Into<String>) -> Self {
        Self::PropertyNotDefined { name: name.into() }
    }

    /// Creates a [`NotCallable`](Self::NotCallable).
    pub fn not_callable(name: impl Into<String>) -> Self {
        Self::NotCallable { name: name.into() }
    }

    /// Creates an [`InvalidMixin`](Self::InvalidMixin).
    #[must_use]
    pub fn invalid_mixin(found: &'static str) -> Self {
        Self::InvalidMixin { found }
    }

    /// Creates a [`ReadOnly`](Self::ReadOnly).
    pub fn read_only(name: impl Into<String>) -> Self {
        Self::ReadOnly { name: name.into() }
    }

    /// Creates a [`Thrown`](Self::Thrown) error from a method body.
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown(message.into())
    }

    /// Returns the error's category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConstructorNotCallable => ErrorKind::Configuration,
            Self::UnresolvedConflicts { .. } | Self::MergeConflict { .. } => ErrorKind::Conflict,
            Self::RequiredImplementation => ErrorKind::Required,
            Self::PropertyNotDefined { .. } | Self::UnknownClass(_) => ErrorKind::Reference,
            Self::NotCallable { .. } | Self::InvalidMixin { .. } | Self::ReadOnly { .. } => {
                ErrorKind::Type
            }
            Self::Thrown(_) => ErrorKind::Application,
        }
    }
}
