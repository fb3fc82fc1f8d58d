//! Property descriptors and the `required` / `conflict` markers.

use serde::{Deserialize, Serialize};

use crate::value::{ClassId, Method, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Attributes
// ─────────────────────────────────────────────────────────────────────────────

/// Descriptor flags of a property.
///
/// Plain assignment produces a writable, enumerable, configurable property
/// ([`Attributes::DATA`], the default). Bookkeeping members such as the root
/// constructor use [`Attributes::HIDDEN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    /// Whether assignments through an instance may replace the value.
    pub writable: bool,
    /// Whether the property is visited by enumeration (and therefore merged).
    pub enumerable: bool,
    /// Whether the descriptor may be redefined.
    pub configurable: bool,
}

impl Attributes {
    /// Writable, enumerable and configurable.
    pub const DATA: Attributes = Attributes {
        writable: true,
        enumerable: true,
        configurable: true,
    };

    /// Read-only, non-enumerable, non-configurable.
    pub const HIDDEN: Attributes = Attributes {
        writable: false,
        enumerable: false,
        configurable: false,
    };

    /// Returns a copy with `writable` set.
    #[must_use]
    pub const fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Returns a copy with `enumerable` set.
    #[must_use]
    pub const fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    /// Returns a copy with `configurable` set.
    #[must_use]
    pub const fn with_configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::DATA
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ConflictInfo
// ─────────────────────────────────────────────────────────────────────────────

/// Which fragments disagreed about a conflicted property.
///
/// Contributors are kept sorted and de-duplicated so that the marker produced
/// by a merge does not depend on fragment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictInfo {
    contributors: Vec<String>,
}

impl ConflictInfo {
    /// Creates conflict info from the contributing fragment labels.
    pub fn new<I, S>(contributors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut contributors: Vec<String> = contributors.into_iter().map(Into::into).collect();
        contributors.sort();
        contributors.dedup();
        Self { contributors }
    }

    /// Returns the labels of the fragments that supplied a concrete value.
    #[must_use]
    pub fn contributors(&self) -> &[String] {
        &self.contributors
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Slot
// ─────────────────────────────────────────────────────────────────────────────

/// What a property holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// A plain value (including methods).
    Value(Value),
    /// Getter and/or setter pair.
    Accessor {
        /// Invoked on read.
        get: Option<Method>,
        /// Invoked on assignment with the assigned value.
        set: Option<Method>,
    },
    /// Placeholder that another fragment or a subclass must implement.
    Required,
    /// Two merged fragments supplied different definitions.
    Conflict(ConflictInfo),
}

// ─────────────────────────────────────────────────────────────────────────────
// Property
// ─────────────────────────────────────────────────────────────────────────────

/// A full property descriptor: slot plus attributes.
///
/// Merge equality compares the whole descriptor, so the same method exposed
/// once as enumerable and once as hidden is a conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    slot: Slot,
    attributes: Attributes,
}

impl Property {
    /// Creates a plain data property.
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            slot: Slot::Value(value.into()),
            attributes: Attributes::DATA,
        }
    }

    /// Creates a method property from a closure.
    pub fn method<F>(name: &str, func: F) -> Self
    where
        F: Fn(&mut crate::dispatch::Context<'_>, &[Value]) -> Result<Value, crate::error::ClassError>
            + Send
            + Sync
            + 'static,
    {
        Self::value(Method::new(name, func))
    }

    /// Creates an accessor property.
    #[must_use]
    pub fn accessor(get: Option<Method>, set: Option<Method>) -> Self {
        Self {
            slot: Slot::Accessor { get, set },
            attributes: Attributes::DATA,
        }
    }

    /// Creates a `required` placeholder.
    #[must_use]
    pub fn required() -> Self {
        Self {
            slot: Slot::Required,
            attributes: Attributes::DATA,
        }
    }

    /// Creates a `conflict` marker.
    #[must_use]
    pub fn conflict(info: ConflictInfo) -> Self {
        Self {
            slot: Slot::Conflict(info),
            attributes: Attributes::DATA,
        }
    }

    /// Creates a hidden (read-only, non-enumerable) data property.
    pub fn hidden(value: impl Into<Value>) -> Self {
        Self::value(value).with_attributes(Attributes::HIDDEN)
    }

    /// Replaces the descriptor flags.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Returns the slot.
    #[must_use]
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// Returns the descriptor flags.
    #[must_use]
    pub fn attributes(&self) -> Attributes {
        self.attributes
    }

    /// Returns the plain value, if this is a data property.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true for the `required` placeholder.
    #[must_use]
    pub fn is_required(&self) -> bool {
        matches!(self.slot, Slot::Required)
    }

    /// Returns true for the `conflict` marker.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self.slot, Slot::Conflict(_))
    }

    /// Returns true if both descriptors define the member the same way.
    ///
    /// Compares the whole descriptor; numbers use [`Value::same_value`].
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.attributes == other.attributes
            && match (&self.slot, &other.slot) {
                (Slot::Value(a), Slot::Value(b)) => a.same_value(b),
                (a, b) => a == b,
            }
    }

    /// Returns true if enumeration visits this property.
    #[must_use]
    pub fn is_enumerable(&self) -> bool {
        self.attributes.enumerable
    }

    /// Returns true if this property may stand where a function is expected.
    ///
    /// Both markers count: invoking them fails at call time, not at
    /// definition time.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        match &self.slot {
            Slot::Value(value) => value.is_callable(),
            Slot::Required | Slot::Conflict(_) => true,
            Slot::Accessor { .. } => false,
        }
    }
}

/// Returns a fresh `required` placeholder property.
#[must_use]
pub fn required() -> Property {
    Property::required()
}

/// Returns a fresh `conflict` marker with no recorded contributors.
#[must_use]
pub fn conflict() -> Property {
    Property::conflict(ConflictInfo::default())
}

macro_rules! impl_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Property {
                fn from(value: $ty) -> Self {
                    Property::value(value)
                }
            }
        )*
    };
}

impl_from_value!(
    Value,
    Method,
    &str,
    String,
    bool,
    f64,
    i32,
    u32,
    ClassId,
    crate::set::PropertySet,
    std::sync::Arc<crate::set::PropertySet>,
);
