//! Property sets and the reflection helpers built on them.
//!
//! A [`PropertySet`] is an insertion-ordered map of named [`Property`]
//! descriptors with an optional inherited link. The inherited link is what
//! [`shallow_clone`] produces: a new, empty set whose lookups fall through to
//! its parent. Enumeration ([`PropertySet::iter_own_or_inherited`]) walks own
//! keys first and then the inherited chain, skipping shadowed names.

use std::sync::Arc;

use hashbrown::HashSet;
use indexmap::IndexMap;

use crate::property::Property;

/// Member names that must be visited when a set owns them, whether or not
/// they are flagged enumerable.
pub const BUILTIN_MEMBERS: [&str; 7] = [
    "constructor",
    "hasOwnProperty",
    "isPrototypeOf",
    "propertyIsEnumerable",
    "toLocaleString",
    "toString",
    "valueOf",
];

fn is_builtin_member(key: &str) -> bool {
    BUILTIN_MEMBERS.contains(&key)
}

// ─────────────────────────────────────────────────────────────────────────────
// PropertySet
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered mapping from member name to property descriptor.
///
/// # Example
///
/// ```
/// use barman_object::property_set;
/// use barman_object::set::PropertySet;
///
/// let base = std::sync::Arc::new(property_set! { "a" => 1, "b" => 2 });
/// let mut child = PropertySet::inheriting(base);
/// child.insert("b", 3);
///
/// let keys: Vec<&str> = child.iter_own_or_inherited().map(|(key, _)| key).collect();
/// assert_eq!(keys, ["b", "a"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    label: Option<Arc<str>>,
    own: IndexMap<String, Property>,
    inherits: Option<Arc<PropertySet>>,
}

impl PropertySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty, labelled set.
    ///
    /// The label names the set in conflict diagnostics when it is merged as a
    /// trait.
    #[must_use]
    pub fn named(label: impl Into<Arc<str>>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Creates an empty set whose lookups fall through to `parent`.
    #[must_use]
    pub fn inheriting(parent: Arc<PropertySet>) -> Self {
        Self {
            inherits: Some(parent),
            ..Self::default()
        }
    }

    /// Sets the label, builder style.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the inherited set, if any.
    #[must_use]
    pub fn inherits(&self) -> Option<&Arc<PropertySet>> {
        self.inherits.as_ref()
    }

    /// Inserts or replaces an own property, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, property: impl Into<Property>) -> Option<Property> {
        self.own.insert(key.into(), property.into())
    }

    /// Inserts a property, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, property: impl Into<Property>) -> Self {
        self.insert(key, property);
        self
    }

    /// Removes an own property, preserving the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<Property> {
        self.own.shift_remove(key)
    }

    /// Returns an own property.
    #[must_use]
    pub fn get_own(&self, key: &str) -> Option<&Property> {
        self.own.get(key)
    }

    /// Looks a property up through the inherited chain.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&Property> {
        let mut current = Some(self);
        while let Some(set) = current {
            if let Some(property) = set.own.get(key) {
                return Some(property);
            }
            current = set.inherits.as_deref();
        }
        None
    }

    /// Returns true if the set owns `key` directly.
    #[must_use]
    pub fn has_own(&self, key: &str) -> bool {
        self.own.contains_key(key)
    }

    /// Returns the number of own properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.own.len()
    }

    /// Returns true if the set has no own properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.own.is_empty()
    }

    /// Iterates own properties in insertion order, enumerable or not.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.own.iter().map(|(key, property)| (key.as_str(), property))
    }

    /// Iterates every enumerable key reachable through the inherited chain.
    #[must_use]
    pub fn iter_own_or_inherited(&self) -> OwnOrInherited<'_> {
        OwnOrInherited {
            level: Some(self),
            depth: 0,
            entries: self.own.iter(),
            seen: HashSet::new(),
        }
    }

    /// Calls `f(property, key, self)` once per enumerable own or inherited key.
    pub fn each_own_or_inherited<F>(&self, mut f: F)
    where
        F: FnMut(&Property, &str, &PropertySet),
    {
        for (key, property) in self.iter_own_or_inherited() {
            f(property, key, self);
        }
    }

    /// Copies every enumerable key of each present source onto this set.
    ///
    /// Later sources overwrite earlier ones and always overwrite what the set
    /// already owns. No `required`/`conflict` resolution happens here; this is
    /// a blunt overwrite.
    pub fn extend_from<'a, I>(&mut self, sources: I) -> &mut Self
    where
        I: IntoIterator<Item = Option<&'a PropertySet>>,
    {
        for source in sources.into_iter().flatten() {
            for (key, property) in source.iter_own_or_inherited() {
                self.own.insert(key.to_string(), property.clone());
            }
        }
        self
    }

    /// Serializes the enumerable data members to JSON.
    ///
    /// Methods, accessors and markers are skipped. The inherited link itself
    /// is never serialized, only the members it makes visible.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (key, property) in self.iter_own_or_inherited() {
            if let Some(json) = property.as_value().and_then(crate::value::Value::to_json) {
                map.insert(key.to_string(), json);
            }
        }
        serde_json::Value::Object(map)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OwnOrInherited
// ─────────────────────────────────────────────────────────────────────────────

/// Iterator returned by [`PropertySet::iter_own_or_inherited`].
#[derive(Debug)]
pub struct OwnOrInherited<'a> {
    level: Option<&'a PropertySet>,
    depth: usize,
    entries: indexmap::map::Iter<'a, String, Property>,
    seen: HashSet<&'a str>,
}

impl<'a> Iterator for OwnOrInherited<'a> {
    type Item = (&'a str, &'a Property);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.level?;
            match self.entries.next() {
                Some((key, property)) => {
                    // Shadowing applies even to keys that are not visited.
                    if !self.seen.insert(key.as_str()) {
                        continue;
                    }
                    let visible =
                        property.is_enumerable() || (self.depth == 0 && is_builtin_member(key));
                    if visible {
                        return Some((key.as_str(), property));
                    }
                }
                None => {
                    self.level = level.inherits.as_deref();
                    self.depth += 1;
                    if let Some(next) = self.level {
                        self.entries = next.own.iter();
                    }
                }
            }
        }
    }
}

impl core::iter::FusedIterator for OwnOrInherited<'_> {}

// ─────────────────────────────────────────────────────────────────────────────
// Free helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Returns true iff `obj` is present and owns `key` directly.
#[must_use]
pub fn has(obj: Option<&PropertySet>, key: &str) -> bool {
    obj.is_some_and(|set| set.has_own(key))
}

/// Creates an empty set inheriting from `parent`.
///
/// Absence propagates: `None` in, `None` out.
#[must_use]
pub fn shallow_clone(parent: Option<&Arc<PropertySet>>) -> Option<PropertySet> {
    parent.map(|parent| PropertySet::inheriting(Arc::clone(parent)))
}

/// Copies each present source onto `target`. See [`PropertySet::extend_from`].
pub fn extend<'t, 'a, I>(target: &'t mut PropertySet, sources: I) -> &'t mut PropertySet
where
    I: IntoIterator<Item = Option<&'a PropertySet>>,
{
    target.extend_from(sources)
}

/// Builds a [`PropertySet`] from `key => value` pairs.
///
/// Values may be anything convertible into a [`Property`].
///
/// ```
/// use barman_object::property_set;
///
/// let set = property_set! { "version" => "1.0", "count" => 2 };
/// assert_eq!(set.len(), 2);
/// ```
#[macro_export]
macro_rules! property_set {
    () => {
        $crate::set::PropertySet::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut set = $crate::set::PropertySet::new();
        $( set.insert($key, $value); )+
        set
    }};
}
