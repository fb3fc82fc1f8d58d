//! Nestable merge inputs.
//!
//! Traits may be grouped into arbitrarily nested lists. [`flatten`] unnests
//! them lazily, depth-first and left-to-right, so merging never recurses into
//! nested groups itself.

use crate::error::ClassError;
use crate::set::PropertySet;
use crate::value::Value;

/// A merge input: a single set, a nested group of inputs, or nothing.
#[derive(Debug, Clone, Default)]
pub enum Fragment {
    /// Stands for a missing argument; contributes nothing.
    #[default]
    Absent,
    /// One property set.
    Set(PropertySet),
    /// An ordered group of fragments.
    Nested(Vec<Fragment>),
}

impl Fragment {
    /// Groups fragments.
    pub fn nested<I, F>(fragments: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        Fragment::Nested(fragments.into_iter().map(Into::into).collect())
    }
}

impl From<PropertySet> for Fragment {
    fn from(set: PropertySet) -> Self {
        Fragment::Set(set)
    }
}

impl From<&PropertySet> for Fragment {
    fn from(set: &PropertySet) -> Self {
        Fragment::Set(set.clone())
    }
}

impl From<Option<PropertySet>> for Fragment {
    fn from(set: Option<PropertySet>) -> Self {
        set.map_or(Fragment::Absent, Fragment::Set)
    }
}

impl From<Vec<Fragment>> for Fragment {
    fn from(fragments: Vec<Fragment>) -> Self {
        Fragment::Nested(fragments)
    }
}

impl From<Vec<PropertySet>> for Fragment {
    fn from(sets: Vec<PropertySet>) -> Self {
        Fragment::nested(sets)
    }
}

impl TryFrom<Value> for Fragment {
    type Error = ClassError;

    /// Accepts objects and absent values; anything else is not a mixin.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(set) => Ok(Fragment::Set(PropertySet::clone(&set))),
            Value::Undefined | Value::Null => Ok(Fragment::Absent),
            other => Err(ClassError::invalid_mixin(other.type_name())),
        }
    }
}

/// Single-pass iterator over the leaf sets of nested fragments.
#[derive(Debug)]
pub struct Flatten<'a> {
    stack: Vec<core::slice::Iter<'a, Fragment>>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = &'a PropertySet;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.stack.last_mut()?.next();
            match next {
                Some(Fragment::Set(set)) => return Some(set),
                Some(Fragment::Nested(children)) => self.stack.push(children.iter()),
                Some(Fragment::Absent) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl core::iter::FusedIterator for Flatten<'_> {}

/// Lazily unnests `fragments` depth-first, left-to-right, skipping absent ones.
#[must_use]
pub fn flatten(fragments: &[Fragment]) -> Flatten<'_> {
    Flatten {
        stack: vec![fragments.iter()],
    }
}
