//! The mix engine: builds a future prototype by layering a cloned parent,
//! merged traits and the class body.
//!
//! Precedence, highest first: class body, merged traits, inherited
//! parent members. The overlay is a blunt overwrite, so a class body that
//! defines a conflicted member resolves the conflict.

use std::sync::Arc;

use crate::error::ClassError;
use crate::flatten::Fragment;
use crate::merge::{assert_no_conflict, merge};
use crate::set::{PropertySet, shallow_clone};

/// Layers `parent`, `traits` and `own` without validating the result.
///
/// Conflict markers from the traits survive unless `own` overrides them;
/// invoking such a member later fails at call time.
#[must_use]
pub fn compose(parent: Option<&Arc<PropertySet>>, traits: &[Fragment], own: &PropertySet) -> PropertySet {
    let mut base = shallow_clone(parent).unwrap_or_default();
    let traits = merge(traits);
    base.extend_from([Some(&traits), Some(own)]);
    base
}

/// Layers `parent`, `traits` and `own`, failing if a conflict survives.
///
/// # Errors
///
/// Returns [`ClassError::UnresolvedConflicts`] if two traits disagree on a
/// member that `own` does not override.
///
/// # Example
///
/// ```
/// use barman_object::mix::mix;
/// use barman_object::{Fragment, property_set};
///
/// let loud = Fragment::from(property_set! { "volume" => 11 });
/// let quiet = Fragment::from(property_set! { "volume" => 1 });
///
/// assert!(mix(None, &[loud.clone(), quiet.clone()], &property_set! {}).is_err());
///
/// let resolved = mix(None, &[loud, quiet], &property_set! { "volume" => 5 }).unwrap();
/// assert_eq!(resolved.get_own("volume").unwrap().as_value().unwrap().as_number(), Some(5.0));
/// ```
pub fn mix(
    parent: Option<&Arc<PropertySet>>,
    traits: &[Fragment],
    own: &PropertySet,
) -> Result<PropertySet, ClassError> {
    let result = compose(parent, traits, own);
    assert_no_conflict(&result)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{Property, required};
    use crate::property_set;

    #[test]
    fn result_inherits_from_parent_without_owning_its_members() {
        let parent = Arc::new(property_set! { "a" => 1 });
        let result = mix(Some(&parent), &[], &property_set! { "b" => 2 }).unwrap();

        assert!(!result.has_own("a"));
        assert_eq!(result.lookup("a"), Some(&Property::value(1)));
        assert!(Arc::ptr_eq(result.inherits().unwrap(), &parent));
    }

    #[test]
    fn traits_override_parent_and_own_overrides_traits() {
        let parent = Arc::new(property_set! { "a" => "parent", "b" => "parent" });
        let traits = [Fragment::from(property_set! { "a" => "trait", "b" => "trait" })];
        let result = mix(Some(&parent), &traits, &property_set! { "b" => "own" }).unwrap();

        assert_eq!(result.lookup("a"), Some(&Property::value("trait")));
        assert_eq!(result.lookup("b"), Some(&Property::value("own")));
    }

    #[test]
    fn compose_keeps_conflict_markers() {
        let traits = [
            Fragment::from(property_set! { "x" => 1 }),
            Fragment::from(property_set! { "x" => 2 }),
        ];
        let composed = compose(None, &traits, &PropertySet::new());
        assert!(composed.get_own("x").unwrap().is_conflict());
    }

    #[test]
    fn own_required_placeholder_still_wins_over_trait() {
        let traits = [Fragment::from(property_set! { "run" => "trait" })];
        let result = mix(None, &traits, &property_set! { "run" => required() }).unwrap();
        assert!(result.get_own("run").unwrap().is_required());
    }
}
