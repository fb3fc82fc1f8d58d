//! The merge engine.
//!
//! [`merge`] combines any number of property sets into a fresh one, resolving
//! each member name independently:
//!
//! | accumulated | incoming | result |
//! |-------------|----------|--------|
//! | unset | `V` | `V` |
//! | `A` | `A` (same descriptor) | `A` |
//! | `required` | `V` | `V` |
//! | `A` | `required` | `A` |
//! | `A` | `V != A` | `conflict` |
//!
//! The fold is a join over `unset < required < concrete < conflict`, which
//! makes the outcome independent of fragment order: once two different
//! concrete definitions have been seen the member is a conflict, no matter
//! where a `required` placeholder sat in the sequence.

use indexmap::IndexMap;

use crate::error::ClassError;
use crate::flatten::{Fragment, flatten};
use crate::property::{ConflictInfo, Property, Slot};
use crate::set::PropertySet;

/// Per-member state of the fold.
enum Accumulator {
    Required(Property),
    Concrete {
        property: Property,
        contributors: Vec<String>,
    },
    Conflict {
        contributors: Vec<String>,
    },
}

impl Accumulator {
    fn join(current: Option<Accumulator>, candidate: &Property, label: &str) -> Accumulator {
        match candidate.slot() {
            Slot::Required => {
                current.unwrap_or_else(|| Accumulator::Required(candidate.clone()))
            }
            Slot::Conflict(info) => {
                let mut contributors = match current {
                    Some(
                        Accumulator::Concrete { contributors, .. }
                        | Accumulator::Conflict { contributors },
                    ) => contributors,
                    Some(Accumulator::Required(_)) | None => Vec::new(),
                };
                contributors.extend(info.contributors().iter().cloned());
                Accumulator::Conflict { contributors }
            }
            Slot::Value(_) | Slot::Accessor { .. } => match current {
                None | Some(Accumulator::Required(_)) => Accumulator::Concrete {
                    property: candidate.clone(),
                    contributors: vec![label.to_string()],
                },
                Some(Accumulator::Concrete {
                    property,
                    mut contributors,
                }) => {
                    contributors.push(label.to_string());
                    if property.same_definition(candidate) {
                        Accumulator::Concrete {
                            property,
                            contributors,
                        }
                    } else {
                        Accumulator::Conflict { contributors }
                    }
                }
                Some(Accumulator::Conflict { mut contributors }) => {
                    contributors.push(label.to_string());
                    Accumulator::Conflict { contributors }
                }
            },
        }
    }

    fn finish(self, name: &str) -> Property {
        match self {
            Accumulator::Required(property) | Accumulator::Concrete { property, .. } => property,
            Accumulator::Conflict { contributors } => {
                let info = ConflictInfo::new(contributors);
                tracing::trace!(
                    property = name,
                    contributors = ?info.contributors(),
                    "merge produced a conflict marker"
                );
                Property::conflict(info)
            }
        }
    }
}

/// Merges nested fragments into a new property set.
///
/// Inputs are never mutated. Inherited enumerable members of each input are
/// merged too and become own members of the result. Merging nothing yields
/// an empty set; absent fragments count as empty.
///
/// # Example
///
/// ```
/// use barman_object::merge::merge;
/// use barman_object::property::required;
/// use barman_object::{Fragment, property_set};
///
/// let a = property_set! { "run" => required(), "name" => "a" };
/// let b = property_set! { "run" => "fast", "name" => "b" };
///
/// let merged = merge(&[Fragment::from(a), Fragment::from(b)]);
/// assert!(merged.get_own("name").unwrap().is_conflict());
/// assert_eq!(merged.get_own("run").unwrap().as_value().unwrap().as_str(), Some("fast"));
/// ```
#[must_use]
pub fn merge(fragments: &[Fragment]) -> PropertySet {
    merge_sets(flatten(fragments))
}

/// Merges already flattened property sets. See [`merge`].
pub fn merge_sets<'a, I>(sets: I) -> PropertySet
where
    I: IntoIterator<Item = &'a PropertySet>,
{
    let mut state: IndexMap<String, Option<Accumulator>> = IndexMap::new();
    let mut fragment_count = 0usize;

    for (index, set) in sets.into_iter().enumerate() {
        fragment_count += 1;
        let fallback;
        let label = match set.label() {
            Some(label) => label,
            None => {
                fallback = format!("#{index}");
                fallback.as_str()
            }
        };

        for (name, property) in set.iter_own_or_inherited() {
            let slot = state.entry(name.to_string()).or_insert(None);
            *slot = Some(Accumulator::join(slot.take(), property, label));
        }
    }

    let mut result = PropertySet::new();
    for (name, accumulator) in state {
        if let Some(accumulator) = accumulator {
            let property = accumulator.finish(&name);
            result.insert(name, property);
        }
    }

    tracing::trace!(fragments = fragment_count, members = result.len(), "merged fragments");
    result
}

/// Fails if any enumerable member of `set` (own or inherited) is a conflict.
///
/// # Errors
///
/// Returns [`ClassError::UnresolvedConflicts`] naming every conflicted
/// member, sorted ascending.
pub fn assert_no_conflict(set: &PropertySet) -> Result<(), ClassError> {
    let conflicts: Vec<&str> = set
        .iter_own_or_inherited()
        .filter(|(_, property)| property.is_conflict())
        .map(|(name, _)| name)
        .collect();

    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(ClassError::unresolved_conflicts(conflicts))
    }
}
