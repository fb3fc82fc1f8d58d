//! Entry points.
//!
//! Thin wrappers over [`ClassRegistry`] and the factories that read the way
//! client code is usually written:
//!
//! ```
//! use barman_class::prelude::*;
//!
//! let mut registry = ClassRegistry::new();
//! let shape = create(&mut registry, ClassSpec::new().with_method("sides", 0)).unwrap();
//! let square = shape.extend(&mut registry, ClassSpec::new().with_method("sides", 4)).unwrap();
//!
//! let mut instance = square.instantiate(&registry, &[]).unwrap();
//! assert_eq!(instance.context(&registry).get("sides").unwrap(), Value::from(4));
//! ```

use std::sync::Arc;

use barman_object::{ClassError, ClassId, Fragment, Instance, PropertySet, Value};

use crate::factory::{ClassFactory, TraitsClassFactory};
use crate::registry::ClassRegistry;
use crate::spec::ClassSpec;

/// Creates a class. Equivalent to [`ClassRegistry::create`].
///
/// # Errors
///
/// Propagates the factory's errors.
pub fn create(registry: &mut ClassRegistry, spec: ClassSpec) -> Result<ClassId, ClassError> {
    registry.create(spec)
}

/// Creates a subclass of `parent`. Equivalent to [`ClassRegistry::extend`].
///
/// # Errors
///
/// Propagates the factory's errors.
pub fn extend(registry: &mut ClassRegistry, parent: ClassId, spec: ClassSpec) -> Result<ClassId, ClassError> {
    registry.extend(parent, spec)
}

/// Alias of [`extend`] for call sites that read better parent-first.
///
/// # Errors
///
/// Propagates the factory's errors.
pub fn subclass_of(
    registry: &mut ClassRegistry,
    parent: ClassId,
    spec: ClassSpec,
) -> Result<ClassId, ClassError> {
    registry.extend(parent, spec)
}

/// Returns a factory composing `traits`, in order.
///
/// ```
/// use barman_class::prelude::*;
///
/// let t1 = property_set! { "render" => "A" };
/// let t2 = property_set! { "render" => "B" };
///
/// let mut registry = ClassRegistry::new();
/// let err = create(&mut registry, ClassSpec::new().with_factory(include([t1, t2]))).unwrap_err();
/// assert_eq!(err.to_string(), "There is a merge conflict for the following properties: render");
/// ```
pub fn include<I, F>(traits: I) -> ClassFactory
where
    I: IntoIterator<Item = F>,
    F: Into<Fragment>,
{
    ClassFactory::Traits(TraitsClassFactory::new(traits))
}

/// Alias of [`include`].
pub fn with_traits<I, F>(traits: I) -> ClassFactory
where
    I: IntoIterator<Item = F>,
    F: Into<Fragment>,
{
    include(traits)
}

/// Like [`include`], but for dynamically typed trait values.
///
/// Objects become traits; `Undefined` and `Null` are skipped.
///
/// # Errors
///
/// Returns [`ClassError::InvalidMixin`] for any other value.
pub fn include_values<I>(traits: I) -> Result<ClassFactory, ClassError>
where
    I: IntoIterator<Item = Value>,
{
    let traits = traits
        .into_iter()
        .map(Fragment::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(include(traits))
}

// ─────────────────────────────────────────────────────────────────────────────
// ClassExt
// ─────────────────────────────────────────────────────────────────────────────

/// Class-side operations available on every [`ClassId`].
pub trait ClassExt: Copy {
    /// Creates a subclass of this class.
    ///
    /// # Errors
    ///
    /// Propagates the factory's errors.
    fn extend(self, registry: &mut ClassRegistry, spec: ClassSpec) -> Result<ClassId, ClassError>;

    /// Creates an instance and runs the constructor.
    ///
    /// # Errors
    ///
    /// Propagates constructor errors.
    fn instantiate(self, registry: &ClassRegistry, args: &[Value]) -> Result<Instance, ClassError>;

    /// Returns the parent's prototype.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::UnknownClass`] for foreign ids.
    fn super_prototype(self, registry: &ClassRegistry) -> Result<Arc<PropertySet>, ClassError>;
}

impl ClassExt for ClassId {
    fn extend(self, registry: &mut ClassRegistry, spec: ClassSpec) -> Result<ClassId, ClassError> {
        registry.extend(self, spec)
    }

    fn instantiate(self, registry: &ClassRegistry, args: &[Value]) -> Result<Instance, ClassError> {
        registry.instantiate(self, args)
    }

    fn super_prototype(self, registry: &ClassRegistry) -> Result<Arc<PropertySet>, ClassError> {
        registry.super_prototype(self).cloned()
    }
}
