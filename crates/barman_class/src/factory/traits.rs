//! The trait-composition factory.

use barman_object::{ClassError, ClassId, Fragment, PropertySet, assert_no_conflict, merge};

use super::{ConflictPolicy, CreateClass, FactoryConfig};
use crate::registry::ClassRegistry;

/// Builds classes from an ordered list of traits.
///
/// `create_class` merges the traits, overlays the class body (body wins),
/// runs the baseline algorithm and, under the eager policy, fails if any
/// conflict remains. A failing call registers nothing.
///
/// # Example
///
/// ```
/// use barman_class::{ClassRegistry, ClassSpec, TraitsClassFactory};
/// use barman_object::property_set;
///
/// let t1 = property_set! { "render" => "A" };
/// let t2 = property_set! { "render" => "B" };
/// let mut registry = ClassRegistry::new();
///
/// let clash = TraitsClassFactory::new([t1.clone(), t2.clone()]);
/// assert!(registry.create(ClassSpec::new().with_factory(clash)).is_err());
///
/// let resolved = TraitsClassFactory::new([t1, t2]);
/// let class = registry
///     .create(ClassSpec::new().with_factory(resolved).with_method("render", "A"))
///     .unwrap();
/// assert!(registry.contains(class));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TraitsClassFactory {
    traits: Vec<Fragment>,
    config: FactoryConfig,
}

impl TraitsClassFactory {
    /// Creates a factory composing `traits`, in order.
    pub fn new<I, F>(traits: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        Self {
            traits: traits.into_iter().map(Into::into).collect(),
            config: FactoryConfig::default(),
        }
    }

    /// Replaces the factory settings.
    #[must_use]
    pub fn with_config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Shorthand for a lazy conflict policy.
    #[must_use]
    pub fn lazy(self) -> Self {
        let config = self.config.with_conflict_policy(ConflictPolicy::Lazy);
        self.with_config(config)
    }

    /// Returns the traits in composition order.
    #[must_use]
    pub fn traits(&self) -> &[Fragment] {
        &self.traits
    }
}

impl CreateClass for TraitsClassFactory {
    fn create_class(
        &self,
        registry: &mut ClassRegistry,
        parent: ClassId,
        instance_methods: PropertySet,
        static_methods: PropertySet,
    ) -> Result<ClassId, ClassError> {
        let mut composition = merge(&self.traits);
        composition.extend_from([Some(&instance_methods)]);

        if self.config.conflict_policy == ConflictPolicy::Eager {
            // Must fail before anything is registered.
            assert_no_conflict(&composition)?;
        }
        self.default_create_class(registry, parent, composition, static_methods)
    }

    fn config(&self) -> FactoryConfig {
        self.config
    }

    fn name(&self) -> &str {
        "traits"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barman_object::{ClassResolver, property_set, required};

    #[test]
    fn body_overrides_traits() {
        let mut registry = ClassRegistry::new();
        let factory = TraitsClassFactory::new([
            property_set! { "a" => 1, "b" => 1 },
            property_set! { "a" => 2 },
        ]);

        let class = factory
            .create_class(&mut registry, ClassId::NIL, property_set! { "a" => 3 }, PropertySet::new())
            .unwrap();

        let prototype = registry.prototype(class).unwrap();
        assert_eq!(prototype.get_own("a").unwrap().as_value().unwrap().as_number(), Some(3.0));
        assert_eq!(prototype.get_own("b").unwrap().as_value().unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn eager_conflict_registers_nothing() {
        let mut registry = ClassRegistry::new();
        let factory = TraitsClassFactory::new([
            property_set! { "b" => 1, "a" => 1 },
            property_set! { "b" => 2, "a" => 2 },
        ]);

        let err = factory
            .create_class(&mut registry, ClassId::NIL, PropertySet::new(), PropertySet::new())
            .unwrap_err();

        assert_eq!(err, ClassError::unresolved_conflicts(["a", "b"]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lazy_policy_keeps_markers() {
        let mut registry = ClassRegistry::new();
        let factory = TraitsClassFactory::new([property_set! { "a" => 1 }, property_set! { "a" => 2 }]).lazy();

        let class = factory
            .create_class(&mut registry, ClassId::NIL, PropertySet::new(), PropertySet::new())
            .unwrap();
        assert!(registry.prototype(class).unwrap().get_own("a").unwrap().is_conflict());
    }

    #[test]
    fn required_members_survive_composition() {
        let mut registry = ClassRegistry::new();
        let factory = TraitsClassFactory::new([property_set! { "area" => required() }]);

        let class = factory
            .create_class(&mut registry, ClassId::NIL, PropertySet::new(), PropertySet::new())
            .unwrap();
        assert!(registry.prototype(class).unwrap().get_own("area").unwrap().is_required());
    }
}
