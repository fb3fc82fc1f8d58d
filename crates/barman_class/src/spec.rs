//! Class specifications.

use std::sync::Arc;

use barman_object::{ClassError, ClassId, Fragment, Property, PropertySet, assert_no_conflict, merge};

use crate::factory::{ClassFactory, ConflictPolicy, CreateClass, TraitsClassFactory};
use crate::registry::ClassRegistry;

/// Everything needed to create one class.
///
/// Every field is optional: the parent defaults to `Nil`, the factory to
/// [`ClassFactory::Default`], and the trait and member lists to empty.
///
/// # Example
///
/// ```
/// use barman_class::{ClassRegistry, ClassSpec};
/// use barman_object::{Value, property_set};
///
/// let mut registry = ClassRegistry::new();
/// let class = registry
///     .create(
///         ClassSpec::named("Config")
///             .with_trait(property_set! { "format" => "toml" })
///             .with_static("version", "1.0"),
///     )
///     .unwrap();
///
/// assert_eq!(registry.find("Config"), Some(class));
/// assert_eq!(registry.get_static(class, "version").unwrap(), Value::from("1.0"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassSpec {
    name: Option<Arc<str>>,
    parent: Option<ClassId>,
    factory: ClassFactory,
    traits: Vec<Fragment>,
    instance_methods: PropertySet,
    static_methods: PropertySet,
}

impl ClassSpec {
    /// Creates an empty specification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty specification for a named class.
    #[must_use]
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the parent class.
    #[must_use]
    pub fn with_parent(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the class factory.
    #[must_use]
    pub fn with_factory(mut self, factory: impl Into<ClassFactory>) -> Self {
        self.factory = factory.into();
        self
    }

    /// Appends a trait.
    #[must_use]
    pub fn with_trait(mut self, fragment: impl Into<Fragment>) -> Self {
        self.traits.push(fragment.into());
        self
    }

    /// Appends several traits.
    #[must_use]
    pub fn with_traits<I, F>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.traits.extend(fragments.into_iter().map(Into::into));
        self
    }

    /// Adds one instance member.
    #[must_use]
    pub fn with_method(mut self, name: impl Into<String>, property: impl Into<Property>) -> Self {
        self.instance_methods.insert(name, property);
        self
    }

    /// Copies every own member of `methods` into the instance members.
    #[must_use]
    pub fn with_instance_methods(mut self, methods: &PropertySet) -> Self {
        self.instance_methods.extend_from([Some(methods)]);
        self
    }

    /// Adds one static member.
    #[must_use]
    pub fn with_static(mut self, name: impl Into<String>, property: impl Into<Property>) -> Self {
        self.static_methods.insert(name, property);
        self
    }

    /// Copies every own member of `methods` into the static members.
    #[must_use]
    pub fn with_static_methods(mut self, methods: &PropertySet) -> Self {
        self.static_methods.extend_from([Some(methods)]);
        self
    }

    /// Returns the parent, if one was set.
    #[must_use]
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    /// Returns the factory.
    #[must_use]
    pub fn factory(&self) -> &ClassFactory {
        &self.factory
    }

    /// Returns the traits.
    #[must_use]
    pub fn traits(&self) -> &[Fragment] {
        &self.traits
    }

    /// Returns the instance members.
    #[must_use]
    pub fn instance_methods(&self) -> &PropertySet {
        &self.instance_methods
    }

    /// Returns the static members.
    #[must_use]
    pub fn static_methods(&self) -> &PropertySet {
        &self.static_methods
    }

    /// Runs the factory against `registry`.
    ///
    /// The default factory mixes the traits itself and a traits factory
    /// composes them after its own. Any other factory receives the traits
    /// already merged, with the class body laid over them and the factory's
    /// conflict policy applied.
    pub(crate) fn build(self, registry: &mut ClassRegistry) -> Result<ClassId, ClassError> {
        let ClassSpec {
            name,
            parent,
            factory,
            traits,
            instance_methods,
            static_methods,
        } = self;
        let parent = parent.unwrap_or(ClassId::NIL);
        registry.descriptor(parent)?;

        let class = match &factory {
            ClassFactory::Default(default) => default.create_class_with_traits(
                registry,
                parent,
                &traits,
                instance_methods,
                static_methods,
            )?,
            ClassFactory::Traits(composer) => {
                let composer =
                    TraitsClassFactory::new(composer.traits().iter().cloned().chain(traits))
                        .with_config(composer.config());
                composer.create_class(registry, parent, instance_methods, static_methods)?
            }
            other => {
                let instance_methods = if traits.is_empty() {
                    instance_methods
                } else {
                    let mut composed = merge(&traits);
                    composed.extend_from([Some(&instance_methods)]);
                    if other.config().conflict_policy == ConflictPolicy::Eager {
                        assert_no_conflict(&composed)?;
                    }
                    composed
                };
                other.create_class(registry, parent, instance_methods, static_methods)?
            }
        };

        tracing::debug!(
            class = %class,
            parent = %parent,
            factory = factory.name(),
            name = name.as_deref(),
            "class created"
        );

        if let Some(name) = name {
            registry.set_name(class, name)?;
        }
        Ok(class)
    }
}
