//! Class factories.
//!
//! A class factory turns a parent class, instance members and static members
//! into a registered class. [`ClassFactory`] is the closed set of strategies
//! the entry points accept:
//!
//! | Variant | Behavior |
//! |---------|----------|
//! | [`Default`](ClassFactory::Default) | Mixes the body over the parent prototype |
//! | [`Abstract`](ClassFactory::Abstract) | Always fails with `RequiredImplementation` |
//! | [`Traits`](ClassFactory::Traits) | Merges traits, overlays the body, then checks for conflicts |
//! | [`Custom`](ClassFactory::Custom) | Any user [`CreateClass`] implementation |
//!
//! Factories are passed explicitly; there is no process-wide default.

mod traits;

pub use traits::TraitsClassFactory;

use std::sync::Arc;

use barman_object::{
    ClassError, ClassId, ClassResolver, Fragment, Method, Property, PropertySet, Slot, Value,
    compose, mix,
};
use serde::{Deserialize, Serialize};

use crate::registry::ClassRegistry;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// When merge conflicts are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Class creation fails if any conflict survives the class body.
    #[default]
    Eager,
    /// Conflicts stay in the prototype and fail when the member is invoked.
    Lazy,
}

/// Settings shared by the built-in factories.
///
/// # Example
///
/// ```
/// use barman_class::{ConflictPolicy, FactoryConfig};
///
/// let config = FactoryConfig::default().with_conflict_policy(ConflictPolicy::Lazy);
/// assert_eq!(config.conflict_policy, ConflictPolicy::Lazy);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// When conflicts are reported.
    pub conflict_policy: ConflictPolicy,
}

impl FactoryConfig {
    /// Sets the conflict policy.
    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CreateClass
// ─────────────────────────────────────────────────────────────────────────────

/// The class factory capability.
///
/// Implementors provide [`create_class`](Self::create_class). The provided
/// [`default_create_class`](Self::default_create_class) runs the baseline
/// algorithm so an implementation can layer its own steps around it.
///
/// # Example
///
/// ```
/// use barman_class::{ClassFactory, ClassRegistry, ClassSpec, CreateClass};
/// use barman_object::{ClassError, ClassId, PropertySet};
///
/// /// Stamps every class with a `kind` static.
/// struct Stamped;
///
/// impl CreateClass for Stamped {
///     fn create_class(
///         &self,
///         registry: &mut ClassRegistry,
///         parent: ClassId,
///         instance_methods: PropertySet,
///         mut static_methods: PropertySet,
///     ) -> Result<ClassId, ClassError> {
///         static_methods.insert("kind", "stamped");
///         self.default_create_class(registry, parent, instance_methods, static_methods)
///     }
/// }
///
/// let mut registry = ClassRegistry::new();
/// let class = registry
///     .create(ClassSpec::new().with_factory(ClassFactory::from_create_class(Stamped)))
///     .unwrap();
/// assert_eq!(registry.get_static(class, "kind").unwrap().as_str(), Some("stamped"));
/// ```
pub trait CreateClass: Send + Sync {
    /// Builds and registers a class.
    ///
    /// # Errors
    ///
    /// Any [`ClassError`]; a failing call must not leave a class registered.
    fn create_class(
        &self,
        registry: &mut ClassRegistry,
        parent: ClassId,
        instance_methods: PropertySet,
        static_methods: PropertySet,
    ) -> Result<ClassId, ClassError>;

    /// Settings used by [`default_create_class`](Self::default_create_class).
    fn config(&self) -> FactoryConfig {
        FactoryConfig::default()
    }

    /// Human readable factory name, used in logs.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Runs the baseline algorithm of [`DefaultClassFactory`].
    ///
    /// # Errors
    ///
    /// See [`DefaultClassFactory::create_class_with_traits`].
    fn default_create_class(
        &self,
        registry: &mut ClassRegistry,
        parent: ClassId,
        instance_methods: PropertySet,
        static_methods: PropertySet,
    ) -> Result<ClassId, ClassError> {
        DefaultClassFactory::with_config(self.config()).create_class(
            registry,
            parent,
            instance_methods,
            static_methods,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DefaultClassFactory
// ─────────────────────────────────────────────────────────────────────────────

/// The baseline factory.
///
/// 1. The prototype is the parent prototype with traits and body mixed on
///    top (body wins).
/// 2. A missing own `constructor` is synthesized to forward every argument
///    to the parent's constructor; a non-callable one is rejected.
/// 3. Statics are stored on the class and are not inherited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultClassFactory {
    config: FactoryConfig,
}

impl DefaultClassFactory {
    /// Creates a factory with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory with `config`.
    #[must_use]
    pub fn with_config(config: FactoryConfig) -> Self {
        Self { config }
    }

    /// Builds the prototype of a new subclass of `parent` without registering it.
    ///
    /// # Errors
    ///
    /// - [`ClassError::UnresolvedConflicts`] under the eager policy
    /// - [`ClassError::ConstructorNotCallable`] for a data `constructor`
    /// - [`ClassError::UnknownClass`] for a foreign parent
    pub fn create_prototype(
        &self,
        registry: &ClassRegistry,
        parent: ClassId,
        traits: &[Fragment],
        instance_methods: &PropertySet,
    ) -> Result<PropertySet, ClassError> {
        let parent_prototype = registry.prototype(parent)?;
        let mut prototype = match self.config.conflict_policy {
            ConflictPolicy::Eager => mix(Some(parent_prototype), traits, instance_methods)?,
            ConflictPolicy::Lazy => compose(Some(parent_prototype), traits, instance_methods),
        };
        ensure_constructor(&mut prototype, parent)?;
        Ok(prototype)
    }

    /// Builds and registers a subclass of `parent` with `traits` mixed in.
    ///
    /// # Errors
    ///
    /// See [`create_prototype`](Self::create_prototype).
    pub fn create_class_with_traits(
        &self,
        registry: &mut ClassRegistry,
        parent: ClassId,
        traits: &[Fragment],
        instance_methods: PropertySet,
        static_methods: PropertySet,
    ) -> Result<ClassId, ClassError> {
        let prototype = self.create_prototype(registry, parent, traits, &instance_methods)?;
        registry.define(parent, prototype, static_methods)
    }
}

impl CreateClass for DefaultClassFactory {
    fn create_class(
        &self,
        registry: &mut ClassRegistry,
        parent: ClassId,
        instance_methods: PropertySet,
        static_methods: PropertySet,
    ) -> Result<ClassId, ClassError> {
        self.create_class_with_traits(registry, parent, &[], instance_methods, static_methods)
    }

    fn config(&self) -> FactoryConfig {
        self.config
    }

    fn name(&self) -> &str {
        "default"
    }
}

/// Installs a forwarding constructor if `prototype` has none of its own.
fn ensure_constructor(prototype: &mut PropertySet, parent: ClassId) -> Result<(), ClassError> {
    match prototype.get_own("constructor").map(Property::slot) {
        None => {
            let forward = Method::new("constructor", move |ctx, args| {
                ctx.construct_as(parent, args)?;
                Ok(Value::Undefined)
            });
            prototype.insert("constructor", forward);
            Ok(())
        }
        // Markers fail when the constructor runs.
        Some(Slot::Value(Value::Method(_)) | Slot::Required | Slot::Conflict(_)) => Ok(()),
        Some(Slot::Value(_) | Slot::Accessor { .. }) => Err(ClassError::ConstructorNotCallable),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AbstractClassFactory
// ─────────────────────────────────────────────────────────────────────────────

/// A factory whose `create_class` is left unimplemented.
///
/// Creating a class through it fails with
/// [`ClassError::RequiredImplementation`]. Concrete factories implement
/// [`CreateClass`] themselves and reuse
/// [`default_create_class`](CreateClass::default_create_class).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbstractClassFactory;

impl CreateClass for AbstractClassFactory {
    fn create_class(
        &self,
        _registry: &mut ClassRegistry,
        _parent: ClassId,
        _instance_methods: PropertySet,
        _static_methods: PropertySet,
    ) -> Result<ClassId, ClassError> {
        Err(ClassError::RequiredImplementation)
    }

    fn name(&self) -> &str {
        "abstract"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ClassFactory
// ─────────────────────────────────────────────────────────────────────────────

/// Signature of closures accepted by [`ClassFactory::custom`].
pub type CreateClassFn = dyn Fn(&mut ClassRegistry, ClassId, PropertySet, PropertySet) -> Result<ClassId, ClassError>
    + Send
    + Sync;

struct FnClassFactory(Box<CreateClassFn>);

impl CreateClass for FnClassFactory {
    fn create_class(
        &self,
        registry: &mut ClassRegistry,
        parent: ClassId,
        instance_methods: PropertySet,
        static_methods: PropertySet,
    ) -> Result<ClassId, ClassError> {
        (self.0)(registry, parent, instance_methods, static_methods)
    }

    fn name(&self) -> &str {
        "custom"
    }
}

/// The class creation strategy used by an entry point.
#[derive(Clone)]
pub enum ClassFactory {
    /// [`DefaultClassFactory`].
    Default(DefaultClassFactory),
    /// [`AbstractClassFactory`].
    Abstract(AbstractClassFactory),
    /// [`TraitsClassFactory`].
    Traits(TraitsClassFactory),
    /// A user implementation.
    Custom(Arc<dyn CreateClass>),
}

impl Default for ClassFactory {
    fn default() -> Self {
        ClassFactory::Default(DefaultClassFactory::default())
    }
}

impl core::fmt::Debug for ClassFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ClassFactory::Default(factory) => f.debug_tuple("Default").field(factory).finish(),
            ClassFactory::Abstract(factory) => f.debug_tuple("Abstract").field(factory).finish(),
            ClassFactory::Traits(factory) => f.debug_tuple("Traits").field(factory).finish(),
            ClassFactory::Custom(factory) => f.debug_tuple("Custom").field(&factory.name()).finish(),
        }
    }
}

impl ClassFactory {
    /// Wraps a closure as a factory.
    ///
    /// ```
    /// use barman_class::{ClassFactory, ClassRegistry, ClassSpec};
    /// use barman_object::ClassError;
    ///
    /// let sealed = ClassFactory::custom(|_registry, _parent, _inst, _stat| {
    ///     Err(ClassError::thrown("sealed"))
    /// });
    ///
    /// let mut registry = ClassRegistry::new();
    /// assert!(registry.create(ClassSpec::new().with_factory(sealed)).is_err());
    /// ```
    pub fn custom<F>(create: F) -> Self
    where
        F: Fn(&mut ClassRegistry, ClassId, PropertySet, PropertySet) -> Result<ClassId, ClassError>
            + Send
            + Sync
            + 'static,
    {
        ClassFactory::Custom(Arc::new(FnClassFactory(Box::new(create))))
    }

    /// Wraps a [`CreateClass`] implementation.
    pub fn from_create_class(factory: impl CreateClass + 'static) -> Self {
        ClassFactory::Custom(Arc::new(factory))
    }

    /// Returns true for the default strategy.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, ClassFactory::Default(_))
    }
}

impl CreateClass for ClassFactory {
    fn create_class(
        &self,
        registry: &mut ClassRegistry,
        parent: ClassId,
        instance_methods: PropertySet,
        static_methods: PropertySet,
    ) -> Result<ClassId, ClassError> {
        match self {
            ClassFactory::Default(factory) => {
                factory.create_class(registry, parent, instance_methods, static_methods)
            }
            ClassFactory::Abstract(factory) => {
                factory.create_class(registry, parent, instance_methods, static_methods)
            }
            ClassFactory::Traits(factory) => {
                factory.create_class(registry, parent, instance_methods, static_methods)
            }
            ClassFactory::Custom(factory) => {
                factory.create_class(registry, parent, instance_methods, static_methods)
            }
        }
    }

    fn config(&self) -> FactoryConfig {
        match self {
            ClassFactory::Default(factory) => factory.config(),
            ClassFactory::Abstract(factory) => factory.config(),
            ClassFactory::Traits(factory) => factory.config(),
            ClassFactory::Custom(factory) => factory.config(),
        }
    }

    fn name(&self) -> &str {
        match self {
            ClassFactory::Default(factory) => factory.name(),
            ClassFactory::Abstract(factory) => factory.name(),
            ClassFactory::Traits(factory) => factory.name(),
            ClassFactory::Custom(factory) => factory.name(),
        }
    }
}

impl From<DefaultClassFactory> for ClassFactory {
    fn from(factory: DefaultClassFactory) -> Self {
        ClassFactory::Default(factory)
    }
}

impl From<AbstractClassFactory> for ClassFactory {
    fn from(factory: AbstractClassFactory) -> Self {
        ClassFactory::Abstract(factory)
    }
}

impl From<TraitsClassFactory> for ClassFactory {
    fn from(factory: TraitsClassFactory) -> Self {
        ClassFactory::Traits(factory)
    }
}
