//! The class arena.
//!
//! Every class lives in a [`ClassRegistry`] and is addressed by a [`ClassId`].
//! A descriptor stores its parent's id rather than a pointer, so super
//! lookups are index walks. The root class `Nil` is always `ClassId(0)` and
//! is its own parent.

use std::sync::Arc;

use barman_object::{
    ClassError, ClassId, ClassResolver, Context, Instance, Method, Property, PropertySet, Value,
};
use hashbrown::HashMap;

use crate::spec::ClassSpec;

/// Name given to the root class.
pub const NIL_NAME: &str = "Nil";

// ─────────────────────────────────────────────────────────────────────────────
// ClassDescriptor
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the registry knows about one class.
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    name: Option<Arc<str>>,
    parent: ClassId,
    prototype: Arc<PropertySet>,
    statics: PropertySet,
}

impl ClassDescriptor {
    /// Returns the class name, if one was assigned.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the parent class.
    #[must_use]
    pub fn parent(&self) -> ClassId {
        self.parent
    }

    /// Returns the instance prototype.
    #[must_use]
    pub fn prototype(&self) -> &Arc<PropertySet> {
        &self.prototype
    }

    /// Returns the static members. Statics are not inherited.
    #[must_use]
    pub fn statics(&self) -> &PropertySet {
        &self.statics
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ClassRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Arena of class descriptors.
///
/// # Example
///
/// ```
/// use barman_class::{ClassRegistry, ClassSpec};
/// use barman_object::{ClassId, ClassResolver, Method, Value};
///
/// let mut registry = ClassRegistry::new();
/// let greeter = registry
///     .create(ClassSpec::new().with_method(
///         "greet",
///         Method::new("greet", |_ctx, _args| Ok(Value::from("hi"))),
///     ))
///     .unwrap();
///
/// assert_eq!(registry.parent(greeter).unwrap(), ClassId::NIL);
///
/// let mut instance = registry.instantiate(greeter, &[]).unwrap();
/// let reply = instance.context(&registry).call("greet", &[]).unwrap();
/// assert_eq!(reply, Value::from("hi"));
/// ```
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    classes: Vec<ClassDescriptor>,
    names: HashMap<Arc<str>, ClassId>,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// Creates a registry holding only the root class.
    #[must_use]
    pub fn new() -> Self {
        let constructor = Method::new("constructor", |_ctx, _args| Ok(Value::Undefined));
        let prototype = PropertySet::named(NIL_NAME).with("constructor", Property::hidden(constructor));

        let name: Arc<str> = Arc::from(NIL_NAME);
        let mut names = HashMap::new();
        names.insert(Arc::clone(&name), ClassId::NIL);

        Self {
            classes: vec![ClassDescriptor {
                name: Some(name),
                parent: ClassId::NIL,
                prototype: Arc::new(prototype),
                statics: PropertySet::new(),
            }],
            names,
        }
    }

    /// Returns the root class.
    #[must_use]
    pub fn nil(&self) -> ClassId {
        ClassId::NIL
    }

    /// Returns the number of registered classes, `Nil` included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false: the root class is registered on construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns true if `class` belongs to this registry.
    #[must_use]
    pub fn contains(&self, class: ClassId) -> bool {
        class.index() < self.classes.len()
    }

    /// Returns the descriptor of `class`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::UnknownClass`] if the id is not registered.
    pub fn descriptor(&self, class: ClassId) -> Result<&ClassDescriptor, ClassError> {
        self.classes
            .get(class.index())
            .ok_or(ClassError::UnknownClass(class))
    }

    /// Registers a finished class. Factories call this as their last step.
    ///
    /// `prototype` is stored as given; it is expected to inherit from the
    /// parent's prototype, as [`mix`](barman_object::mix) arranges.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::UnknownClass`] if `parent` is not registered.
    pub fn define(
        &mut self,
        parent: ClassId,
        prototype: PropertySet,
        statics: PropertySet,
    ) -> Result<ClassId, ClassError> {
        self.descriptor(parent)?;

        let class = ClassId::new(self.classes.len());
        self.classes.push(ClassDescriptor {
            name: None,
            parent,
            prototype: Arc::new(prototype),
            statics,
        });

        tracing::debug!(
            class = %class,
            parent = %parent,
            statics = self.classes[class.index()].statics.len(),
            "class registered"
        );
        Ok(class)
    }

    /// Assigns a lookup name to `class`, replacing any previous holder of the name.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::UnknownClass`] if the id is not registered.
    pub fn set_name(&mut self, class: ClassId, name: impl Into<Arc<str>>) -> Result<(), ClassError> {
        let name = name.into();
        self.descriptor(class)?;

        // The previous holder loses the name.
        if let Some(holder) = self.names.get(&*name).copied().filter(|holder| *holder != class) {
            self.classes[holder.index()].name = None;
        }
        let previous = self.classes[class.index()].name.replace(Arc::clone(&name));
        if let Some(previous) = previous
            && self.names.get(&*previous) == Some(&class)
        {
            self.names.remove(&*previous);
        }
        tracing::trace!(class = %class, name = %name, "class named");
        self.names.insert(name, class);
        Ok(())
    }

    /// Finds a class by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ClassId> {
        self.names.get(name).copied()
    }

    /// Returns the name of `class`, if it has one.
    #[must_use]
    pub fn name(&self, class: ClassId) -> Option<&str> {
        self.classes.get(class.index()).and_then(ClassDescriptor::name)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Class creation
    // ─────────────────────────────────────────────────────────────────────────

    /// Creates a class from `spec`. The parent defaults to `Nil`.
    ///
    /// # Errors
    ///
    /// Propagates the factory's errors; on failure nothing is registered.
    pub fn create(&mut self, spec: ClassSpec) -> Result<ClassId, ClassError> {
        spec.build(self)
    }

    /// Creates a subclass of `parent` from `spec`, ignoring any parent set on `spec`.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn extend(&mut self, parent: ClassId, spec: ClassSpec) -> Result<ClassId, ClassError> {
        spec.with_parent(parent).build(self)
    }

    /// Creates an instance of `class` and runs its constructor.
    ///
    /// # Errors
    ///
    /// Propagates constructor errors, and [`ClassError::UnknownClass`] for foreign ids.
    pub fn instantiate(&self, class: ClassId, args: &[Value]) -> Result<Instance, ClassError> {
        self.descriptor(class)?;
        let mut instance = Instance::new(class);
        Context::for_instance(self, &mut instance).construct_as(class, args)?;
        Ok(instance)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Iterates `class` and its ancestors, ending with `Nil`.
    pub fn ancestors(&self, class: ClassId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            next: self.contains(class).then_some(class),
        }
    }

    /// Returns true if `class` is `instance`'s class or one of its ancestors.
    #[must_use]
    pub fn is_instance_of(&self, instance: &Instance, class: ClassId) -> bool {
        self.is_subclass_of(instance.class(), class)
    }

    /// Returns true if `ancestor` appears in `class`'s chain (reflexively).
    #[must_use]
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        self.ancestors(class).any(|candidate| candidate == ancestor)
    }

    /// Returns the prototype of `class`'s parent (the super pointer).
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::UnknownClass`] if the id is not registered.
    pub fn super_prototype(&self, class: ClassId) -> Result<&Arc<PropertySet>, ClassError> {
        let parent = self.descriptor(class)?.parent;
        self.prototype(parent)
    }

    /// Returns an own static member of `class`.
    #[must_use]
    pub fn static_member(&self, class: ClassId, name: &str) -> Option<&Property> {
        self.classes
            .get(class.index())
            .and_then(|descriptor| descriptor.statics.get_own(name))
    }

    /// Reads a static member; missing members read as [`Value::Undefined`].
    ///
    /// # Errors
    ///
    /// Propagates getter errors and [`ClassError::UnknownClass`].
    pub fn get_static(&self, class: ClassId, name: &str) -> Result<Value, ClassError> {
        Context::for_class(self, class).get(name)
    }

    /// Invokes a static member with the class as receiver.
    ///
    /// # Errors
    ///
    /// See [`Context::call`].
    pub fn call_static(&self, class: ClassId, name: &str, args: &[Value]) -> Result<Value, ClassError> {
        Context::for_class(self, class).call(name, args)
    }
}

impl ClassResolver for ClassRegistry {
    fn prototype(&self, class: ClassId) -> Result<&Arc<PropertySet>, ClassError> {
        Ok(&self.descriptor(class)?.prototype)
    }

    fn parent(&self, class: ClassId) -> Result<ClassId, ClassError> {
        Ok(self.descriptor(class)?.parent)
    }

    fn statics(&self, class: ClassId) -> Result<&PropertySet, ClassError> {
        Ok(&self.descriptor(class)?.statics)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ancestors
// ─────────────────────────────────────────────────────────────────────────────

/// Iterator over a class chain. See [`ClassRegistry::ancestors`].
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    registry: &'a ClassRegistry,
    next: Option<ClassId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ClassId;

    fn next(&mut self) -> Option<ClassId> {
        let current = self.next?;
        self.next = self
            .registry
            .classes
            .get(current.index())
            .map(ClassDescriptor::parent)
            .filter(|parent| *parent != current);
        Some(current)
    }
}

impl core::iter::FusedIterator for Ancestors<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use barman_object::property_set;

    #[test]
    fn nil_is_its_own_parent() {
        let registry = ClassRegistry::new();
        assert_eq!(registry.parent(ClassId::NIL).unwrap(), ClassId::NIL);
        assert_eq!(registry.find(NIL_NAME), Some(ClassId::NIL));
        assert!(registry.prototype(ClassId::NIL).unwrap().has_own("constructor"));
        assert!(Arc::ptr_eq(
            registry.super_prototype(ClassId::NIL).unwrap(),
            registry.prototype(ClassId::NIL).unwrap(),
        ));
    }

    #[test]
    fn nil_prototype_enumerates_nothing_but_its_constructor() {
        let registry = ClassRegistry::new();
        let keys: Vec<&str> = registry
            .prototype(ClassId::NIL)
            .unwrap()
            .iter_own_or_inherited()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, ["constructor"]);
    }

    #[test]
    fn define_rejects_foreign_parents() {
        let mut registry = ClassRegistry::new();
        let err = registry
            .define(ClassId::new(7), PropertySet::new(), PropertySet::new())
            .unwrap_err();
        assert_eq!(err, ClassError::UnknownClass(ClassId::new(7)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ancestors_end_at_nil() {
        let mut registry = ClassRegistry::new();
        let a = registry.define(ClassId::NIL, PropertySet::new(), PropertySet::new()).unwrap();
        let b = registry.define(a, PropertySet::new(), PropertySet::new()).unwrap();

        let chain: Vec<ClassId> = registry.ancestors(b).collect();
        assert_eq!(chain, [b, a, ClassId::NIL]);
        assert!(registry.is_subclass_of(b, a));
        assert!(!registry.is_subclass_of(a, b));
        assert_eq!(registry.ancestors(ClassId::new(99)).count(), 0);
    }

    #[test]
    fn renaming_releases_the_old_name() {
        let mut registry = ClassRegistry::new();
        let class = registry.define(ClassId::NIL, PropertySet::new(), PropertySet::new()).unwrap();

        registry.set_name(class, "Widget").unwrap();
        registry.set_name(class, "Gadget").unwrap();

        assert_eq!(registry.find("Widget"), None);
        assert_eq!(registry.find("Gadget"), Some(class));
        assert_eq!(registry.name(class), Some("Gadget"));
    }

    #[test]
    fn a_taken_name_moves_to_the_new_class() {
        let mut registry = ClassRegistry::new();
        let first = registry.create(ClassSpec::named("Widget")).unwrap();
        let second = registry.create(ClassSpec::named("Widget")).unwrap();

        assert_eq!(registry.find("Widget"), Some(second));
        assert_eq!(registry.name(first), None);
        assert_eq!(registry.name(second), Some("Widget"));

        registry.set_name(first, "Gadget").unwrap();
        assert_eq!(registry.find("Widget"), Some(second));
        assert_eq!(registry.find("Gadget"), Some(first));
    }

    #[test]
    fn statics_are_not_inherited() {
        let mut registry = ClassRegistry::new();
        let base = registry
            .define(ClassId::NIL, PropertySet::new(), property_set! { "version" => "1.0" })
            .unwrap();
        let child = registry.define(base, PropertySet::new(), PropertySet::new()).unwrap();

        assert_eq!(registry.get_static(base, "version").unwrap(), Value::from("1.0"));
        assert_eq!(registry.get_static(child, "version").unwrap(), Value::Undefined);
        assert!(registry.static_member(child, "version").is_none());
    }
}
