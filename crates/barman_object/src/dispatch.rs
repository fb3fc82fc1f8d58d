//! Member dispatch and super delegation.
//!
//! Classes live in an arena owned by Layer 2; this module only needs to walk
//! it, which it does through the [`ClassResolver`] trait. A [`Context`] is the
//! receiver of one invocation: it carries `this` (an [`Instance`] or, for
//! static members, a class) and the *home* class, i.e. the class whose
//! prototype owns the member currently executing. Super lookups start at the
//! home class's parent, so a method inherited three levels down still reaches
//! its own parent's implementation rather than looping on the receiver's.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ClassError;
use crate::property::{Property, Slot};
use crate::set::PropertySet;
use crate::value::{ClassId, Method, Value};

// ─────────────────────────────────────────────────────────────────────────────
// ClassResolver
// ─────────────────────────────────────────────────────────────────────────────

/// Read access to a class arena.
///
/// Implemented by the class registry. The root class must report itself as
/// its own parent; walks stop there.
pub trait ClassResolver: Send + Sync {
    /// Returns the prototype of `class`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::UnknownClass`] if the id is not registered.
    fn prototype(&self, class: ClassId) -> Result<&Arc<PropertySet>, ClassError>;

    /// Returns the parent of `class`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::UnknownClass`] if the id is not registered.
    fn parent(&self, class: ClassId) -> Result<ClassId, ClassError>;

    /// Returns the static members of `class`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::UnknownClass`] if the id is not registered.
    fn statics(&self, class: ClassId) -> Result<&PropertySet, ClassError>;

    /// Finds the nearest class, starting at `class`, whose prototype owns `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::UnknownClass`] if the chain references an unknown id.
    fn resolve(&self, class: ClassId, name: &str) -> Result<Option<(ClassId, &Property)>, ClassError> {
        let mut current = class;
        loop {
            if let Some(property) = self.prototype(current)?.get_own(name) {
                return Ok(Some((current, property)));
            }
            let parent = self.parent(current)?;
            if parent == current {
                return Ok(None);
            }
            current = parent;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instance
// ─────────────────────────────────────────────────────────────────────────────

/// Own state of one constructed object.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    class: ClassId,
    fields: IndexMap<String, Value>,
}

impl Instance {
    /// Creates an instance with no fields. Constructors are not run.
    #[must_use]
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            fields: IndexMap::new(),
        }
    }

    /// Returns the class the instance was created from.
    #[must_use]
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Returns an own field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Iterates own fields in assignment order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Serializes own data fields to JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .filter_map(|(name, value)| value.to_json().map(|json| (name.clone(), json)))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Opens an invocation context with this instance as `this`.
    pub fn context<'a>(&'a mut self, resolver: &'a dyn ClassResolver) -> Context<'a> {
        Context::for_instance(resolver, self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// The `this` of an invocation.
#[derive(Debug)]
pub enum Receiver<'a> {
    /// Instance member call.
    Instance(&'a mut Instance),
    /// Static member call on a class.
    Class(ClassId),
}

/// Invocation context handed to every [`Method`].
pub struct Context<'a> {
    resolver: &'a dyn ClassResolver,
    receiver: Receiver<'a>,
    home: ClassId,
}

impl core::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Context")
            .field("receiver", &self.receiver)
            .field("home", &self.home)
            .finish_non_exhaustive()
    }
}

impl<'a> Context<'a> {
    /// Context for calls on `instance`, starting at its own class.
    pub fn for_instance(resolver: &'a dyn ClassResolver, instance: &'a mut Instance) -> Self {
        let home = instance.class;
        Self {
            resolver,
            receiver: Receiver::Instance(instance),
            home,
        }
    }

    /// Context for static calls on `class`.
    pub fn for_class(resolver: &'a dyn ClassResolver, class: ClassId) -> Self {
        Self {
            resolver,
            receiver: Receiver::Class(class),
            home: class,
        }
    }

    /// Returns the class arena.
    #[must_use]
    pub fn resolver(&self) -> &'a dyn ClassResolver {
        self.resolver
    }

    /// Returns the class whose member is currently executing.
    #[must_use]
    pub fn home(&self) -> ClassId {
        self.home
    }

    /// Returns the receiver's class.
    #[must_use]
    pub fn class(&self) -> ClassId {
        match &self.receiver {
            Receiver::Instance(instance) => instance.class,
            Receiver::Class(class) => *class,
        }
    }

    /// Returns the receiving instance, if this is an instance call.
    #[must_use]
    pub fn instance(&self) -> Option<&Instance> {
        match &self.receiver {
            Receiver::Instance(instance) => Some(&**instance),
            Receiver::Class(_) => None,
        }
    }

    /// Returns the receiving instance mutably, if this is an instance call.
    pub fn instance_mut(&mut self) -> Option<&mut Instance> {
        match &mut self.receiver {
            Receiver::Instance(instance) => Some(&mut **instance),
            Receiver::Class(_) => None,
        }
    }

    /// Same receiver, different home.
    fn rehome(&mut self, home: ClassId) -> Context<'_> {
        let receiver = match &mut self.receiver {
            Receiver::Instance(instance) => Receiver::Instance(&mut **instance),
            Receiver::Class(class) => Receiver::Class(*class),
        };
        Context {
            resolver: self.resolver,
            receiver,
            home,
        }
    }

    /// Finds `name` on the receiver: own fields and the prototype chain for
    /// instances, own statics for classes.
    fn find(&self, name: &str) -> Result<Option<(ClassId, &'a Property)>, ClassError> {
        let resolver = self.resolver;
        match &self.receiver {
            Receiver::Instance(instance) => resolver.resolve(instance.class, name),
            Receiver::Class(class) => Ok(resolver
                .statics(*class)?
                .get_own(name)
                .map(|property| (*class, property))),
        }
    }

    /// Reads a member.
    ///
    /// Accessors run their getter. Markers read as functions that fail when
    /// invoked. Missing members read as [`Value::Undefined`].
    ///
    /// # Errors
    ///
    /// Propagates getter errors and unknown class ids.
    pub fn get(&mut self, name: &str) -> Result<Value, ClassError> {
        if let Some(value) = self.instance().and_then(|instance| instance.fields.get(name)) {
            return Ok(value.clone());
        }
        match self.find(name)? {
            Some((owner, property)) => self.read(owner, name, property),
            None => Ok(Value::Undefined),
        }
    }

    fn read(&mut self, owner: ClassId, name: &str, property: &Property) -> Result<Value, ClassError> {
        match property.slot() {
            Slot::Value(value) => Ok(value.clone()),
            Slot::Accessor { get: Some(getter), .. } => getter.call(&mut self.rehome(owner), &[]),
            Slot::Accessor { get: None, .. } => Ok(Value::Undefined),
            Slot::Required => Ok(Value::Method(Method::new(name, |_ctx, _args| {
                Err(ClassError::RequiredImplementation)
            }))),
            Slot::Conflict(info) => {
                let error = ClassError::merge_conflict(name, info.contributors());
                Ok(Value::Method(Method::new(name, move |_ctx, _args| {
                    Err(error.clone())
                })))
            }
        }
    }

    /// Assigns a member.
    ///
    /// Existing own fields are overwritten. Otherwise an inherited accessor's
    /// setter runs, a non-writable inherited member rejects the assignment,
    /// and anything else creates an own field.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::ReadOnly`] for read-only members and for any
    /// assignment through a class receiver.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ClassError> {
        let value = value.into();
        if let Receiver::Class(_) = self.receiver {
            return Err(ClassError::read_only(name));
        }
        if let Some(field) = self.instance_mut().and_then(|instance| instance.fields.get_mut(name)) {
            *field = value;
            return Ok(());
        }
        if let Some((owner, property)) = self.find(name)? {
            match property.slot() {
                Slot::Accessor { set: Some(setter), .. } => {
                    setter.call(&mut self.rehome(owner), &[value])?;
                    return Ok(());
                }
                Slot::Accessor { set: None, .. } => return Err(ClassError::read_only(name)),
                _ if !property.attributes().writable => return Err(ClassError::read_only(name)),
                _ => {}
            }
        }
        if let Some(instance) = self.instance_mut() {
            instance.fields.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Invokes a member with `args`.
    ///
    /// # Errors
    ///
    /// - [`ClassError::PropertyNotDefined`] if no such member exists
    /// - [`ClassError::NotCallable`] if it is a data member
    /// - [`ClassError::RequiredImplementation`] for a `required` placeholder
    /// - [`ClassError::MergeConflict`] for an unresolved conflict
    /// - whatever the method body returns
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, ClassError> {
        if let Some(value) = self.instance().and_then(|instance| instance.fields.get(name)) {
            let method = value.as_method().cloned().ok_or_else(|| ClassError::not_callable(name))?;
            let home = self.class();
            return method.call(&mut self.rehome(home), args);
        }
        match self.find(name)? {
            Some((owner, property)) => self.invoke(owner, name, property, args),
            None => Err(ClassError::property_not_defined(name)),
        }
    }

    fn invoke(
        &mut self,
        owner: ClassId,
        name: &str,
        property: &Property,
        args: &[Value],
    ) -> Result<Value, ClassError> {
        match property.slot() {
            Slot::Value(Value::Method(method)) => method.call(&mut self.rehome(owner), args),
            Slot::Value(_) => Err(ClassError::not_callable(name)),
            Slot::Accessor { .. } => match self.read(owner, name, property)? {
                Value::Method(method) => method.call(&mut self.rehome(owner), args),
                _ => Err(ClassError::not_callable(name)),
            },
            Slot::Required => Err(ClassError::RequiredImplementation),
            Slot::Conflict(info) => Err(ClassError::merge_conflict(name, info.contributors())),
        }
    }

    /// Runs `class`'s constructor against the current receiver.
    ///
    /// This is how implicit constructors chain to their parent.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::ConstructorNotCallable`] if the prototype's
    /// `constructor` is a data member, and propagates constructor errors.
    pub fn construct_as(&mut self, class: ClassId, args: &[Value]) -> Result<(), ClassError> {
        let resolver = self.resolver;
        let prototype = resolver.prototype(class)?;
        match prototype.get_own("constructor").map(Property::slot) {
            None => Ok(()),
            Some(Slot::Value(Value::Method(constructor))) => {
                constructor.call(&mut self.rehome(class), args)?;
                Ok(())
            }
            Some(Slot::Required) => Err(ClassError::RequiredImplementation),
            Some(Slot::Conflict(info)) => {
                Err(ClassError::merge_conflict("constructor", info.contributors()))
            }
            Some(_) => Err(ClassError::ConstructorNotCallable),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Super delegation
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the parent prototype of the home class.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::UnknownClass`] for ids missing from the arena.
    pub fn super_prototype(&self) -> Result<Arc<PropertySet>, ClassError> {
        let parent = self.resolver.parent(self.home)?;
        self.resolver.prototype(parent).cloned()
    }

    /// Looks `name` up starting at the home class's parent.
    ///
    /// Callables come back bound to this receiver; other values come back as
    /// they are.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::PropertyNotDefined`] if the parent chain has no
    /// such member (or it is undefined).
    pub fn super_member(&mut self, name: &str) -> Result<SuperMember, ClassError> {
        let resolver = self.resolver;
        let parent = resolver.parent(self.home)?;
        let (owner, property) = resolver
            .resolve(parent, name)?
            .ok_or_else(|| ClassError::property_not_defined(name))?;
        match self.read(owner, name, property)? {
            Value::Undefined => Err(ClassError::property_not_defined(name)),
            Value::Method(method) => Ok(SuperMember::Method(BoundMethod {
                method,
                home: owner,
            })),
            value => Ok(SuperMember::Value(value)),
        }
    }

    /// Like [`super_member`](Self::super_member), but insists on a callable.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::NotCallable`] if the parent member is data.
    pub fn super_method(&mut self, name: &str) -> Result<BoundMethod, ClassError> {
        match self.super_member(name)? {
            SuperMember::Method(bound) => Ok(bound),
            SuperMember::Value(_) => Err(ClassError::not_callable(name)),
        }
    }

    /// Calls the parent implementation of `name` on this receiver.
    ///
    /// # Errors
    ///
    /// See [`super_method`](Self::super_method); also propagates the parent's errors.
    pub fn call_super(&mut self, name: &str, args: &[Value]) -> Result<Value, ClassError> {
        let bound = self.super_method(name)?;
        bound.call(self, args)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Super members
// ─────────────────────────────────────────────────────────────────────────────

/// A parent method paired with the class that owns it.
///
/// Calling it through a context runs it against that context's receiver with
/// the owner as home, so nested super calls keep climbing.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    method: Method,
    home: ClassId,
}

impl BoundMethod {
    /// Returns the underlying method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the class that owns the method.
    #[must_use]
    pub fn home(&self) -> ClassId {
        self.home
    }

    /// Invokes the method on `ctx`'s receiver.
    ///
    /// # Errors
    ///
    /// Propagates the method's errors.
    pub fn call(&self, ctx: &mut Context<'_>, args: &[Value]) -> Result<Value, ClassError> {
        self.method.call(&mut ctx.rehome(self.home), args)
    }
}

/// Result of a lenient super lookup.
#[derive(Debug, Clone)]
pub enum SuperMember {
    /// A callable parent member.
    Method(BoundMethod),
    /// A data parent member.
    Value(Value),
}

impl SuperMember {
    /// Returns the member as a plain value.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            SuperMember::Method(bound) => Value::Method(bound.method),
            SuperMember::Value(value) => value,
        }
    }
}
