//! Dynamic values held by property sets and instance fields.
//!
//! [`Value`] mirrors the handful of value shapes a class body needs: primitives,
//! callables ([`Method`]), nested objects and class references. Equality is
//! strict equality: primitives compare by value, methods and objects compare
//! by identity.

use core::fmt;
use std::sync::Arc;

use crate::dispatch::Context;
use crate::error::ClassError;
use crate::set::PropertySet;

// ─────────────────────────────────────────────────────────────────────────────
// ClassId
// ─────────────────────────────────────────────────────────────────────────────

/// Stable identifier of a class inside a class registry.
///
/// Ids are indices into the registry's arena. They are only meaningful for the
/// registry that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

impl ClassId {
    /// The root class every hierarchy bottoms out at.
    pub const NIL: ClassId = ClassId(0);

    /// Creates a class ID from a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns true if this is the root class.
    #[must_use]
    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class_{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Method
// ─────────────────────────────────────────────────────────────────────────────

type MethodFn = dyn Fn(&mut Context<'_>, &[Value]) -> Result<Value, ClassError> + Send + Sync;

/// A callable member.
///
/// Methods are reference counted and compare by identity: two clones of the
/// same method are equal, two methods built from identical closures are not.
/// This is what lets the merge engine tell "the same definition reached me
/// through two traits" apart from "two traits define different behavior".
///
/// # Example
///
/// ```
/// use barman_object::value::{Method, Value};
///
/// let greet = Method::new("greet", |_ctx, _args| Ok(Value::from("hi")));
/// assert_eq!(greet, greet.clone());
/// assert_ne!(greet, Method::new("greet", |_ctx, _args| Ok(Value::from("hi"))));
/// ```
#[derive(Clone)]
pub struct Method {
    name: Arc<str>,
    func: Arc<MethodFn>,
}

impl Method {
    /// Creates a method from a closure.
    ///
    /// The closure receives the invocation [`Context`] (receiver, super
    /// delegation) and the call arguments.
    pub fn new<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&mut Context<'_>, &[Value]) -> Result<Value, ClassError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Returns the method's name, used for diagnostics only.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the method.
    ///
    /// # Errors
    ///
    /// Propagates whatever error the method body returns.
    pub fn call(&self, ctx: &mut Context<'_>, args: &[Value]) -> Result<Value, ClassError> {
        (self.func)(ctx, args)
    }

    /// Returns true if both handles point at the same function.
    #[must_use]
    pub fn ptr_eq(&self, other: &Method) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({})", self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value
// ─────────────────────────────────────────────────────────────────────────────

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number (IEEE 754 double).
    Number(f64),
    /// Immutable string.
    Str(Arc<str>),
    /// Callable member.
    Method(Method),
    /// Nested object, compared by identity.
    Object(Arc<PropertySet>),
    /// Reference to a class.
    Class(ClassId),
}

impl Value {
    /// Returns true for [`Value::Undefined`].
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if the value can be invoked.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Method(_))
    }

    /// Returns the method if this value is callable.
    #[must_use]
    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Value::Method(method) => Some(method),
            _ => None,
        }
    }

    /// Returns the string slice if this value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if this value is numeric.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean if this value is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the nested object if this value is one.
    #[must_use]
    pub fn as_object(&self) -> Option<&Arc<PropertySet>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns a short name of the value's type, as used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Method(_) => "function",
            Value::Object(_) => "object",
            Value::Class(_) => "class",
        }
    }

    /// Converts a data value to JSON.
    ///
    /// Returns `None` for values that have no JSON form (undefined, methods,
    /// class references). Non-finite numbers become `null`.
    #[must_use]
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Undefined | Value::Method(_) | Value::Class(_) => None,
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::Number(n) => Some(
                serde_json::Number::from_f64(*n)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number),
            ),
            Value::Str(s) => Some(serde_json::Value::String(s.to_string())),
            Value::Object(object) => Some(object.to_json()),
        }
    }

    /// Merge equality: strict equality, except that `NaN` matches itself.
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Method(a), Value::Method(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{n:.0}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Method(method) => write!(f, "function {}", method.name()),
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Class(id) => write!(f, "{id}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<Method> for Value {
    fn from(value: Method) -> Self {
        Value::Method(value)
    }
}

impl From<PropertySet> for Value {
    fn from(value: PropertySet) -> Self {
        Value::Object(Arc::new(value))
    }
}

impl From<Arc<PropertySet>> for Value {
    fn from(value: Arc<PropertySet>) -> Self {
        Value::Object(value)
    }
}

impl From<ClassId> for Value {
    fn from(value: ClassId) -> Self {
        Value::Class(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_equality_semantics() {
        assert_eq!(Value::from("a"), Value::from("a".to_string()));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::Null, Value::Undefined);

        let a = Arc::new(PropertySet::new());
        let b = Arc::new(PropertySet::new());
        assert_eq!(Value::Object(Arc::clone(&a)), Value::Object(a));
        assert_ne!(Value::Object(b), Value::from(PropertySet::new()));
    }

    #[test]
    fn display_formats_integers_without_fraction() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(ClassId::new(4).to_string(), "class_4");
    }

    #[test]
    fn to_json_skips_non_data_values() {
        let method = Method::new("noop", |_ctx, _args| Ok(Value::Undefined));
        assert_eq!(Value::from(method).to_json(), None);
        assert_eq!(Value::Undefined.to_json(), None);
        assert_eq!(Value::from(f64::INFINITY).to_json(), Some(serde_json::Value::Null));
        assert_eq!(Value::from("x").to_json(), Some(serde_json::json!("x")));
    }
}
