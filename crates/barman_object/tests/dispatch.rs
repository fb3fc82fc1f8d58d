//! Tests for member dispatch against a minimal class arena.
//!
//! These tests verify:
//! - Field shadowing and prototype lookup
//! - Home-relative super resolution
//! - Marker members invoked through a context

use std::sync::Arc;

use barman_object::prelude::*;

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Parent index plus prototype; index 0 is the root.
struct Arena {
    classes: Vec<(ClassId, Arc<PropertySet>, PropertySet)>,
}

impl Arena {
    fn new() -> Self {
        Self {
            classes: vec![(ClassId::NIL, Arc::new(PropertySet::new()), PropertySet::new())],
        }
    }

    fn add(&mut self, parent: ClassId, own: PropertySet) -> ClassId {
        let prototype = mix(Some(&self.classes[parent.index()].1), &[], &own).unwrap();
        self.classes.push((parent, Arc::new(prototype), PropertySet::new()));
        ClassId::new(self.classes.len() - 1)
    }
}

impl ClassResolver for Arena {
    fn prototype(&self, class: ClassId) -> Result<&Arc<PropertySet>, ClassError> {
        self.classes
            .get(class.index())
            .map(|entry| &entry.1)
            .ok_or(ClassError::UnknownClass(class))
    }

    fn parent(&self, class: ClassId) -> Result<ClassId, ClassError> {
        self.classes
            .get(class.index())
            .map(|entry| entry.0)
            .ok_or(ClassError::UnknownClass(class))
    }

    fn statics(&self, class: ClassId) -> Result<&PropertySet, ClassError> {
        self.classes
            .get(class.index())
            .map(|entry| &entry.2)
            .ok_or(ClassError::UnknownClass(class))
    }
}

fn constant(value: &'static str) -> Method {
    Method::new("constant", move |_ctx, _args| Ok(Value::from(value)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Lookup
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn fields_shadow_prototype_members() {
    let mut arena = Arena::new();
    let class = arena.add(ClassId::NIL, property_set! { "color" => "red" });

    let mut instance = Instance::new(class);
    let mut ctx = instance.context(&arena);

    assert_eq!(ctx.get("color").unwrap(), Value::from("red"));
    ctx.set("color", "blue").unwrap();
    assert_eq!(ctx.get("color").unwrap(), Value::from("blue"));
    assert_eq!(ctx.get("missing").unwrap(), Value::Undefined);

    assert_eq!(instance.field("color"), Some(&Value::from("blue")));
    assert_eq!(arena.prototype(class).unwrap().lookup("color"), Some(&Property::value("red")));
}

#[test]
fn resolve_reports_the_owning_class() {
    let mut arena = Arena::new();
    let a = arena.add(ClassId::NIL, property_set! { "x" => 1 });
    let b = arena.add(a, property_set! { "y" => 2 });

    let (owner, _) = arena.resolve(b, "x").unwrap().unwrap();
    assert_eq!(owner, a);
    assert!(arena.resolve(b, "z").unwrap().is_none());
    assert_eq!(
        arena.resolve(ClassId::new(40), "x").unwrap_err(),
        ClassError::UnknownClass(ClassId::new(40))
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Super
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn inherited_method_supers_from_its_own_class() {
    let mut arena = Arena::new();
    let a = arena.add(ClassId::NIL, property_set! { "name" => constant("a") });
    let b = arena.add(
        a,
        property_set! {
            "name" => Method::new("name", |ctx, args| {
                let parent = ctx.call_super("name", args)?;
                Ok(Value::from(format!("{parent}b")))
            })
        },
    );
    // `c` inherits `b`'s method; its super must still be `a`'s.
    let c = arena.add(b, PropertySet::new());

    let mut instance = Instance::new(c);
    assert_eq!(instance.context(&arena).call("name", &[]).unwrap(), Value::from("ab"));
}

#[test]
fn bound_super_methods_keep_their_home() {
    let mut arena = Arena::new();
    let a = arena.add(ClassId::NIL, property_set! { "v" => constant("a") });
    let b = arena.add(a, property_set! { "v" => constant("b") });

    let mut instance = Instance::new(b);
    let mut ctx = instance.context(&arena);
    let bound = ctx.super_method("v").unwrap();

    assert_eq!(bound.home(), a);
    assert_eq!(bound.call(&mut ctx, &[]).unwrap(), Value::from("a"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Markers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn markers_fail_when_invoked() {
    let mut arena = Arena::new();
    let merged = merge(&[
        Fragment::from(PropertySet::named("Left").with("draw", constant("l"))),
        Fragment::from(PropertySet::named("Right").with("draw", constant("r"))),
    ]);
    let class = arena.add(ClassId::NIL, property_set! { "pending" => required() });
    let lazy = {
        let prototype = compose(Some(arena.prototype(class).unwrap()), &[], &merged);
        arena.classes.push((class, Arc::new(prototype), PropertySet::new()));
        ClassId::new(arena.classes.len() - 1)
    };

    let mut instance = Instance::new(lazy);
    let mut ctx = instance.context(&arena);

    assert_eq!(ctx.call("pending", &[]).unwrap_err(), ClassError::RequiredImplementation);
    assert_eq!(
        ctx.call("draw", &[]).unwrap_err(),
        ClassError::merge_conflict("draw", &["Left".to_string(), "Right".to_string()])
    );

    let draw = ctx.get("draw").unwrap();
    let err = draw.as_method().unwrap().call(&mut ctx, &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}
