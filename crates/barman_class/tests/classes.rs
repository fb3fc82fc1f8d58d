//! Tests for class creation, instances and super delegation.
//!
//! These tests verify:
//! - Overriding and super delegation (`call_super`, `super_member`)
//! - Super chains of arbitrary depth
//! - Static versus instance members
//! - Constructor synthesis, forwarding and validation
//! - Accessors, read-only members and marker invocation

use std::sync::Arc;

use barman_class::prelude::*;

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn returns(name: &str, value: &'static str) -> Method {
    Method::new(name, move |_ctx, _args| Ok(Value::from(value)))
}

fn call(registry: &ClassRegistry, class: ClassId, name: &str) -> Result<Value, ClassError> {
    let mut instance = registry.instantiate(class, &[])?;
    instance.context(registry).call(name, &[])
}

// ─────────────────────────────────────────────────────────────────────────────
// Overriding and super
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn child_overrides_and_reaches_parent_through_super() {
    let mut registry = ClassRegistry::new();
    let base = create(&mut registry, ClassSpec::new().with_method("greet", returns("greet", "hi"))).unwrap();
    let child = base
        .extend(&mut registry, ClassSpec::new().with_method("greet", returns("greet", "hello")))
        .unwrap();

    let mut instance = child.instantiate(&registry, &[]).unwrap();
    let mut ctx = instance.context(&registry);

    assert_eq!(ctx.call("greet", &[]).unwrap(), Value::from("hello"));
    assert_eq!(ctx.call_super("greet", &[]).unwrap(), Value::from("hi"));
    assert!(registry.is_instance_of(&instance, base));
}

#[test]
fn super_prototype_is_the_parent_prototype() {
    let mut registry = ClassRegistry::new();
    let a = create(&mut registry, ClassSpec::new()).unwrap();
    let b = a.extend(&mut registry, ClassSpec::new()).unwrap();
    let c = b.extend(&mut registry, ClassSpec::new()).unwrap();

    let mut instance = c.instantiate(&registry, &[]).unwrap();
    let ctx = instance.context(&registry);
    assert!(Arc::ptr_eq(&ctx.super_prototype().unwrap(), registry.prototype(b).unwrap()));

    assert!(Arc::ptr_eq(&c.super_prototype(&registry).unwrap(), registry.prototype(b).unwrap()));
    assert!(Arc::ptr_eq(&b.super_prototype(&registry).unwrap(), registry.prototype(a).unwrap()));
    assert!(Arc::ptr_eq(
        &a.super_prototype(&registry).unwrap(),
        registry.prototype(ClassId::NIL).unwrap()
    ));
}

#[test]
fn nil_super_is_itself() {
    let registry = ClassRegistry::new();
    let nil = registry.nil();
    assert!(Arc::ptr_eq(
        &nil.super_prototype(&registry).unwrap(),
        registry.prototype(nil).unwrap()
    ));
}

/// Each level appends its own tag after delegating to its parent.
fn tagged(tag: &'static str) -> Method {
    Method::new("describe", move |ctx, args| {
        let inherited = ctx.call_super("describe", args)?;
        Ok(Value::from(format!("{inherited}>{tag}")))
    })
}

#[test]
fn super_chain_resolves_at_every_depth() {
    let mut registry = ClassRegistry::new();
    let root = create(&mut registry, ClassSpec::new().with_method("describe", returns("describe", "root"))).unwrap();
    let a = root.extend(&mut registry, ClassSpec::new().with_method("describe", tagged("a"))).unwrap();
    // `b` inherits `describe` from `a` without overriding it.
    let b = a.extend(&mut registry, ClassSpec::new()).unwrap();
    let c = b.extend(&mut registry, ClassSpec::new().with_method("describe", tagged("c"))).unwrap();

    assert_eq!(call(&registry, a, "describe").unwrap(), Value::from("root>a"));
    assert_eq!(call(&registry, b, "describe").unwrap(), Value::from("root>a"));
    assert_eq!(call(&registry, c, "describe").unwrap(), Value::from("root>a>c"));
}

#[test]
fn super_member_is_lenient_and_super_method_is_strict() {
    let mut registry = ClassRegistry::new();
    let base = create(&mut registry, ClassSpec::new().with_method("label", "base")).unwrap();
    let child = base.extend(&mut registry, ClassSpec::new()).unwrap();

    let mut instance = child.instantiate(&registry, &[]).unwrap();
    let mut ctx = instance.context(&registry);

    assert_eq!(ctx.super_member("label").unwrap().into_value(), Value::from("base"));
    assert_eq!(
        ctx.super_method("label").unwrap_err(),
        ClassError::not_callable("label")
    );
}

#[test]
fn unknown_super_member_is_a_reference_error() {
    let mut registry = ClassRegistry::new();
    let class = create(&mut registry, ClassSpec::new()).unwrap();

    let mut instance = class.instantiate(&registry, &[]).unwrap();
    let err = instance.context(&registry).call_super("missing", &[]).unwrap_err();

    assert_eq!(err.to_string(), "The property missing is not defined");
    assert_eq!(err.kind(), ErrorKind::Reference);
}

// ─────────────────────────────────────────────────────────────────────────────
// Statics
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn statics_live_on_the_class_only() {
    let mut registry = ClassRegistry::new();
    let class = create(&mut registry, ClassSpec::new().with_static("version", "1.0")).unwrap();

    assert_eq!(registry.get_static(class, "version").unwrap(), Value::from("1.0"));

    let mut instance = class.instantiate(&registry, &[]).unwrap();
    assert_eq!(instance.context(&registry).get("version").unwrap(), Value::Undefined);
}

#[test]
fn static_methods_receive_the_class() {
    let mut registry = ClassRegistry::new();
    let class = create(
        &mut registry,
        ClassSpec::new().with_static(
            "which",
            Method::new("which", |ctx, _args| Ok(Value::Class(ctx.class()))),
        ),
    )
    .unwrap();

    assert_eq!(registry.call_static(class, "which", &[]).unwrap(), Value::Class(class));
    assert_eq!(
        Context::for_class(&registry, class).set("version", "2.0").unwrap_err(),
        ClassError::read_only("version")
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Constructors
// ─────────────────────────────────────────────────────────────────────────────

fn storing_constructor() -> Method {
    Method::new("constructor", |ctx, args| {
        let name = args.first().cloned().unwrap_or_default();
        ctx.set("name", name)?;
        Ok(Value::Undefined)
    })
}

#[test]
fn implicit_constructor_forwards_arguments() {
    let mut registry = ClassRegistry::new();
    let base = create(&mut registry, ClassSpec::new().with_method("constructor", storing_constructor())).unwrap();
    let child = base.extend(&mut registry, ClassSpec::new()).unwrap();
    let grandchild = child.extend(&mut registry, ClassSpec::new()).unwrap();

    let instance = grandchild.instantiate(&registry, &[Value::from("ada")]).unwrap();
    assert_eq!(instance.field("name"), Some(&Value::from("ada")));
    assert_eq!(instance.to_json(), serde_json::json!({ "name": "ada" }));
}

#[test]
fn explicit_constructor_can_chain_with_super() {
    let mut registry = ClassRegistry::new();
    let base = create(&mut registry, ClassSpec::new().with_method("constructor", storing_constructor())).unwrap();
    let child = base
        .extend(
            &mut registry,
            ClassSpec::new().with_method(
                "constructor",
                Method::new("constructor", |ctx, args| {
                    ctx.call_super("constructor", args)?;
                    ctx.set("kind", "child")?;
                    Ok(Value::Undefined)
                }),
            ),
        )
        .unwrap();

    let instance = child.instantiate(&registry, &[Value::from("bob")]).unwrap();
    assert_eq!(instance.field("name"), Some(&Value::from("bob")));
    assert_eq!(instance.field("kind"), Some(&Value::from("child")));
}

#[test]
fn non_callable_constructor_is_rejected() {
    let mut registry = ClassRegistry::new();
    let err = create(&mut registry, ClassSpec::new().with_method("constructor", 42)).unwrap_err();

    assert_eq!(err, ClassError::ConstructorNotCallable);
    assert_eq!(registry.len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Members
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn accessors_run_against_the_instance() {
    let getter = Method::new("get_double", |ctx, _args| {
        let base = ctx.get("base")?.as_number().unwrap_or_default();
        Ok(Value::from(base * 2.0))
    });
    let setter = Method::new("set_double", |ctx, args| {
        let value = args.first().and_then(Value::as_number).unwrap_or_default();
        ctx.set("base", value / 2.0)?;
        Ok(Value::Undefined)
    });

    let mut registry = ClassRegistry::new();
    let class = create(
        &mut registry,
        ClassSpec::new().with_method("double", Property::accessor(Some(getter), Some(setter))),
    )
    .unwrap();

    let mut instance = class.instantiate(&registry, &[]).unwrap();
    let mut ctx = instance.context(&registry);
    ctx.set("double", 10.0).unwrap();

    assert_eq!(ctx.get("base").unwrap(), Value::from(5.0));
    assert_eq!(ctx.get("double").unwrap(), Value::from(10.0));
}

#[test]
fn read_only_members_reject_assignment() {
    let mut registry = ClassRegistry::new();
    let class = create(
        &mut registry,
        ClassSpec::new().with_method(
            "id",
            Property::value(7).with_attributes(Attributes::DATA.with_writable(false)),
        ),
    )
    .unwrap();

    let mut instance = class.instantiate(&registry, &[]).unwrap();
    let err = instance.context(&registry).set("id", 8).unwrap_err();
    assert_eq!(err, ClassError::read_only("id"));
}

#[test]
fn calling_missing_and_data_members_fails() {
    let mut registry = ClassRegistry::new();
    let class = create(&mut registry, ClassSpec::new().with_method("size", 3)).unwrap();

    assert_eq!(
        call(&registry, class, "nothing").unwrap_err(),
        ClassError::property_not_defined("nothing")
    );
    assert_eq!(call(&registry, class, "size").unwrap_err(), ClassError::not_callable("size"));
}

#[test]
fn required_member_fails_when_invoked() {
    let mut registry = ClassRegistry::new();
    let shape = create(&mut registry, ClassSpec::new().with_method("area", required())).unwrap();
    let square = shape
        .extend(
            &mut registry,
            ClassSpec::new().with_method("area", Method::new("area", |_ctx, _args| Ok(Value::from(4)))),
        )
        .unwrap();

    let err = call(&registry, shape, "area").unwrap_err();
    assert_eq!(err.to_string(), "An implementation is required");
    assert_eq!(err.kind(), ErrorKind::Required);

    assert_eq!(call(&registry, square, "area").unwrap(), Value::from(4));
}

#[test]
fn named_classes_can_be_found() {
    let mut registry = ClassRegistry::new();
    let class = create(&mut registry, ClassSpec::named("Widget")).unwrap();

    assert_eq!(registry.find("Widget"), Some(class));
    assert_eq!(registry.name(class), Some("Widget"));
    assert_eq!(registry.find("Nil"), Some(ClassId::NIL));
}

// ─────────────────────────────────────────────────────────────────────────────
// Laws
// ─────────────────────────────────────────────────────────────────────────────

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every level of a chain, overriding or not, sees its parent's result.
        #[test]
        fn prop_super_chain_of_any_depth(overrides in prop::collection::vec(any::<bool>(), 1..12)) {
            let mut registry = ClassRegistry::new();
            let mut class = create(
                &mut registry,
                ClassSpec::new().with_method("describe", returns("describe", "root")),
            )
            .unwrap();

            let mut expected = String::from("root");
            for (depth, overrides) in overrides.iter().enumerate() {
                let mut spec = ClassSpec::new();
                if *overrides {
                    let tag = depth.to_string();
                    expected = format!("{expected}>{tag}");
                    spec = spec.with_method(
                        "describe",
                        Method::new("describe", move |ctx, args| {
                            let inherited = ctx.call_super("describe", args)?;
                            Ok(Value::from(format!("{inherited}>{tag}")))
                        }),
                    );
                }
                class = class.extend(&mut registry, spec).unwrap();
            }

            prop_assert_eq!(call(&registry, class, "describe").unwrap(), Value::from(expected));
            prop_assert_eq!(registry.ancestors(class).count(), overrides.len() + 2);
        }
    }
}
