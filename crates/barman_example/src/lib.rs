//! Example widget catalog built with Barman.
//!
//! Widgets share behavior through traits rather than a deep hierarchy:
//!
//! ```text
//! Nil ── Widget ──┬── Button      (Clickable + Labelled)
//!                 └── IconButton  (Clickable + Labelled + Iconic, `render` resolved in the body)
//! ```
//!
//! `Labelled` and `Iconic` both define `render`, so `IconButton` must pick an
//! implementation. Under the lazy conflict policy the catalog also contains
//! `BrokenButton`, which leaves the clash unresolved.

use barman_class::prelude::*;

/// Ids of the classes in the catalog.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    /// Base class; stores the `id` passed to its constructor.
    pub widget: ClassId,
    /// A labelled, clickable widget.
    pub button: ClassId,
    /// A button with an icon.
    pub icon_button: ClassId,
    /// Only present under [`ConflictPolicy::Lazy`].
    pub broken_button: Option<ClassId>,
}

fn clickable() -> PropertySet {
    PropertySet::named("Clickable")
        .with("label", required())
        .with(
            "click",
            Method::new("click", |ctx, _args| {
                let label = ctx.get("label")?;
                Ok(Value::from(format!("clicked {label}")))
            }),
        )
}

fn labelled() -> PropertySet {
    PropertySet::named("Labelled").with(
        "render",
        Method::new("render", |ctx, _args| {
            let label = ctx.get("label")?;
            Ok(Value::from(format!("[{label}]")))
        }),
    )
}

fn iconic() -> PropertySet {
    PropertySet::named("Iconic").with(
        "render",
        Method::new("render", |ctx, _args| {
            let icon = ctx.get("icon")?;
            Ok(Value::from(format!("<{icon}>")))
        }),
    )
}

/// Registers the catalog's classes.
///
/// # Errors
///
/// Propagates class creation errors.
pub fn build_catalog(registry: &mut ClassRegistry, policy: ConflictPolicy) -> Result<Catalog, ClassError> {
    let config = FactoryConfig::default().with_conflict_policy(policy);

    let widget = create(
        registry,
        ClassSpec::named("Widget")
            .with_method(
                "constructor",
                Method::new("constructor", |ctx, args| {
                    ctx.set("id", args.first().cloned().unwrap_or_default())?;
                    Ok(Value::Undefined)
                }),
            )
            .with_static("version", "1.0"),
    )?;

    let button = widget.extend(
        registry,
        ClassSpec::named("Button")
            .with_factory(TraitsClassFactory::new([clickable(), labelled()]).with_config(config))
            .with_method("label", "OK"),
    )?;

    let icon_button = widget.extend(
        registry,
        ClassSpec::named("IconButton")
            .with_factory(
                TraitsClassFactory::new([clickable(), labelled(), iconic()]).with_config(config),
            )
            .with_method("label", "Save")
            .with_method("icon", "disk")
            .with_method(
                "render",
                Method::new("render", |ctx, _args| {
                    let icon = ctx.get("icon")?;
                    let label = ctx.get("label")?;
                    Ok(Value::from(format!("<{icon}> [{label}]")))
                }),
            ),
    )?;

    let broken_button = match policy {
        ConflictPolicy::Eager => None,
        ConflictPolicy::Lazy => Some(widget.extend(
            registry,
            ClassSpec::named("BrokenButton")
                .with_factory(TraitsClassFactory::new([labelled(), iconic()]).with_config(config))
                .with_method("label", "?")
                .with_method("icon", "?"),
        )?),
    };

    Ok(Catalog {
        widget,
        button,
        icon_button,
        broken_button,
    })
}

/// Instantiates `class` with `id` and renders it.
///
/// # Errors
///
/// Propagates constructor and `render` errors.
pub fn render(registry: &ClassRegistry, class: ClassId, id: &str) -> Result<String, ClassError> {
    let mut instance = class.instantiate(registry, &[Value::from(id)])?;
    let rendered = instance.context(registry).call("render", &[])?;
    Ok(rendered.to_string())
}
