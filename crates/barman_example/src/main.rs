//! Example widget catalog CLI.
//!
//! Builds the catalog and renders one instance of each widget.
//!
//! # Usage
//!
//! ```bash
//! widgets [eager|lazy]
//! ```
//!
//! Log output is controlled with `RUST_LOG` (default `info`); use
//! `RUST_LOG=barman_class=debug` to see class registration.

use barman_class::prelude::*;
use barman_example::{build_catalog, render};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let policy = match std::env::args().nth(1) {
        None => ConflictPolicy::default(),
        Some(arg) => match serde_json::from_value::<ConflictPolicy>(serde_json::Value::String(arg.clone())) {
            Ok(policy) => policy,
            Err(_) => {
                tracing::error!(policy = %arg, "expected `eager` or `lazy`");
                std::process::exit(1);
            }
        },
    };

    let mut registry = ClassRegistry::new();
    let catalog = match build_catalog(&mut registry, policy) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, "failed to build catalog");
            std::process::exit(1);
        }
    };
    tracing::info!(policy = ?policy, classes = registry.len(), "catalog built");

    let widgets = [
        ("button", Some(catalog.button)),
        ("icon_button", Some(catalog.icon_button)),
        ("broken_button", catalog.broken_button),
    ];
    for (id, class) in widgets {
        let Some(class) = class else { continue };
        let name = registry.name(class).unwrap_or("anonymous");
        match render(&registry, class, id) {
            Ok(output) => tracing::info!(class = name, %output, "rendered"),
            Err(e) => tracing::warn!(class = name, error = %e, kind = ?e.kind(), "render failed"),
        }
    }

    if let Ok(version) = registry.get_static(catalog.widget, "version") {
        tracing::info!(%version, "widget version");
    }
}
