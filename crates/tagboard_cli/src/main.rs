//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `tagboard_core` wiring.
//! - Keep output deterministic for quick local sanity checks.

use tagboard_core::{Engine, Intent, MemoryBackend, ReactiveStore};

fn main() {
    println!("tagboard_core version={}", tagboard_core::core_version());

    let backend = MemoryBackend::new();
    let today = backend.today();
    let mut engine = Engine::new(backend, ReactiveStore::new(), today);

    if let Err(error) = engine.signin("admin", "admin123") {
        eprintln!("signin failed: {error}");
        std::process::exit(1);
    }
    if let Err(error) = engine.load() {
        eprintln!("load failed: {error}");
        std::process::exit(1);
    }

    let created = engine.apply(Intent::CreateNote {
        text: "!tomorrow plan the #demo with @alice".to_string(),
        date: None,
    });
    match created {
        Ok(applied) => println!("created={applied:?}"),
        Err(error) => {
            eprintln!("create failed: {error}");
            std::process::exit(1);
        }
    }

    if let Err(error) = engine.apply(Intent::OpenView {
        query: "#demo".to_string(),
    }) {
        eprintln!("open view failed: {error}");
        std::process::exit(1);
    }

    for view in engine.views().iter() {
        println!(
            "view query={} active={} notes={}",
            view.query,
            view.active,
            view.notes.len()
        );
    }
}
