//! Basic router usage example
//!
//! Demonstrates named loggers, level inheritance, propagation and filters.
//!
//! Run with: cargo run --example basic_usage

use log_router::prelude::*;
use log_router::{info, warning};

fn main() -> Result<()> {
    println!("=== Log Router - Basic Usage Example ===\n");

    let registry = Registry::global();
    let root = registry.root();
    root.set_level(Level::Debug);

    // Everything that propagates to the root ends up on stdout
    let console = Handler::builder(ConsoleSink::stdout())
        .name("console")
        .formatter(TemplateFormatter::new("[{timestamp}] [{level:<8}] {name} - {message} {extra}")?)
        .build();
    root.add_handler(console)?;

    println!("1. Logging at different levels:");
    let app = log_router::get_logger("app")?;
    app.debug("This is a debug message");
    app.info("This is an info message");
    app.warning("This is a warning message");
    app.error("This is an error message");
    app.critical("This is a critical message");

    println!("\n2. Children inherit their parent's level:");
    app.set_level(Level::Warning);
    let db = app.get_child("db")?;
    db.info("Hidden: app.db inherits WARNING from app");
    db.warning("Shown: slow query detected");

    println!("\n3. Structured fields and deferred arguments:");
    db.set_level(Level::Info);
    db.log_with(
        Level::Info,
        Message::new("query took {} ms").arg(42),
        Extra::new().with("table", "users").with("rows", 17),
    );
    info!(db, "connection pool size {}", 8);

    println!("\n4. Stopping propagation:");
    let audit = log_router::get_logger("audit")?;
    audit.set_propagate(false);
    let audit_handler = Handler::builder(ConsoleSink::stdout())
        .formatter(JsonFormatter::new())
        .filter(FieldFilter::present("user"))
        .build();
    audit.add_handler(audit_handler)?;
    audit.log_with(Level::Warning, "password changed", Extra::new().with("user", "alice"));
    warning!(audit, "dropped by the field filter: no user");

    registry.flush_all()?;
    println!("\n=== Example completed successfully ===");
    Ok(())
}
