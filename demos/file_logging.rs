//! File logging example
//!
//! Demonstrates routing to both console and file handlers with different
//! thresholds, and reading sink failures from an error channel.
//!
//! Run with: cargo run --example file_logging

use log_router::prelude::*;

fn main() -> Result<()> {
    println!("=== Log Router - File Logging Example ===\n");

    let errors = ErrorChannel::new(32);
    let registry = Registry::builder()
        .root_level(Level::Debug)
        .error_channel(errors.clone())
        .build()?;
    let app = registry.get_logger("app")?;

    // Console shows warnings and above, the file gets everything
    let console = Handler::builder(ConsoleSink::stderr())
        .level(Level::Warning)
        .formatter(TemplateFormatter::new("{level:<8} {name}: {message}")?)
        .error_channel(errors.clone())
        .build();
    let file = Handler::builder(FileSink::truncate("application.log")?)
        .formatter(LogfmtFormatter::new().with_timestamp_format(TimestampFormat::UnixMillis))
        .auto_flush(false)
        .error_channel(errors.clone())
        .build();
    app.add_handler(console)?;
    app.add_handler(file)?;

    println!("1. Logging to both console and file:");
    app.info("Application started");
    app.debug("Loading configuration...");
    app.warning("Using default settings for some options");
    app.error("Failed to load optional plugin");

    println!("\n2. Performing some operations:");
    let worker = app.get_child("worker")?;
    for i in 1..=5 {
        worker.info(Message::new("Processing item {}/5").arg(i));
        if i == 3 {
            worker.warning("Item 3 took longer than expected");
        }
    }

    registry.shutdown()?;

    println!("\n3. Sink failures reported while logging:");
    for failure in errors.drain() {
        println!("  {}", failure);
    }

    println!("\nLog file written to: application.log");
    Ok(())
}
