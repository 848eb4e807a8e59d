//! Declarative configuration example
//!
//! Builds formatters, filters, handlers and loggers from one JSON document.
//!
//! Run with: cargo run --example dict_config

use log_router::prelude::*;

const CONFIG: &str = r#"{
    "formatters": {
        "console": { "kind": "template", "template": "{level:<8} {name} - {message} {extra}", "colors": true },
        "json": { "kind": "json", "timestamp": "iso8601_micros" }
    },
    "filters": {
        "sampled": { "kind": "sample", "every_nth": 10, "always_keep": "WARNING" }
    },
    "handlers": {
        "console": { "sink": { "kind": "console", "stream": "stdout" }, "formatter": "console" },
        "metrics": {
            "sink": { "kind": "memory" },
            "formatter": "json",
            "filters": ["sampled"]
        }
    },
    "loggers": {
        "app": { "level": "INFO", "handlers": ["console"] },
        "app.metrics": { "level": "DEBUG", "handlers": ["metrics"], "propagate": false }
    },
    "root": { "level": "WARNING" }
}"#;

fn main() -> Result<()> {
    println!("=== Log Router - Declarative Configuration Example ===\n");

    let registry = Registry::new();
    let applied = RouterConfig::from_json_str(CONFIG)?.apply(&registry)?;

    let app = registry.get_logger("app")?;
    app.info("configured from JSON");
    app.debug("hidden below INFO");

    let metrics = registry.get_logger("app.metrics")?;
    for i in 0..30 {
        metrics.log_with(Level::Debug, "sample", Extra::new().with("n", i));
    }
    metrics.warning("always kept by the sampler");

    if let Some(buffer) = applied.memory_buffer("metrics") {
        println!("\nSampled metrics records ({}):", buffer.len());
        for line in buffer.lines() {
            println!("  {}", line);
        }
    }

    registry.shutdown()?;
    Ok(())
}
