//! Integration tests for the log router
//!
//! These tests verify:
//! - Level gating at the logger and at the handler
//! - Handler ordering and propagation up the logger tree
//! - Filter chains and formatter behavior
//! - Sink failure isolation
//! - Thread safety of file output
//! - Declarative configuration

use log_router::prelude::*;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

fn quiet_registry() -> Registry {
    Registry::builder().last_resort(None).build().unwrap()
}

fn memory_handler(name: &str, template: &str) -> (Arc<Handler>, MemoryBuffer) {
    let sink = MemorySink::new();
    let buffer = sink.buffer();
    let handler = Handler::builder(sink)
        .name(name)
        .formatter(TemplateFormatter::new(template).expect("valid template"))
        .build();
    (handler, buffer)
}

#[test]
fn test_info_logger_emits_only_error() {
    let registry = quiet_registry();
    let app = registry.get_logger("app").unwrap();
    app.set_level(Level::Info);
    let (handler, buffer) = memory_handler("console", "{level}:{message}");
    handler.set_level(Level::Error);
    app.add_handler(Arc::clone(&handler)).unwrap();

    app.info("start");
    assert_eq!(buffer.write_count(), 0);
    assert_eq!(handler.metrics().below_level(), 1);

    app.error("boom");
    assert_eq!(buffer.lines(), vec!["ERROR:boom"]);
    assert_eq!(buffer.write_count(), 1);
}

#[test]
fn test_debug_below_logger_level_never_reaches_handler() {
    let registry = quiet_registry();
    let app = registry.get_logger("app").unwrap();
    app.set_level(Level::Info);
    let (handler, buffer) = memory_handler("console", "{level}:{message}");
    app.add_handler(Arc::clone(&handler)).unwrap();

    app.debug("boom");

    assert!(buffer.is_empty());
    assert_eq!(handler.metrics().below_level(), 0);
}

/// Appends each formatted record to a log shared by several sinks
struct OrderSink {
    name: String,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Sink for OrderSink {
    fn write(&mut self, text: &str) -> log_router::Result<()> {
        self.seen.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn flush(&mut self) -> log_router::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn order_handler(label: &str, seen: &Arc<Mutex<Vec<String>>>) -> Arc<Handler> {
    let sink = OrderSink {
        name: label.to_string(),
        seen: Arc::clone(seen),
    };
    Handler::builder(sink)
        .formatter(TemplateFormatter::new(format!("{} {{message}}", label)).unwrap())
        .build()
}

#[test]
fn test_handlers_run_in_attachment_order() {
    let registry = quiet_registry();
    let app = registry.get_logger("app").unwrap();
    app.set_level(Level::Debug);

    let seen = Arc::new(Mutex::new(Vec::new()));
    app.add_handler(order_handler("A", &seen)).unwrap();
    app.add_handler(order_handler("B", &seen)).unwrap();

    app.info("x");
    app.info("y");

    assert_eq!(*seen.lock().unwrap(), vec!["A x", "B x", "A y", "B y"]);
}

#[test]
fn test_propagation_child_parent_root_order() {
    let registry = quiet_registry();
    registry.root().set_level(Level::Debug);

    let seen = Arc::new(Mutex::new(Vec::new()));
    registry
        .get_logger("a.b")
        .unwrap()
        .add_handler(order_handler("child", &seen))
        .unwrap();
    registry
        .get_logger("a")
        .unwrap()
        .add_handler(order_handler("parent", &seen))
        .unwrap();
    registry.root().add_handler(order_handler("root", &seen)).unwrap();

    registry.get_logger("a.b").unwrap().info("hello");

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["child hello", "parent hello", "root hello"]
    );
}

#[test]
fn test_propagation_stops_at_logger() {
    let registry = quiet_registry();
    registry.root().set_level(Level::Debug);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let parent = registry.get_logger("svc").unwrap();
    let child = registry.get_logger("svc.worker").unwrap();
    child.add_handler(order_handler("child", &seen)).unwrap();
    parent.add_handler(order_handler("parent", &seen)).unwrap();
    registry.root().add_handler(order_handler("root", &seen)).unwrap();

    parent.set_propagate(false);
    child.info("stopped at svc");

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["child stopped at svc", "parent stopped at svc"]
    );
}

#[test]
fn test_ancestor_level_does_not_regate_propagated_records() {
    let registry = quiet_registry();
    let (root_h, root_buf) = memory_handler("root", "{name} {message}");
    registry.root().add_handler(root_h).unwrap();
    registry.root().set_level(Level::Critical);

    let child = registry.get_logger("noisy").unwrap();
    child.set_level(Level::Debug);
    child.debug("still delivered");

    assert_eq!(root_buf.lines(), vec!["noisy still delivered"]);
}

#[test]
fn test_handler_level_drops_below_threshold() {
    let registry = quiet_registry();
    let app = registry.get_logger("app").unwrap();
    app.set_level(Level::Debug);
    let (handler, buffer) = memory_handler("warn-only", "{message}");
    handler.set_level(Level::Warning);
    app.add_handler(Arc::clone(&handler)).unwrap();

    app.info("dropped");
    app.warning("kept");

    assert_eq!(buffer.lines(), vec!["kept"]);
    assert_eq!(handler.metrics().below_level(), 1);
}

#[test]
fn test_filter_chain_short_circuits() {
    let registry = quiet_registry();
    let app = registry.get_logger("app").unwrap();
    app.set_level(Level::Debug);

    let second_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&second_calls);
    let (handler, buffer) = memory_handler("filtered", "{message}");
    handler.add_filter(FnFilter::new(|record: &LogRecord| record.level() >= Level::Warning));
    handler.add_filter(FnFilter::new(move |_: &LogRecord| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    }));
    app.add_handler(Arc::clone(&handler)).unwrap();

    app.info("rejected by the first filter");
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    assert!(buffer.is_empty());
    assert_eq!(handler.metrics().filtered(), 1);

    app.error("passes both");
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(buffer.lines(), vec!["passes both"]);
}

#[test]
fn test_formatter_is_idempotent() {
    let formatter = TemplateFormatter::new("[{timestamp}] {level} {name} {message} {extra}").unwrap();
    let record = LogRecord::new(Level::Info, "app", "same input")
        .with_extra(Extra::new().with("user", "alice").with("attempt", 2));

    assert_eq!(formatter.format(&record), formatter.format(&record));

    let json = JsonFormatter::new();
    assert_eq!(json.format(&record), json.format(&record));
}

#[test]
fn test_failing_sink_does_not_affect_others() {
    let errors = ErrorChannel::new(16);
    let registry = Registry::builder()
        .last_resort(None)
        .error_channel(errors.clone())
        .build()
        .unwrap();
    let app = registry.get_logger("app").unwrap();
    app.set_level(Level::Info);

    let broken = MemorySink::new();
    let broken_buf = broken.buffer();
    broken_buf.set_failing(true);
    let broken = Handler::builder(broken)
        .name("broken")
        .formatter(TemplateFormatter::message_only())
        .error_channel(errors.clone())
        .build();
    let (healthy, healthy_buf) = memory_handler("healthy", "{message}");

    app.add_handler(Arc::clone(&broken)).unwrap();
    app.add_handler(healthy).unwrap();

    app.error("must arrive");

    assert_eq!(healthy_buf.lines(), vec!["must arrive"]);
    assert_eq!(broken.metrics().sink_failures(), 1);

    let failures = errors.drain();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].handler, "broken");
    assert_eq!(failures[0].logger, "app");
    assert!(failures[0].error.is_sink());
}

#[test]
fn test_log_injection_is_escaped() {
    let registry = quiet_registry();
    let app = registry.get_logger("app").unwrap();
    let (handler, buffer) = memory_handler("console", "{level} {message}");
    app.add_handler(handler).unwrap();

    app.error("User login\nERROR fake entry\r\tindented");

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0], "ERROR User login\\nERROR fake entry\\r\\tindented");
}

#[test]
fn test_deferred_message_arguments() {
    let registry = quiet_registry();
    let app = registry.get_logger("app").unwrap();
    let (handler, buffer) = memory_handler("console", "{message}");
    app.add_handler(handler).unwrap();

    app.error(Message::new("user {} failed {} times").arg("bob").arg(3));
    assert_eq!(buffer.lines(), vec!["user bob failed 3 times"]);
}

#[test]
fn test_extra_fields_in_templates_and_json() {
    let registry = quiet_registry();
    let app = registry.get_logger("api").unwrap();
    let (text, text_buf) = memory_handler("text", "{message} user={user} trace={trace_id}");
    let json_sink = MemorySink::new();
    let json_buf = json_sink.buffer();
    let json = Handler::builder(json_sink)
        .formatter(JsonFormatter::new())
        .build();
    app.add_handler(text).unwrap();
    app.add_handler(json).unwrap();

    app.log_with(Level::Error, "denied", Extra::new().with("user", "carol").with("status", 403));

    assert_eq!(text_buf.lines(), vec!["denied user=carol trace=-"]);
    let value: serde_json::Value = serde_json::from_str(&json_buf.lines()[0]).unwrap();
    assert_eq!(value["level"], "ERROR");
    assert_eq!(value["logger"], "api");
    assert_eq!(value["message"], "denied");
    assert_eq!(value["user"], "carol");
    assert_eq!(value["status"], 403);
}

#[test]
fn test_handler_shared_between_loggers() {
    let registry = quiet_registry();
    let (handler, buffer) = memory_handler("shared", "{name}:{message}");
    let web = registry.get_logger("web").unwrap();
    let db = registry.get_logger("db").unwrap();
    web.add_handler(Arc::clone(&handler)).unwrap();
    db.add_handler(Arc::clone(&handler)).unwrap();

    web.error("a");
    db.error("b");

    assert_eq!(buffer.lines(), vec!["web:a", "db:b"]);
    assert_eq!(registry.attached_handlers().len(), 1);
}

#[test]
fn test_concurrent_file_writes_keep_whole_lines() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("concurrent.log");

    let registry = quiet_registry();
    let logger = registry.get_logger("workers").unwrap();
    logger.set_level(Level::Info);
    let handler = Handler::builder(FileSink::new(&log_file).unwrap())
        .formatter(TemplateFormatter::new("{name} {message}").unwrap())
        .auto_flush(false)
        .build();
    logger.add_handler(handler).unwrap();

    let threads = 8;
    let per_thread = 200;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..per_thread {
                    logger.info(format!("thread-{} message-{} {}", t, i, "x".repeat(64)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    registry.shutdown().unwrap();

    let content = fs::read_to_string(&log_file).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), threads * per_thread);
    for line in lines {
        assert!(line.starts_with("workers thread-"), "spliced line: {}", line);
        assert!(line.ends_with(&"x".repeat(64)), "truncated line: {}", line);
    }
}

#[test]
fn test_closed_handler_reports_instead_of_writing() {
    let errors = ErrorChannel::new(8);
    let registry = Registry::builder()
        .last_resort(None)
        .error_channel(errors.clone())
        .build()
        .unwrap();
    let app = registry.get_logger("app").unwrap();
    let sink = MemorySink::new();
    let buffer = sink.buffer();
    let handler = Handler::builder(sink)
        .formatter(TemplateFormatter::message_only())
        .error_channel(errors.clone())
        .build();
    app.add_handler(Arc::clone(&handler)).unwrap();

    handler.close().unwrap();
    handler.close().unwrap();
    app.error("after close");

    assert!(buffer.is_closed());
    assert!(buffer.is_empty());
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_config_from_json() {
    let temp_dir = TempDir::new().unwrap();
    let log_file = temp_dir.path().join("app.log");
    let json = format!(
        r#"{{
            "formatters": {{
                "plain": {{ "kind": "template", "template": "{{level}}:{{message}}" }},
                "structured": {{ "kind": "json", "timestamp": "unix_millis" }}
            }},
            "filters": {{
                "errors_only": {{ "kind": "level_range", "min": "ERROR" }}
            }},
            "handlers": {{
                "memory": {{ "sink": {{ "kind": "memory" }}, "formatter": "plain" }},
                "file": {{
                    "sink": {{ "kind": "file", "path": {path} }},
                    "formatter": "structured",
                    "filters": ["errors_only"]
                }}
            }},
            "loggers": {{
                "app": {{ "level": "INFO", "handlers": ["memory", "file"] }}
            }}
        }}"#,
        path = serde_json::to_string(&log_file).unwrap()
    );

    let registry = quiet_registry();
    let applied = RouterConfig::from_json_str(&json)
        .unwrap()
        .apply(&registry)
        .unwrap();

    let app = registry.get_logger("app").unwrap();
    app.info("started");
    app.error("boom");
    registry.flush_all().unwrap();

    assert_eq!(
        applied.memory_buffer("memory").unwrap().lines(),
        vec!["INFO:started", "ERROR:boom"]
    );
    let content = fs::read_to_string(&log_file).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);
    let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(value["message"], "boom");
    assert!(value["timestamp"].is_number());
}

#[test]
fn test_global_registry_helpers() {
    let logger = log_router::get_logger("integration.global").unwrap();
    assert_eq!(logger.parent().unwrap().name(), "integration");
    assert_eq!(logger.registry().root(), log_router::root_logger());
}
