//! Property-based tests for log_router using proptest

use proptest::prelude::*;
use log_router::prelude::*;

fn any_level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::Debug),
        Just(Level::Info),
        Just(Level::Warning),
        Just(Level::Error),
        Just(Level::Critical),
    ]
}

fn quiet_registry() -> Registry {
    Registry::builder().last_resort(None).build().unwrap()
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}".prop_filter("root names the root logger", |s| s != "root")
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// Names and numeric values both parse back to the same level
    #[test]
    fn test_level_name_and_value_roundtrip(level in any_level()) {
        prop_assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
        prop_assert_eq!(level.as_str().to_lowercase().parse::<Level>().unwrap(), level);
        prop_assert_eq!(Level::from_value(level.value()).unwrap(), level);
    }

    /// Ordering of levels follows their numeric values
    #[test]
    fn test_level_ordering_matches_values(a in any_level(), b in any_level()) {
        prop_assert_eq!(a.cmp(&b), a.value().cmp(&b.value()));
    }
}

// ============================================================================
// Routing Tests
// ============================================================================

proptest! {
    /// A record reaches a handler exactly when it clears both thresholds
    #[test]
    fn test_emission_matches_thresholds(
        logger_level in any_level(),
        handler_level in any_level(),
        record_level in any_level(),
    ) {
        let registry = quiet_registry();
        let logger = registry.get_logger("prop").unwrap();
        logger.set_level(logger_level);
        let sink = MemorySink::new();
        let buffer = sink.buffer();
        let handler = Handler::builder(sink)
            .level(handler_level)
            .formatter(TemplateFormatter::message_only())
            .build();
        logger.add_handler(handler).unwrap();

        logger.log(record_level, "probe");

        let expected = record_level >= logger_level && record_level >= handler_level;
        prop_assert_eq!(buffer.len(), usize::from(expected));
    }

    /// The effective level is the nearest explicit level on the path to root
    #[test]
    fn test_effective_level_is_nearest_explicit(
        segments in prop::collection::vec(segment(), 1..5),
        levels in prop::collection::vec(prop::option::of(any_level()), 5),
        root_level in any_level(),
    ) {
        let registry = quiet_registry();
        registry.root().set_level(root_level);

        let mut expected = root_level;
        for depth in 1..=segments.len() {
            let name = segments[..depth].join(".");
            let logger = registry.get_logger(&name).unwrap();
            if let Some(level) = levels[depth - 1] {
                logger.set_level(level);
                expected = level;
            }
            prop_assert_eq!(logger.effective_level(), expected);
        }
    }

    /// Every ancestor of a created logger exists and is reachable via `parent`
    #[test]
    fn test_ancestors_exist(segments in prop::collection::vec(segment(), 1..6)) {
        let registry = quiet_registry();
        let name = segments.join(".");
        let logger = registry.get_logger(&name).unwrap();

        let chain: Vec<String> = std::iter::successors(Some(logger), |l| l.parent())
            .map(|l| l.name().to_string())
            .collect();
        prop_assert_eq!(chain.len(), segments.len() + 1);
        prop_assert_eq!(chain.last().map(String::as_str), Some("root"));
        for (depth, expected) in (1..=segments.len()).rev().zip(chain.iter()) {
            prop_assert_eq!(&segments[..depth].join("."), expected);
        }
    }
}

// ============================================================================
// Formatting Tests
// ============================================================================

proptest! {
    /// Control characters in messages never produce extra lines
    #[test]
    fn test_message_never_spans_lines(message in "\\PC*", breaks in "[\n\r\t]{0,4}") {
        let text = format!("{}{}{}", message, breaks, message);
        let record = LogRecord::new(Level::Info, "prop", text);
        let formatted = TemplateFormatter::default().format(&record);
        prop_assert!(!formatted.contains('\n'));
        prop_assert!(!formatted.contains('\r'));
    }

    /// Formatting the same record twice yields the same text
    #[test]
    fn test_formatters_are_deterministic(
        message in "[ -~]{0,40}",
        key in "[a-z]{1,8}",
        value in any::<i64>(),
    ) {
        let record = LogRecord::new(Level::Warning, "prop", message)
            .with_extra(Extra::new().with(key, value));

        let template = TemplateFormatter::default();
        prop_assert_eq!(template.format(&record), template.format(&record));
        let json = JsonFormatter::new();
        prop_assert_eq!(json.format(&record), json.format(&record));
        let logfmt = LogfmtFormatter::new();
        prop_assert_eq!(logfmt.format(&record), logfmt.format(&record));
    }

    /// JSON output always parses and keeps the message intact
    #[test]
    fn test_json_output_is_valid(message in "[ -z|~]{0,60}") {
        let record = LogRecord::new(Level::Error, "prop", message.clone());
        let line = JsonFormatter::new().format(&record);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        prop_assert_eq!(value["message"].as_str(), Some(message.as_str()));
    }

    /// Deferred arguments render as if formatted eagerly
    #[test]
    fn test_message_args_render_in_order(a in "[a-z]{0,8}", b in any::<i32>()) {
        let message = Message::new("{} and {}").arg(a.as_str()).arg(b);
        prop_assert_eq!(message.render().into_owned(), format!("{} and {}", a, b));
    }
}

// ============================================================================
// Filter Tests
// ============================================================================

proptest! {
    /// every_nth keeps exactly ceil(total / n) records
    #[test]
    fn test_every_nth_sampling_count(n in 1u64..20, total in 0usize..200) {
        let filter = SampleFilter::every_nth(n);
        let record = LogRecord::new(Level::Info, "prop", "sample");
        let kept = (0..total).filter(|_| filter.accepts(&record)).count() as u64;
        prop_assert_eq!(kept, (total as u64).div_ceil(n));
    }

    /// A name filter accepts exactly the named logger and its descendants
    #[test]
    fn test_name_filter_boundaries(base in segment(), suffix in segment()) {
        let filter = NameFilter::new(base.clone());
        let child = format!("{}.{}", base, suffix);
        let sibling = format!("{}{}", base, suffix);

        let accepts = |name: &str| filter.accepts(&LogRecord::new(Level::Info, name, "x"));
        prop_assert!(accepts(&base));
        prop_assert!(accepts(&child));
        prop_assert!(!accepts(&sibling));
    }
}
