//! Formatters turning log records into display text
//!
//! Provides:
//! - `TemplateFormatter`: `{placeholder}` templates such as `"{level}:{message}"`
//! - `JsonFormatter`: one JSON object per record
//! - `LogfmtFormatter`: key=value pairs compatible with log aggregation tools

use super::error::{Result, RouterError};
use super::fields::FieldValue;
use super::record::LogRecord;
use super::timestamp::TimestampFormat;

/// Renders a record into the text a sink receives
///
/// Implementations must be deterministic: the same record and the same
/// formatter configuration always produce the same text.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Placeholder {
    Level,
    LevelNo,
    Message,
    Name,
    Timestamp,
    Thread,
    Extra,
    Field(String),
}

impl Placeholder {
    fn parse(key: &str) -> Self {
        match key {
            "level" => Placeholder::Level,
            "levelno" => Placeholder::LevelNo,
            "message" => Placeholder::Message,
            "name" => Placeholder::Name,
            "timestamp" => Placeholder::Timestamp,
            "thread" => Placeholder::Thread,
            "extra" => Placeholder::Extra,
            other => Placeholder::Field(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        placeholder: Placeholder,
        padding: Option<(Align, usize)>,
    },
}

/// Template-driven text formatter
///
/// Recognised placeholders are `{level}`, `{levelno}`, `{message}`, `{name}`,
/// `{timestamp}`, `{thread}` and `{extra}` (all extra fields as `key=value`).
/// Any other name is looked up in the record's extra fields and renders as
/// `-` when absent. A width with optional alignment may follow a colon:
/// `{level:<8}`, `{name:>12}`, `{message:^30}`. `{{` and `}}` are literal braces.
///
/// # Example
///
/// ```
/// use log_router::{Formatter, Level, LogRecord, TemplateFormatter};
///
/// let formatter = TemplateFormatter::new("{level}:{message}").unwrap();
/// let record = LogRecord::new(Level::Error, "app", "boom");
/// assert_eq!(formatter.format(&record), "ERROR:boom");
/// ```
#[derive(Debug, Clone)]
pub struct TemplateFormatter {
    template: String,
    segments: Vec<Segment>,
    timestamp_format: TimestampFormat,
    #[cfg(feature = "console")]
    use_colors: bool,
}

impl TemplateFormatter {
    pub const DEFAULT_TEMPLATE: &'static str = "[{timestamp}] [{level:<8}] {name} - {message} {extra}";

    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let segments = Self::parse(&template)?;
        Ok(Self {
            template,
            segments,
            timestamp_format: TimestampFormat::default(),
            #[cfg(feature = "console")]
            use_colors: false,
        })
    }

    /// Formatter emitting only the rendered message
    pub fn message_only() -> Self {
        Self {
            template: "{message}".to_string(),
            segments: vec![Segment::Field {
                placeholder: Placeholder::Message,
                padding: None,
            }],
            timestamp_format: TimestampFormat::default(),
            #[cfg(feature = "console")]
            use_colors: false,
        }
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Colour the `{level}` token with the level's terminal colour
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn parse(template: &str) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        body.push(inner);
                    }
                    if !closed {
                        return Err(RouterError::config(
                            "TemplateFormatter",
                            format!("unclosed '{{' in template '{}'", template),
                        ));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Self::parse_field(&body, template)?);
                }
                '}' => {
                    return Err(RouterError::config(
                        "TemplateFormatter",
                        format!("unmatched '}}' in template '{}'", template),
                    ));
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(segments)
    }

    fn parse_field(body: &str, template: &str) -> Result<Segment> {
        let (key, spec) = match body.split_once(':') {
            Some((key, spec)) => (key.trim(), Some(spec.trim())),
            None => (body.trim(), None),
        };

        let valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '-');
        if !valid_key {
            return Err(RouterError::config(
                "TemplateFormatter",
                format!("invalid placeholder '{{{}}}' in template '{}'", body, template),
            ));
        }

        let padding = match spec {
            None | Some("") => None,
            Some(spec) => {
                let (align, width) = match spec.chars().next() {
                    Some('<') => (Align::Left, &spec[1..]),
                    Some('>') => (Align::Right, &spec[1..]),
                    Some('^') => (Align::Center, &spec[1..]),
                    _ => (Align::Left, spec),
                };
                let width = width.parse::<usize>().map_err(|_| {
                    RouterError::config(
                        "TemplateFormatter",
                        format!("invalid width '{}' for placeholder '{}'", spec, key),
                    )
                })?;
                Some((align, width))
            }
        };

        Ok(Segment::Field {
            placeholder: Placeholder::parse(key),
            padding,
        })
    }

    fn render_placeholder(&self, placeholder: &Placeholder, record: &LogRecord) -> String {
        match placeholder {
            Placeholder::Level => record.level().as_str().to_string(),
            Placeholder::LevelNo => record.level().value().to_string(),
            Placeholder::Message => record.message().into_owned(),
            Placeholder::Name => record.logger_name().to_string(),
            Placeholder::Timestamp => self.timestamp_format.format(record.timestamp()),
            Placeholder::Thread => record.thread().to_string(),
            Placeholder::Extra => record.extra().format_fields(),
            Placeholder::Field(key) => record
                .extra()
                .get(key)
                .map(FieldValue::to_string)
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    #[cfg(feature = "console")]
    fn colorize(&self, placeholder: &Placeholder, text: String, record: &LogRecord) -> String {
        use colored::Colorize;
        if self.use_colors && *placeholder == Placeholder::Level {
            text.as_str().color(record.level().color()).to_string()
        } else {
            text
        }
    }

    #[cfg(not(feature = "console"))]
    fn colorize(&self, _placeholder: &Placeholder, text: String, _record: &LogRecord) -> String {
        text
    }
}

fn pad(text: String, align: Align, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text;
    }
    let fill = width - len;
    match align {
        Align::Left => format!("{}{}", text, " ".repeat(fill)),
        Align::Right => format!("{}{}", " ".repeat(fill), text),
        Align::Center => {
            let left = fill / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(fill - left))
        }
    }
}

impl Default for TemplateFormatter {
    fn default() -> Self {
        Self {
            template: Self::DEFAULT_TEMPLATE.to_string(),
            segments: Self::parse(Self::DEFAULT_TEMPLATE).unwrap_or_default(),
            timestamp_format: TimestampFormat::default(),
            #[cfg(feature = "console")]
            use_colors: false,
        }
    }
}

impl Formatter for TemplateFormatter {
    fn format(&self, record: &LogRecord) -> String {
        // An empty trailing `{extra}` also drops the spaces of the literal before it
        let trailing_extra_empty = record.extra().is_empty()
            && matches!(
                self.segments.last(),
                Some(Segment::Field {
                    placeholder: Placeholder::Extra,
                    ..
                })
            );
        let separator = if trailing_extra_empty {
            self.segments.len().checked_sub(2)
        } else {
            None
        };

        let mut out = String::with_capacity(self.template.len() + 64);
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) if Some(index) == separator => {
                    out.push_str(text.trim_end_matches(' '))
                }
                Segment::Literal(text) => out.push_str(text),
                Segment::Field {
                    placeholder,
                    padding,
                } => {
                    let mut text = self.render_placeholder(placeholder, record);
                    if let Some((align, width)) = padding {
                        text = pad(text, *align, *width);
                    }
                    out.push_str(&self.colorize(placeholder, text, record));
                }
            }
        }
        out
    }
}

/// One JSON object per record
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    timestamp_format: TimestampFormat,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut json_obj = serde_json::Map::new();

        json_obj.insert(
            "timestamp".to_string(),
            self.timestamp_format.to_json_value(record.timestamp()),
        );
        json_obj.insert(
            "level".to_string(),
            serde_json::Value::String(record.level().as_str().to_string()),
        );
        json_obj.insert(
            "logger".to_string(),
            serde_json::Value::String(record.logger_name().to_string()),
        );
        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(record.message().into_owned()),
        );
        json_obj.insert(
            "thread".to_string(),
            serde_json::Value::String(record.thread().to_string()),
        );

        // Reserved keys win over extra fields of the same name
        for (key, value) in record.extra().iter() {
            json_obj
                .entry(key.clone())
                .or_insert_with(|| value.to_json_value());
        }

        serde_json::to_string(&serde_json::Value::Object(json_obj)).unwrap_or_default()
    }
}

/// Logfmt output (`key=value` pairs)
#[derive(Debug, Clone, Default)]
pub struct LogfmtFormatter {
    timestamp_format: TimestampFormat,
}

impl LogfmtFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    fn escape_key(key: &str) -> String {
        key.chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
            .collect()
    }

    fn escape_value(value: &str) -> String {
        if value.is_empty() || value.contains([' ', '"', '=']) {
            Self::quote(value)
        } else {
            value.to_string()
        }
    }

    fn quote(value: &str) -> String {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

impl Formatter for LogfmtFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut parts = vec![
            format!(
                "timestamp={}",
                Self::escape_value(&self.timestamp_format.format(record.timestamp()))
            ),
            format!("level={}", record.level()),
            format!("logger={}", Self::escape_value(record.logger_name())),
            // Message is always quoted
            format!("message={}", Self::quote(&record.message())),
        ];

        for (key, value) in record.extra().iter() {
            let formatted = match value {
                FieldValue::String(s) => Self::escape_value(s),
                other => other.to_string(),
            };
            parts.push(format!("{}={}", Self::escape_key(key), formatted));
        }

        parts.join(" ")
    }
}
