//! Record filters attached to handlers
//!
//! A filter is a predicate over a [`LogRecord`]. Handlers run their filters
//! in attachment order and drop the record at the first rejection. Filters
//! only see the record by shared reference, so they cannot alter what later
//! filters or the formatter observe.

use super::fields::FieldValue;
use super::level::Level;
use super::record::LogRecord;
use rand::Rng;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub trait Filter: Send + Sync {
    fn accepts(&self, record: &LogRecord) -> bool;
}

/// Accepts records whose level lies within optional bounds (both inclusive)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelRangeFilter {
    min: Option<Level>,
    max: Option<Level>,
}

impl LevelRangeFilter {
    pub fn new(min: Option<Level>, max: Option<Level>) -> Self {
        Self { min, max }
    }

    /// Only records at `level` or below, e.g. keep errors off stdout
    pub fn at_most(level: Level) -> Self {
        Self::new(None, Some(level))
    }

    pub fn at_least(level: Level) -> Self {
        Self::new(Some(level), None)
    }
}

impl Filter for LevelRangeFilter {
    fn accepts(&self, record: &LogRecord) -> bool {
        let level = record.level();
        self.min.map_or(true, |min| level >= min) && self.max.map_or(true, |max| level <= max)
    }
}

/// Accepts records emitted by one logger or any of its descendants
///
/// `NameFilter::new("app.db")` passes `app.db` and `app.db.pool` but not
/// `app.dbx`. An empty name passes everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    name: String,
}

impl NameFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Filter for NameFilter {
    fn accepts(&self, record: &LogRecord) -> bool {
        if self.name.is_empty() {
            return true;
        }
        match record.logger_name().strip_prefix(self.name.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}

/// Accepts records by their extra fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// The key must be present
    Present(String),
    /// The key must be present with exactly this value
    Equals(String, FieldValue),
}

impl FieldFilter {
    pub fn present(key: impl Into<String>) -> Self {
        FieldFilter::Present(key.into())
    }

    pub fn equals(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        FieldFilter::Equals(key.into(), value.into())
    }
}

impl Filter for FieldFilter {
    fn accepts(&self, record: &LogRecord) -> bool {
        match self {
            FieldFilter::Present(key) => record.extra().contains_key(key),
            FieldFilter::Equals(key, expected) => record.extra().get(key) == Some(expected),
        }
    }
}

/// Stateful filter thinning out high-volume output
///
/// Levels at or above `always_keep` bypass sampling entirely.
#[derive(Debug)]
pub struct SampleFilter {
    mode: SampleMode,
    always_keep: Option<Level>,
    seen: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SampleMode {
    EveryNth(u64),
    Rate(f64),
}

impl SampleFilter {
    /// Keep the 1st, (n+1)th, (2n+1)th ... record; `n` of 0 is treated as 1
    pub fn every_nth(n: u64) -> Self {
        Self {
            mode: SampleMode::EveryNth(n.max(1)),
            always_keep: None,
            seen: AtomicU64::new(0),
        }
    }

    /// Keep each record with probability `rate` (clamped to 0.0..=1.0)
    pub fn rate(rate: f64) -> Self {
        Self {
            mode: SampleMode::Rate(rate.clamp(0.0, 1.0)),
            always_keep: None,
            seen: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn always_keep(mut self, level: Level) -> Self {
        self.always_keep = Some(level);
        self
    }

    /// Number of records this filter has been asked about
    pub fn seen(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }
}

impl Filter for SampleFilter {
    fn accepts(&self, record: &LogRecord) -> bool {
        let position = self.seen.fetch_add(1, Ordering::Relaxed);
        if self.always_keep.is_some_and(|level| record.level() >= level) {
            return true;
        }
        match self.mode {
            SampleMode::EveryNth(n) => position % n == 0,
            SampleMode::Rate(rate) if rate >= 1.0 => true,
            SampleMode::Rate(rate) if rate <= 0.0 => false,
            SampleMode::Rate(rate) => rand::thread_rng().gen::<f64>() < rate,
        }
    }
}

/// Filter backed by a closure
pub struct FnFilter<F> {
    predicate: F,
}

impl<F> FnFilter<F>
where
    F: Fn(&LogRecord) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> Filter for FnFilter<F>
where
    F: Fn(&LogRecord) -> bool + Send + Sync,
{
    fn accepts(&self, record: &LogRecord) -> bool {
        (self.predicate)(record)
    }
}

impl<F> fmt::Debug for FnFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFilter").finish_non_exhaustive()
    }
}
