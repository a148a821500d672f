//! Deterministic message collection for schedule processing
//!
//! Messages raised while interpreting keywords are collected in order and
//! returned with the schedule, so two runs over the same deck produce the same
//! log. Every collected entry is also forwarded to `tracing` for hosts that
//! install a subscriber.

use serde::{Deserialize, Serialize};

use crate::types::KeywordLocation;

/// Severity of a collected message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Detailed processing information
    Debug,
    /// Informational remark about how input was interpreted
    Note,
    /// General information
    Info,
    /// Input that was accepted but probably not what the user intended
    Warning,
    /// Errors that occurred
    Error,
}

/// A collected log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Report step the message belongs to, if any
    pub report_step: Option<usize>,
    /// Keyword that triggered the message, if any
    pub location: Option<KeywordLocation>,
    pub message: String,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            report_step: None,
            location: None,
            message: message.into(),
        }
    }

    /// Attach the report step
    pub fn at_step(mut self, report_step: usize) -> Self {
        self.report_step = Some(report_step);
        self
    }

    /// Attach the keyword location
    pub fn with_location(mut self, location: KeywordLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// Collecting logger with a minimum level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
    min_level: LogLevel,
}

impl MessageLog {
    /// Create a new message log
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            entries: Vec::new(),
            min_level,
        }
    }

    /// Create a log that captures all levels
    pub fn all() -> Self {
        Self::new(LogLevel::Debug)
    }

    /// Record an entry if it meets the minimum level
    pub fn log(&mut self, entry: LogEntry) {
        let keyword = entry.location.as_ref().map(|l| l.keyword.as_str()).unwrap_or("");
        match entry.level {
            LogLevel::Debug => tracing::debug!(keyword, step = ?entry.report_step, "{}", entry.message),
            LogLevel::Note | LogLevel::Info => {
                tracing::info!(keyword, step = ?entry.report_step, "{}", entry.message)
            }
            LogLevel::Warning => tracing::warn!(keyword, step = ?entry.report_step, "{}", entry.message),
            LogLevel::Error => tracing::error!(keyword, step = ?entry.report_step, "{}", entry.message),
        }
        if entry.level >= self.min_level {
            self.entries.push(entry);
        }
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Debug, message));
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Note, message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Info, message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Warning, message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Error, message));
    }

    /// Get all log entries
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Move the entries of `other` to the end of this log
    pub fn append(&mut self, other: &mut MessageLog) {
        self.entries.append(&mut other.entries);
    }

    /// Filter entries by log level
    pub fn filter_by_level(&self, level: LogLevel) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.level == level).collect()
    }

    /// Filter entries raised by a keyword
    pub fn filter_by_keyword(&self, keyword: &str) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.location.as_ref().map(|l| l.keyword.as_str()) == Some(keyword))
            .collect()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(LogLevel::Note)
    }
}
