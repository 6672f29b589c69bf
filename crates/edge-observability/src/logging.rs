//! Structured logging with request context.

use std::collections::BTreeMap;
use std::fmt;

use edge_core::RequestId;
use serde::{Deserialize, Serialize};

/// Log level for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A structured log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Log level.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
    /// Request ID for correlation.
    pub request_id: String,
    /// Pipeline name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    /// Stage handling the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Request path and query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Additional structured fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
    /// Microseconds since the logger was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_us: Option<u64>,
}

impl LogEntry {
    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    /// Format as human-readable string.
    pub fn to_human(&self) -> String {
        let mut s = format!("[{}]", self.level);

        if let Some(stage) = &self.stage {
            s.push_str(&format!(" {}:", stage));
        }
        s.push(' ');
        s.push_str(&self.message);

        if let Some(elapsed) = self.elapsed_us {
            s.push_str(&format!(" ({}us)", elapsed));
        }

        if !self.fields.is_empty() {
            s.push_str(" | ");
            let fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            s.push_str(&fields.join(" "));
        }

        s
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

/// Structured logger with request context.
///
/// One logger is created per request. Stages derive their own logger with
/// [`StructuredLogger::for_stage`] so every entry names the stage it came from.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    request_id: RequestId,
    pipeline: Option<String>,
    stage: Option<String>,
    path: Option<String>,
    start_time: std::time::Instant,
    min_level: LogLevel,
    format: LogFormat,
}

impl StructuredLogger {
    /// Create a new logger with request context.
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            pipeline: None,
            stage: None,
            path: None,
            start_time: std::time::Instant::now(),
            min_level: LogLevel::Info,
            format: LogFormat::Json,
        }
    }

    /// Set the pipeline name.
    pub fn with_pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.pipeline = Some(pipeline.into());
        self
    }

    /// Set the request path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set minimum log level.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Set output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Derive a logger for one stage, sharing request id and start time.
    pub fn for_stage(&self, stage: impl Into<String>) -> Self {
        Self {
            stage: Some(stage.into()),
            ..self.clone()
        }
    }

    /// Log at debug level.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, BTreeMap::new());
    }

    /// Log at info level.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, BTreeMap::new());
    }

    /// Log at warn level.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, BTreeMap::new());
    }

    /// Log at error level.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, BTreeMap::new());
    }

    /// Build the entry that would be emitted, or `None` if filtered out.
    pub fn entry(
        &self,
        level: LogLevel,
        message: &str,
        fields: BTreeMap<String, serde_json::Value>,
    ) -> Option<LogEntry> {
        if level < self.min_level {
            return None;
        }

        Some(LogEntry {
            level,
            message: message.to_string(),
            request_id: self.request_id.to_string(),
            pipeline: self.pipeline.clone(),
            stage: self.stage.clone(),
            path: self.path.clone(),
            fields,
            elapsed_us: Some(self.elapsed_us()),
        })
    }

    fn log(&self, level: LogLevel, message: &str, fields: BTreeMap<String, serde_json::Value>) {
        let Some(entry) = self.entry(level, message, fields) else {
            return;
        };

        let output = match self.format {
            LogFormat::Json => entry.to_json(),
            LogFormat::Human => entry.to_human(),
        };

        // Output to stderr (Spin captures this)
        eprintln!("{}", output);
    }

    /// Get the request ID.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Get elapsed time since logger creation.
    pub fn elapsed_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }
}

/// Builder for log entries with fluent API.
pub struct LogBuilder<'a> {
    logger: &'a StructuredLogger,
    level: LogLevel,
    message: String,
    fields: BTreeMap<String, serde_json::Value>,
}

impl<'a> LogBuilder<'a> {
    /// Create a new log builder.
    pub fn new(logger: &'a StructuredLogger, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            logger,
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a string field.
    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(value.into()));
        self
    }

    /// Add an integer field.
    pub fn field_i64(mut self, key: &str, value: i64) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Add a boolean field.
    pub fn field_bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Add a list of strings.
    pub fn field_list(mut self, key: &str, values: impl IntoIterator<Item = String>) -> Self {
        let values: Vec<String> = values.into_iter().collect();
        self.fields.insert(key.to_string(), serde_json::json!(values));
        self
    }

    /// The entry this builder would emit.
    pub fn entry(&self) -> Option<LogEntry> {
        self.logger
            .entry(self.level, &self.message, self.fields.clone())
    }

    /// Emit the log entry.
    pub fn emit(self) {
        self.logger.log(self.level, &self.message, self.fields);
    }
}

impl StructuredLogger {
    /// Start building an info log entry.
    pub fn info_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Info, message)
    }

    /// Start building a warn log entry.
    pub fn warn_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Warn, message)
    }

    /// Start building a debug log entry.
    pub fn debug_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Debug, message)
    }
}
