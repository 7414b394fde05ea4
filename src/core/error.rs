//! Error types for trellis.
//!
//! Uses thiserror for structured errors with context. Errors are designed to:
//! - Name the option, section or transform that failed
//! - Render the offending value in config notation
//! - Nest cleanly: option errors inside entity errors inside the top-level error

use crate::core::value::Value;
use std::fmt;
use thiserror::Error;

/// Top-level error type for trellis.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum TrellisError {
    #[error("DSL error: {0}")]
    Dsl(#[from] DslError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// An option failed validation.
///
/// `keys_path` lists the enclosing option names, outermost first, when the
/// failure happened inside a nested keyword list.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}{}", keys_path_suffix(.keys_path))]
pub struct ValidationError {
    /// Option that failed, if the failure is attributable to one
    pub key: Option<String>,
    /// Enclosing option names, outermost first
    pub keys_path: Vec<String>,
    /// The rejected value
    pub value: Option<Value>,
    /// Human-readable description
    pub message: String,
}

fn keys_path_suffix(keys_path: &[String]) -> String {
    if keys_path.is_empty() {
        String::new()
    } else {
        let keys: Vec<String> = keys_path.iter().map(|k| format!(":{}", k)).collect();
        format!(" (in options [{}])", keys.join(", "))
    }
}

impl ValidationError {
    /// Error not tied to a single option.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            key: None,
            keys_path: Vec::new(),
            value: None,
            message: message.into(),
        }
    }

    /// Error for option `key`.
    pub fn for_key(key: impl Into<String>, value: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            keys_path: Vec::new(),
            value,
            message: message.into(),
        }
    }

    /// Record that this error happened inside option `parent`.
    pub fn nested(mut self, parent: impl Into<String>) -> Self {
        self.keys_path.insert(0, parent.into());
        self
    }
}

/// Message carried by a [`DslError`].
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorMessage {
    Text(String),
    Validation(ValidationError),
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Text(text) => write!(f, "{}", text),
            ErrorMessage::Validation(err) => write!(f, "{}", err),
        }
    }
}

/// A structured error raised while building or transforming a DSL state.
///
/// Renders as the component in brackets, then the path joined with `->`,
/// then the message.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", render_dsl_error(.component, .path, .message))]
pub struct DslError {
    /// Extension, section or transform that raised the error
    pub component: String,
    pub message: ErrorMessage,
    /// Section names traversed to reach the failure
    pub path: Vec<String>,
}

fn render_dsl_error(component: &str, path: &[String], message: &ErrorMessage) -> String {
    if path.is_empty() {
        format!("[{}]\n{}", component, message)
    } else {
        format!("[{}]\n {}:\n  {}", component, path.join(" -> "), message)
    }
}

impl DslError {
    /// Error with a plain text message.
    pub fn new(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            message: ErrorMessage::Text(message.into()),
            path: Vec::new(),
        }
    }

    /// Error wrapping an option validation failure.
    pub fn validation(component: impl Into<String>, error: ValidationError) -> Self {
        Self {
            component: component.into(),
            message: ErrorMessage::Validation(error),
            path: Vec::new(),
        }
    }

    /// Set the traversed path.
    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    /// The wrapped validation error, if any.
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match &self.message {
            ErrorMessage::Validation(err) => Some(err),
            ErrorMessage::Text(_) => None,
        }
    }
}

/// Errors from ordering transforms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Cycle detected in transform ordering involving: {transforms:?}")]
    CycleDetected { transforms: Vec<String> },
}

/// Result type for DSL operations.
pub type DslResult<T> = Result<T, DslError>;

/// Result type for scheduling.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Result type for end-to-end operations.
pub type TrellisResult<T> = Result<T, TrellisError>;
