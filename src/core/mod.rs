//! Core types for the trellis configuration engine.
//!
//! This module contains the foundational types shared by validation, the
//! entity tree and the transform pipeline:
//! - Configuration values
//! - The option type algebra
//! - Option specs and schemas
//! - Error types
//! - The validation context

pub mod context;
pub mod error;
pub mod options;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use context::{CheckerFn, ValidationContext};
pub use error::{
    DslError, DslResult, ErrorMessage, ScheduleError, ScheduleResult, TrellisError,
    TrellisResult, ValidationError,
};
pub use options::{OptionSpec, Schema};
pub use types::{Checker, Type};
pub use value::{HandleKind, Keyword, Value};
