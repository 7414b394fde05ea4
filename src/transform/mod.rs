//! Transform passes: ordering and execution.
//!
//! - [`transformer`]: the `Transformer` trait and its results
//! - [`scheduler`]: ordering passes from their pairwise declarations
//! - [`pipeline`]: threading a state through sorted passes
//! - [`registry`]: collecting passes from extensions
//! - [`progress`]: progress events
//! - [`builtin`]: passes shipped with the engine

pub mod builtin;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod scheduler;
pub mod transformer;

#[cfg(test)]
mod proptests;

pub use builtin::VerifyUniqueIdentifiers;
pub use pipeline::{PassWarning, Pipeline, PipelineOptions, PipelineReport};
pub use progress::{PipelineEvent, ProgressCallback, ProgressTracker};
pub use registry::TransformRegistry;
pub use scheduler::{ordering_edges, sort};
pub use transformer::{FnTransformer, TransformResult, Transformer};
