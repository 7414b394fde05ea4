//! The `Transformer` trait and pass results.
//!
//! A transformer is a named pass over a [`DslState`]. Ordering between
//! passes is declared pairwise through [`Transformer::before`] and
//! [`Transformer::after`]; after-compile passes run once everything else has
//! finished and only observe the final state.

use crate::core::error::DslError;
use crate::dsl::state::DslState;
use std::fmt;
use std::sync::Arc;

/// Outcome of running one pass.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformResult {
    /// Continue with the same state
    Unchanged,
    /// Continue with a new state
    Updated(DslState),
    /// Record the messages and continue with the new state
    Warn(DslState, Vec<String>),
    /// Abort the pipeline
    Error(DslError),
    /// Stop the pipeline without error, keeping the current state
    Halt,
}

/// A named pass over the DSL state.
///
/// Implementations must be `Send + Sync` so that independent compilations
/// can share them.
pub trait Transformer: Send + Sync {
    /// Unique name of the pass.
    fn name(&self) -> &str;

    /// Run the pass.
    fn transform(&self, state: &DslState) -> TransformResult;

    /// Whether this pass must run before `other`.
    fn before(&self, _other: &dyn Transformer) -> bool {
        false
    }

    /// Whether this pass must run after `other`.
    fn after(&self, _other: &dyn Transformer) -> bool {
        false
    }

    /// Whether this pass runs only after all ordinary passes.
    fn after_compile(&self) -> bool {
        false
    }
}

type TransformFn = Arc<dyn Fn(&DslState) -> TransformResult + Send + Sync>;

/// A transformer assembled from a closure and name-based ordering rules.
#[derive(Clone)]
pub struct FnTransformer {
    name: String,
    run: TransformFn,
    before: Vec<String>,
    after: Vec<String>,
    after_compile: bool,
}

impl FnTransformer {
    /// Create a pass named `name` running `run`.
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&DslState) -> TransformResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(run),
            before: Vec::new(),
            after: Vec::new(),
            after_compile: false,
        }
    }

    /// Run before the pass named `other`.
    pub fn runs_before(mut self, other: impl Into<String>) -> Self {
        self.before.push(other.into());
        self
    }

    /// Run after the pass named `other`.
    pub fn runs_after(mut self, other: impl Into<String>) -> Self {
        self.after.push(other.into());
        self
    }

    /// Mark as after-compile.
    pub fn after_compile_only(mut self) -> Self {
        self.after_compile = true;
        self
    }
}

impl Transformer for FnTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, state: &DslState) -> TransformResult {
        (self.run)(state)
    }

    fn before(&self, other: &dyn Transformer) -> bool {
        self.before.iter().any(|name| name == other.name())
    }

    fn after(&self, other: &dyn Transformer) -> bool {
        self.after.iter().any(|name| name == other.name())
    }

    fn after_compile(&self) -> bool {
        self.after_compile
    }
}

impl fmt::Debug for FnTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransformer")
            .field("name", &self.name)
            .field("before", &self.before)
            .field("after", &self.after)
            .field("after_compile", &self.after_compile)
            .finish()
    }
}
