//! Validation context.
//!
//! The context is passed explicitly through validation. It holds the
//! caller-registered checkers referenced by [`Checker::Registered`] and the
//! component registry consulted when capability checks run in strict mode.
//!
//! [`Checker::Registered`]: crate::core::types::Checker::Registered

use crate::core::value::Value;
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied checker: `(value, args) -> Ok(normalized) | Err(message)`.
pub type CheckerFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, String> + Send + Sync>;

/// Registry consulted during validation.
#[derive(Clone, Default)]
pub struct ValidationContext {
    checkers: IndexMap<String, CheckerFn>,
    /// Component name -> capabilities it implements
    components: IndexMap<String, IndexSet<String>>,
    strict_capabilities: bool,
}

impl ValidationContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require capability references to name a registered component.
    pub fn with_strict_capabilities(mut self, strict: bool) -> Self {
        self.strict_capabilities = strict;
        self
    }

    /// Whether capability references are checked against the registry.
    pub fn strict_capabilities(&self) -> bool {
        self.strict_capabilities
    }

    /// Register a named checker. A later registration replaces an earlier one.
    pub fn register_checker<F>(&mut self, name: impl Into<String>, checker: F)
    where
        F: Fn(&Value, &[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.checkers.insert(name.into(), Arc::new(checker));
    }

    /// Builder form of [`register_checker`](Self::register_checker).
    pub fn with_checker<F>(mut self, name: impl Into<String>, checker: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.register_checker(name, checker);
        self
    }

    /// Look up a checker.
    pub fn checker(&self, name: &str) -> Option<&CheckerFn> {
        self.checkers.get(name)
    }

    /// Record that `component` implements `capabilities`.
    pub fn register_component<I, S>(&mut self, component: impl Into<String>, capabilities: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.components
            .entry(component.into())
            .or_default()
            .extend(capabilities.into_iter().map(Into::into));
    }

    /// Builder form of [`register_component`](Self::register_component).
    pub fn with_component<I, S>(mut self, component: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register_component(component, capabilities);
        self
    }

    /// Check whether `component` is registered as implementing `capability`.
    pub fn implements(&self, component: &str, capability: &str) -> bool {
        self.components
            .get(component)
            .map_or(false, |caps| caps.contains(capability))
    }
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("checkers", &self.checkers.keys().collect::<Vec<_>>())
            .field("components", &self.components)
            .field("strict_capabilities", &self.strict_capabilities)
            .finish()
    }
}
