//! Registry of available transforms.

use crate::core::error::ScheduleResult;
use crate::dsl::section::Extension;
use crate::transform::scheduler::sort;
use crate::transform::transformer::Transformer;
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry for transforms, keyed by name.
///
/// Registration order is kept; it is the declaration order the scheduler
/// falls back on for unconstrained passes. A name can only be registered
/// once.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: IndexMap<String, Arc<dyn Transformer>>,
}

impl TransformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with built-in passes.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::transform::builtin::register_all(&mut registry);
        registry
    }

    /// Collect the transforms of `extensions`, in order.
    pub fn from_extensions(extensions: &[Extension]) -> Self {
        let mut registry = Self::new();
        registry.extend_from(extensions);
        registry
    }

    /// Register the transforms of `extensions`.
    pub fn extend_from(&mut self, extensions: &[Extension]) {
        for extension in extensions {
            for transform in &extension.transforms {
                self.register_shared(Arc::clone(transform));
            }
        }
    }

    /// Register a transform.
    pub fn register(&mut self, transform: impl Transformer + 'static) -> bool {
        self.register_shared(Arc::new(transform))
    }

    /// Register a shared transform. Returns `false` if the name was taken.
    pub fn register_shared(&mut self, transform: Arc<dyn Transformer>) -> bool {
        let name = transform.name().to_string();
        if self.transforms.contains_key(&name) {
            log::warn!("transform {} is already registered, ignoring duplicate", name);
            return false;
        }
        self.transforms.insert(name, transform);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Transformer>> {
        self.transforms.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(|s| s.as_str())
    }

    /// All transforms, in registration order.
    pub fn transforms(&self) -> Vec<Arc<dyn Transformer>> {
        self.transforms.values().cloned().collect()
    }

    /// Unregister a transform.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.transforms.shift_remove(name).is_some()
    }

    /// All transforms in execution order.
    pub fn sorted(&self) -> ScheduleResult<Vec<Arc<dyn Transformer>>> {
        sort(&self.transforms())
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("transforms", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::section::Section;
    use crate::transform::transformer::{FnTransformer, TransformResult};

    fn pass(name: &str) -> FnTransformer {
        FnTransformer::new(name, |_| TransformResult::Unchanged)
    }

    #[test]
    fn test_registration_order_and_dedup() {
        let mut registry = TransformRegistry::new();
        assert!(registry.register(pass("b")));
        assert!(registry.register(pass("a")));
        assert!(!registry.register(pass("b").runs_before("a")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "a"]);
        // the first registration wins
        let b = registry.get("b").unwrap();
        let a = registry.get("a").unwrap();
        assert!(!b.before(a.as_ref()));
    }

    #[test]
    fn test_from_extensions() {
        let first = Extension::new("First")
            .with_section(Section::new("one"))
            .with_transform(pass("normalize"));
        let second = Extension::new("Second")
            .with_transform(pass("count").runs_after("normalize"))
            .with_transform(pass("normalize"));

        let registry = TransformRegistry::from_extensions(&[second, first]);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["count", "normalize"]);

        let sorted = registry.sorted().unwrap();
        let names: Vec<&str> = sorted.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["normalize", "count"]);
    }

    #[test]
    fn test_unregister() {
        let mut registry = TransformRegistry::new();
        registry.register(pass("x"));
        assert!(registry.unregister("x"));
        assert!(!registry.unregister("x"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_with_builtins() {
        let registry = TransformRegistry::with_builtins();
        assert!(registry.contains("verify_unique_identifiers"));
        assert!(registry.get("verify_unique_identifiers").unwrap().after_compile());
    }
}
