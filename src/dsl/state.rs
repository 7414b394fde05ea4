//! The entity tree store.
//!
//! [`DslState`] maps section paths to nodes holding entities and options, and
//! carries a persisted key/value store and an eval queue alongside. All
//! mutators take the state by value and return the updated state, so a
//! pipeline threads one owned value through its passes.

use crate::core::value::{Keyword, Value};
use crate::dsl::entity::Entity;
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Ordered section names identifying a node.
pub type Path = Vec<String>;

/// Build a [`Path`] from string-like segments.
pub fn path<S: AsRef<str>>(segments: &[S]) -> Path {
    segments.iter().map(|s| s.as_ref().to_string()).collect()
}

/// Where `add_entity` places the new entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertOrder {
    /// Newest first
    #[default]
    Prepend,
    Append,
}

/// Entities and options stored at one path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionNode {
    pub entities: Vec<Entity>,
    pub options: Keyword,
}

/// The addressable configuration tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DslState {
    sections: IndexMap<Path, SectionNode>,
    persisted: Keyword,
    eval_queue: Vec<String>,
}

impl DslState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Entities at `path`, empty if the path is absent.
    pub fn get_entities<S: AsRef<str>>(&self, at: &[S]) -> &[Entity] {
        self.sections
            .get(&path(at))
            .map(|node| node.entities.as_slice())
            .unwrap_or(&[])
    }

    /// Insert `entity` at `path`.
    pub fn add_entity<S: AsRef<str>>(mut self, at: &[S], entity: Entity, order: InsertOrder) -> Self {
        let entities = &mut self.sections.entry(path(at)).or_default().entities;
        match order {
            InsertOrder::Prepend => entities.insert(0, entity),
            InsertOrder::Append => entities.push(entity),
        }
        self
    }

    /// Remove every entity at `path` matching `predicate`.
    pub fn remove_entity<S, F>(mut self, at: &[S], predicate: F) -> Self
    where
        S: AsRef<str>,
        F: Fn(&Entity) -> bool,
    {
        if let Some(node) = self.sections.get_mut(&path(at)) {
            node.entities.retain(|entity| !predicate(entity));
        }
        self
    }

    /// Replace every entity at `path` matching `predicate` with `replacement`.
    ///
    /// When several entities match, each is replaced by the same value.
    /// Callers supply a predicate precise enough to match the one they mean.
    pub fn replace_entity<S, F>(mut self, at: &[S], replacement: Entity, predicate: F) -> Self
    where
        S: AsRef<str>,
        F: Fn(&Entity) -> bool,
    {
        if let Some(node) = self.sections.get_mut(&path(at)) {
            for entity in node.entities.iter_mut() {
                if predicate(&*entity) {
                    *entity = replacement.clone();
                }
            }
        }
        self
    }

    // ========================================================================
    // Options
    // ========================================================================

    /// Option `key` at `path`.
    pub fn get_option<S: AsRef<str>>(&self, at: &[S], key: &str) -> Option<&Value> {
        self.sections.get(&path(at))?.options.get(key)
    }

    /// Set option `key` at `path`.
    pub fn set_option<S: AsRef<str>>(mut self, at: &[S], key: impl Into<String>, value: Value) -> Self {
        self.sections
            .entry(path(at))
            .or_default()
            .options
            .insert(key.into(), value);
        self
    }

    /// All options at `path`.
    pub fn options<S: AsRef<str>>(&self, at: &[S]) -> Option<&Keyword> {
        self.sections.get(&path(at)).map(|node| &node.options)
    }

    // ========================================================================
    // Persisted store and eval queue
    // ========================================================================

    /// Store `value` under `key` for the rest of the run.
    pub fn persist(mut self, key: impl Into<String>, value: Value) -> Self {
        self.persisted.insert(key.into(), value);
        self
    }

    /// Persisted value under `key`, or `default`.
    pub fn get_persisted(&self, key: &str, default: Value) -> Value {
        self.persisted.get(key).cloned().unwrap_or(default)
    }

    /// Persisted value under `key`.
    pub fn fetch_persisted(&self, key: &str) -> Option<&Value> {
        self.persisted.get(key)
    }

    /// Queue an opaque code block.
    pub fn eval(mut self, code: impl Into<String>) -> Self {
        self.eval_queue.push(code.into());
        self
    }

    /// Queued code blocks in insertion order.
    pub fn eval_queue(&self) -> &[String] {
        &self.eval_queue
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Paths with a node, in creation order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.sections.keys()
    }

    /// Node at `path`.
    pub fn node<S: AsRef<str>>(&self, at: &[S]) -> Option<&SectionNode> {
        self.sections.get(&path(at))
    }

    /// Every node with its path.
    pub fn nodes(&self) -> impl Iterator<Item = (&Path, &SectionNode)> {
        self.sections.iter()
    }

    /// Total number of top-level entities across all paths.
    pub fn entity_count(&self) -> usize {
        self.sections.values().map(|node| node.entities.len()).sum()
    }
}

impl Serialize for DslState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sections: IndexMap<String, &SectionNode> = self
            .sections
            .iter()
            .map(|(path, node)| (path.join("."), node))
            .collect();

        let mut state = serializer.serialize_struct("DslState", 3)?;
        state.serialize_field("sections", &sections)?;
        state.serialize_field("persisted", &self.persisted)?;
        state.serialize_field("eval_queue", &self.eval_queue)?;
        state.end()
    }
}
