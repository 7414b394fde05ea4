//! Section, entity and extension definitions.
//!
//! Definitions are immutable once built and describe what a configuration
//! may contain. They are the input to [`build_entity`](super::entity::build_entity)
//! and to the raw-input loader.

use crate::core::options::{OptionSpec, Schema};
use crate::core::value::{Keyword, Value};
use crate::transform::Transformer;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Definition of an entity that may appear in a section.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDef {
    /// Name used in configuration input
    pub name: String,
    /// Record type the built entity represents
    pub target: String,
    /// Schema for the entity's scalar options
    pub schema: Schema,
    /// Collection name -> entities that may nest under it
    pub entities: IndexMap<String, Vec<EntityDef>>,
    /// Option names filled from positional arguments
    pub args: Vec<String>,
    /// Option whose value must be unique among siblings
    pub identifier: Option<String>,
    /// Fields merged into every built entity
    pub auto_set_fields: Keyword,
    pub describe: Option<String>,
}

impl EntityDef {
    /// Create an entity definition with an empty schema.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            schema: Schema::new(),
            entities: IndexMap::new(),
            args: Vec::new(),
            identifier: None,
            auto_set_fields: Keyword::new(),
            describe: None,
        }
    }

    /// Replace the schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Add an option to the schema.
    pub fn option(mut self, name: impl Into<String>, spec: OptionSpec) -> Self {
        self.schema = self.schema.option(name, spec);
        self
    }

    /// Allow `entity` to nest under `collection`.
    pub fn nested(mut self, collection: impl Into<String>, entity: EntityDef) -> Self {
        self.entities.entry(collection.into()).or_default().push(entity);
        self
    }

    /// Set the positional argument names.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the identifier option.
    pub fn with_identifier(mut self, option: impl Into<String>) -> Self {
        self.identifier = Some(option.into());
        self
    }

    /// Merge `value` under `key` into every built entity.
    pub fn auto_set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.auto_set_fields.insert(key.into(), value);
        self
    }

    /// Set the description.
    pub fn with_describe(mut self, describe: impl Into<String>) -> Self {
        self.describe = Some(describe.into());
        self
    }

    /// Search nested entity groups, depth first, for an entity named `name`.
    pub fn find_nested(&self, name: &str) -> Option<&EntityDef> {
        self.entities.values().flatten().find_map(|def| {
            if def.name == name {
                Some(def)
            } else {
                def.find_nested(name)
            }
        })
    }

    /// The collection a direct child named `child` belongs to.
    pub fn collection_for(&self, child: &str) -> Option<&str> {
        self.entities
            .iter()
            .find(|(_, defs)| defs.iter().any(|def| def.name == child))
            .map(|(collection, _)| collection.as_str())
    }

    /// Direct child definition named `child`.
    pub fn child(&self, child: &str) -> Option<&EntityDef> {
        self.entities.values().flatten().find(|def| def.name == child)
    }

    /// Map positional `args` onto their option names.
    ///
    /// An argument never overrides an option supplied by name.
    pub fn apply_args(&self, args: &[Value], mut options: Keyword) -> Result<Keyword, String> {
        if args.len() > self.args.len() {
            return Err(format!(
                "{} accepts {} positional argument(s), got {}",
                Value::atom(self.name.as_str()),
                self.args.len(),
                args.len()
            ));
        }
        for (name, value) in self.args.iter().zip(args) {
            options.entry(name.clone()).or_insert_with(|| value.clone());
        }
        Ok(options)
    }
}

/// A named section holding options, entities and nested sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    /// Schema for the section's own options
    pub schema: Schema,
    pub entities: Vec<EntityDef>,
    pub sections: Vec<Section>,
    pub describe: Option<String>,
}

impl Section {
    /// Create an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: Schema::new(),
            entities: Vec::new(),
            sections: Vec::new(),
            describe: None,
        }
    }

    /// Add a section option.
    pub fn option(mut self, name: impl Into<String>, spec: OptionSpec) -> Self {
        self.schema = self.schema.option(name, spec);
        self
    }

    /// Add an entity definition.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add a nested section.
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Set the description.
    pub fn with_describe(mut self, describe: impl Into<String>) -> Self {
        self.describe = Some(describe.into());
        self
    }

    /// Entity defined directly in this section.
    pub fn find_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Section nested directly in this section.
    pub fn find_section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// A bundle of sections and the transforms that post-process them.
#[derive(Clone)]
pub struct Extension {
    pub name: String,
    pub sections: Vec<Section>,
    pub transforms: Vec<Arc<dyn Transformer>>,
}

impl Extension {
    /// Create an empty extension.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
            transforms: Vec::new(),
        }
    }

    /// Add a top-level section.
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Add a transform.
    pub fn with_transform(mut self, transform: impl Transformer + 'static) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    /// Add an already shared transform.
    pub fn with_shared_transform(mut self, transform: Arc<dyn Transformer>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Top-level section named `name`.
    pub fn find_section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("sections", &self.sections)
            .field(
                "transforms",
                &self.transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
