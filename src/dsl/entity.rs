//! Built entities and the entity-build entry point.
//!
//! [`build_entity`] resolves an entity definition along a path of section
//! names, validates the supplied options against its schema and assembles
//! the [`Entity`].

use crate::core::context::ValidationContext;
use crate::core::error::{DslError, DslResult};
use crate::core::value::{Keyword, Value};
use crate::dsl::section::{EntityDef, Extension, Section};
use crate::validation::validate;
use indexmap::IndexMap;
use serde::Serialize;

/// A validated entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    /// Entity name as written in configuration
    pub name: String,
    /// Record type
    pub target: String,
    /// Validated scalar options
    pub options: Keyword,
    /// Collection name -> nested entities in declaration order
    pub entities: IndexMap<String, Vec<Entity>>,
    /// Value of the identifier option, if the definition declares one
    pub identifier: Option<Value>,
}

impl Entity {
    /// Create an entity with no options.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            options: Keyword::new(),
            entities: IndexMap::new(),
            identifier: None,
        }
    }

    /// Set an option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Get an option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Nested entities of `collection`.
    pub fn children(&self, collection: &str) -> &[Entity] {
        self.entities.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Wrap the entity so it can be carried as an option value.
    pub fn to_value(&self) -> Value {
        Value::Entity(Box::new(self.clone()))
    }
}

/// Find the entity definition `name` along `path` in `extension`.
///
/// - A one-segment path names a top-level section holding the entity.
/// - A two-segment path first treats the second segment as an entity of the
///   first section and searches its nested entity groups; failing that, it
///   names a nested section.
/// - Longer paths descend one section per leading segment.
pub fn resolve_entity<'a, S: AsRef<str>>(
    extension: &'a Extension,
    path: &[S],
    name: &str,
) -> DslResult<&'a EntityDef> {
    let segments: Vec<&str> = path.iter().map(|s| s.as_ref()).collect();
    resolve_in(&extension.name, &extension.sections, &segments, &segments, name)
}

fn resolve_in<'a>(
    component: &str,
    sections: &'a [Section],
    full_path: &[&str],
    path: &[&str],
    name: &str,
) -> DslResult<&'a EntityDef> {
    let not_found = |message: String| DslError::new(component, message).with_path(full_path.iter().copied());
    let find_section = |section_name: &str| {
        sections
            .iter()
            .find(|s| s.name == section_name)
            .ok_or_else(|| not_found(format!("no section {}", Value::atom(section_name))))
    };

    match path {
        [] => Err(not_found(format!(
            "cannot resolve entity {} without a section path",
            Value::atom(name)
        ))),
        [section_name] => {
            let section = find_section(*section_name)?;
            section.find_entity(name).ok_or_else(|| {
                not_found(format!(
                    "no entity {} in section {}",
                    Value::atom(name),
                    Value::atom(*section_name)
                ))
            })
        }
        [section_name, maybe_entity] => {
            let section = find_section(*section_name)?;
            let nested = section
                .find_entity(maybe_entity)
                .and_then(|parent| parent.find_nested(name));
            match nested {
                Some(def) => Ok(def),
                None => resolve_in(component, &section.sections, full_path, &path[1..], name),
            }
        }
        [section_name, rest @ ..] => {
            let section = find_section(*section_name)?;
            resolve_in(component, &section.sections, full_path, rest, name)
        }
    }
}

/// Build entity `name` at `path` from raw options.
///
/// Options named after one of the entity's nested collections must hold
/// built entities (or lists of them); the remaining options are validated
/// against the entity's schema.
pub fn build_entity<S: AsRef<str>>(
    extension: &Extension,
    path: &[S],
    name: &str,
    options: Keyword,
    ctx: &ValidationContext,
) -> DslResult<Entity> {
    let def = resolve_entity(extension, path, name)?;
    let path: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();
    build_from_def(&extension.name, def, &path, options, ctx)
}

/// As [`build_entity`], panicking on failure.
///
/// # Panics
///
/// Panics with the rendered [`DslError`] if the entity cannot be built.
pub fn build_entity_or_panic<S: AsRef<str>>(
    extension: &Extension,
    path: &[S],
    name: &str,
    options: Keyword,
    ctx: &ValidationContext,
) -> Entity {
    match build_entity(extension, path, name, options, ctx) {
        Ok(entity) => entity,
        Err(err) => panic!("{}", err),
    }
}

pub(crate) fn build_from_def(
    component: &str,
    def: &EntityDef,
    path: &[String],
    options: Keyword,
    ctx: &ValidationContext,
) -> DslResult<Entity> {
    let mut entities: IndexMap<String, Vec<Entity>> = def
        .entities
        .keys()
        .map(|collection| (collection.clone(), Vec::new()))
        .collect();
    let mut scalars = Keyword::with_capacity(options.len());

    for (key, value) in options {
        match def.entities.get(&key) {
            Some(allowed) => {
                let children = split_entities(&key, allowed, value)
                    .map_err(|message| DslError::new(component, message).with_path(path.iter()))?;
                entities.entry(key).or_default().extend(children);
            }
            None => {
                scalars.insert(key, value);
            }
        }
    }

    let mut options = validate(&scalars, &def.schema, ctx)
        .map_err(|err| DslError::validation(component, err).with_path(path.iter()))?;
    for (key, value) in &def.auto_set_fields {
        options.insert(key.clone(), value.clone());
    }

    let identifier = def
        .identifier
        .as_ref()
        .and_then(|key| options.get(key))
        .cloned();

    log::trace!("built entity {} at {}", def.name, path.join("."));
    Ok(Entity {
        name: def.name.clone(),
        target: def.target.clone(),
        options,
        entities,
        identifier,
    })
}

fn split_entities(collection: &str, allowed: &[EntityDef], value: Value) -> Result<Vec<Entity>, String> {
    let items = match value {
        Value::List(items) => items,
        single => vec![single],
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Entity(entity) if allowed.iter().any(|def| def.name == entity.name) => Ok(*entity),
            other => Err(format!(
                "invalid value for {} collection: expected entities of [{}], got: {}",
                Value::atom(collection),
                allowed
                    .iter()
                    .map(|def| Value::atom(def.name.as_str()).to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                other
            )),
        })
        .collect()
}
