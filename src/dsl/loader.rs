//! Raw configuration input.
//!
//! [`DslInput`] is the unvalidated tree a caller hands to the compiler. It
//! can be assembled in code or read from TOML, where the declared sections
//! decide whether a key is an option, an entity or a nested section:
//!
//! ```toml
//! [service]
//! name = "api"
//! mode = ":prod"
//!
//! [[service.endpoint]]
//! path = "/users"
//! tags = [":public"]
//! ```
//!
//! Strings starting with `:` become atoms and strings of the form
//! `&name/arity` become function handles.

use crate::core::error::{DslError, DslResult, TrellisResult};
use crate::core::value::{Keyword, Value};
use crate::dsl::section::{EntityDef, Extension, Section};

/// Unvalidated entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntity {
    pub name: String,
    /// Positional arguments
    pub args: Vec<Value>,
    pub options: Keyword,
    /// Nested entities, in declaration order
    pub entities: Vec<RawEntity>,
}

impl RawEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Add an option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add a nested entity.
    pub fn with_entity(mut self, entity: RawEntity) -> Self {
        self.entities.push(entity);
        self
    }
}

/// Unvalidated section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSection {
    pub name: String,
    pub options: Keyword,
    pub entities: Vec<RawEntity>,
    pub sections: Vec<RawSection>,
}

impl RawSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a section option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add an entity.
    pub fn with_entity(mut self, entity: RawEntity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add a nested section.
    pub fn with_section(mut self, section: RawSection) -> Self {
        self.sections.push(section);
        self
    }
}

/// Unvalidated configuration: a list of top-level sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DslInput {
    pub sections: Vec<RawSection>,
}

impl DslInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level section.
    pub fn with_section(mut self, section: RawSection) -> Self {
        self.sections.push(section);
        self
    }

    /// Parse TOML against the sections declared by `extensions`.
    pub fn from_toml_str(src: &str, extensions: &[Extension]) -> TrellisResult<Self> {
        let table: toml::Table = src.parse()?;
        let mut input = DslInput::new();

        for (name, value) in table {
            let (extension, section) = extensions
                .iter()
                .find_map(|ext| ext.find_section(&name).map(|section| (ext, section)))
                .ok_or_else(|| {
                    DslError::new("trellis", format!("unknown section {}", Value::atom(name.as_str())))
                })?;
            let body = expect_table(&extension.name, &[name.as_str()], value)?;
            input.sections.push(raw_section(&extension.name, &[name.as_str()], section, body)?);
        }

        Ok(input)
    }
}

fn expect_table(component: &str, path: &[&str], value: toml::Value) -> DslResult<toml::Table> {
    match value {
        toml::Value::Table(table) => Ok(table),
        other => Err(DslError::new(
            component,
            format!("expected a table, got: {}", toml_to_value(other)),
        )
        .with_path(path.iter().copied())),
    }
}

fn raw_section(
    component: &str,
    path: &[&str],
    def: &Section,
    body: toml::Table,
) -> DslResult<RawSection> {
    let mut section = RawSection::new(def.name.as_str());

    for (key, value) in body {
        if let Some(entity) = def.find_entity(&key) {
            section
                .entities
                .extend(raw_entities(component, path, entity, value)?);
        } else if let Some(nested) = def.find_section(&key) {
            let mut nested_path = path.to_vec();
            nested_path.push(&key);
            let table = expect_table(component, &nested_path, value)?;
            section
                .sections
                .push(raw_section(component, &nested_path, nested, table)?);
        } else {
            section.options.insert(key, toml_to_value(value));
        }
    }

    Ok(section)
}

fn raw_entities(
    component: &str,
    path: &[&str],
    def: &EntityDef,
    value: toml::Value,
) -> DslResult<Vec<RawEntity>> {
    let tables = match value {
        toml::Value::Array(items) => items
            .into_iter()
            .map(|item| expect_table(component, path, item))
            .collect::<DslResult<Vec<_>>>()?,
        other => vec![expect_table(component, path, other)?],
    };

    tables
        .into_iter()
        .map(|table| {
            let mut entity = RawEntity::new(def.name.as_str());
            for (key, value) in table {
                match def.child(&key) {
                    Some(child) => entity
                        .entities
                        .extend(raw_entities(component, path, child, value)?),
                    None => {
                        entity.options.insert(key, toml_to_value(value));
                    }
                }
            }
            Ok(entity)
        })
        .collect()
}

/// Convert a TOML value into a configuration value.
pub fn toml_to_value(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => string_to_value(s),
        toml::Value::Integer(i) => Value::Integer(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Boolean(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => {
            Value::keyword(table.into_iter().map(|(k, v)| (k, toml_to_value(v))))
        }
    }
}

fn string_to_value(s: String) -> Value {
    if let Some(atom) = s.strip_prefix(':').filter(|a| !a.is_empty()) {
        return Value::atom(atom);
    }
    if let Some((name, arity)) = s.strip_prefix('&').and_then(|f| f.rsplit_once('/')) {
        if let Ok(arity) = arity.parse::<usize>() {
            return Value::function(name, arity);
        }
    }
    Value::String(s)
}
