//! Option specifications and schemas.
//!
//! An [`OptionSpec`] describes one named option: its [`Type`], whether it is
//! required, its default and its nested schema. A [`Schema`] is an ordered
//! map from option name to spec; insertion order is the order options are
//! reported and emitted in.

use crate::core::types::Type;
use crate::core::value::Value;
use indexmap::IndexMap;

/// Definition of a single option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    /// Accepted shape
    pub option_type: Type,
    /// Whether the option must be supplied
    pub required: bool,
    /// Value used when the option is absent
    pub default: Option<Value>,
    /// Schema for nested keyword options
    pub keys: Option<Schema>,
    /// Deprecation notice, logged when the option is supplied
    pub deprecated: Option<String>,
    /// Free-text documentation
    pub doc: Option<String>,
    /// Display grouping label
    pub subsection: Option<String>,
    /// Override for the type shown in documentation
    pub type_doc: Option<String>,
    /// New name; values supplied under this option move there
    pub rename_to: Option<String>,

    // Documentation tooling only. Stripped by sanitize.
    /// Hide from generated docs
    pub hide: bool,
    /// Alias hint for generated docs
    pub as_alias: Option<String>,
    /// Completion snippet
    pub snippet: Option<String>,
    /// Cross references
    pub links: Vec<String>,
}

impl OptionSpec {
    /// Create an optional option of the given type.
    pub fn new(option_type: Type) -> Self {
        Self {
            option_type,
            required: false,
            default: None,
            keys: None,
            deprecated: None,
            doc: None,
            subsection: None,
            type_doc: None,
            rename_to: None,
            hide: false,
            as_alias: None,
            snippet: None,
            links: Vec::new(),
        }
    }

    /// Mark the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the nested schema.
    pub fn with_keys(mut self, keys: Schema) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Mark the option as deprecated.
    pub fn deprecated(mut self, notice: impl Into<String>) -> Self {
        self.deprecated = Some(notice.into());
        self
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set the display grouping label.
    pub fn with_subsection(mut self, subsection: impl Into<String>) -> Self {
        self.subsection = Some(subsection.into());
        self
    }

    /// Override the type shown in documentation.
    pub fn with_type_doc(mut self, type_doc: impl Into<String>) -> Self {
        self.type_doc = Some(type_doc.into());
        self
    }

    /// Move values supplied under this option to `target`.
    pub fn with_rename_to(mut self, target: impl Into<String>) -> Self {
        self.rename_to = Some(target.into());
        self
    }

    /// Hide the option from generated docs.
    pub fn hidden(mut self) -> Self {
        self.hide = true;
        self
    }

    /// Set the alias hint.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.as_alias = Some(alias.into());
        self
    }

    /// Set the completion snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Add a cross reference.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.links.push(link.into());
        self
    }
}

/// Ordered mapping from option name to [`OptionSpec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    options: IndexMap<String, OptionSpec>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option. A repeated name replaces the earlier spec in place.
    pub fn option(mut self, name: impl Into<String>, spec: OptionSpec) -> Self {
        self.options.insert(name.into(), spec);
        self
    }

    /// Look up an option.
    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.options.get(name)
    }

    /// Check whether the schema declares `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Iterate over options in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionSpec)> {
        self.options.iter()
    }

    /// Option names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Check if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Check whether every option type, and every nested schema, is canonical.
    pub fn is_canonical(&self) -> bool {
        self.options.values().all(|spec| {
            spec.option_type.is_canonical()
                && spec.keys.as_ref().map_or(true, Schema::is_canonical)
        })
    }
}

impl FromIterator<(String, OptionSpec)> for Schema {
    fn from_iter<I: IntoIterator<Item = (String, OptionSpec)>>(iter: I) -> Self {
        Self {
            options: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a String, &'a OptionSpec);
    type IntoIter = indexmap::map::Iter<'a, String, OptionSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}
