//! Dynamically typed configuration values.
//!
//! Everything a caller writes into a section or entity is a [`Value`]. The
//! set is closed, which keeps validation an exhaustive match:
//! - Scalars (nil, booleans, integers, floats, strings, atoms)
//! - Containers (lists, tuples, ordered maps)
//! - Opaque references (function handles, process/reference handles)
//! - Records (plain structs and built entities)
//!
//! Values render in an inspect-like notation (`:atom`, `"string"`,
//! `{a, b}`, `[key: value]`) so error messages show the offending value the
//! way it was written.

use crate::dsl::entity::Entity;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Ordered option map, the validated form of a keyword list.
pub type Keyword = IndexMap<String, Value>;

/// Kind of an opaque runtime handle.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Pid,
    Reference,
}

/// A configuration value.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Absence of a value
    Nil,
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Symbolic name; references to components are atoms too
    Atom(String),
    List(Vec<Value>),
    /// Fixed-arity sequence
    Tuple(Vec<Value>),
    /// Key/value pairs in insertion order
    Map(Vec<(Value, Value)>),
    /// Handle to a callable of a fixed arity
    Function { name: String, arity: usize },
    /// Instance of a named record type
    Struct { name: String, fields: Keyword },
    /// A built entity carried as a value
    Entity(Box<Entity>),
    /// Opaque runtime handle
    Handle { kind: HandleKind, id: u64 },
}

// ============================================================================
// Constructors
// ============================================================================

impl Value {
    /// Create an atom.
    pub fn atom(name: impl Into<String>) -> Self {
        Value::Atom(name.into())
    }

    /// Create a string.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create a function handle.
    pub fn function(name: impl Into<String>, arity: usize) -> Self {
        Value::Function {
            name: name.into(),
            arity,
        }
    }

    /// Create a `{module, function, args}` tuple.
    pub fn mfa(module: impl Into<String>, function: impl Into<String>, args: Vec<Value>) -> Self {
        Value::Tuple(vec![
            Value::Atom(module.into()),
            Value::Atom(function.into()),
            Value::List(args),
        ])
    }

    /// Create a keyword list (a list of `{atom, value}` pairs).
    pub fn keyword<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::List(
            pairs
                .into_iter()
                .map(|(k, v)| Value::Tuple(vec![Value::Atom(k.into()), v]))
                .collect(),
        )
    }

    /// Create a keyword list from an ordered option map.
    pub fn from_keyword(keyword: &Keyword) -> Self {
        Value::keyword(keyword.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    /// Create a record instance.
    pub fn record(name: impl Into<String>, fields: Keyword) -> Self {
        Value::Struct {
            name: name.into(),
            fields,
        }
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl Value {
    /// Try to get this value as a string reference.
    pub fn as_string(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Try to get this value as a float.
    /// Integers are automatically converted to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a list reference.
    pub fn as_list(&self) -> Option<&[Value]> {
        if let Value::List(items) = self {
            Some(items)
        } else {
            None
        }
    }

    /// Check if this value is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Check if this value is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Check if this value is a keyword list.
    ///
    /// The empty list counts as a keyword list.
    pub fn is_keyword(&self) -> bool {
        match self {
            Value::List(items) => items.iter().all(|item| keyword_pair(item).is_some()),
            _ => false,
        }
    }

    /// Convert a keyword list into an ordered option map.
    ///
    /// Returns None if this is not a keyword list. When a key repeats, the
    /// first occurrence wins.
    pub fn as_keyword(&self) -> Option<Keyword> {
        let items = self.as_list()?;
        let mut keyword = Keyword::with_capacity(items.len());
        for item in items {
            let (key, value) = keyword_pair(item)?;
            keyword.entry(key.to_string()).or_insert_with(|| value.clone());
        }
        Some(keyword)
    }

    /// Check if this value is a `{module, function, args}` tuple.
    pub fn is_mfa(&self) -> bool {
        matches!(
            self,
            Value::Tuple(items)
                if items.len() == 3
                    && matches!(items[0], Value::Atom(_))
                    && matches!(items[1], Value::Atom(_))
                    && matches!(items[2], Value::List(_))
        )
    }

}

fn keyword_pair(item: &Value) -> Option<(&str, &Value)> {
    match item {
        Value::Tuple(pair) if pair.len() == 2 => match &pair[0] {
            Value::Atom(key) => Some((key.as_str(), &pair[1])),
            _ => None,
        },
        _ => None,
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        Value::Entity(Box::new(entity))
    }
}

// ============================================================================
// Display (inspect notation)
// ============================================================================

/// Render an atom the way it is written in a config: `:name`, bare for
/// module-style names, quoted when it is not a plain identifier.
pub(crate) fn fmt_atom(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_')
                && name
                    .chars()
                    .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '?' | '!'))
        }
        None => false,
    };

    if plain && name.starts_with(|c: char| c.is_uppercase()) {
        write!(f, "{}", name)
    } else if plain {
        write!(f, ":{}", name)
    } else {
        write!(f, ":{:?}", name)
    }
}

fn fmt_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn fmt_fields<'a>(
    f: &mut fmt::Formatter<'_>,
    fields: impl Iterator<Item = (&'a String, &'a Value)>,
) -> fmt::Result {
    for (i, (key, value)) in fields.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", key, value)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{:?}", fl),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Atom(a) => fmt_atom(f, a),
            Value::List(items) if !items.is_empty() && self.is_keyword() => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some((key, value)) = keyword_pair(item) {
                        write!(f, "{}: {}", key, value)?;
                    }
                }
                write!(f, "]")
            }
            Value::List(items) => {
                write!(f, "[")?;
                fmt_seq(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "{{")?;
                fmt_seq(f, items)?;
                write!(f, "}}")
            }
            Value::Map(pairs) => {
                write!(f, "%{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Function { name, arity } => write!(f, "&{}/{}", name, arity),
            Value::Struct { name, fields } => {
                write!(f, "%{}{{", name)?;
                fmt_fields(f, fields.iter())?;
                write!(f, "}}")
            }
            Value::Entity(entity) => {
                write!(f, "%{}{{", entity.target)?;
                fmt_fields(f, entity.options.iter())?;
                write!(f, "}}")
            }
            Value::Handle { kind: HandleKind::Pid, id } => write!(f, "#PID<0.{}.0>", id),
            Value::Handle {
                kind: HandleKind::Reference,
                id,
            } => write!(f, "#Reference<{}>", id),
        }
    }
}
