//! The option type algebra.
//!
//! [`Type`] is a closed enum covering three layers:
//! - Primitive and composite types understood directly by the validator
//! - Canonical-only forms (`In`, `Fun`, `Custom`) that the normalizer produces
//! - Extended forms that schema authors write and that are rewritten by
//!   [`crate::validation::sanitize`] before validation
//!
//! Canonical types are a subset of `Type`, so normalization maps `Type` to
//! `Type` and can be applied repeatedly.

use crate::core::options::Schema;
use crate::core::value::Value;
use std::fmt;

/// Shape accepted by an option.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    // --- primitives ---
    /// Any value
    Any,
    Atom,
    String,
    Boolean,
    Integer,
    /// Integer `>= 0`
    NonNegInteger,
    /// Integer `> 0`
    PosInteger,
    Float,
    /// Non-negative integer or `:infinity`
    Timeout,
    Pid,
    Reference,
    /// `{module, function, args}` tuple
    Mfa,

    // --- composites ---
    /// Keyword list, optionally validated against a nested schema
    KeywordList(Option<Schema>),
    /// Keyword list with at least one entry
    NonEmptyKeywordList(Option<Schema>),
    /// Map with atom keys, optionally validated against a nested schema
    MapOf(Option<Schema>),
    /// Map with typed keys and values
    Map { key: Box<Type>, value: Box<Type> },
    List(Box<Type>),
    /// Fixed-arity tuple, one type per position
    Tuple(Vec<Type>),
    /// First matching alternative wins
    Or(Vec<Type>),

    // --- canonical-only ---
    /// Value must equal one of the listed values
    In(Vec<Value>),
    /// Function handle of the given arity
    Fun(usize),
    /// Delegates to a custom checker
    Custom(Checker),

    // --- extended (rewritten by sanitize) ---
    /// Enumerated literal set, alias of `In`
    OneOf(Vec<Value>),
    /// Function with documented parameter types; only the arity is checked
    FunWithArgs {
        args: Vec<Type>,
        returns: Option<Box<Type>>,
    },
    /// `{tag, value}` pair whose value matches `inner`
    TaggedTuple { tag: Value, inner: Box<Type> },
    /// Instance of the named record type
    Struct(String),
    /// A bare value or a list, normalized to a list
    WrapList(Box<Type>),
    /// Accepted verbatim
    Quoted,
    /// Reference to a component implementing `capability`, with optional opts
    CapabilityModule {
        capability: String,
        builtins: Option<String>,
    },
    /// As `CapabilityModule`, or a bare function of `arity`
    CapabilityWithFunction {
        capability: String,
        builtins: Option<String>,
        marker: String,
        arity: usize,
    },
    /// Reference to a component implementing `capability`, shape-checked only
    Behaviour(String),
    /// Reference to an engine extension
    SelfReference,
    /// Function of `arity` or an MFA tuple
    FunOrMfa(usize),
    /// Any function or MFA tuple
    AnyFunction,
    /// Exactly this value
    Literal(Value),
    /// Documentation-only literal marker
    AnyLiteral,
    /// Reference to a loadable unit
    Module,
}

/// Custom checkers produced by normalization.
///
/// Each variant carries the parameters its check needs. `Registered` defers
/// to a caller-supplied function looked up by name in the
/// [`ValidationContext`](crate::core::context::ValidationContext).
#[derive(Debug, Clone, PartialEq)]
pub enum Checker {
    TaggedTuple {
        field: String,
        inner: Box<Type>,
        tag: Value,
    },
    StructInstance(String),
    WrapList {
        field: String,
        inner: Box<Type>,
    },
    CapabilityModule(String),
    CapabilityWithFunction {
        capability: String,
        marker: String,
        arity: usize,
    },
    FunOrMfa(usize),
    AnyFunction,
    Literal(Value),
    Registered {
        name: String,
        args: Vec<Value>,
    },
}

impl Checker {
    /// Name under which the checker reports itself.
    pub fn name(&self) -> &str {
        match self {
            Checker::TaggedTuple { .. } => "tagged_tuple",
            Checker::StructInstance(_) => "struct_instance",
            Checker::WrapList { .. } => "wrap_list",
            Checker::CapabilityModule(_) => "capability_module",
            Checker::CapabilityWithFunction { .. } => "capability_with_function",
            Checker::FunOrMfa(_) => "fun_or_mfa",
            Checker::AnyFunction => "any_function",
            Checker::Literal(_) => "literal",
            Checker::Registered { name, .. } => name,
        }
    }

    /// Check whether all types nested in this checker are canonical.
    pub fn is_canonical(&self) -> bool {
        match self {
            Checker::TaggedTuple { inner, .. } | Checker::WrapList { inner, .. } => {
                inner.is_canonical()
            }
            _ => true,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl Type {
    /// List of `inner`.
    pub fn list(inner: Type) -> Self {
        Type::List(Box::new(inner))
    }

    /// Keyword list validated against `schema`.
    pub fn keyword_list(schema: Schema) -> Self {
        Type::KeywordList(Some(schema))
    }

    /// Map with typed keys and values.
    pub fn map(key: Type, value: Type) -> Self {
        Type::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Enumerated atoms.
    pub fn one_of_atoms<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Type::OneOf(names.into_iter().map(Value::atom).collect())
    }

    /// `{tag, value}` pair.
    pub fn tagged(tag: Value, inner: Type) -> Self {
        Type::TaggedTuple {
            tag,
            inner: Box::new(inner),
        }
    }

    /// A bare value or a list of `inner`.
    pub fn wrap_list(inner: Type) -> Self {
        Type::WrapList(Box::new(inner))
    }

    /// Component implementing `capability`.
    pub fn capability(capability: impl Into<String>) -> Self {
        Type::CapabilityModule {
            capability: capability.into(),
            builtins: None,
        }
    }

    /// Component implementing `capability`, or a bare function of `arity`.
    pub fn capability_or_fun(
        capability: impl Into<String>,
        marker: impl Into<String>,
        arity: usize,
    ) -> Self {
        Type::CapabilityWithFunction {
            capability: capability.into(),
            builtins: None,
            marker: marker.into(),
            arity,
        }
    }

    /// Caller-registered checker.
    pub fn registered(name: impl Into<String>, args: Vec<Value>) -> Self {
        Type::Custom(Checker::Registered {
            name: name.into(),
            args,
        })
    }

    /// Check whether this type belongs to the canonical algebra.
    pub fn is_canonical(&self) -> bool {
        let schema_canonical = |schema: &Option<Schema>| {
            schema.as_ref().map_or(true, |s| s.is_canonical())
        };

        match self {
            Type::Any
            | Type::Atom
            | Type::String
            | Type::Boolean
            | Type::Integer
            | Type::NonNegInteger
            | Type::PosInteger
            | Type::Float
            | Type::Timeout
            | Type::Pid
            | Type::Reference
            | Type::Mfa
            | Type::In(_)
            | Type::Fun(_) => true,
            Type::KeywordList(schema)
            | Type::NonEmptyKeywordList(schema)
            | Type::MapOf(schema) => schema_canonical(schema),
            Type::Map { key, value } => key.is_canonical() && value.is_canonical(),
            Type::List(inner) => inner.is_canonical(),
            Type::Tuple(types) | Type::Or(types) => types.iter().all(Type::is_canonical),
            Type::Custom(checker) => checker.is_canonical(),
            Type::OneOf(_)
            | Type::FunWithArgs { .. }
            | Type::TaggedTuple { .. }
            | Type::Struct(_)
            | Type::WrapList(_)
            | Type::Quoted
            | Type::CapabilityModule { .. }
            | Type::CapabilityWithFunction { .. }
            | Type::Behaviour(_)
            | Type::SelfReference
            | Type::FunOrMfa(_)
            | Type::AnyFunction
            | Type::Literal(_)
            | Type::AnyLiteral
            | Type::Module => false,
        }
    }
}

// ============================================================================
// Display
// ============================================================================

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any | Type::Quoted | Type::AnyLiteral => write!(f, "any"),
            Type::Atom | Type::Module | Type::SelfReference => write!(f, "atom"),
            Type::Behaviour(capability) => write!(f, "module implementing {}", capability),
            Type::String => write!(f, "string"),
            Type::Boolean => write!(f, "boolean"),
            Type::Integer => write!(f, "integer"),
            Type::NonNegInteger => write!(f, "non negative integer"),
            Type::PosInteger => write!(f, "positive integer"),
            Type::Float => write!(f, "float"),
            Type::Timeout => write!(f, "non negative integer or :infinity"),
            Type::Pid => write!(f, "pid"),
            Type::Reference => write!(f, "reference"),
            Type::Mfa => write!(f, "tuple {{module, function, args}}"),
            Type::KeywordList(_) => write!(f, "keyword list"),
            Type::NonEmptyKeywordList(_) => write!(f, "non-empty keyword list"),
            Type::MapOf(_) => write!(f, "map"),
            Type::Map { key, value } => write!(f, "map of {} => {}", key, value),
            Type::List(inner) => write!(f, "list of {}", inner),
            Type::Tuple(types) => write!(f, "tuple of size {}", types.len()),
            Type::Or(types) => {
                let names: Vec<String> = types.iter().map(|t| t.to_string()).collect();
                write!(f, "{}", names.join(" or "))
            }
            Type::In(values) | Type::OneOf(values) => {
                write!(f, "one of [{}]", join_values(values))
            }
            Type::Fun(arity) | Type::FunOrMfa(arity) => write!(f, "function of arity {}", arity),
            Type::FunWithArgs { args, .. } => write!(f, "function of arity {}", args.len()),
            Type::AnyFunction => write!(f, "function"),
            Type::TaggedTuple { tag, inner } => write!(f, "{{{}, {}}}", tag, inner),
            Type::Struct(record) => write!(f, "%{}{{}}", record),
            Type::WrapList(inner) => write!(f, "{} or list of {}", inner, inner),
            Type::CapabilityModule { capability, .. } => {
                write!(f, "module implementing {} with options", capability)
            }
            Type::CapabilityWithFunction {
                capability, arity, ..
            } => write!(
                f,
                "module implementing {} or function of arity {}",
                capability, arity
            ),
            Type::Literal(value) => write!(f, "{}", value),
            Type::Custom(checker) => write!(f, "{}", checker.name()),
        }
    }
}
