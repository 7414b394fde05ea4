//! Generic keyword validator.
//!
//! Validates a raw keyword map against a canonical [`Schema`]:
//! - Unknown options are rejected
//! - Renamed options are checked against their own spec, then stored under
//!   their new name
//! - Required options must be present, optional ones receive their default
//! - Each supplied value is checked against its type, recursing into nested
//!   keyword schemas
//!
//! The output keeps schema declaration order.

use crate::core::context::ValidationContext;
use crate::core::error::ValidationError;
use crate::core::options::Schema;
use crate::core::types::Type;
use crate::core::value::{HandleKind, Keyword, Value};
use crate::validation::checkers::handle;
use crate::validation::sanitize::sanitize_type;

/// Why a value did not conform to a type.
#[derive(Debug)]
enum Mismatch {
    /// Leaf failure, reported as an invalid value
    Reason(String),
    /// Failure inside a list element
    List(String),
    /// Failure inside a nested keyword schema
    Nested(ValidationError),
}

impl Mismatch {
    fn into_message(self) -> String {
        match self {
            Mismatch::Reason(reason) | Mismatch::List(reason) => reason,
            Mismatch::Nested(err) => err.to_string(),
        }
    }
}

/// Validate `raw` against `schema`.
pub fn validate_options(
    raw: &Keyword,
    schema: &Schema,
    ctx: &ValidationContext,
) -> Result<Keyword, ValidationError> {
    let unknown: Vec<&String> = raw.keys().filter(|k| !schema.contains(k)).collect();
    if !unknown.is_empty() {
        return Err(ValidationError::new(format!(
            "unknown options [{}], valid options are: [{}]",
            atom_list(unknown.into_iter().map(String::as_str)),
            atom_list(schema.names())
        )));
    }

    // Targets fed by a supplied renamed option.
    let renamed_into: Vec<&str> = schema
        .iter()
        .filter(|(name, _)| raw.contains_key(*name))
        .filter_map(|(_, spec)| spec.rename_to.as_deref())
        .collect();

    let mut output = Keyword::with_capacity(schema.len());
    for (name, spec) in schema.iter() {
        let key = spec.rename_to.as_ref().unwrap_or(name);

        match raw.get(name) {
            Some(value) => {
                if let Some(notice) = &spec.deprecated {
                    log::warn!("{} is deprecated: {}", Value::atom(name.as_str()), notice);
                }
                let validated = conform(&spec.option_type, name, spec.keys.as_ref(), value, ctx)
                    .map_err(|mismatch| option_error(name, value, mismatch))?;
                if spec.rename_to.is_some() {
                    log::debug!("moving option {} to {}", name, key);
                    // A value given under the new name wins.
                    output.entry(key.clone()).or_insert(validated);
                } else {
                    output.insert(key.clone(), validated);
                }
            }
            None if renamed_into.contains(&name.as_str()) => {}
            None if spec.required => {
                return Err(ValidationError::for_key(
                    name.as_str(),
                    None,
                    format!(
                        "required {} option not found, received options: [{}]",
                        Value::atom(name.as_str()),
                        atom_list(raw.keys().map(String::as_str))
                    ),
                ));
            }
            None => {
                if let Some(default) = &spec.default {
                    output.entry(key.clone()).or_insert_with(|| default.clone());
                }
            }
        }
    }

    Ok(output)
}

/// Validate a single value against a type, returning the message on failure.
///
/// Extended types are normalized first.
pub fn validate_value(
    option_type: &Type,
    field: &str,
    value: &Value,
    ctx: &ValidationContext,
) -> Result<Value, String> {
    conform(option_type, field, None, value, ctx).map_err(Mismatch::into_message)
}

fn option_error(name: &str, value: &Value, mismatch: Mismatch) -> ValidationError {
    match mismatch {
        Mismatch::Reason(reason) => ValidationError::for_key(
            name,
            Some(value.clone()),
            format!("invalid value for {} option: {}", Value::atom(name), reason),
        ),
        Mismatch::List(reason) => ValidationError::for_key(
            name,
            Some(value.clone()),
            format!("invalid list in {} option: {}", Value::atom(name), reason),
        ),
        Mismatch::Nested(err) => err.nested(name),
    }
}

fn atom_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .map(|n| Value::atom(n).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn expected(option_type: &Type, value: &Value) -> Mismatch {
    Mismatch::Reason(format!("expected {}, got: {}", option_type, value))
}

fn conform(
    option_type: &Type,
    field: &str,
    keys: Option<&Schema>,
    value: &Value,
    ctx: &ValidationContext,
) -> Result<Value, Mismatch> {
    let accept = |ok: bool| {
        if ok {
            Ok(value.clone())
        } else {
            Err(expected(option_type, value))
        }
    };

    match option_type {
        Type::Any => Ok(value.clone()),
        Type::Atom => accept(matches!(value, Value::Atom(_))),
        Type::String => accept(matches!(value, Value::String(_))),
        Type::Boolean => accept(matches!(value, Value::Boolean(_))),
        Type::Integer => accept(matches!(value, Value::Integer(_))),
        Type::NonNegInteger => accept(matches!(value, Value::Integer(i) if *i >= 0)),
        Type::PosInteger => accept(matches!(value, Value::Integer(i) if *i > 0)),
        Type::Float => accept(matches!(value, Value::Float(_))),
        Type::Timeout => accept(match value {
            Value::Integer(i) => *i >= 0,
            Value::Atom(a) => a == "infinity",
            _ => false,
        }),
        Type::Pid => accept(handle(value, HandleKind::Pid)),
        Type::Reference => accept(handle(value, HandleKind::Reference)),
        Type::Mfa => accept(value.is_mfa()),
        Type::In(values) => accept(values.contains(value)),
        Type::Fun(arity) => accept(matches!(value, Value::Function { arity: a, .. } if a == arity)),
        Type::Custom(checker) => checker.check(value, ctx).map_err(Mismatch::Reason),

        Type::KeywordList(schema) => conform_keyword(option_type, schema.as_ref().or(keys), value, ctx),
        Type::NonEmptyKeywordList(schema) => {
            if matches!(value, Value::List(items) if items.is_empty()) {
                return Err(expected(option_type, value));
            }
            conform_keyword(option_type, schema.as_ref().or(keys), value, ctx)
        }
        Type::MapOf(schema) => conform_map_of(option_type, schema.as_ref().or(keys), value, ctx),
        Type::Map {
            key: key_type,
            value: value_type,
        } => {
            let Value::Map(pairs) = value else {
                return Err(expected(option_type, value));
            };
            let mut out = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                let k = conform(key_type, field, None, k, ctx).map_err(|m| {
                    Mismatch::Reason(format!("invalid map key {}: {}", k, m.into_message()))
                })?;
                let v = conform(value_type, field, keys, v, ctx).map_err(|m| {
                    Mismatch::Reason(format!("invalid map value at key {}: {}", k, m.into_message()))
                })?;
                out.push((k, v));
            }
            Ok(Value::Map(out))
        }
        Type::List(inner) => {
            let Value::List(items) = value else {
                return Err(expected(option_type, value));
            };
            let mut out = Vec::with_capacity(items.len());
            for (position, item) in items.iter().enumerate() {
                match conform(inner, field, keys, item, ctx) {
                    Ok(v) => out.push(v),
                    Err(Mismatch::Nested(mut err)) => {
                        err.message = format!(
                            "invalid value for list element at position {}: {}",
                            position, err.message
                        );
                        return Err(Mismatch::Nested(err));
                    }
                    Err(Mismatch::Reason(reason)) | Err(Mismatch::List(reason)) => {
                        return Err(Mismatch::List(format!(
                            "invalid value for list element at position {}: {}",
                            position, reason
                        )))
                    }
                }
            }
            Ok(Value::List(out))
        }
        Type::Tuple(types) => {
            let Value::Tuple(items) = value else {
                return Err(expected(option_type, value));
            };
            if items.len() != types.len() {
                return Err(expected(option_type, value));
            }
            let mut out = Vec::with_capacity(items.len());
            for (position, (t, item)) in types.iter().zip(items).enumerate() {
                let v = conform(t, field, None, item, ctx).map_err(|m| {
                    Mismatch::Reason(format!(
                        "invalid value for tuple element at position {}: {}",
                        position,
                        m.into_message()
                    ))
                })?;
                out.push(v);
            }
            Ok(Value::Tuple(out))
        }
        Type::Or(types) => {
            let mut reasons = Vec::with_capacity(types.len());
            let mut nested = None;
            for t in types {
                match conform(t, field, keys, value, ctx) {
                    Ok(v) => return Ok(v),
                    Err(Mismatch::Nested(err)) if nested.is_none() => nested = Some(err),
                    Err(m) => reasons.push(m.into_message()),
                }
            }
            // The value had the shape of a nested schema; report where inside it failed.
            if let Some(err) = nested {
                return Err(Mismatch::Nested(err));
            }
            let listed: Vec<String> = reasons.iter().map(|r| format!("  * {}", r)).collect();
            Err(Mismatch::Reason(format!(
                "expected to match at least one given type, but didn't match any. \
                 Here are the reasons why it didn't match each of the allowed types:\n\n{}",
                listed.join("\n")
            )))
        }

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
        | Type::Module => conform(&sanitize_type(field, option_type), field, keys, value, ctx),
    }
}

fn conform_keyword(
    option_type: &Type,
    schema: Option<&Schema>,
    value: &Value,
    ctx: &ValidationContext,
) -> Result<Value, Mismatch> {
    let Some(keyword) = value.as_keyword() else {
        return Err(expected(option_type, value));
    };
    match schema {
        Some(schema) => validate_options(&keyword, schema, ctx)
            .map(|validated| Value::from_keyword(&validated))
            .map_err(Mismatch::Nested),
        None => Ok(value.clone()),
    }
}

fn conform_map_of(
    option_type: &Type,
    schema: Option<&Schema>,
    value: &Value,
    ctx: &ValidationContext,
) -> Result<Value, Mismatch> {
    let Value::Map(pairs) = value else {
        return Err(expected(option_type, value));
    };
    let Some(schema) = schema else {
        return Ok(value.clone());
    };

    let mut keyword = Keyword::with_capacity(pairs.len());
    for (k, v) in pairs {
        match k {
            Value::Atom(name) => {
                keyword.insert(name.clone(), v.clone());
            }
            other => {
                return Err(Mismatch::Reason(format!(
                    "expected map keys to be atoms, got: {}",
                    other
                )))
            }
        }
    }

    let validated = validate_options(&keyword, schema, ctx).map_err(Mismatch::Nested)?;
    Ok(Value::Map(
        validated
            .into_iter()
            .map(|(k, v)| (Value::Atom(k), v))
            .collect(),
    ))
}
