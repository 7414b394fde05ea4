//! Custom checkers.
//!
//! Each checker is a pure function of the value, its own parameters and the
//! [`ValidationContext`]. On success it returns the normalized value; on
//! failure a message naming the expected shape.

use crate::core::context::ValidationContext;
use crate::core::types::{Checker, Type};
use crate::core::value::{HandleKind, Value};
use crate::validation::validator::validate_value;

impl Checker {
    /// Run the checker against `value`.
    pub fn check(&self, value: &Value, ctx: &ValidationContext) -> Result<Value, String> {
        match self {
            Checker::TaggedTuple { field, inner, tag } => tagged_tuple(value, field, inner, tag, ctx),
            Checker::StructInstance(record) => struct_instance(value, record),
            Checker::WrapList { field, inner } => wrap_list(value, field, inner, ctx),
            Checker::CapabilityModule(capability) => capability_module(value, capability, ctx),
            Checker::CapabilityWithFunction {
                capability,
                marker,
                arity,
            } => capability_with_function(value, capability, marker, *arity, ctx),
            Checker::FunOrMfa(arity) => fun_or_mfa(value, *arity),
            Checker::AnyFunction => any_function(value),
            Checker::Literal(expected) => literal(value, expected),
            Checker::Registered { name, args } => match ctx.checker(name) {
                Some(checker) => checker(value, args),
                None => Err(format!("no checker registered under the name {:?}", name)),
            },
        }
    }
}

/// Accepts `{tag, v}` where `v` validates against `inner`.
pub fn tagged_tuple(
    value: &Value,
    field: &str,
    inner: &Type,
    tag: &Value,
    ctx: &ValidationContext,
) -> Result<Value, String> {
    match value {
        Value::Tuple(items) if items.len() == 2 && &items[0] == tag => {
            let validated = validate_value(inner, field, &items[1], ctx)?;
            Ok(Value::Tuple(vec![tag.clone(), validated]))
        }
        _ => Err(format!(
            "Expected a tagged tuple in the form of {{{}, value}}, got: {}",
            tag, value
        )),
    }
}

/// Accepts a record or built entity of the named type.
pub fn struct_instance(value: &Value, record: &str) -> Result<Value, String> {
    let matches = match value {
        Value::Struct { name, .. } => name == record,
        Value::Entity(entity) => entity.target == record,
        _ => false,
    };

    if matches {
        Ok(value.clone())
    } else {
        Err(format!("Expected an instance of %{}{{}}, got: {}", record, value))
    }
}

/// Wraps a bare value into a list, then validates it as a list of `inner`.
///
/// `nil` becomes the empty list.
pub fn wrap_list(
    value: &Value,
    field: &str,
    inner: &Type,
    ctx: &ValidationContext,
) -> Result<Value, String> {
    let wrapped = match value {
        Value::Nil => Value::List(Vec::new()),
        Value::List(_) => value.clone(),
        other => Value::List(vec![other.clone()]),
    };

    validate_value(&Type::List(Box::new(inner.clone())), field, &wrapped, ctx)
}

/// Accepts `Module` (normalized to `{Module, []}`) or `{Module, opts}` where
/// `opts` is a keyword list.
///
/// Only the shape is checked unless the context is strict, in which case the
/// component must be registered as implementing `capability`.
pub fn capability_module(
    value: &Value,
    capability: &str,
    ctx: &ValidationContext,
) -> Result<Value, String> {
    let (component, normalized) = match value {
        Value::Atom(component) => (
            component,
            Value::Tuple(vec![value.clone(), Value::List(Vec::new())]),
        ),
        Value::Tuple(items) if items.len() == 2 && items[1].is_keyword() => match &items[0] {
            Value::Atom(component) => (component, value.clone()),
            _ => return Err(format!("expected a module and opts, got: {}", value)),
        },
        _ => return Err(format!("expected a module and opts, got: {}", value)),
    };

    if ctx.strict_capabilities() && !ctx.implements(component, capability) {
        return Err(format!(
            "{} does not implement the {} capability",
            Value::atom(component.as_str()),
            capability
        ));
    }

    Ok(normalized)
}

/// As [`capability_module`], and also accepts a function of `arity`,
/// normalized to `{marker, [fun: f]}`.
pub fn capability_with_function(
    value: &Value,
    capability: &str,
    marker: &str,
    arity: usize,
    ctx: &ValidationContext,
) -> Result<Value, String> {
    match value {
        Value::Function { arity: actual, .. } if *actual == arity => Ok(Value::Tuple(vec![
            Value::atom(marker),
            Value::keyword([("fun", value.clone())]),
        ])),
        Value::Function { arity: actual, .. } => Err(format!(
            "Expected a module or a function of arity {}, got a function of arity {}",
            arity, actual
        )),
        _ => capability_module(value, capability, ctx),
    }
}

/// Accepts a function of `arity` or an MFA tuple.
pub fn fun_or_mfa(value: &Value, arity: usize) -> Result<Value, String> {
    match value {
        Value::Function { arity: actual, .. } if *actual == arity => Ok(value.clone()),
        Value::Function { arity: actual, .. } => Err(format!(
            "expected a function of arity {}, got a function of arity {}",
            arity, actual
        )),
        _ if value.is_mfa() => Ok(value.clone()),
        _ => Err(format!(
            "expected a function of arity {} or a {{module, function, args}} tuple, got: {}",
            arity, value
        )),
    }
}

/// Accepts any function or MFA tuple.
pub fn any_function(value: &Value) -> Result<Value, String> {
    if matches!(value, Value::Function { .. }) || value.is_mfa() {
        Ok(value.clone())
    } else {
        Err(format!(
            "expected a function or a {{module, function, args}} tuple, got: {}",
            value
        ))
    }
}

/// Accepts exactly `expected`.
pub fn literal(value: &Value, expected: &Value) -> Result<Value, String> {
    if value == expected {
        Ok(value.clone())
    } else {
        Err(format!("expected {}, got: {}", expected, value))
    }
}

/// Check a handle's kind. Used by the validator for `pid` and `reference`.
pub(crate) fn handle(value: &Value, kind: HandleKind) -> bool {
    matches!(value, Value::Handle { kind: k, .. } if *k == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ValidationContext {
        ValidationContext::new()
    }

    #[test]
    fn test_tagged_tuple_accepts_matching_pair() {
        let pair = Value::Tuple(vec![Value::atom("ok"), Value::Integer(3)]);
        let out = tagged_tuple(&pair, "result", &Type::Integer, &Value::atom("ok"), &ctx());
        assert_eq!(out, Ok(pair));
    }

    #[test]
    fn test_tagged_tuple_rejects_wrong_shape_naming_tag() {
        let tag = Value::atom("ok");
        for bad in [
            Value::atom("ok"),
            Value::Tuple(vec![Value::atom("error"), Value::Integer(3)]),
            Value::Tuple(vec![Value::atom("ok"), Value::Integer(3), Value::Nil]),
        ] {
            let err = tagged_tuple(&bad, "result", &Type::Integer, &tag, &ctx()).unwrap_err();
            assert!(
                err.starts_with("Expected a tagged tuple in the form of {:ok, value}"),
                "{}",
                err
            );
        }
    }

    #[test]
    fn test_tagged_tuple_rejects_bad_inner() {
        let pair = Value::Tuple(vec![Value::atom("ok"), Value::string("three")]);
        assert!(tagged_tuple(&pair, "result", &Type::Integer, &Value::atom("ok"), &ctx()).is_err());
    }

    #[test]
    fn test_wrap_list() {
        let inner = Type::Integer;
        assert_eq!(
            wrap_list(&Value::Integer(1), "n", &inner, &ctx()),
            Ok(Value::List(vec![Value::Integer(1)]))
        );
        let list = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(wrap_list(&list, "n", &inner, &ctx()), Ok(list));
        assert_eq!(wrap_list(&Value::Nil, "n", &inner, &ctx()), Ok(Value::List(vec![])));
        assert!(wrap_list(&Value::atom("x"), "n", &inner, &ctx()).is_err());
    }

    #[test]
    fn test_capability_module_shapes() {
        let storage = "Storage";
        assert_eq!(
            capability_module(&Value::atom("Demo.Memory"), storage, &ctx()),
            Ok(Value::Tuple(vec![Value::atom("Demo.Memory"), Value::List(vec![])]))
        );

        let with_opts = Value::Tuple(vec![
            Value::atom("Demo.Memory"),
            Value::keyword([("size", Value::Integer(10))]),
        ]);
        assert_eq!(capability_module(&with_opts, storage, &ctx()), Ok(with_opts.clone()));

        let err = capability_module(&Value::Integer(1), storage, &ctx()).unwrap_err();
        assert_eq!(err, "expected a module and opts, got: 1");

        let bad_opts = Value::Tuple(vec![Value::atom("Demo.Memory"), Value::Integer(1)]);
        assert!(capability_module(&bad_opts, storage, &ctx()).is_err());
    }

    #[test]
    fn test_capability_module_strict_mode() {
        let strict = ValidationContext::new()
            .with_strict_capabilities(true)
            .with_component("Demo.Memory", ["Storage"]);

        assert!(capability_module(&Value::atom("Demo.Memory"), "Storage", &strict).is_ok());
        let err = capability_module(&Value::atom("Demo.Disk"), "Storage", &strict).unwrap_err();
        assert_eq!(err, "Demo.Disk does not implement the Storage capability");
    }

    #[test]
    fn test_capability_with_function() {
        let f = Value::function("check", 2);
        assert_eq!(
            capability_with_function(&f, "Check", "Demo.FunctionCheck", 2, &ctx()),
            Ok(Value::Tuple(vec![
                Value::atom("Demo.FunctionCheck"),
                Value::keyword([("fun", f.clone())]),
            ]))
        );

        let err = capability_with_function(&Value::function("check", 1), "Check", "M", 2, &ctx())
            .unwrap_err();
        assert_eq!(
            err,
            "Expected a module or a function of arity 2, got a function of arity 1"
        );

        assert!(capability_with_function(&Value::atom("Demo.Check"), "Check", "M", 2, &ctx()).is_ok());
    }

    #[test]
    fn test_function_checkers() {
        let mfa = Value::mfa("Demo", "run", vec![]);
        assert!(fun_or_mfa(&Value::function("f", 1), 1).is_ok());
        assert!(fun_or_mfa(&mfa, 1).is_ok());
        assert!(fun_or_mfa(&Value::function("f", 2), 1).is_err());
        assert!(any_function(&Value::function("f", 5)).is_ok());
        assert!(any_function(&mfa).is_ok());
        assert!(any_function(&Value::atom("f")).is_err());
    }

    #[test]
    fn test_literal_and_registered() {
        assert!(literal(&Value::Integer(1), &Value::Integer(1)).is_ok());
        assert_eq!(
            literal(&Value::Integer(2), &Value::Integer(1)),
            Err("expected 1, got: 2".to_string())
        );

        let ctx = ValidationContext::new().with_checker("at_least", |value, args| {
            match (value.as_integer(), args.first().and_then(Value::as_integer)) {
                (Some(v), Some(min)) if v >= min => Ok(value.clone()),
                _ => Err(format!("expected at least {:?}, got: {}", args, value)),
            }
        });
        let checker = Checker::Registered {
            name: "at_least".into(),
            args: vec![Value::Integer(10)],
        };
        assert!(checker.check(&Value::Integer(12), &ctx).is_ok());
        assert!(checker.check(&Value::Integer(2), &ctx).is_err());

        let unknown = Checker::Registered {
            name: "missing".into(),
            args: vec![],
        };
        assert!(unknown.check(&Value::Nil, &ctx).is_err());
    }

    #[test]
    fn test_struct_instance() {
        let record = Value::record("Demo.Header", Default::default());
        assert!(struct_instance(&record, "Demo.Header").is_ok());
        assert!(struct_instance(&record, "Demo.Other").is_err());
        assert!(struct_instance(&Value::Nil, "Demo.Header").is_err());
    }
}
