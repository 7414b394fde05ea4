//! Type normalizer.
//!
//! Rewrites schemas written in the extended type algebra into the canonical
//! algebra the generic validator understands. Every rule matches a distinct
//! variant, so the rewrite is a single exhaustive match. Canonical types
//! rewrite to themselves, which makes `sanitize` idempotent.

use crate::core::options::{OptionSpec, Schema};
use crate::core::types::{Checker, Type};

/// Rewrite every option of `schema` into canonical form.
pub fn sanitize(schema: &Schema) -> Schema {
    schema
        .iter()
        .map(|(name, spec)| (name.clone(), sanitize_option(name, spec)))
        .collect()
}

/// Rewrite a single option.
///
/// Documentation-only fields are dropped and nested `keys` are sanitized.
pub fn sanitize_option(name: &str, spec: &OptionSpec) -> OptionSpec {
    OptionSpec {
        option_type: sanitize_type(name, &spec.option_type),
        keys: spec.keys.as_ref().map(sanitize),
        hide: false,
        as_alias: None,
        snippet: None,
        links: Vec::new(),
        ..spec.clone()
    }
}

/// Rewrite a type. `field` names the option the type belongs to and is
/// carried into checkers that validate nested values.
pub fn sanitize_type(field: &str, option_type: &Type) -> Type {
    match option_type {
        Type::OneOf(values) => Type::In(values.clone()),
        Type::FunWithArgs { args, .. } => Type::Fun(args.len()),
        Type::Or(types) => Type::Or(sanitize_all(field, types)),
        Type::TaggedTuple { tag, inner } => Type::Custom(Checker::TaggedTuple {
            field: field.to_string(),
            inner: boxed(field, inner),
            tag: tag.clone(),
        }),
        Type::Struct(record) => Type::Custom(Checker::StructInstance(record.clone())),
        Type::List(inner) => Type::List(boxed(field, inner)),
        Type::WrapList(inner) => Type::Custom(Checker::WrapList {
            field: field.to_string(),
            inner: boxed(field, inner),
        }),
        Type::Quoted => Type::Any,
        Type::CapabilityModule { capability, .. } => {
            Type::Custom(Checker::CapabilityModule(capability.clone()))
        }
        Type::CapabilityWithFunction {
            capability,
            marker,
            arity,
            ..
        } => Type::Custom(Checker::CapabilityWithFunction {
            capability: capability.clone(),
            marker: marker.clone(),
            arity: *arity,
        }),
        Type::Behaviour(_) | Type::SelfReference | Type::Module => Type::Atom,
        Type::FunOrMfa(arity) => Type::Custom(Checker::FunOrMfa(*arity)),
        Type::AnyFunction => Type::Custom(Checker::AnyFunction),
        Type::Literal(value) => Type::Custom(Checker::Literal(value.clone())),
        Type::AnyLiteral => Type::Any,
        Type::KeywordList(schema) => Type::KeywordList(schema.as_ref().map(sanitize)),
        Type::NonEmptyKeywordList(schema) => {
            Type::NonEmptyKeywordList(schema.as_ref().map(sanitize))
        }
        Type::MapOf(schema) => Type::MapOf(schema.as_ref().map(sanitize)),
        Type::Map { key, value } => Type::Map {
            key: boxed(field, key),
            value: boxed(field, value),
        },
        Type::Tuple(types) => Type::Tuple(sanitize_all(field, types)),
        // Checkers built by hand may still hold extended inner types.
        Type::Custom(Checker::TaggedTuple {
            field: checker_field,
            inner,
            tag,
        }) => Type::Custom(Checker::TaggedTuple {
            field: checker_field.clone(),
            inner: Box::new(sanitize_type(checker_field, inner)),
            tag: tag.clone(),
        }),
        Type::Custom(Checker::WrapList {
            field: checker_field,
            inner,
        }) => Type::Custom(Checker::WrapList {
            field: checker_field.clone(),
            inner: Box::new(sanitize_type(checker_field, inner)),
        }),
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
        | Type::Fun(_)
        | Type::Custom(_) => option_type.clone(),
    }
}

fn sanitize_all(field: &str, types: &[Type]) -> Vec<Type> {
    types.iter().map(|t| sanitize_type(field, t)).collect()
}

fn boxed(field: &str, inner: &Type) -> Box<Type> {
    Box::new(sanitize_type(field, inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;

    fn sanitized(t: Type) -> Type {
        sanitize_type("field", &t)
    }

    #[test]
    fn test_aliases_and_degradations() {
        let values = vec![Value::atom("a"), Value::atom("b")];
        assert_eq!(sanitized(Type::OneOf(values.clone())), Type::In(values));
        assert_eq!(
            sanitized(Type::FunWithArgs {
                args: vec![Type::Integer, Type::String],
                returns: Some(Box::new(Type::Boolean)),
            }),
            Type::Fun(2)
        );
        assert_eq!(sanitized(Type::Quoted), Type::Any);
        assert_eq!(sanitized(Type::AnyLiteral), Type::Any);
        assert_eq!(sanitized(Type::Behaviour("Storage".into())), Type::Atom);
        assert_eq!(sanitized(Type::SelfReference), Type::Atom);
        assert_eq!(sanitized(Type::Module), Type::Atom);
    }

    #[test]
    fn test_checker_rewrites_carry_parameters() {
        assert_eq!(
            sanitized(Type::tagged(Value::atom("ok"), Type::OneOf(vec![Value::Integer(1)]))),
            Type::Custom(Checker::TaggedTuple {
                field: "field".into(),
                inner: Box::new(Type::In(vec![Value::Integer(1)])),
                tag: Value::atom("ok"),
            })
        );
        assert_eq!(
            sanitized(Type::wrap_list(Type::Module)),
            Type::Custom(Checker::WrapList {
                field: "field".into(),
                inner: Box::new(Type::Atom),
            })
        );
        assert_eq!(
            sanitized(Type::CapabilityModule {
                capability: "Storage".into(),
                builtins: Some("Demo.Builtins".into()),
            }),
            Type::Custom(Checker::CapabilityModule("Storage".into()))
        );
        assert_eq!(
            sanitized(Type::CapabilityWithFunction {
                capability: "Check".into(),
                builtins: None,
                marker: "Demo.FunctionCheck".into(),
                arity: 2,
            }),
            Type::Custom(Checker::CapabilityWithFunction {
                capability: "Check".into(),
                marker: "Demo.FunctionCheck".into(),
                arity: 2,
            })
        );
        assert_eq!(sanitized(Type::FunOrMfa(1)), Type::Custom(Checker::FunOrMfa(1)));
        assert_eq!(sanitized(Type::AnyFunction), Type::Custom(Checker::AnyFunction));
        assert_eq!(
            sanitized(Type::Struct("Demo.Header".into())),
            Type::Custom(Checker::StructInstance("Demo.Header".into()))
        );
        assert_eq!(
            sanitized(Type::Literal(Value::Integer(7))),
            Type::Custom(Checker::Literal(Value::Integer(7)))
        );
    }

    #[test]
    fn test_composites_recurse() {
        let t = Type::Or(vec![
            Type::list(Type::Module),
            Type::Tuple(vec![Type::Quoted, Type::Integer]),
            Type::map(Type::Module, Type::OneOf(vec![])),
        ]);
        let expected = Type::Or(vec![
            Type::list(Type::Atom),
            Type::Tuple(vec![Type::Any, Type::Integer]),
            Type::map(Type::Atom, Type::In(vec![])),
        ]);
        assert_eq!(sanitized(t), expected);
    }

    #[test]
    fn test_option_strips_tooling_fields_and_nested_keys() {
        let nested = Schema::new().option("mode", OptionSpec::new(Type::one_of_atoms(["a"])));
        let spec = OptionSpec::new(Type::KeywordList(None))
            .required()
            .hidden()
            .with_alias("alias")
            .with_snippet("mode: :a")
            .with_link("guide")
            .with_doc("kept")
            .with_keys(nested);

        let out = sanitize_option("opts", &spec);
        assert!(!out.hide);
        assert!(out.as_alias.is_none());
        assert!(out.snippet.is_none());
        assert!(out.links.is_empty());
        assert!(out.required);
        assert_eq!(out.doc.as_deref(), Some("kept"));
        assert_eq!(
            out.keys.unwrap().get("mode").unwrap().option_type,
            Type::In(vec![Value::atom("a")])
        );
    }

    #[test]
    fn test_sanitize_is_idempotent_on_schema() {
        let schema = Schema::new()
            .option("a", OptionSpec::new(Type::wrap_list(Type::OneOf(vec![Value::atom("x")]))))
            .option(
                "b",
                OptionSpec::new(Type::keyword_list(
                    Schema::new().option("c", OptionSpec::new(Type::FunOrMfa(2)).with_link("x")),
                )),
            );

        let once = sanitize(&schema);
        assert!(once.is_canonical());
        assert_eq!(sanitize(&once), once);
    }
}
