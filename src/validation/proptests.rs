//! Property-based tests for normalization and the custom checkers.

use super::checkers::{tagged_tuple, wrap_list};
use super::sanitize::{sanitize, sanitize_type};
use crate::core::context::ValidationContext;
use crate::core::options::{OptionSpec, Schema};
use crate::core::types::Type;
use crate::core::value::Value;
use proptest::prelude::*;

// Scalar values without floats, so equality is total
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::Integer),
        "[a-z]{1,8}".prop_map(Value::Atom),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec(inner, 0..4).prop_map(Value::Tuple),
        ]
    })
}

fn leaf_type_strategy() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::Any),
        Just(Type::Atom),
        Just(Type::String),
        Just(Type::Boolean),
        Just(Type::Integer),
        Just(Type::NonNegInteger),
        Just(Type::PosInteger),
        Just(Type::Float),
        Just(Type::Timeout),
        Just(Type::Pid),
        Just(Type::Reference),
        Just(Type::Mfa),
        Just(Type::Quoted),
        Just(Type::SelfReference),
        Just(Type::AnyFunction),
        Just(Type::AnyLiteral),
        Just(Type::Module),
        Just(Type::KeywordList(None)),
        "[A-Z][a-z]{1,6}".prop_map(Type::Behaviour),
        "[A-Z][a-z]{1,6}".prop_map(Type::Struct),
        (0usize..4).prop_map(Type::FunOrMfa),
        (0usize..4).prop_map(Type::Fun),
        prop::collection::vec(scalar_strategy(), 0..4).prop_map(Type::OneOf),
        prop::collection::vec(scalar_strategy(), 0..4).prop_map(Type::In),
        scalar_strategy().prop_map(Type::Literal),
        ("[A-Z][a-z]{1,6}", prop::option::of("[A-Z][a-z]{1,6}")).prop_map(
            |(capability, builtins)| Type::CapabilityModule {
                capability,
                builtins,
            }
        ),
        ("[A-Z][a-z]{1,6}", 0usize..4).prop_map(|(capability, arity)| {
            Type::CapabilityWithFunction {
                capability,
                builtins: None,
                marker: "Demo.Fn".to_string(),
                arity,
            }
        }),
    ]
}

fn type_strategy() -> impl Strategy<Value = Type> {
    leaf_type_strategy().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::list),
            inner.clone().prop_map(Type::wrap_list),
            (scalar_strategy(), inner.clone()).prop_map(|(tag, t)| Type::tagged(tag, t)),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Type::Or),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Type::Tuple),
            (inner.clone(), inner.clone()).prop_map(|(k, v)| Type::map(k, v)),
            prop::collection::vec(inner.clone(), 0..3).prop_map(|args| Type::FunWithArgs {
                args,
                returns: None,
            }),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..4).prop_map(|options| {
                Type::keyword_list(
                    options
                        .into_iter()
                        .map(|(name, t)| (name, OptionSpec::new(t).with_link("docs")))
                        .collect(),
                )
            }),
        ]
    })
}

fn schema_strategy() -> impl Strategy<Value = Schema> {
    prop::collection::vec(("[a-z]{1,6}", type_strategy(), any::<bool>()), 0..6).prop_map(
        |options| {
            options
                .into_iter()
                .map(|(name, t, hide)| {
                    let spec = OptionSpec::new(t).with_snippet("snippet");
                    (name, if hide { spec.hidden() } else { spec })
                })
                .collect()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    // Normalizing twice is the same as normalizing once
    #[test]
    fn sanitize_type_is_idempotent(t in type_strategy()) {
        let once = sanitize_type("field", &t);
        prop_assert!(once.is_canonical());
        prop_assert_eq!(sanitize_type("field", &once), once);
    }

    #[test]
    fn sanitize_schema_is_idempotent(schema in schema_strategy()) {
        let once = sanitize(&schema);
        prop_assert!(once.is_canonical());
        prop_assert_eq!(sanitize(&once), once);
    }

    // A bare value is treated exactly like a one-element list
    #[test]
    fn wrap_list_wraps_bare_values(v in value_strategy()) {
        prop_assume!(!v.is_list() && !v.is_nil());
        let ctx = ValidationContext::new();
        let bare = wrap_list(&v, "field", &Type::Any, &ctx);
        let listed = wrap_list(&Value::List(vec![v.clone()]), "field", &Type::Any, &ctx);
        prop_assert_eq!(bare, listed);
    }

    #[test]
    fn wrap_list_keeps_valid_lists(items in prop::collection::vec(any::<i64>(), 0..8)) {
        let list = Value::List(items.into_iter().map(Value::Integer).collect());
        let out = wrap_list(&list, "field", &Type::Integer, &ValidationContext::new());
        prop_assert_eq!(out, Ok(list));
    }

    // Tagged pairs succeed iff the inner value validates
    #[test]
    fn tagged_tuple_follows_inner_type(tag in "[a-z]{1,6}", v in value_strategy()) {
        let ctx = ValidationContext::new();
        let tag = Value::Atom(tag);
        let pair = Value::Tuple(vec![tag.clone(), v.clone()]);
        let result = tagged_tuple(&pair, "field", &Type::Integer, &tag, &ctx);
        prop_assert_eq!(result.is_ok(), matches!(v, Value::Integer(_)));
    }

    #[test]
    fn tagged_tuple_rejects_other_tags(v in any::<i64>()) {
        let ctx = ValidationContext::new();
        let pair = Value::Tuple(vec![Value::atom("error"), Value::Integer(v)]);
        let err = tagged_tuple(&pair, "field", &Type::Integer, &Value::atom("ok"), &ctx)
            .unwrap_err();
        prop_assert!(err.contains("{:ok, value}"), "assertion failed: err.contains(\"{{:ok, value}}\")");
    }
}
