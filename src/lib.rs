//! # Trellis - Declarative Configuration Engine
//!
//! Trellis validates declarative configuration against typed schemas, stores
//! the result in an addressable entity tree and runs ordered transformation
//! passes over it.
//!
//! ## Features
//!
//! - **Typed Options**: A closed type algebra with normalization, defaults,
//!   renames, deprecations and nested keyword schemas
//! - **Entity Tree**: Sections and nested entities addressed by path, with
//!   persisted values alongside
//! - **Ordered Transforms**: Passes declare pairwise `before`/`after`
//!   constraints and are sorted topologically
//! - **After-compile Verifiers**: Passes that observe the final state only
//! - **Parallel Compilation**: Independent inputs compile concurrently
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::prelude::*;
//!
//! let extension = Extension::new("Demo.Service").with_section(
//!     Section::new("service")
//!         .option("name", OptionSpec::new(Type::String).required())
//!         .option("port", OptionSpec::new(Type::PosInteger).with_default(4000i64)),
//! );
//!
//! let input = DslInput::new().with_section(RawSection::new("service").option("name", "api"));
//!
//! let artifact = Compiler::new(vec![extension]).compile(&input)?;
//! assert_eq!(
//!     artifact.state.get_option(&["service"], "port"),
//!     Some(&Value::Integer(4000))
//! );
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Values, the type algebra, schemas, errors and the validation context
//! - [`validation`]: Normalization and validation of options
//! - [`dsl`]: Section and entity definitions, built entities and the state tree
//! - [`transform`]: Transform ordering and the pipeline
//! - [`compiler`]: End-to-end compilation
//! - [`config`]: Engine configuration
//!
//! ## Writing Transforms
//!
//! Implement [`Transformer`](transform::Transformer):
//!
//! ```rust,ignore
//! use trellis::prelude::*;
//!
//! struct CountEndpoints;
//!
//! impl Transformer for CountEndpoints {
//!     fn name(&self) -> &str {
//!         "count_endpoints"
//!     }
//!
//!     fn transform(&self, state: &DslState) -> TransformResult {
//!         let count = state.get_entities(&["service"]).len() as i64;
//!         TransformResult::Updated(state.clone().persist("endpoints", Value::Integer(count)))
//!     }
//!
//!     fn after(&self, other: &dyn Transformer) -> bool {
//!         other.name() == "normalize_paths"
//!     }
//! }
//! ```

#![warn(clippy::all)]

pub mod compiler;
pub mod config;
pub mod core;
pub mod dsl;
pub mod transform;
pub mod validation;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    // Values and types
    pub use crate::core::types::{Checker, Type};
    pub use crate::core::value::{HandleKind, Keyword, Value};

    // Schemas
    pub use crate::core::options::{OptionSpec, Schema};

    // Context
    pub use crate::core::context::ValidationContext;

    // Errors
    pub use crate::core::error::{
        DslError, DslResult, ErrorMessage, ScheduleError, ScheduleResult, TrellisError,
        TrellisResult, ValidationError,
    };

    // Validation
    pub use crate::validation::{sanitize, validate, validate_options, validate_value};

    // DSL
    pub use crate::dsl::{
        build_entity, build_entity_or_panic, DslInput, DslState, Entity, EntityDef, Extension,
        InsertOrder, RawEntity, RawSection, Section,
    };

    // Transforms
    pub use crate::transform::{
        FnTransformer, Pipeline, PipelineEvent, PipelineOptions, PipelineReport,
        TransformRegistry, TransformResult, Transformer, VerifyUniqueIdentifiers,
    };

    // Compilation
    pub use crate::compiler::{Artifact, Compiler};
    pub use crate::config::EngineConfig;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
