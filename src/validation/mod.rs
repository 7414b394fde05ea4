//! Option validation.
//!
//! Validation is two steps: [`sanitize`] normalizes a schema into the
//! canonical type algebra, then the generic validator checks raw options
//! against it. Custom checkers live in [`checkers`].

pub mod checkers;
pub mod sanitize;
pub mod validator;

#[cfg(test)]
mod proptests;

pub use sanitize::{sanitize, sanitize_option, sanitize_type};
pub use validator::{validate_options, validate_value};

use crate::core::context::ValidationContext;
use crate::core::error::ValidationError;
use crate::core::options::Schema;
use crate::core::value::Keyword;

/// Sanitize `schema` and validate `raw` against it.
pub fn validate(
    raw: &Keyword,
    schema: &Schema,
    ctx: &ValidationContext,
) -> Result<Keyword, ValidationError> {
    validate_options(raw, &sanitize(schema), ctx)
}
