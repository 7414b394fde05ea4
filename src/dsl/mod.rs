//! The declarative surface and the entity tree.
//!
//! - [`section`]: definitions of sections, entities and extensions
//! - [`entity`]: built entities and `build_entity`
//! - [`state`]: the path-addressed tree threaded through transforms
//! - [`loader`]: raw input, assembled in code or parsed from TOML

pub mod entity;
pub mod loader;
pub mod section;
pub mod state;

pub use entity::{build_entity, build_entity_or_panic, resolve_entity, Entity};
pub use loader::{DslInput, RawEntity, RawSection};
pub use section::{EntityDef, Extension, Section};
pub use state::{path, DslState, InsertOrder, Path, SectionNode};
