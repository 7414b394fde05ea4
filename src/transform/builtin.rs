//! Built-in passes.

use crate::core::error::DslError;
use crate::dsl::entity::Entity;
use crate::dsl::state::DslState;
use crate::transform::registry::TransformRegistry;
use crate::transform::transformer::{TransformResult, Transformer};

/// Register all built-in passes.
pub fn register_all(registry: &mut TransformRegistry) {
    registry.register(VerifyUniqueIdentifiers);
}

/// Rejects sibling entities of the same kind that share an identifier.
///
/// Runs after compilation so it sees entities added by other passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyUniqueIdentifiers;

impl VerifyUniqueIdentifiers {
    pub const NAME: &'static str = "verify_unique_identifiers";
}

impl Transformer for VerifyUniqueIdentifiers {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn transform(&self, state: &DslState) -> TransformResult {
        for (path, node) in state.nodes() {
            if let Err(err) = check_siblings(&node.entities, path.clone()) {
                return TransformResult::Error(err);
            }
        }
        TransformResult::Unchanged
    }

    fn after_compile(&self) -> bool {
        true
    }
}

fn check_siblings(entities: &[Entity], path: Vec<String>) -> Result<(), DslError> {
    for (i, entity) in entities.iter().enumerate() {
        let Some(identifier) = &entity.identifier else {
            continue;
        };
        let duplicate = entities[..i]
            .iter()
            .any(|earlier| earlier.name == entity.name && earlier.identifier.as_ref() == Some(identifier));
        if duplicate {
            return Err(DslError::new(
                entity.target.as_str(),
                format!("got duplicate {}: {}", entity.name, identifier),
            )
            .with_path(path));
        }
    }

    for entity in entities {
        for (collection, children) in &entity.entities {
            let mut child_path = path.clone();
            child_path.push(entity.name.clone());
            child_path.push(collection.clone());
            check_siblings(children, child_path)?;
        }
    }

    Ok(())
}
