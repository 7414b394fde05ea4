//! End-to-end compilation.
//!
//! A [`Compiler`] turns a raw [`DslInput`] into a validated [`DslState`],
//! then runs every registered transform over it. Independent inputs can be
//! compiled in parallel with [`Compiler::compile_many`].

use crate::config::EngineConfig;
use crate::core::context::ValidationContext;
use crate::core::error::{DslError, DslResult, ScheduleResult, TrellisResult};
use crate::core::value::Value;
use crate::dsl::entity::{build_from_def, Entity};
use crate::dsl::loader::{DslInput, RawEntity, RawSection};
use crate::dsl::section::{EntityDef, Extension, Section};
use crate::dsl::state::{DslState, Path};
use crate::transform::pipeline::{PassWarning, Pipeline, PipelineOptions};
use crate::transform::progress::PipelineEvent;
use crate::transform::registry::TransformRegistry;
use crate::validation::validate;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

/// Output of a successful compilation.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    /// Final state after every pass
    pub state: DslState,
    pub warnings: Vec<PassWarning>,
    pub halted_by: Option<String>,
    /// Scheduled pass order
    pub order: Vec<String>,
    /// Passes that actually ran
    pub applied: Vec<String>,
}

/// Compiles raw input against a set of extensions.
pub struct Compiler {
    extensions: Vec<Extension>,
    registry: TransformRegistry,
    context: ValidationContext,
    config: EngineConfig,
    options: PipelineOptions,
}

impl Compiler {
    /// Create a compiler for `extensions`, with their transforms and the
    /// built-in passes registered.
    pub fn new(extensions: Vec<Extension>) -> Self {
        let mut registry = TransformRegistry::from_extensions(&extensions);
        crate::transform::builtin::register_all(&mut registry);
        let config = EngineConfig::default();
        Self {
            extensions,
            registry,
            context: config.apply_to(ValidationContext::new()),
            options: config.pipeline_options(),
            config,
        }
    }

    /// Use `context` for validation. The configured capability setting
    /// still applies.
    pub fn with_context(mut self, context: ValidationContext) -> Self {
        self.context = self.config.apply_to(context);
        self
    }

    /// Apply `config`.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.context = config.apply_to(self.context);
        self.options.warnings_as_errors = config.warnings_as_errors;
        self.config = config;
        self
    }

    /// Report pipeline progress to `callback`.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(PipelineEvent) + Send + Sync + 'static,
    {
        self.options = self.options.with_progress(callback);
        self
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The sorted pipeline of registered transforms.
    pub fn pipeline(&self) -> ScheduleResult<Pipeline> {
        Ok(Pipeline::new(&self.registry.transforms())?.with_options(self.options.clone()))
    }

    /// Compile `input`.
    ///
    /// Transforms are ordered before anything is built, so an ordering error
    /// aborts before any pass runs.
    pub fn compile(&self, input: &DslInput) -> TrellisResult<Artifact> {
        let pipeline = self.pipeline()?;
        let state = self.build_state(input)?;
        log::info!(
            "compiled {} entities, running {} transforms",
            state.entity_count(),
            pipeline.len()
        );

        let order = pipeline.order().into_iter().map(String::from).collect();
        let report = pipeline.run(state)?;
        Ok(Artifact {
            state: report.state,
            warnings: report.warnings,
            halted_by: report.halted_by,
            order,
            applied: report.applied,
        })
    }

    /// Compile independent inputs in parallel.
    pub fn compile_many(&self, inputs: &[DslInput]) -> Vec<TrellisResult<Artifact>> {
        inputs.par_iter().map(|input| self.compile(input)).collect()
    }

    /// Validate `input` into a state without running any transform.
    pub fn build_state(&self, input: &DslInput) -> DslResult<DslState> {
        let mut state = DslState::new();
        for raw in &input.sections {
            let (extension, section) = self.find_section(&raw.name)?;
            state = self.compile_section(state, extension, section, vec![raw.name.clone()], raw)?;
        }
        Ok(state)
    }

    fn find_section(&self, name: &str) -> DslResult<(&Extension, &Section)> {
        self.extensions
            .iter()
            .find_map(|ext| ext.find_section(name).map(|section| (ext, section)))
            .ok_or_else(|| DslError::new("trellis", format!("unknown section {}", Value::atom(name))))
    }

    fn compile_section(
        &self,
        mut state: DslState,
        extension: &Extension,
        def: &Section,
        path: Path,
        raw: &RawSection,
    ) -> DslResult<DslState> {
        let options = validate(&raw.options, &def.schema, &self.context)
            .map_err(|err| DslError::validation(extension.name.as_str(), err).with_path(path.iter()))?;
        for (key, value) in options {
            state = state.set_option(&path[..], key, value);
        }

        for raw_entity in &raw.entities {
            let entity_def = def.find_entity(&raw_entity.name).ok_or_else(|| {
                DslError::new(
                    extension.name.as_str(),
                    format!(
                        "no entity {} in section {}",
                        Value::atom(raw_entity.name.as_str()),
                        Value::atom(def.name.as_str())
                    ),
                )
                .with_path(path.iter())
            })?;
            let entity = self.compile_entity(extension, entity_def, &path, raw_entity)?;
            state = state.add_entity(&path[..], entity, self.config.default_order);
        }

        for nested in &raw.sections {
            let nested_def = def.find_section(&nested.name).ok_or_else(|| {
                DslError::new(
                    extension.name.as_str(),
                    format!(
                        "no section {} in section {}",
                        Value::atom(nested.name.as_str()),
                        Value::atom(def.name.as_str())
                    ),
                )
                .with_path(path.iter())
            })?;
            let mut nested_path = path.clone();
            nested_path.push(nested.name.clone());
            state = self.compile_section(state, extension, nested_def, nested_path, nested)?;
        }

        Ok(state)
    }

    fn compile_entity(
        &self,
        extension: &Extension,
        def: &EntityDef,
        path: &[String],
        raw: &RawEntity,
    ) -> DslResult<Entity> {
        let mut options = def
            .apply_args(&raw.args, raw.options.clone())
            .map_err(|message| DslError::new(extension.name.as_str(), message).with_path(path.iter()))?;

        let mut child_path = path.to_vec();
        child_path.push(def.name.clone());

        let mut grouped: IndexMap<String, Vec<Value>> = IndexMap::new();
        for child in &raw.entities {
            let (collection, child_def) = def
                .collection_for(&child.name)
                .zip(def.child(&child.name))
                .ok_or_else(|| {
                    DslError::new(
                        extension.name.as_str(),
                        format!(
                            "no entity {} in entity {}",
                            Value::atom(child.name.as_str()),
                            Value::atom(def.name.as_str())
                        ),
                    )
                    .with_path(child_path.iter())
                })?;
            let built = self.compile_entity(extension, child_def, &child_path, child)?;
            grouped
                .entry(collection.to_string())
                .or_default()
                .push(built.to_value());
        }

        for (collection, mut built) in grouped {
            let merged = match options.shift_remove(&collection) {
                Some(Value::List(mut items)) => {
                    items.append(&mut built);
                    items
                }
                Some(other) => {
                    built.insert(0, other);
                    built
                }
                None => built,
            };
            options.insert(collection, Value::List(merged));
        }

        build_from_def(&extension.name, def, path, options, &self.context)
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("extensions", &self.extensions)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
