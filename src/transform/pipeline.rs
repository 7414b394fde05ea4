//! Running sorted transforms over a state.
//!
//! The pipeline threads a [`DslState`] through each ordinary pass in order.
//! After-compile passes then see the final state; whatever state they return
//! is discarded.

use crate::core::error::{DslError, DslResult, ScheduleResult};
use crate::dsl::state::DslState;
use crate::transform::progress::{PipelineEvent, ProgressCallback, ProgressTracker};
use crate::transform::scheduler::sort;
use crate::transform::transformer::{TransformResult, Transformer};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Pipeline options.
#[derive(Clone, Default)]
pub struct PipelineOptions {
    /// Fail on the first warning instead of collecting it.
    pub warnings_as_errors: bool,
    /// Progress callback.
    pub progress_callback: Option<Arc<ProgressCallback>>,
}

impl std::fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("warnings_as_errors", &self.warnings_as_errors)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl PipelineOptions {
    /// Create a new options builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat warnings as errors.
    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    /// Set progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(PipelineEvent) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(Box::new(callback)));
        self
    }
}

/// A warning raised by a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassWarning {
    pub transform: String,
    pub message: String,
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Final state
    pub state: DslState,
    pub warnings: Vec<PassWarning>,
    /// Name of the pass that halted the run, if any
    pub halted_by: Option<String>,
    /// Names of the passes that ran, in order
    pub applied: Vec<String>,
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Whether a pass halted the run.
    pub fn halted(&self) -> bool {
        self.halted_by.is_some()
    }
}

/// Sorted transforms ready to run.
#[derive(Clone)]
pub struct Pipeline {
    transforms: Vec<Arc<dyn Transformer>>,
    options: PipelineOptions,
}

impl Pipeline {
    /// Sort `transforms` into a pipeline.
    pub fn new(transforms: &[Arc<dyn Transformer>]) -> ScheduleResult<Self> {
        Ok(Self {
            transforms: sort(transforms)?,
            options: PipelineOptions::default(),
        })
    }

    /// Set options.
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Pass names in execution order.
    pub fn order(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Run every pass over `state`.
    pub fn run(&self, state: DslState) -> DslResult<PipelineReport> {
        let callback = self.options.progress_callback.as_deref();
        let mut tracker = ProgressTracker::new(self.transforms.len());
        if let Some(callback) = callback {
            tracker = tracker.with_callback(&**callback);
        }
        tracker.start();

        let mut state = state;
        let mut warnings = Vec::new();
        let mut applied = Vec::new();
        let mut halted_by = None;

        for transform in &self.transforms {
            let name = transform.name();
            let deferred = transform.after_compile();

            tracker.pass_started(name);
            let started = Instant::now();
            let result = transform.transform(&state);
            let elapsed = started.elapsed().as_millis() as u64;
            applied.push(name.to_string());

            match result {
                TransformResult::Unchanged => {
                    tracker.pass_completed(name, elapsed, false);
                }
                TransformResult::Updated(next) => {
                    tracker.pass_completed(name, elapsed, !deferred);
                    if !deferred {
                        state = next;
                    }
                }
                TransformResult::Warn(next, messages) => {
                    for message in messages {
                        log::warn!("[{}] {}", name, message);
                        tracker.warning(name, &message);
                        if self.options.warnings_as_errors {
                            tracker.report_error(name, message.clone());
                            return Err(DslError::new(name, message));
                        }
                        warnings.push(PassWarning {
                            transform: name.to_string(),
                            message,
                        });
                    }
                    tracker.pass_completed(name, elapsed, !deferred);
                    if !deferred {
                        state = next;
                    }
                }
                TransformResult::Error(err) => {
                    log::error!("transform {} failed: {}", name, err);
                    tracker.report_error(name, err.to_string());
                    return Err(err);
                }
                TransformResult::Halt => {
                    log::info!("transform {} halted the pipeline", name);
                    tracker.pass_completed(name, elapsed, false);
                    tracker.halted(name);
                    halted_by = Some(name.to_string());
                    break;
                }
            }
        }

        tracker.complete();
        log::debug!(
            "pipeline ran {} of {} passes in {}ms",
            applied.len(),
            self.transforms.len(),
            tracker.elapsed_ms()
        );

        Ok(PipelineReport {
            state,
            warnings,
            halted_by,
            applied,
            duration_ms: tracker.elapsed_ms(),
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("order", &self.order())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use crate::transform::transformer::FnTransformer;
    use std::sync::Mutex;

    fn shared(passes: Vec<FnTransformer>) -> Vec<Arc<dyn Transformer>> {
        passes
            .into_iter()
            .map(|p| Arc::new(p) as Arc<dyn Transformer>)
            .collect()
    }

    fn mark(name: &'static str) -> FnTransformer {
        FnTransformer::new(name, move |state| {
            TransformResult::Updated(state.clone().persist(name, Value::Boolean(true)))
        })
    }

    #[test]
    fn test_updates_are_threaded() {
        let pipeline = Pipeline::new(&shared(vec![
            FnTransformer::new("count", |state| {
                let seen = state.get_persisted("first", Value::Boolean(false));
                TransformResult::Updated(state.clone().persist("first_seen", seen))
            })
            .runs_after("first"),
            mark("first"),
        ]))
        .unwrap();

        assert_eq!(pipeline.order(), vec!["first", "count"]);
        let report = pipeline.run(DslState::new()).unwrap();
        assert_eq!(
            report.state.fetch_persisted("first_seen"),
            Some(&Value::Boolean(true))
        );
        assert_eq!(report.applied, vec!["first", "count"]);
        assert!(!report.halted());
    }

    #[test]
    fn test_warnings_are_collected() {
        let pipeline = Pipeline::new(&shared(vec![
            FnTransformer::new("lint", |state| {
                TransformResult::Warn(state.clone(), vec!["deprecated style".into()])
            }),
            mark("after"),
        ]))
        .unwrap();

        let report = pipeline.run(DslState::new()).unwrap();
        assert_eq!(
            report.warnings,
            vec![PassWarning {
                transform: "lint".into(),
                message: "deprecated style".into()
            }]
        );
        assert!(report.state.fetch_persisted("after").is_some());
    }

    #[test]
    fn test_warnings_as_errors() {
        let pipeline = Pipeline::new(&shared(vec![FnTransformer::new("lint", |state| {
            TransformResult::Warn(state.clone(), vec!["bad".into()])
        })]))
        .unwrap()
        .with_options(PipelineOptions::new().with_warnings_as_errors(true));

        let err = pipeline.run(DslState::new()).unwrap_err();
        assert_eq!(err.component, "lint");
        assert_eq!(err.to_string(), "[lint]\nbad");
    }

    #[test]
    fn test_error_aborts() {
        let pipeline = Pipeline::new(&shared(vec![
            FnTransformer::new("fail", |_| {
                TransformResult::Error(DslError::new("Demo", "broken"))
            }),
            mark("never"),
        ]))
        .unwrap();

        let err = pipeline.run(DslState::new()).unwrap_err();
        assert_eq!(err.component, "Demo");
    }

    #[test]
    fn test_halt_keeps_state_and_skips_after_compile() {
        let verified = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&verified);
        let pipeline = Pipeline::new(&shared(vec![
            FnTransformer::new("verify", move |_| {
                *flag.lock().unwrap() = true;
                TransformResult::Unchanged
            })
            .after_compile_only(),
            mark("first"),
            FnTransformer::new("stop", |_| TransformResult::Halt).runs_after("first"),
            mark("never").runs_after("stop"),
        ]))
        .unwrap();

        let report = pipeline.run(DslState::new()).unwrap();
        assert_eq!(report.halted_by.as_deref(), Some("stop"));
        assert!(report.state.fetch_persisted("first").is_some());
        assert!(report.state.fetch_persisted("never").is_none());
        assert!(!*verified.lock().unwrap());
    }

    #[test]
    fn test_after_compile_state_is_discarded() {
        let pipeline = Pipeline::new(&shared(vec![
            FnTransformer::new("verify", |state| {
                TransformResult::Warn(
                    state.clone().persist("verify", Value::Boolean(true)),
                    vec!["looks odd".into()],
                )
            })
            .after_compile_only(),
            mark("main"),
        ]))
        .unwrap();

        let report = pipeline.run(DslState::new()).unwrap();
        assert!(report.state.fetch_persisted("main").is_some());
        assert!(report.state.fetch_persisted("verify").is_none());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_progress_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let pipeline = Pipeline::new(&shared(vec![mark("a"), mark("b")]))
            .unwrap()
            .with_options(
                PipelineOptions::new().with_progress(move |event| sink.lock().unwrap().push(event)),
            );

        pipeline.run(DslState::new()).unwrap();
        let events = events.lock().unwrap();
        assert_eq!(events.first(), Some(&PipelineEvent::Started { total_passes: 2 }));
        assert!(matches!(
            events.last(),
            Some(PipelineEvent::Completed { passes_run: 2, .. })
        ));
        let started = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::PassStarted { .. }))
            .count();
        assert_eq!(started, 2);
    }

    #[test]
    fn test_empty_pipeline_returns_input() {
        let pipeline = Pipeline::new(&[]).unwrap();
        assert!(pipeline.is_empty());
        let state = DslState::new().persist("x", Value::Integer(1));
        let report = pipeline.run(state.clone()).unwrap();
        assert_eq!(report.state, state);
    }
}
