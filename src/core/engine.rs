//! Sequential step-execution engine.
//!
//! Consumes the caller-supplied step list strictly in order, suspending
//! at every step boundary until the dispatched operation completes.
//! The first fatal error aborts the remaining steps; pipelines are
//! expected to be re-run from the start after a fix, so there is no
//! retry or rollback.

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::tasks::Tasks;

use super::dispatch;
use super::step::ParsedStep;

/// Engine execution state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// No steps attempted yet
    Idle,
    /// Dispatching the i-th step (0-indexed)
    RunningStep(usize),
    /// Every step completed
    Succeeded,
    /// A step failed; terminal, no further steps attempted
    Failed,
}

/// Outcome of one engine invocation
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Succeeded,
    Failed { step: String, error: String },
}

/// Record of one engine invocation
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Step tokens dispatched, in order, including the failing one
    pub attempted: Vec<String>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Succeeded)
    }
}

/// Sequential step orchestrator
pub struct Engine<'a, T: Tasks> {
    tasks: T,
    config: &'a Config,
    state: EngineState,
}

impl<'a, T: Tasks> Engine<'a, T> {
    pub fn new(tasks: T, config: &'a Config) -> Self {
        Self {
            tasks,
            config,
            state: EngineState::Idle,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn tasks(&self) -> &T {
        &self.tasks
    }

    /// Execute the steps in order, stopping at the first fatal error.
    ///
    /// An empty step list succeeds without performing any operation.
    /// Duplicate tokens are re-executed in place.
    #[instrument(skip(self, steps), fields(count = steps.len()))]
    pub async fn run(&mut self, steps: &[String]) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "Starting step sequence");

        let mut attempted = Vec::with_capacity(steps.len());

        for (step_idx, token) in steps.iter().enumerate() {
            self.state = EngineState::RunningStep(step_idx);
            info!(step = %token, "Running step");
            attempted.push(token.clone());

            let parsed = ParsedStep::parse(token);
            if let Err(e) = dispatch::dispatch(parsed, &self.tasks, self.config).await {
                self.state = EngineState::Failed;
                error!(step = %token, error = %e, "Step failed, aborting remaining steps");

                return RunReport {
                    run_id,
                    started_at,
                    completed_at: Utc::now(),
                    attempted,
                    outcome: RunOutcome::Failed {
                        step: token.clone(),
                        error: e.to_string(),
                    },
                };
            }
        }

        self.state = EngineState::Succeeded;
        info!(%run_id, steps = attempted.len(), "All steps completed");

        RunReport {
            run_id,
            started_at,
            completed_at: Utc::now(),
            attempted,
            outcome: RunOutcome::Succeeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::NpmTasks;

    #[test]
    fn test_engine_starts_idle() {
        let config = Config::default();
        let engine = Engine::new(NpmTasks::new(), &config);
        assert_eq!(*engine.state(), EngineState::Idle);
    }

    #[tokio::test]
    async fn test_empty_step_list_succeeds_without_operations() {
        let config = Config::default();
        let mut engine = Engine::new(NpmTasks::new(), &config);

        let report = engine.run(&[]).await;

        assert!(report.is_success());
        assert!(report.attempted.is_empty());
        assert_eq!(*engine.state(), EngineState::Succeeded);
    }
}
