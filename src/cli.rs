//! Command-line interface for shipwright.
//!
//! The whole surface is one positional list: step tokens, executed in
//! the order given. CI pipelines and local developers compose ad hoc
//! sequences like `shipwright compile-es5-strict run-unit-tests`.

use anyhow::Result;
use clap::Parser;

use crate::config::Config;
use crate::core::{Engine, RunOutcome};
use crate::tasks::NpmTasks;

/// shipwright - sequential build-and-release step orchestrator
#[derive(Parser, Debug)]
#[command(name = "shipwright")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Steps to execute, in order (e.g. compile-es5-strict run-unit-tests)
    pub steps: Vec<String>,
}

impl Cli {
    /// Execute the supplied steps
    pub async fn execute(self) -> Result<()> {
        let config = Config::load()?;
        let mut engine = Engine::new(NpmTasks::new(), &config);

        let report = engine.run(&self.steps).await;

        match &report.outcome {
            RunOutcome::Succeeded => {
                eprintln!(
                    "[Run {} completed: {} step(s)]",
                    report.run_id,
                    report.attempted.len()
                );
                Ok(())
            }
            RunOutcome::Failed { step, error } => {
                eprintln!("[Run {} failed at step '{}': {}]", report.run_id, step, error);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_order_preserving() {
        let cli = Cli::parse_from(["shipwright", "check-install", "compile-es5", "npm-lint"]);
        assert_eq!(cli.steps, vec!["check-install", "compile-es5", "npm-lint"]);
    }

    #[test]
    fn test_no_steps_is_valid() {
        let cli = Cli::parse_from(["shipwright"]);
        assert!(cli.steps.is_empty());
    }

    #[test]
    fn test_duplicate_steps_are_kept() {
        let cli = Cli::parse_from(["shipwright", "npm-lint", "npm-lint"]);
        assert_eq!(cli.steps.len(), 2);
    }
}
