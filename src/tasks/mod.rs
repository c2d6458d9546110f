//! Collaborator operations invoked by the dispatcher.
//!
//! The build toolchain (compiler, test runner, fixture setup, coverage
//! reporting) sits behind the [`Tasks`] trait so the engine can be
//! exercised without spawning real processes. Every operation returns a
//! typed result; the engine's fail-fast loop is a plain early-return
//! check, with no unwinding control flow.

use async_trait::async_trait;
use glob::Pattern;
use thiserror::Error;

use crate::config::Config;
use crate::crypto::CryptoError;
use crate::invoke::InvokeError;

pub mod npm;

pub use npm::NpmTasks;

/// Fatal step failures. Each aborts the remaining sequence unchanged.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("compilation failed: {0}")]
    Compile(#[source] InvokeError),

    #[error("tests failed: {0}")]
    Test(#[source] InvokeError),

    #[error("subprocess failed: {0}")]
    Subprocess(#[from] InvokeError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("invalid test glob `{pattern}`: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Compiler invocation parameters, decoded from a `compile-*` step token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileConfig {
    pub strict: bool,
    pub language_level: String,
}

/// What the test runner should execute: include/exclude glob sets under
/// a root directory, a coverage flag, and a per-test timeout.
///
/// Constructed fresh per run-tests step from a fixed policy and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSelection {
    pub root: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub coverage: bool,
    pub timeout_ms: u64,
}

impl TestSelection {
    /// Fixed selection policy: everything under the test root, with the
    /// curated exclude list only when unit-tests-only execution was
    /// requested at startup.
    pub fn new(coverage: bool, config: &Config) -> Self {
        let root = config.test_root.clone();
        let include = vec![format!("{root}/**/*.js")];
        let exclude = if config.unit_tests_only {
            vec![
                format!("{root}/**/*.integration.js"),
                "build/system-test/**".to_string(),
            ]
        } else {
            Vec::new()
        };

        Self {
            root,
            include,
            exclude,
            coverage,
            timeout_ms: config.test_timeout_ms,
        }
    }

    /// Reject malformed glob patterns before handing them to the runner
    pub fn validate(&self) -> Result<(), TaskError> {
        for pattern in self.include.iter().chain(self.exclude.iter()) {
            Pattern::new(pattern).map_err(|source| TaskError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// The build-toolchain collaborators behind every non-credential step.
///
/// Implemented for real by [`NpmTasks`]; tests substitute recording
/// fakes to observe the engine's sequencing.
#[async_trait]
pub trait Tasks {
    /// Verify the package installs cleanly from a packed tarball
    async fn check_install(&self) -> Result<(), TaskError>;

    /// Compile the sources, failing on any compiler error
    async fn compile(&self, config: CompileConfig) -> Result<(), TaskError>;

    /// Generate plugin type declarations
    async fn get_plugin_types(&self) -> Result<(), TaskError>;

    /// Initialize test fixtures, optionally including integration fixtures
    async fn init_test_fixtures(&self, include_integration: bool) -> Result<(), TaskError>;

    /// Run the selected tests, failing if any test fails
    async fn run_tests(&self, selection: TestSelection) -> Result<(), TaskError>;

    /// Report previously collected coverage
    async fn report_coverage(&self) -> Result<(), TaskError>;

    /// Check that co-installed packages do not interfere with each other
    async fn test_non_interference(&self) -> Result<(), TaskError>;

    /// Forward a passthrough step to the package manager's script runner
    async fn run_script(&self, script: &str) -> Result<(), TaskError>;
}
