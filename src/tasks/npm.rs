//! Default `Tasks` implementation backed by the npm/npx toolchain.
//!
//! Each operation maps onto the conventional script or tool the
//! orchestrated packages already carry: `tsc` for compilation, `mocha`
//! (under `nyc` for coverage) for tests, and `npm run` scripts for the
//! rest. All process handling goes through the subprocess invoker.

use async_trait::async_trait;

use crate::invoke;

use super::{CompileConfig, TaskError, Tasks, TestSelection};

/// Shells out to npm scripts and npx-installed tools
pub struct NpmTasks {
    /// Path to the npm binary (default: "npm")
    npm: String,
    /// Path to the npx binary (default: "npx")
    npx: String,
}

impl Default for NpmTasks {
    fn default() -> Self {
        Self::new()
    }
}

impl NpmTasks {
    pub fn new() -> Self {
        Self {
            npm: "npm".to_string(),
            npx: "npx".to_string(),
        }
    }

    /// Override the toolchain binaries (used by tests and sandboxed CI)
    pub fn with_binaries(npm: impl Into<String>, npx: impl Into<String>) -> Self {
        Self {
            npm: npm.into(),
            npx: npx.into(),
        }
    }

    async fn npm_run(&self, script: &str) -> Result<(), TaskError> {
        let args = vec!["run".to_string(), script.to_string()];
        invoke::run(&self.npm, &args).await.map_err(TaskError::from)
    }
}

#[async_trait]
impl Tasks for NpmTasks {
    async fn check_install(&self) -> Result<(), TaskError> {
        self.npm_run("check-install").await
    }

    async fn compile(&self, config: CompileConfig) -> Result<(), TaskError> {
        let mut args = vec![
            "tsc".to_string(),
            "--target".to_string(),
            config.language_level,
        ];
        if config.strict {
            args.push("--strict".to_string());
        }

        invoke::run(&self.npx, &args).await.map_err(TaskError::Compile)
    }

    async fn get_plugin_types(&self) -> Result<(), TaskError> {
        self.npm_run("get-plugin-types").await
    }

    async fn init_test_fixtures(&self, include_integration: bool) -> Result<(), TaskError> {
        let mut args = vec!["run".to_string(), "init-fixtures".to_string()];
        if include_integration {
            args.push("--".to_string());
            args.push("--integration".to_string());
        }

        invoke::run(&self.npm, &args).await.map_err(TaskError::from)
    }

    async fn run_tests(&self, selection: TestSelection) -> Result<(), TaskError> {
        selection.validate()?;

        let mut args: Vec<String> = Vec::new();
        if selection.coverage {
            args.push("nyc".to_string());
        }
        args.push("mocha".to_string());
        args.push("--timeout".to_string());
        args.push(selection.timeout_ms.to_string());
        for pattern in &selection.exclude {
            args.push("--ignore".to_string());
            args.push(pattern.clone());
        }
        args.extend(selection.include.iter().cloned());

        invoke::run(&self.npx, &args).await.map_err(TaskError::Test)
    }

    async fn report_coverage(&self) -> Result<(), TaskError> {
        let args = vec![
            "nyc".to_string(),
            "report".to_string(),
            "--reporter=lcov".to_string(),
        ];
        invoke::run(&self.npx, &args).await.map_err(TaskError::from)
    }

    async fn test_non_interference(&self) -> Result<(), TaskError> {
        self.npm_run("test-non-interference").await
    }

    async fn run_script(&self, script: &str) -> Result<(), TaskError> {
        self.npm_run(script).await
    }
}
