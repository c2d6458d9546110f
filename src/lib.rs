//! shipwright - sequential build-and-release step orchestrator
//!
//! Accepts an ordered list of named steps on invocation and executes
//! each in turn: compiling, dependency-install checks, plugin type
//! generation, test fixtures, unit tests (with or without coverage),
//! coverage reporting, cross-package interference checks, and
//! encrypting/decrypting the service-account credentials file used by
//! integration tests.
//!
//! # Architecture
//!
//! - `core::step`: classifies raw step tokens into a typed union
//! - `core::dispatch`: maps a classified step onto an operation
//! - `core::engine`: runs steps strictly in order, fail-fast
//! - `tasks`: the build-toolchain seam (trait + npm implementation)
//! - `invoke`: subprocess execution
//! - `crypto`: credential file encryption (AES-256-GCM)
//! - `config`: startup-resolved configuration, env + YAML
//!
//! # Usage
//!
//! ```bash
//! # Compile strictly, then run unit tests
//! shipwright compile-es5-strict run-unit-tests
//!
//! # Forward to an npm script
//! shipwright npm-lint-fix
//!
//! # Encrypt CI credentials (prints the key/IV once)
//! shipwright encrypt-service-account-credentials
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod invoke;
pub mod tasks;

// Re-export main types at crate root for convenience
pub use crate::core::{Engine, EngineState, ParsedStep, RunOutcome, RunReport};
pub use config::Config;
pub use crypto::{CredentialMaterial, CryptoError};
pub use invoke::InvokeError;
pub use tasks::{CompileConfig, NpmTasks, TaskError, Tasks, TestSelection};
