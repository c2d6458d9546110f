//! Step dispatch.
//!
//! Maps a classified step onto the matching operation. Every branch
//! either completes or returns a fatal [`TaskError`] for the engine to
//! observe. Two paths are deliberately non-fatal and only log a
//! diagnostic: unknown named steps, and credential decryption when the
//! environment supplied no secrets.

use tracing::{info, warn};

use crate::config::Config;
use crate::core::step::ParsedStep;
use crate::crypto::{self, CredentialMaterial};
use crate::tasks::{CompileConfig, TaskError, Tasks, TestSelection};

/// Named operations the dispatcher resolves 1:1
const STEP_CHECK_INSTALL: &str = "check-install";
const STEP_ENCRYPT_CREDENTIALS: &str = "encrypt-service-account-credentials";
const STEP_DECRYPT_CREDENTIALS: &str = "decrypt-service-account-credentials";
const STEP_GET_PLUGIN_TYPES: &str = "get-plugin-types";
const STEP_INIT_TEST_FIXTURES: &str = "init-test-fixtures";
const STEP_RUN_UNIT_TESTS: &str = "run-unit-tests";
const STEP_RUN_UNIT_TESTS_COVERAGE: &str = "run-unit-tests-with-coverage";
const STEP_REPORT_COVERAGE: &str = "report-coverage";
const STEP_TEST_NON_INTERFERENCE: &str = "test-non-interference";

/// Invoke the operation a parsed step maps to
pub async fn dispatch<T: Tasks>(
    step: ParsedStep,
    tasks: &T,
    config: &Config,
) -> Result<(), TaskError> {
    match step {
        ParsedStep::NpmPassthrough { .. } => tasks.run_script(&step.script_name()).await,

        ParsedStep::Compile {
            language_level,
            strict,
        } => {
            tasks
                .compile(CompileConfig {
                    strict,
                    language_level,
                })
                .await
        }

        ParsedStep::Named(name) => dispatch_named(&name, tasks, config).await,
    }
}

async fn dispatch_named<T: Tasks>(
    name: &str,
    tasks: &T,
    config: &Config,
) -> Result<(), TaskError> {
    match name {
        STEP_CHECK_INSTALL => tasks.check_install().await,
        STEP_GET_PLUGIN_TYPES => tasks.get_plugin_types().await,
        STEP_INIT_TEST_FIXTURES => tasks.init_test_fixtures(!config.unit_tests_only).await,
        STEP_RUN_UNIT_TESTS => tasks.run_tests(TestSelection::new(false, config)).await,
        STEP_RUN_UNIT_TESTS_COVERAGE => tasks.run_tests(TestSelection::new(true, config)).await,
        STEP_REPORT_COVERAGE => tasks.report_coverage().await,
        STEP_TEST_NON_INTERFERENCE => tasks.test_non_interference().await,
        STEP_ENCRYPT_CREDENTIALS => encrypt_credentials(config),
        STEP_DECRYPT_CREDENTIALS => decrypt_credentials(config),
        unknown => {
            // Non-fatal: a typo must not block unrelated steps in the
            // same invocation
            warn!(step = %unknown, "Unknown step, skipping");
            Ok(())
        }
    }
}

/// Encrypt the deterministic credentials file and hand the fresh key/IV
/// to the operator. The pair goes to stdout only; nothing here persists
/// or logs it.
fn encrypt_credentials(config: &Config) -> Result<(), TaskError> {
    let path = config.credentials_path();
    let material = crypto::encrypt(&path)?;

    println!(
        "Encrypted {} -> {}",
        path.display(),
        crypto::ciphertext_path(&path).display()
    );
    println!("Store these in your secret manager; they are shown only once:");
    println!("  key: {}", material.key_hex());
    println!("  iv:  {}", material.iv_hex());

    Ok(())
}

/// Decrypt the credentials ciphertext with secrets captured from the
/// environment at startup. Missing secrets skip the step: integration
/// tests needing the file will fail later, which is the intended signal
/// in environments without secrets.
fn decrypt_credentials(config: &Config) -> Result<(), TaskError> {
    let Some(secrets) = &config.decryption_secrets else {
        warn!("Decryption key/IV not set in environment, skipping credential decryption");
        return Ok(());
    };

    let material = CredentialMaterial::from_hex(&secrets.key_hex, &secrets.iv_hex)?;
    let path = config.credentials_path();
    crypto::decrypt(&material, &path)?;

    info!(path = %path.display(), "Decrypted service-account credentials");
    Ok(())
}
