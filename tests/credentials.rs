//! Credential Provisioning Tests
//!
//! Round-trip fidelity, wrong-key rejection, and the non-fatal
//! missing-secrets policy, all against temp directories.

use shipwright::config::DecryptionSecrets;
use shipwright::crypto::{self, CredentialMaterial};
use shipwright::{Config, Engine, NpmTasks, RunOutcome};
use tempfile::TempDir;

const PLAINTEXT: &[u8] = br#"{"type":"service_account","project_id":"widgets","private_key_id":"ci-key"}"#;

/// Config pointing the deterministic credentials filename into a tempdir
fn config_for(dir: &TempDir) -> Config {
    Config {
        project: "widgets".to_string(),
        key_id: "ci-key".to_string(),
        credentials_dir: dir.path().to_path_buf(),
        ..Default::default()
    }
}

fn write_plaintext(config: &Config) {
    std::fs::write(config.credentials_path(), PLAINTEXT).unwrap();
}

#[test]
fn test_round_trip_through_deterministic_filename() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    write_plaintext(&config);

    let path = config.credentials_path();
    assert!(path.ends_with("widgets-ci-key.json"));

    let material = crypto::encrypt(&path).unwrap();
    assert!(crypto::ciphertext_path(&path).exists());

    std::fs::remove_file(&path).unwrap();
    crypto::decrypt(&material, &path).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), PLAINTEXT);
}

#[test]
fn test_ciphertext_never_contains_plaintext() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    write_plaintext(&config);

    let path = config.credentials_path();
    crypto::encrypt(&path).unwrap();

    let ciphertext = std::fs::read(crypto::ciphertext_path(&path)).unwrap();
    assert_ne!(ciphertext, PLAINTEXT);
    // The GCM tag adds 16 bytes over the plaintext
    assert_eq!(ciphertext.len(), PLAINTEXT.len() + 16);
}

#[test]
fn test_wrong_material_never_silently_succeeds() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    write_plaintext(&config);

    let path = config.credentials_path();
    crypto::encrypt(&path).unwrap();

    let wrong = CredentialMaterial::generate();
    assert!(crypto::decrypt(&wrong, &path).is_err());

    // The failed decryption must not have touched the plaintext
    assert_eq!(std::fs::read(&path).unwrap(), PLAINTEXT);
}

#[tokio::test]
async fn test_decrypt_step_with_secrets_recovers_plaintext() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&dir);
    write_plaintext(&config);

    let path = config.credentials_path();
    let material = crypto::encrypt(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    config.decryption_secrets = Some(DecryptionSecrets {
        key_hex: material.key_hex(),
        iv_hex: material.iv_hex(),
    });

    // The credential steps never reach the npm toolchain
    let mut engine = Engine::new(NpmTasks::new(), &config);
    let report = engine
        .run(&["decrypt-service-account-credentials".to_string()])
        .await;

    assert!(report.is_success());
    assert_eq!(std::fs::read(&path).unwrap(), PLAINTEXT);
}

#[tokio::test]
async fn test_missing_secrets_skip_without_failing_or_modifying() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    write_plaintext(&config);
    assert!(config.decryption_secrets.is_none());

    let mut engine = Engine::new(NpmTasks::new(), &config);
    let report = engine
        .run(&["decrypt-service-account-credentials".to_string()])
        .await;

    assert!(report.is_success());
    assert_eq!(
        std::fs::read(config.credentials_path()).unwrap(),
        PLAINTEXT
    );
}

#[tokio::test]
async fn test_malformed_secrets_are_fatal() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&dir);
    write_plaintext(&config);
    crypto::encrypt(&config.credentials_path()).unwrap();

    config.decryption_secrets = Some(DecryptionSecrets {
        key_hex: "deadbeef".to_string(),
        iv_hex: "deadbeef".to_string(),
    });

    let mut engine = Engine::new(NpmTasks::new(), &config);
    let report = engine
        .run(&["decrypt-service-account-credentials".to_string()])
        .await;

    match &report.outcome {
        RunOutcome::Failed { step, error } => {
            assert_eq!(step, "decrypt-service-account-credentials");
            assert!(error.contains("malformed key"));
        }
        other => panic!("expected failure outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_encrypt_step_missing_plaintext_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    // No plaintext written

    let mut engine = Engine::new(NpmTasks::new(), &config);
    let report = engine
        .run(&["encrypt-service-account-credentials".to_string()])
        .await;

    match &report.outcome {
        RunOutcome::Failed { step, error } => {
            assert_eq!(step, "encrypt-service-account-credentials");
            assert!(error.contains("not found"));
        }
        other => panic!("expected failure outcome, got {:?}", other),
    }
}
