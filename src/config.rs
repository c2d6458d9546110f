//! Configuration for shipwright.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SHIPWRIGHT_*)
//! 2. Config file (.shipwright/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .shipwright/config.yaml
//! - Paths in the config file are relative to the project root (the
//!   parent of the .shipwright directory)
//!
//! Everything ambient, including the decryption secrets, is captured
//! once at startup so dispatch logic never reaches into the process
//! environment mid-run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming the credentials project identifier
pub const ENV_PROJECT: &str = "SHIPWRIGHT_PROJECT";
/// Environment variable naming the credentials key identifier
pub const ENV_KEY_ID: &str = "SHIPWRIGHT_KEY_ID";
/// Environment variable overriding the credentials directory
pub const ENV_CREDENTIALS_DIR: &str = "SHIPWRIGHT_CREDENTIALS_DIR";
/// Flag requesting unit-tests-only execution (narrower test selection)
pub const ENV_UNIT_TESTS_ONLY: &str = "SHIPWRIGHT_UNIT_TESTS_ONLY";
/// Hex-encoded decryption key, supplied by CI out-of-band
pub const ENV_ENC_KEY: &str = "SHIPWRIGHT_ENC_KEY";
/// Hex-encoded decryption IV, supplied by CI out-of-band
pub const ENV_ENC_IV: &str = "SHIPWRIGHT_ENC_IV";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub credentials: CredentialsSection,
    #[serde(default)]
    pub test: TestSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsSection {
    /// Project identifier (first half of the credentials filename)
    pub project: Option<String>,
    /// Key identifier (second half of the credentials filename)
    pub key_id: Option<String>,
    /// Directory holding the credentials file (relative to project root)
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestSection {
    /// Root directory of compiled test files
    pub root: Option<String>,
    /// Per-test timeout passed to the test runner, in milliseconds
    pub timeout_ms: Option<u64>,
}

/// Hex-encoded key/IV pair captured from the environment at startup.
/// Both halves must be present for decryption to run at all.
#[derive(Clone)]
pub struct DecryptionSecrets {
    pub key_hex: String,
    pub iv_hex: String,
}

// Redacted: secrets must never leak through debug logging
impl std::fmt::Debug for DecryptionSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DecryptionSecrets { .. }")
    }
}

/// Resolved configuration, built once at startup and passed by
/// reference into the engine and dispatcher.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credentials project identifier
    pub project: String,
    /// Credentials key identifier
    pub key_id: String,
    /// Directory holding the credentials plaintext and ciphertext
    pub credentials_dir: PathBuf,
    /// Root directory of compiled test files
    pub test_root: String,
    /// Per-test timeout in milliseconds
    pub test_timeout_ms: u64,
    /// Narrow the test selection to unit tests only
    pub unit_tests_only: bool,
    /// Decryption secrets, if the environment supplied both halves
    pub decryption_secrets: Option<DecryptionSecrets>,
    /// Path to the config file, if one was found
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: "dev".to_string(),
            key_id: "service-account".to_string(),
            credentials_dir: PathBuf::from("."),
            test_root: "build/test".to_string(),
            test_timeout_ms: 10_000,
            unit_tests_only: false,
            decryption_secrets: None,
            config_file: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        let defaults = Config::default();
        let config_file = find_config_file();

        let (file, base_dir) = match &config_file {
            Some(path) => {
                let parsed = load_config_file(path)?;
                // Project root is the parent of the .shipwright directory
                let base = path
                    .parent()
                    .and_then(|p| p.parent())
                    .unwrap_or(Path::new("."))
                    .to_path_buf();
                (parsed, base)
            }
            None => (ConfigFile::default(), PathBuf::from(".")),
        };

        let project = env_value(ENV_PROJECT)
            .or(file.credentials.project)
            .unwrap_or(defaults.project);
        let key_id = env_value(ENV_KEY_ID)
            .or(file.credentials.key_id)
            .unwrap_or(defaults.key_id);

        let credentials_dir = env_value(ENV_CREDENTIALS_DIR)
            .map(PathBuf::from)
            .or_else(|| {
                file.credentials
                    .dir
                    .map(|dir| resolve_path(&base_dir, &dir))
            })
            .unwrap_or(defaults.credentials_dir);

        let test_root = file.test.root.unwrap_or(defaults.test_root);
        let test_timeout_ms = file.test.timeout_ms.unwrap_or(defaults.test_timeout_ms);

        let decryption_secrets = match (env_value(ENV_ENC_KEY), env_value(ENV_ENC_IV)) {
            (Some(key_hex), Some(iv_hex)) => Some(DecryptionSecrets { key_hex, iv_hex }),
            _ => None,
        };

        Ok(Self {
            project,
            key_id,
            credentials_dir,
            test_root,
            test_timeout_ms,
            unit_tests_only: env_flag(ENV_UNIT_TESTS_ONLY),
            decryption_secrets,
            config_file,
        })
    }

    /// Deterministic credentials plaintext path: `<project>-<key_id>.json`
    /// under the configured credentials directory.
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_dir
            .join(format!("{}-{}.json", self.project, self.key_id))
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".shipwright").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Truthy flag: set to anything except "", "0", or "false"
fn env_flag(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.project, "dev");
        assert_eq!(config.key_id, "service-account");
        assert_eq!(config.test_root, "build/test");
        assert_eq!(config.test_timeout_ms, 10_000);
        assert!(!config.unit_tests_only);
        assert!(config.decryption_secrets.is_none());
    }

    #[test]
    fn test_credentials_path_is_deterministic() {
        let config = Config {
            project: "widgets".to_string(),
            key_id: "ci-key".to_string(),
            credentials_dir: PathBuf::from("/secrets"),
            ..Default::default()
        };

        assert_eq!(
            config.credentials_path(),
            PathBuf::from("/secrets/widgets-ci-key.json")
        );
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let shipwright_dir = temp.path().join(".shipwright");
        std::fs::create_dir_all(&shipwright_dir).unwrap();

        let config_path = shipwright_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
credentials:
  project: widgets
  key_id: ci-key
  dir: ./secrets
test:
  root: dist/test
  timeout_ms: 20000
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.credentials.project, Some("widgets".to_string()));
        assert_eq!(config.credentials.key_id, Some("ci-key".to_string()));
        assert_eq!(config.credentials.dir, Some("./secrets".to_string()));
        assert_eq!(config.test.root, Some("dist/test".to_string()));
        assert_eq!(config.test.timeout_ms, Some(20_000));
    }

    #[test]
    fn test_empty_config_file_uses_defaults() {
        let parsed: ConfigFile = serde_yaml::from_str("{}").unwrap();
        assert!(parsed.credentials.project.is_none());
        assert!(parsed.test.root.is_none());
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./secrets"),
            PathBuf::from("/home/user/project/./secrets")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/secrets"),
            PathBuf::from("/absolute/secrets")
        );
    }

    #[test]
    fn test_env_flag_truthiness() {
        // Distinct variable names: tests in this binary run in parallel
        std::env::set_var("SHIPWRIGHT_TEST_FLAG_ON", "1");
        std::env::set_var("SHIPWRIGHT_TEST_FLAG_ZERO", "0");
        std::env::set_var("SHIPWRIGHT_TEST_FLAG_FALSE", "False");
        std::env::set_var("SHIPWRIGHT_TEST_FLAG_EMPTY", "");

        assert!(env_flag("SHIPWRIGHT_TEST_FLAG_ON"));
        assert!(!env_flag("SHIPWRIGHT_TEST_FLAG_ZERO"));
        assert!(!env_flag("SHIPWRIGHT_TEST_FLAG_FALSE"));
        assert!(!env_flag("SHIPWRIGHT_TEST_FLAG_EMPTY"));
        assert!(!env_flag("SHIPWRIGHT_TEST_FLAG_UNSET"));
    }
}
