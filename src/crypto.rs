//! Credential file encryption for integration-test secrets.
//!
//! Encrypts a service-account JSON file into a repository-committable
//! `<file>.enc` sibling using AES-256-GCM. The key and IV (the GCM
//! nonce) are generated fresh on every encryption, shown to the
//! operator exactly once, and never written to disk by this module.
//! GCM authentication guarantees that a wrong key or IV fails loudly
//! instead of producing silently wrong plaintext.

use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use thiserror::Error;
use tracing::debug;

/// Size of the AES-256 key in bytes
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce ("IV") in bytes
pub const IV_SIZE: usize = 12;

/// Failures of the credential cipher. All are fatal to the run.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("credentials file not found: {path}")]
    MissingFile { path: PathBuf },

    #[error("credentials file is not valid JSON: {path}")]
    NotJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed key: expected {expected} bytes, got {actual}")]
    BadKeyLength { expected: usize, actual: usize },

    #[error("malformed IV: expected {expected} bytes, got {actual}")]
    BadIvLength { expected: usize, actual: usize },

    #[error("key or IV is not valid hex")]
    BadHex(#[from] hex::FromHexError),

    #[error("decryption failed: wrong key/IV or corrupted ciphertext")]
    AuthFailure,

    #[error("encryption failed")]
    EncryptFailure,

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The key + IV pair required to recover an encrypted credentials file.
///
/// Produced fresh by [`encrypt`], handed to the operator as hex for
/// storage in a secret manager, and supplied back through the
/// environment at decryption time. Possessing only one half renders
/// the ciphertext unrecoverable.
pub struct CredentialMaterial {
    pub key: [u8; KEY_SIZE],
    pub iv: [u8; IV_SIZE],
}

// Redacted: key material must never leak through debug logging
impl std::fmt::Debug for CredentialMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialMaterial { .. }")
    }
}

impl CredentialMaterial {
    /// Generate fresh random material from the OS RNG
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    /// Parse hex-encoded key and IV, as carried in the environment
    pub fn from_hex(key_hex: &str, iv_hex: &str) -> Result<Self, CryptoError> {
        let key_bytes = hex::decode(key_hex.trim())?;
        let iv_bytes = hex::decode(iv_hex.trim())?;

        let key: [u8; KEY_SIZE] =
            key_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::BadKeyLength {
                    expected: KEY_SIZE,
                    actual: key_bytes.len(),
                })?;
        let iv: [u8; IV_SIZE] =
            iv_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::BadIvLength {
                    expected: IV_SIZE,
                    actual: iv_bytes.len(),
                })?;

        Ok(Self { key, iv })
    }

    /// Hex encoding of the key, for operator display
    pub fn key_hex(&self) -> String {
        hex::encode(self.key)
    }

    /// Hex encoding of the IV, for operator display
    pub fn iv_hex(&self) -> String {
        hex::encode(self.iv)
    }
}

/// Ciphertext sibling of a plaintext path (`creds.json` -> `creds.json.enc`)
pub fn ciphertext_path(plaintext: &Path) -> PathBuf {
    let mut name = plaintext.as_os_str().to_owned();
    name.push(".enc");
    PathBuf::from(name)
}

/// Encrypt the credentials file at `plaintext_path`, writing the
/// ciphertext to the `.enc` sibling and returning the freshly generated
/// key/IV pair for the operator to store out-of-band.
pub fn encrypt(plaintext_path: &Path) -> Result<CredentialMaterial, CryptoError> {
    let plaintext = read_file(plaintext_path)?;

    // A credentials file that is not JSON is an operator mistake;
    // refuse to commit garbage ciphertext to the repository.
    serde_json::from_slice::<serde_json::Value>(&plaintext).map_err(|source| {
        CryptoError::NotJson {
            path: plaintext_path.to_path_buf(),
            source,
        }
    })?;

    let material = CredentialMaterial::generate();
    let cipher =
        Aes256Gcm::new_from_slice(&material.key).map_err(|_| CryptoError::BadKeyLength {
            expected: KEY_SIZE,
            actual: material.key.len(),
        })?;
    let nonce = Nonce::from_slice(&material.iv);
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_slice())
        .map_err(|_| CryptoError::EncryptFailure)?;

    let out_path = ciphertext_path(plaintext_path);
    std::fs::write(&out_path, &ciphertext).map_err(|source| CryptoError::Io {
        path: out_path.clone(),
        source,
    })?;

    debug!(path = %out_path.display(), "Wrote ciphertext artifact");
    Ok(material)
}

/// Decrypt the `.enc` sibling of `plaintext_path` with the supplied
/// key/IV pair, overwriting the plaintext file with the recovered bytes.
pub fn decrypt(material: &CredentialMaterial, plaintext_path: &Path) -> Result<(), CryptoError> {
    let enc_path = ciphertext_path(plaintext_path);
    let ciphertext = read_file(&enc_path)?;

    let cipher =
        Aes256Gcm::new_from_slice(&material.key).map_err(|_| CryptoError::BadKeyLength {
            expected: KEY_SIZE,
            actual: material.key.len(),
        })?;
    let nonce = Nonce::from_slice(&material.iv);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_slice())
        .map_err(|_| CryptoError::AuthFailure)?;

    std::fs::write(plaintext_path, plaintext).map_err(|source| CryptoError::Io {
        path: plaintext_path.to_path_buf(),
        source,
    })?;

    debug!(path = %plaintext_path.display(), "Recovered credentials plaintext");
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, CryptoError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CryptoError::MissingFile {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CryptoError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
