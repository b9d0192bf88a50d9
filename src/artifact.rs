//! Reference artifacts read from process-local storage at startup.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Raw artifact text together with its content fingerprint.
#[derive(Debug, Clone)]
pub struct ArtifactSource {
    pub text: String,
    /// Lowercase hex SHA-256 of `text`.
    pub fingerprint: String,
}

/// Read an artifact file and fingerprint its bytes.
pub fn read(path: &Path) -> std::io::Result<ArtifactSource> {
    let text = fs::read_to_string(path)?;
    let fingerprint = sha256_hex(&text);
    Ok(ArtifactSource { text, fingerprint })
}

pub fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
