//! SHA-256 verification of downloaded artifacts.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use fetchbin_schema::Sha256Digest;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    Mismatch {
        path: PathBuf,
        expected: Sha256Digest,
        actual: Sha256Digest,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Compute the SHA-256 digest of a file.
pub fn sha256_file(path: &Path) -> io::Result<Sha256Digest> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let count = file.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }
    Ok(Sha256Digest::from_bytes(&hasher.finalize().into()))
}

/// Check `path` against `expected`. On mismatch the file is removed.
///
/// # Errors
///
/// Returns [`VerifyError::Mismatch`] if the digests differ, or
/// [`VerifyError::Io`] if the file cannot be read.
pub fn verify_file(path: &Path, expected: &Sha256Digest) -> Result<Sha256Digest, VerifyError> {
    let actual = sha256_file(path)?;
    if &actual != expected {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("failed to remove rejected artifact {}: {e}", path.display());
        }
        return Err(VerifyError::Mismatch {
            path: path.to_path_buf(),
            expected: expected.clone(),
            actual,
        });
    }
    tracing::debug!("verified {} ({})", path.display(), actual.short(12));
    Ok(actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    // sha256("hello world")
    const HELLO: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn digest_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a");
        fs::write(&path, b"hello world").unwrap();
        assert_eq!(sha256_file(&path).unwrap().as_str(), HELLO);
    }

    #[test]
    fn match_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a");
        fs::write(&path, b"hello world").unwrap();
        let expected = Sha256Digest::new(HELLO.to_uppercase()).unwrap();
        assert!(verify_file(&path, &expected).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn single_byte_change_fails_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a");
        fs::write(&path, b"hello worle").unwrap();
        let expected = Sha256Digest::new(HELLO).unwrap();

        let err = verify_file(&path, &expected).unwrap_err();
        assert!(matches!(err, VerifyError::Mismatch { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let expected = Sha256Digest::new(HELLO).unwrap();
        assert!(matches!(
            verify_file(&dir.path().join("nope"), &expected),
            Err(VerifyError::Io(_))
        ));
    }
}
