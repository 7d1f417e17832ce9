use crate::error::{ReleaseError, Result};
use crate::warning::ReleaseWarning;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// Signs and packs the built extension with an external packer (`crx3`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packager {
    pub packer: String,
    pub dist_dir: PathBuf,
    pub output: PathBuf,
}

/// A packed extension
#[derive(Debug, Clone, PartialEq)]
pub struct PackageReport {
    pub output: PathBuf,
    pub warnings: Vec<ReleaseWarning>,
}

/// Decode a base64 private key, tolerating line breaks.
pub fn decode_private_key(encoded: &str) -> Result<Vec<u8>> {
    if encoded.trim().is_empty() {
        return Err(ReleaseError::missing_config("EXTENSION_PRIVATE_KEY"));
    }

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| ReleaseError::packaging(format!("private key is not valid base64: {}", e)))
}

impl Packager {
    /// Pack `dist_dir` into `output` using the base64-encoded private key.
    ///
    /// The key only exists on disk while the packer runs. Failing to delete it
    /// afterwards is reported as a warning and never hides the pack result.
    pub fn package(&self, private_key: &str) -> Result<PackageReport> {
        let key = decode_private_key(private_key)?;

        let mut key_file = tempfile::Builder::new()
            .prefix("extension-key")
            .suffix(".pem")
            .tempfile()?;
        key_file.write_all(&key)?;
        key_file.flush()?;

        let result = self.run_packer(key_file.path().to_path_buf());

        let key_path = key_file.path().display().to_string();
        let mut warnings = Vec::new();
        if let Err(e) = key_file.close() {
            warnings.push(ReleaseWarning::CleanupFailed {
                path: key_path,
                reason: e.to_string(),
            });
        }

        result.map(|()| PackageReport {
            output: self.output.clone(),
            warnings,
        })
    }

    fn run_packer(&self, key_path: PathBuf) -> Result<()> {
        debug!(
            "{} pack {} -> {}",
            self.packer,
            self.dist_dir.display(),
            self.output.display()
        );

        let output = Command::new(&self.packer)
            .arg("pack")
            .arg(&self.dist_dir)
            .arg("-p")
            .arg(&key_path)
            .arg("-o")
            .arg(&self.output)
            .output()
            .map_err(|e| {
                ReleaseError::packaging(format!("Failed to execute {}: {}", self.packer, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(ReleaseError::packaging(format!(
                "{} failed with exit code {}\nStdout: {}\nStderr: {}",
                self.packer,
                output.status.code().unwrap_or(-1),
                stdout,
                stderr
            )));
        }

        Ok(())
    }
}
