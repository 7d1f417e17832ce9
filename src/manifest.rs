//! Version fields in JSON manifests.
//!
//! `package.json` is the source of truth for the current version. The
//! extension's own `manifest.json` mirrors it when present.

use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use crate::warning::ReleaseWarning;
use log::{debug, warn};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Revision the previous version is read from
pub const PREVIOUS_REVISION: &str = "HEAD~1";

/// Extract the raw `version` string from manifest JSON.
pub fn version_field(content: &str, source: &str) -> Result<String> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| ReleaseError::manifest(format!("{} is not valid JSON: {}", source, e)))?;

    value
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ReleaseError::manifest(format!("Could not read version from {}", source)))
}

/// Manifest files of one project, relative to `root`
#[derive(Debug, Clone)]
pub struct ManifestSet {
    root: PathBuf,
    package_json: String,
    extension_manifest: Option<String>,
}

impl ManifestSet {
    pub fn new(
        root: impl Into<PathBuf>,
        package_json: impl Into<String>,
        extension_manifest: Option<String>,
    ) -> Self {
        ManifestSet {
            root: root.into(),
            package_json: package_json.into(),
            extension_manifest,
        }
    }

    fn package_json_path(&self) -> PathBuf {
        self.root.join(&self.package_json)
    }

    /// Current version from `package.json` on disk
    pub fn current_version(&self) -> Result<Version> {
        let path = self.package_json_path();
        if !path.exists() {
            return Err(ReleaseError::manifest(format!(
                "{} not found",
                self.package_json
            )));
        }

        let content = fs::read_to_string(&path)?;
        Version::parse(&version_field(&content, &self.package_json)?)
    }

    /// Version recorded in `package.json` in the parent commit.
    ///
    /// `None` when there is no parent commit, the file did not exist there,
    /// or its version was not a valid `major.minor.patch`.
    pub fn previous_version<R: Repository>(&self, repo: &R) -> Result<Option<Version>> {
        let git_path = self.package_json.replace('\\', "/");
        let Some(content) = repo.read_file_at(PREVIOUS_REVISION, &git_path)? else {
            debug!("no {} at {}", git_path, PREVIOUS_REVISION);
            return Ok(None);
        };

        let source = format!("{}:{}", PREVIOUS_REVISION, git_path);
        let raw = match version_field(&content, &source) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{}", e);
                return Ok(None);
            }
        };

        match Version::parse(&raw) {
            Ok(version) => Ok(Some(version)),
            Err(e) => {
                warn!("ignoring previous version: {}", e);
                Ok(None)
            }
        }
    }

    /// Write `version` into every manifest.
    ///
    /// `package.json` must exist. A missing extension manifest is reported as
    /// a warning and skipped.
    pub fn set_version(&self, version: &Version) -> Result<Vec<ReleaseWarning>> {
        let mut warnings = Vec::new();

        let package_json = self.package_json_path();
        if !package_json.exists() {
            return Err(ReleaseError::manifest(format!(
                "{} not found",
                self.package_json
            )));
        }
        write_version(&package_json, version)?;

        if let Some(manifest) = &self.extension_manifest {
            let path = self.root.join(manifest);
            if path.exists() {
                write_version(&path, version)?;
            } else {
                warnings.push(ReleaseWarning::ManifestMissing {
                    path: manifest.clone(),
                });
            }
        }

        Ok(warnings)
    }
}

/// Replace the `version` field of a JSON file, keeping key order.
///
/// Output is two-space indented with a trailing newline.
pub fn write_version(path: &Path, version: &Version) -> Result<()> {
    let content = fs::read_to_string(path)?;
    let mut value: Value = serde_json::from_str(&content)?;

    let object = value.as_object_mut().ok_or_else(|| {
        ReleaseError::manifest(format!("{} is not a JSON object", path.display()))
    })?;
    object.insert("version".to_string(), Value::String(version.to_string()));

    let mut output = serde_json::to_string_pretty(&value)?;
    output.push('\n');
    fs::write(path, output)?;

    debug!("set version {} in {}", version, path.display());
    Ok(())
}
