use std::fmt;

use crate::domain::Version;

/// Non-fatal conditions met during a release step.
/// The step still succeeds, but the operator should know about them.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// The local commit succeeded but the remote was not updated
    PushFailed {
        target: String,
        remote: String,
        reason: String,
    },
    /// An optional manifest file was not found and was left alone
    ManifestMissing { path: String },
    /// A transient file could not be removed after use
    CleanupFailed { path: String, reason: String },
    /// The merged release branch and the trunk manifest disagree on the version
    VersionMismatch {
        branch_version: Version,
        manifest_version: Version,
    },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::PushFailed {
                target,
                remote,
                reason,
            } => write!(
                f,
                "Failed to push '{}' to '{}': {}. Local state is intact; push manually with: git push {} {}",
                target, remote, reason, remote, target
            ),
            ReleaseWarning::ManifestMissing { path } => {
                write!(f, "{} not found, skipping manifest update", path)
            }
            ReleaseWarning::CleanupFailed { path, reason } => {
                write!(f, "Could not remove {}: {}", path, reason)
            }
            ReleaseWarning::VersionMismatch {
                branch_version,
                manifest_version,
            } => write!(
                f,
                "Release branch version {} differs from trunk manifest version {}",
                branch_version, manifest_version
            ),
        }
    }
}
