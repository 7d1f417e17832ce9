use crate::domain::branch::ReleaseBranch;
use crate::domain::version::Version;
use std::fmt;

/// A release tag, `vMAJOR.MINOR.PATCH`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseTag {
    version: Version,
}

impl ReleaseTag {
    /// Create a new tag for a version
    pub fn new(version: Version) -> Self {
        ReleaseTag { version }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn name(&self) -> String {
        format!("v{}", self.version)
    }

    /// Annotation for a tag created because the manifest version changed on trunk.
    pub fn version_change_message(&self, previous: Option<&Version>) -> String {
        let previous = previous
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string());

        format!(
            "Release version {version}\n\n\
             This tag marks the release of version {version}.\n\
             Previous version: {previous}\n\n\
             Created automatically after version change detected on trunk.",
            version = self.version,
            previous = previous
        )
    }

    /// Annotation for a tag created after a release pull request merged.
    pub fn merge_message(&self, pr_id: &str, source: &ReleaseBranch, destination: &str) -> String {
        format!(
            "Release version {version}\n\n\
             Automatically created after merging release PR #{pr_id}\n\
             Source branch: {source}\n\
             Merged to: {destination}",
            version = self.version,
            pr_id = pr_id,
            source = source,
            destination = destination
        )
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.version)
    }
}
