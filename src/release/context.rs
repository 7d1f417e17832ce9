use crate::domain::{BranchContext, ReleaseBranch, Version};
use crate::error::Result;
use crate::git::Repository;
use crate::manifest::ManifestSet;

/// Facts about the repository gathered once per invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseContext {
    pub branch: BranchContext,
    pub current_version: Version,
    /// Absent only when there is no earlier commit or manifest to compare with
    pub previous_version: Option<Version>,
}

impl ReleaseContext {
    pub fn gather<R: Repository>(repo: &R, manifests: &ManifestSet, trunk: &str) -> Result<Self> {
        Ok(ReleaseContext {
            branch: BranchContext::new(repo.current_branch()?, trunk),
            current_version: manifests.current_version()?,
            previous_version: manifests.previous_version(repo)?,
        })
    }
}

/// Metadata of a merged pull request as reported by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeEvent {
    pub pr_id: String,
    pub source_branch: Option<String>,
    pub destination_branch: String,
}

/// What a merge event means for tagging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeKind {
    /// Merged somewhere other than trunk
    NotTrunk,
    /// A release branch merged into trunk
    Release(ReleaseBranch),
    /// Any other merge into trunk
    Other,
}

impl MergeEvent {
    pub fn classify(&self, trunk: &str) -> MergeKind {
        if self.destination_branch != trunk {
            return MergeKind::NotTrunk;
        }

        match self.source_branch.as_deref().and_then(ReleaseBranch::parse) {
            Some(branch) => MergeKind::Release(branch),
            None => MergeKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use std::fs;
    use tempfile::TempDir;

    fn event(source: Option<&str>, destination: &str) -> MergeEvent {
        MergeEvent {
            pr_id: "7".to_string(),
            source_branch: source.map(str::to_string),
            destination_branch: destination.to_string(),
        }
    }

    #[test]
    fn test_classify_release_merge() {
        let kind = event(Some("release/v1.4.0"), "main").classify("main");
        assert_eq!(kind, MergeKind::Release(ReleaseBranch::new(Version::new(1, 4, 0))));
    }

    #[test]
    fn test_classify_not_trunk() {
        assert_eq!(
            event(Some("release/v1.4.0"), "develop").classify("main"),
            MergeKind::NotTrunk
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(event(Some("feature/login"), "main").classify("main"), MergeKind::Other);
        assert_eq!(event(None, "main").classify("main"), MergeKind::Other);
    }

    #[test]
    fn test_gather() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"version": "1.2.3"}"#).unwrap();
        let manifests = ManifestSet::new(dir.path(), "package.json", None);
        let repo = MockRepository::on_branch("main").with_file_at(
            "HEAD~1",
            "package.json",
            r#"{"version": "1.2.2"}"#,
        );

        let ctx = ReleaseContext::gather(&repo, &manifests, "main").unwrap();
        assert!(ctx.branch.is_trunk);
        assert_eq!(ctx.current_version, Version::new(1, 2, 3));
        assert_eq!(ctx.previous_version, Some(Version::new(1, 2, 2)));
    }
}
