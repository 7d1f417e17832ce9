use crate::domain::branch::ReleaseBranch;
use crate::domain::version::Version;

/// Everything needed to open the merge-back pull request for a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSpec {
    pub title: String,
    pub description: String,
    pub source_branch: String,
    pub destination_branch: String,
    pub close_source_branch: bool,
}

impl PullRequestSpec {
    /// Merge `release/vX.Y.Z` back into `trunk`.
    pub fn merge_back(version: Version, trunk: &str) -> Self {
        PullRequestSpec {
            title: format!("Release v{}", version),
            description: merge_back_description(&version, trunk),
            source_branch: ReleaseBranch::new(version).name(),
            destination_branch: trunk.to_string(),
            close_source_branch: false,
        }
    }
}

fn merge_back_description(version: &Version, trunk: &str) -> String {
    format!(
        "Automated release for version {version}\n\n\
         This PR merges the release branch back into {trunk} to keep version numbers synchronized.\n\n\
         ## Changes\n\
         - Version bumped to {version}\n\
         - Extension built and packaged\n\
         - Deployed to dev and prod environments\n\n\
         Please review and merge to complete the release process.",
        version = version,
        trunk = trunk
    )
}
