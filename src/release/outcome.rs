use crate::domain::{PullRequestSpec, Version};
use crate::hosting::CreatedPullRequest;
use crate::warning::ReleaseWarning;
use std::fmt;

/// Result of a release step that did not fail.
///
/// Skips are deliberate no-ops and map to a zero exit code, so callers can
/// tell them apart from real work without inspecting messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    Skipped(SkipReason),
}

impl<T> Outcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Skipped(_) => None,
        }
    }
}

/// Why a step turned into a no-op
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    VersionUnchanged(Version),
    TagExists(String),
    NotTargetingTrunk { destination: String },
    NotReleasePullRequest { source: Option<String> },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::VersionUnchanged(version) => {
                write!(f, "Version unchanged ({}). No tag needed.", version)
            }
            SkipReason::TagExists(tag) => write!(f, "Tag {} already exists. Skipping.", tag),
            SkipReason::NotTargetingTrunk { destination } => write!(
                f,
                "PR merges into '{}', not trunk. Skipping tag creation.",
                destination
            ),
            SkipReason::NotReleasePullRequest { source } => match source {
                Some(source) => write!(f, "Branch '{}' is not a release branch", source),
                None => f.write_str("No source branch given; not a release PR"),
            },
        }
    }
}

/// A release branch that was cut and committed
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRelease {
    pub previous: Version,
    pub version: Version,
    pub branch: String,
    pub pushed: bool,
    pub warnings: Vec<ReleaseWarning>,
}

/// A version written to the manifests and committed on the current branch
#[derive(Debug, Clone, PartialEq)]
pub struct VersionCommit {
    pub version: Version,
    pub branch: String,
    pub pushed: bool,
    pub warnings: Vec<ReleaseWarning>,
}

/// A release tag that was created and pushed
#[derive(Debug, Clone, PartialEq)]
pub struct TagRelease {
    pub tag: String,
    pub version: Version,
    pub previous: Option<Version>,
    pub warnings: Vec<ReleaseWarning>,
}

/// The merge-back pull request that was opened
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedPullRequest {
    pub spec: PullRequestSpec,
    pub created: CreatedPullRequest,
}
