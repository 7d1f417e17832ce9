//! Domain logic - pure release naming rules independent of git operations

pub mod branch;
pub mod pull_request;
pub mod tag;
pub mod version;

pub use branch::{BranchContext, ReleaseBranch};
pub use pull_request::PullRequestSpec;
pub use tag::ReleaseTag;
pub use version::{IncrementKind, Version};
