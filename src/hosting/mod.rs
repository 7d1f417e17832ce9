//! Pull request hosting abstraction
//!
//! The release flows only need one capability from the hosting service:
//! opening a pull request. [PullRequestHost] captures it so the state machine
//! can be driven against [bitbucket::BitbucketClient] in production and
//! [mock::MockHost] in tests.

pub mod bitbucket;
pub mod mock;

pub use bitbucket::{BitbucketAuth, BitbucketClient};
pub use mock::MockHost;

use crate::domain::PullRequestSpec;
use crate::error::Result;

/// What the host reports back for a created pull request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedPullRequest {
    pub id: Option<u64>,
    pub url: Option<String>,
}

/// Opens pull requests on a hosting service
pub trait PullRequestHost {
    /// Create a pull request.
    ///
    /// # Returns
    /// * `Ok(CreatedPullRequest)` - The host accepted it (HTTP 201)
    /// * `Err(ReleaseError::PullRequestRejected)` - Any other status, with the body
    /// * `Err` - Transport failure
    fn create_pull_request(&self, spec: &PullRequestSpec) -> Result<CreatedPullRequest>;
}
