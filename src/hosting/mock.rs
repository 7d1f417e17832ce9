use crate::domain::PullRequestSpec;
use crate::error::{ReleaseError, Result};
use crate::hosting::{CreatedPullRequest, PullRequestHost};
use std::cell::RefCell;

/// Pull request host that records requests instead of sending them
#[derive(Debug, Default)]
pub struct MockHost {
    requests: RefCell<Vec<PullRequestSpec>>,
    rejection: Option<(u16, String)>,
}

impl MockHost {
    /// A host that accepts every request
    pub fn accepting() -> Self {
        MockHost::default()
    }

    /// A host that answers every request with this status and body
    pub fn rejecting(status: u16, body: impl Into<String>) -> Self {
        MockHost {
            requests: RefCell::new(Vec::new()),
            rejection: Some((status, body.into())),
        }
    }

    pub fn requests(&self) -> Vec<PullRequestSpec> {
        self.requests.borrow().clone()
    }
}

impl PullRequestHost for MockHost {
    fn create_pull_request(&self, spec: &PullRequestSpec) -> Result<CreatedPullRequest> {
        self.requests.borrow_mut().push(spec.clone());

        if let Some((status, body)) = &self.rejection {
            return Err(ReleaseError::PullRequestRejected {
                status: *status,
                body: body.clone(),
            });
        }

        let id = self.requests.borrow().len() as u64;
        Ok(CreatedPullRequest {
            id: Some(id),
            url: Some(format!("https://example.invalid/pull-requests/{}", id)),
        })
    }
}
