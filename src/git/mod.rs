//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the git operations the
//! release flows need, allowing for multiple implementations including a real
//! repository and a recording fake for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [Repository] trait. The concrete
//! implementations include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation for testing
//!
//! # Usage
//!
//! The release state machine depends on the [Repository] trait only, so every
//! flow can be exercised without a checkout on disk.
//!
//! ```rust
//! # use git_release_flow::git::{PushTarget, Repository};
//! # fn example<R: Repository>(repo: &R) -> Result<(), Box<dyn std::error::Error>> {
//! if !repo.tag_exists("v1.4.0")? {
//!     repo.create_annotated_tag("v1.4.0", "Release version 1.4.0")?;
//!     repo.push("origin", PushTarget::Tag("v1.4.0"), false)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::{GitOperation, MockRepository};
pub use repository::Git2Repository;

use crate::error::Result;
use std::fmt;

/// Reported as the current branch when HEAD is detached, like
/// `git rev-parse --abbrev-ref HEAD`
pub const DETACHED_HEAD: &str = "HEAD";

/// What a push sends to the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushTarget<'a> {
    Branch(&'a str),
    Tag(&'a str),
}

impl PushTarget<'_> {
    /// Fully qualified reference name, e.g. `refs/tags/v1.0.0`
    pub fn refname(&self) -> String {
        match self {
            PushTarget::Branch(name) => format!("refs/heads/{}", name),
            PushTarget::Tag(name) => format!("refs/tags/{}", name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PushTarget::Branch(name) | PushTarget::Tag(name) => name,
        }
    }
}

impl fmt::Display for PushTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Common git operation trait for abstraction
///
/// Every capability the release state machine consumes from version control.
/// Existence checks are separate from the operations they guard so callers can
/// turn a repeated action into a no-op instead of a duplicate.
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map their
/// underlying errors (like `git2::Error`) to [crate::error::ReleaseError]
/// variants, keeping the raw message as context.
pub trait Repository {
    /// Name of the checked-out branch (e.g. "main")
    ///
    /// # Returns
    /// * `Ok(String)` - Short branch name, or [DETACHED_HEAD] when no branch is checked out
    /// * `Err` - If HEAD is unreadable
    fn current_branch(&self) -> Result<String>;

    /// Whether tracked files match HEAD.
    ///
    /// Untracked files do not make the tree dirty.
    fn is_working_tree_clean(&self) -> Result<bool>;

    /// Whether a local branch with this name exists
    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Create a branch at HEAD and check it out
    ///
    /// # Arguments
    /// * `name` - Name of the new branch (e.g. "release/v1.3.0")
    ///
    /// # Returns
    /// * `Ok(())` - Branch created and HEAD now points at it
    /// * `Err` - If the branch already exists or HEAD cannot be resolved
    fn create_and_checkout_branch(&self, name: &str) -> Result<()>;

    /// Check out an existing local branch
    fn checkout_branch(&self, name: &str) -> Result<()>;

    /// Fetch from a remote and fast-forward the local branch
    ///
    /// A branch that only exists on the remote is created locally at the
    /// fetched commit, so it can be checked out afterwards.
    ///
    /// # Arguments
    /// * `remote` - Name of the remote (e.g. "origin")
    /// * `branch` - Local branch to bring up to date
    fn pull(&self, remote: &str, branch: &str) -> Result<()>;

    /// Stage every tracked change and commit it on the current branch
    ///
    /// # Arguments
    /// * `message` - Commit message
    fn commit_all(&self, message: &str) -> Result<()>;

    /// Push a branch or tag to a remote
    ///
    /// # Arguments
    /// * `remote` - Name of the remote (e.g. "origin")
    /// * `target` - Branch or tag to push
    /// * `set_upstream` - Record the remote branch as upstream (branches only)
    ///
    /// # Returns
    /// * `Ok(())` - Remote accepted the update
    /// * `Err` - Network, authentication, or remote rejection
    fn push(&self, remote: &str, target: PushTarget<'_>, set_upstream: bool) -> Result<()>;

    /// Whether a tag with this name exists locally
    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Create an annotated tag on HEAD
    ///
    /// # Arguments
    /// * `name` - Tag name (e.g. "v1.4.0")
    /// * `message` - Tag annotation
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Read a file's content as of a revision.
    ///
    /// # Arguments
    /// * `revision` - Any revision expression (e.g. "HEAD~1")
    /// * `path` - Path relative to the repository root
    ///
    /// # Returns
    /// * `Ok(Some(content))` - The file exists at that revision
    /// * `Ok(None)` - The revision or the file does not exist
    /// * `Err` - If the repository cannot be read
    fn read_file_at(&self, revision: &str, path: &str) -> Result<Option<String>>;
}
