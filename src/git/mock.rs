use crate::error::{ReleaseError, Result};
use crate::git::{PushTarget, Repository};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// A mutating call recorded by [MockRepository]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOperation {
    CreateBranch(String),
    Checkout(String),
    Pull { remote: String, branch: String },
    Commit(String),
    Push {
        remote: String,
        refname: String,
        set_upstream: bool,
    },
    Tag { name: String, message: String },
}

#[derive(Debug, Default)]
struct MockState {
    current_branch: String,
    branches: HashSet<String>,
    tags: HashSet<String>,
    files: HashMap<(String, String), String>,
    operations: Vec<GitOperation>,
}

/// Mock repository for testing without actual git operations
///
/// State changes through `&self` like the real adapter, and every mutating
/// call is recorded so tests can assert on exactly what was attempted.
#[derive(Debug, Default)]
pub struct MockRepository {
    state: RefCell<MockState>,
    dirty: bool,
    fail_commit: Option<String>,
    fail_push: Option<String>,
    fail_tag: Option<String>,
}

impl MockRepository {
    /// Create a clean repository checked out on `branch`
    pub fn on_branch(branch: impl Into<String>) -> Self {
        let branch = branch.into();
        let repo = MockRepository::default();
        {
            let mut state = repo.state.borrow_mut();
            state.branches.insert(branch.clone());
            state.current_branch = branch;
        }
        repo
    }

    /// Mark tracked files as modified
    pub fn with_dirty_tree(mut self) -> Self {
        self.dirty = true;
        self
    }

    /// Add an existing local branch
    pub fn with_branch(self, name: impl Into<String>) -> Self {
        self.state.borrow_mut().branches.insert(name.into());
        self
    }

    /// Add an existing tag
    pub fn with_tag(self, name: impl Into<String>) -> Self {
        self.state.borrow_mut().tags.insert(name.into());
        self
    }

    /// Make a file readable at a revision (e.g. "HEAD~1")
    pub fn with_file_at(
        self,
        revision: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.state
            .borrow_mut()
            .files
            .insert((revision.into(), path.into()), content.into());
        self
    }

    /// Make every commit fail with this message
    pub fn failing_commit(mut self, message: impl Into<String>) -> Self {
        self.fail_commit = Some(message.into());
        self
    }

    /// Make every push fail with this message
    pub fn failing_push(mut self, message: impl Into<String>) -> Self {
        self.fail_push = Some(message.into());
        self
    }

    /// Make tag creation fail with this message
    pub fn failing_tag(mut self, message: impl Into<String>) -> Self {
        self.fail_tag = Some(message.into());
        self
    }

    /// Mutating calls in the order they were made
    pub fn operations(&self) -> Vec<GitOperation> {
        self.state.borrow().operations.clone()
    }

    /// Tags created through [Repository::create_annotated_tag]
    pub fn created_tags(&self) -> Vec<String> {
        self.state
            .borrow()
            .operations
            .iter()
            .filter_map(|op| match op {
                GitOperation::Tag { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, operation: GitOperation) {
        self.state.borrow_mut().operations.push(operation);
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<String> {
        Ok(self.state.borrow().current_branch.clone())
    }

    fn is_working_tree_clean(&self) -> Result<bool> {
        Ok(!self.dirty)
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.borrow().branches.contains(name))
    }

    fn create_and_checkout_branch(&self, name: &str) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if !state.branches.insert(name.to_string()) {
                return Err(git2::Error::from_str("branch already exists").into());
            }
            state.current_branch = name.to_string();
        }
        self.record(GitOperation::CreateBranch(name.to_string()));
        Ok(())
    }

    fn checkout_branch(&self, name: &str) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if !state.branches.contains(name) {
                return Err(git2::Error::from_str("branch not found").into());
            }
            state.current_branch = name.to_string();
        }
        self.record(GitOperation::Checkout(name.to_string()));
        Ok(())
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.state.borrow_mut().branches.insert(branch.to_string());
        self.record(GitOperation::Pull {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }

    fn commit_all(&self, message: &str) -> Result<()> {
        if let Some(reason) = &self.fail_commit {
            return Err(git2::Error::from_str(reason).into());
        }
        self.record(GitOperation::Commit(message.to_string()));
        Ok(())
    }

    fn push(&self, remote: &str, target: PushTarget<'_>, set_upstream: bool) -> Result<()> {
        if let Some(reason) = &self.fail_push {
            return Err(ReleaseError::remote(reason.clone()));
        }
        self.record(GitOperation::Push {
            remote: remote.to_string(),
            refname: target.refname(),
            set_upstream,
        });
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.borrow().tags.contains(name))
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        if let Some(reason) = &self.fail_tag {
            return Err(git2::Error::from_str(reason).into());
        }
        {
            let mut state = self.state.borrow_mut();
            if !state.tags.insert(name.to_string()) {
                return Err(git2::Error::from_str("tag already exists").into());
            }
        }
        self.record(GitOperation::Tag {
            name: name.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    fn read_file_at(&self, revision: &str, path: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .borrow()
            .files
            .get(&(revision.to_string(), path.to_string()))
            .cloned())
    }
}
