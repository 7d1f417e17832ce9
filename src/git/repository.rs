use crate::error::{ReleaseError, Result};
use crate::git::{PushTarget, DETACHED_HEAD};
use git2::build::CheckoutBuilder;
use git2::{
    BranchType, Cred, CredentialType, ErrorCode, PushOptions, RemoteCallbacks,
    Repository as Git2Repo, StatusOptions,
};
use log::debug;
use std::path::Path;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Fast-forward a local branch to its remote-tracking counterpart.
    ///
    /// Diverged or missing branches are left alone; when the branch is checked
    /// out the working tree is updated too.
    fn fast_forward(&self, remote: &str, branch: &str) -> Result<()> {
        let tracking = format!("refs/remotes/{}/{}", remote, branch);
        let remote_oid = match self.repo.find_reference(&tracking) {
            Ok(reference) => reference.target().ok_or_else(|| {
                ReleaseError::remote(format!("Remote reference {} is invalid", tracking))
            })?,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let local_ref_name = format!("refs/heads/{}", branch);
        let mut local_ref = match self.repo.find_reference(&local_ref_name) {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::NotFound => {
                let commit = self.repo.find_commit(remote_oid)?;
                self.repo.branch(branch, &commit, false)?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let Some(local_oid) = local_ref.target() else {
            return Ok(());
        };

        if local_oid == remote_oid || !self.repo.graph_descendant_of(remote_oid, local_oid)? {
            return Ok(());
        }

        debug!("fast-forwarding {} to {}", branch, remote_oid);
        local_ref.set_target(remote_oid, &format!("fast-forward from {}", tracking))?;

        let head = self.repo.head()?;
        if head.name() == Some(local_ref_name.as_str()) {
            self.repo
                .checkout_head(Some(CheckoutBuilder::new().force()))?;
        }

        Ok(())
    }
}

/// Remote callbacks that try SSH keys, then the SSH agent, then git's
/// configured credential helper.
fn credential_callbacks<'a>(config: git2::Config) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::SSH_KEY) {
            let username = username_from_url.unwrap_or("git");

            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            return Cred::credential_helper(&config, url, username_from_url);
        }

        Cred::default()
    });
    callbacks
}

impl super::Repository for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            debug!("HEAD is detached at {:?}", head.target());
            return Ok(DETACHED_HEAD.to_string());
        }

        head.shorthand()
            .map(|s| s.to_string())
            .ok_or_else(|| git2::Error::from_str("HEAD name is not valid UTF-8").into())
    }

    fn is_working_tree_clean(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        debug!("{} tracked changes in working tree", statuses.len());
        Ok(statuses.is_empty())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_and_checkout_branch(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.branch(name, &head, false)?;
        self.repo.set_head(&format!("refs/heads/{}", name))?;
        debug!("created branch {} at {}", name, head.id());
        Ok(())
    }

    fn checkout_branch(&self, name: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", name);
        let target = self.repo.revparse_single(&refname)?;

        self.repo
            .checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&refname)?;
        debug!("checked out {}", name);
        Ok(())
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote '{}': {}", remote, e)))?;

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(credential_callbacks(self.repo.config()?));

        let refspec_branch = format!("+refs/heads/{0}:refs/remotes/{1}/{0}", branch, remote);
        let refspecs = [refspec_branch.as_str(), "+refs/tags/*:refs/tags/*"];
        remote_handle
            .fetch(&refspecs, Some(&mut fetch_options), None)
            .map_err(|e| {
                ReleaseError::remote(format!("Failed to fetch from remote '{}': {}", remote, e))
            })?;

        self.fast_forward(remote, branch)
    }

    fn commit_all(&self, message: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        index.update_all(["*"], None)?;
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.repo.signature()?;
        let parent = self.repo.head()?.peel_to_commit()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        debug!("committed {}", oid);
        Ok(())
    }

    fn push(&self, remote: &str, target: PushTarget<'_>, set_upstream: bool) -> Result<()> {
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote '{}': {}", remote, e)))?;

        let refname = target.refname();
        let refspec = format!("{0}:{0}", refname);
        let mut rejection: Option<String> = None;

        {
            let mut callbacks = credential_callbacks(self.repo.config()?);
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejection = Some(format!("{}: {}", refname, status));
                }
                Ok(())
            });

            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);

            remote_handle
                .push(&[refspec.as_str()], Some(&mut push_options))
                .map_err(|e| {
                    if e.class() == git2::ErrorClass::Net {
                        ReleaseError::remote(format!("Network error pushing '{}': {}", target, e))
                    } else {
                        ReleaseError::remote(format!(
                            "Failed to push '{}' to '{}': {}",
                            target, remote, e
                        ))
                    }
                })?;
        }

        if let Some(reason) = rejection {
            return Err(ReleaseError::remote(format!(
                "Remote '{}' rejected {}",
                remote, reason
            )));
        }

        if let (true, PushTarget::Branch(name)) = (set_upstream, target) {
            let mut config = self.repo.config()?;
            config.set_str(&format!("branch.{}.remote", name), remote)?;
            config.set_str(&format!("branch.{}.merge", name), &refname)?;
        }

        debug!("pushed {} to {}", refname, remote);
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        let signature = self.repo.signature()?;

        self.repo
            .tag(name, head.as_object(), &signature, message, false)?;
        debug!("tagged {} as {}", head.id(), name);
        Ok(())
    }

    fn read_file_at(&self, revision: &str, path: &str) -> Result<Option<String>> {
        let object = match self.repo.revparse_single(revision) {
            Ok(object) => object,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let tree = object.peel_to_tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        let content = String::from_utf8(blob.content().to_vec()).map_err(|_| {
            ReleaseError::manifest(format!("{} at {} is not valid UTF-8", path, revision))
        })?;

        Ok(Some(content))
    }
}
