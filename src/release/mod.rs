//! Release state machine
//!
//! Decides, from the current branch and versions, which git and hosting
//! operations are safe to perform next, and performs them through the
//! [Repository] and [PullRequestHost] adapters. Every create is preceded by an
//! existence check so re-running a step after a partial failure is safe.
//!
//! A [ReleaseFlow] tracks one release attempt. Guard failures and adapter
//! errors move it to [Stage::Failed] and are returned as errors; deliberate
//! no-ops move it to [Stage::Skipped] and are returned as
//! [Outcome::Skipped]. Nothing is retried in-process.

pub mod context;
pub mod outcome;
pub mod stage;

pub use context::{MergeEvent, MergeKind, ReleaseContext};
pub use outcome::{
    BranchRelease, OpenedPullRequest, Outcome, SkipReason, TagRelease, VersionCommit,
};
pub use stage::{Stage, StageTracker};

use crate::domain::{
    BranchContext, IncrementKind, PullRequestSpec, ReleaseBranch, ReleaseTag, Version,
};
use crate::error::{ReleaseError, Result};
use crate::git::{PushTarget, Repository};
use crate::hosting::PullRequestHost;
use crate::manifest::ManifestSet;
use crate::warning::ReleaseWarning;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Branch and remote names the flows operate against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    pub trunk: String,
    pub remote: String,
}

impl Default for FlowSettings {
    fn default() -> Self {
        FlowSettings {
            trunk: "main".to_string(),
            remote: "origin".to_string(),
        }
    }
}

/// One release attempt driven through [Stage]s
pub struct ReleaseFlow<'a, R: Repository> {
    repo: &'a R,
    settings: &'a FlowSettings,
    tracker: StageTracker,
}

impl<'a, R: Repository> ReleaseFlow<'a, R> {
    pub fn new(repo: &'a R, settings: &'a FlowSettings) -> Self {
        ReleaseFlow {
            repo,
            settings,
            tracker: StageTracker::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.tracker.stage()
    }

    /// Every stage visited, starting with `Idle`
    pub fn history(&self) -> &[Stage] {
        self.tracker.history()
    }

    fn advance(&mut self, next: Stage) {
        self.tracker.advance(next);
    }

    /// Run a step, moving to `Failed` or `Skipped` according to its result.
    fn run<T>(&mut self, step: impl FnOnce(&mut Self) -> Result<Outcome<T>>) -> Result<Outcome<T>> {
        let result = step(self);
        self.tracker.settle(&result);
        result
    }

    fn require_trunk(&self, branch: &BranchContext) -> Result<()> {
        if !branch.is_trunk {
            return Err(ReleaseError::NotOnTrunk {
                trunk: self.settings.trunk.clone(),
                current: branch.name.clone(),
            });
        }
        Ok(())
    }

    /// Commit then push; a failed push after a good commit is only a warning.
    fn commit_and_push(
        &mut self,
        version: &Version,
        branch: &str,
        set_upstream: bool,
        warnings: &mut Vec<ReleaseWarning>,
    ) -> Result<bool> {
        self.repo
            .commit_all(&format!("Bump version to {}", version))?;
        self.advance(Stage::Committed);

        match self
            .repo
            .push(&self.settings.remote, PushTarget::Branch(branch), set_upstream)
        {
            Ok(()) => {
                self.advance(Stage::Pushed);
                Ok(true)
            }
            Err(e) => {
                warn!("push of {} failed after commit: {}", branch, e);
                warnings.push(ReleaseWarning::PushFailed {
                    target: branch.to_string(),
                    remote: self.settings.remote.clone(),
                    reason: e.to_string(),
                });
                Ok(false)
            }
        }
    }

    /// Cut `release/vX.Y.Z` from trunk with the bumped version committed.
    ///
    /// Guards: on trunk, clean working tree, release branch absent.
    pub fn cut_release_branch(
        &mut self,
        ctx: &ReleaseContext,
        kind: IncrementKind,
        manifests: &ManifestSet,
    ) -> Result<Outcome<BranchRelease>> {
        self.run(|flow| {
            flow.require_trunk(&ctx.branch)?;
            if !flow.repo.is_working_tree_clean()? {
                return Err(ReleaseError::DirtyWorkingTree);
            }
            flow.advance(Stage::BranchRequested);

            let version = ctx.current_version.increment(kind)?;
            let branch = ReleaseBranch::new(version).name();
            if flow.repo.branch_exists(&branch)? {
                return Err(ReleaseError::BranchExists(branch));
            }

            flow.repo.create_and_checkout_branch(&branch)?;
            flow.advance(Stage::BranchCreated);

            let mut warnings = manifests.set_version(&version)?;
            let pushed = flow.commit_and_push(&version, &branch, true, &mut warnings)?;

            Ok(Outcome::Done(BranchRelease {
                previous: ctx.current_version,
                version,
                branch,
                pushed,
                warnings,
            }))
        })
    }

    /// Set an explicit version in the manifests, commit, and push the
    /// current branch.
    pub fn commit_version(
        &mut self,
        version: Version,
        manifests: &ManifestSet,
    ) -> Result<Outcome<VersionCommit>> {
        self.run(|flow| {
            let branch = flow.repo.current_branch()?;
            let mut warnings = manifests.set_version(&version)?;
            let pushed = flow.commit_and_push(&version, &branch, false, &mut warnings)?;

            Ok(Outcome::Done(VersionCommit {
                version,
                branch,
                pushed,
                warnings,
            }))
        })
    }

    /// Tag trunk when its manifest version differs from the parent commit's.
    pub fn tag_on_version_change(&mut self, ctx: &ReleaseContext) -> Result<Outcome<TagRelease>> {
        self.run(|flow| {
            flow.require_trunk(&ctx.branch)?;

            let version = ctx.current_version;
            if ctx.previous_version == Some(version) {
                return Ok(Outcome::Skipped(SkipReason::VersionUnchanged(version)));
            }
            flow.advance(Stage::TagRequested);

            let tag = ReleaseTag::new(version);
            if flow.repo.tag_exists(&tag.name())? {
                return Ok(Outcome::Skipped(SkipReason::TagExists(tag.name())));
            }

            let message = tag.version_change_message(ctx.previous_version.as_ref());
            flow.push_new_tag(&tag, &message)?;

            Ok(Outcome::Done(TagRelease {
                tag: tag.name(),
                version,
                previous: ctx.previous_version,
                warnings: Vec::new(),
            }))
        })
    }

    /// Tag trunk after a release branch was merged into it.
    ///
    /// When `manifests` is given, the trunk manifest version is compared with
    /// the version in the branch name and any disagreement is reported.
    pub fn tag_merged_release(
        &mut self,
        event: &MergeEvent,
        manifests: Option<&ManifestSet>,
    ) -> Result<Outcome<TagRelease>> {
        self.run(|flow| {
            let branch = match event.classify(&flow.settings.trunk) {
                MergeKind::NotTrunk => {
                    return Ok(Outcome::Skipped(SkipReason::NotTargetingTrunk {
                        destination: event.destination_branch.clone(),
                    }))
                }
                MergeKind::Other => {
                    return Ok(Outcome::Skipped(SkipReason::NotReleasePullRequest {
                        source: event.source_branch.clone(),
                    }))
                }
                MergeKind::Release(branch) => branch,
            };
            flow.advance(Stage::TagRequested);

            // pull first: it creates the local trunk when the clone only
            // has the remote-tracking branch
            let trunk = flow.settings.trunk.clone();
            flow.repo.pull(&flow.settings.remote, &trunk)?;
            flow.repo.checkout_branch(&trunk)?;

            let tag = ReleaseTag::new(branch.version());
            if flow.repo.tag_exists(&tag.name())? {
                return Ok(Outcome::Skipped(SkipReason::TagExists(tag.name())));
            }

            let version = tag.version();
            let mut warnings = Vec::new();
            if let Some(manifests) = manifests {
                match manifests.current_version() {
                    Ok(manifest_version) if manifest_version != version => {
                        warnings.push(ReleaseWarning::VersionMismatch {
                            branch_version: version,
                            manifest_version,
                        });
                    }
                    Ok(_) => {}
                    Err(e) => debug!("skipping version cross-check: {}", e),
                }
            }

            let message = tag.merge_message(&event.pr_id, &branch, &event.destination_branch);
            flow.push_new_tag(&tag, &message)?;

            Ok(Outcome::Done(TagRelease {
                tag: tag.name(),
                version,
                previous: None,
                warnings,
            }))
        })
    }

    /// Create an annotated tag on HEAD and push it.
    fn push_new_tag(&mut self, tag: &ReleaseTag, message: &str) -> Result<()> {
        let name = tag.name();
        self.repo.create_annotated_tag(&name, message)?;
        self.repo
            .push(&self.settings.remote, PushTarget::Tag(&name), false)?;
        self.advance(Stage::Tagged);
        Ok(())
    }
}

/// Opens the merge-back pull request.
///
/// Needs only the hosting service, so it runs outside a checkout.
pub struct MergeBackFlow<'a> {
    settings: &'a FlowSettings,
    tracker: StageTracker,
}

impl<'a> MergeBackFlow<'a> {
    pub fn new(settings: &'a FlowSettings) -> Self {
        MergeBackFlow {
            settings,
            tracker: StageTracker::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.tracker.stage()
    }

    pub fn history(&self) -> &[Stage] {
        self.tracker.history()
    }

    /// Open the pull request merging `release/vX.Y.Z` back into trunk.
    pub fn open<H: PullRequestHost>(
        &mut self,
        host: &H,
        version: Version,
    ) -> Result<Outcome<OpenedPullRequest>> {
        let spec = PullRequestSpec::merge_back(version, &self.settings.trunk);
        self.tracker.advance(Stage::PrRequested);

        let result = host.create_pull_request(&spec).map(|created| {
            self.tracker.advance(Stage::PrCreated);
            Outcome::Done(OpenedPullRequest { spec, created })
        });
        self.tracker.settle(&result);
        result
    }
}

/// Handle a merged pull request: tag release merges from their branch name,
/// fall back to version-change detection for anything else merged to trunk.
pub fn handle_merge<R: Repository>(
    repo: &R,
    settings: &FlowSettings,
    event: Option<&MergeEvent>,
    manifests: &ManifestSet,
) -> Result<Outcome<TagRelease>> {
    if let Some(event) = event {
        match event.classify(&settings.trunk) {
            MergeKind::NotTrunk | MergeKind::Release(_) => {
                return ReleaseFlow::new(repo, settings).tag_merged_release(event, Some(manifests));
            }
            MergeKind::Other => {
                info!("PR #{} is not a release PR merge, using version-change detection", event.pr_id)
            }
        }
    }

    let ctx = ReleaseContext::gather(repo, manifests, &settings.trunk)?;
    ReleaseFlow::new(repo, settings).tag_on_version_change(&ctx)
}

/// Write `export VERSION=X.Y.Z` for later pipeline steps.
pub fn write_version_env(dir: &Path, version: &Version) -> Result<PathBuf> {
    let path = dir.join("version.env");
    fs::write(&path, format!("export VERSION={}\n", version))?;
    Ok(path)
}
