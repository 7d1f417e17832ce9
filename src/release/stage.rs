use crate::error::Result;
use crate::release::Outcome;
use log::{debug, info};
use std::fmt;

/// Where a release attempt currently stands.
///
/// One linear pipeline: cut the branch, commit the bump, push it, tag,
/// then open the merge-back pull request. `Failed` and `Skipped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    BranchRequested,
    BranchCreated,
    Committed,
    Pushed,
    TagRequested,
    Tagged,
    PrRequested,
    PrCreated,
    Failed,
    Skipped,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Failed | Stage::Skipped)
    }

    /// Whether the pipeline may move from `self` to `next`.
    ///
    /// Besides the linear chain, the tag and pull request steps can be
    /// entered straight from `Idle` because each runs as its own invocation,
    /// and a version bump on an existing branch goes `Idle -> Committed`.
    pub fn can_advance_to(&self, next: Stage) -> bool {
        use Stage::*;

        match (*self, next) {
            (from, Failed | Skipped) => !from.is_terminal(),
            (Idle, BranchRequested)
            | (BranchRequested, BranchCreated)
            | (BranchCreated, Committed)
            | (Committed, Pushed)
            | (Pushed, TagRequested)
            | (TagRequested, Tagged)
            | (Tagged, PrRequested)
            | (PrRequested, PrCreated)
            | (Idle, Committed)
            | (Idle, TagRequested)
            | (Idle, PrRequested) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::BranchRequested => "branch requested",
            Stage::BranchCreated => "branch created",
            Stage::Committed => "committed",
            Stage::Pushed => "pushed",
            Stage::TagRequested => "tag requested",
            Stage::Tagged => "tagged",
            Stage::PrRequested => "pull request requested",
            Stage::PrCreated => "pull request created",
            Stage::Failed => "failed",
            Stage::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// The current [Stage] of one attempt plus every stage it visited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTracker {
    stage: Stage,
    history: Vec<Stage>,
}

impl Default for StageTracker {
    fn default() -> Self {
        StageTracker {
            stage: Stage::Idle,
            history: vec![Stage::Idle],
        }
    }
}

impl StageTracker {
    pub fn new() -> Self {
        StageTracker::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Every stage visited, starting with `Idle`
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    pub fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal transition {} -> {}",
            self.stage,
            next
        );
        debug!("stage: {} -> {}", self.stage, next);
        self.stage = next;
        self.history.push(next);
    }

    /// Move to `Failed` or `Skipped` according to the result of a step.
    /// Completed steps leave the stage where the step put it.
    pub fn settle<T>(&mut self, result: &Result<Outcome<T>>) {
        match result {
            Ok(Outcome::Skipped(reason)) => {
                info!("{}", reason);
                self.advance(Stage::Skipped);
            }
            Err(e) => {
                debug!("step failed at {}: {}", self.stage, e);
                self.advance(Stage::Failed);
            }
            Ok(Outcome::Done(_)) => {}
        }
    }
}
