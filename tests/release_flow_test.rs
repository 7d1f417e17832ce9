// tests/release_flow_test.rs
use std::fs;
use std::path::Path;

use git_release_flow::domain::{BranchContext, IncrementKind, Version};
use git_release_flow::error::ErrorKind;
use git_release_flow::git::{GitOperation, MockRepository};
use git_release_flow::hosting::MockHost;
use git_release_flow::manifest::{version_field, ManifestSet};
use git_release_flow::release::{
    handle_merge, write_version_env, FlowSettings, MergeBackFlow, MergeEvent, Outcome,
    ReleaseContext, ReleaseFlow, SkipReason, Stage,
};
use git_release_flow::warning::ReleaseWarning;
use git_release_flow::ReleaseError;
use tempfile::TempDir;

fn project(version: &str, with_extension_manifest: bool) -> (TempDir, ManifestSet) {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        format!("{{\n  \"name\": \"extension\",\n  \"version\": \"{}\"\n}}\n", version),
    )
    .unwrap();

    if with_extension_manifest {
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/manifest.json"),
            format!("{{\"manifest_version\": 3, \"version\": \"{}\"}}", version),
        )
        .unwrap();
    }

    let manifests = ManifestSet::new(
        dir.path(),
        "package.json",
        Some("src/manifest.json".to_string()),
    );
    (dir, manifests)
}

fn read_version(path: &Path) -> String {
    version_field(&fs::read_to_string(path).unwrap(), "test").unwrap()
}

fn context(branch: &str, current: Version, previous: Option<Version>) -> ReleaseContext {
    ReleaseContext {
        branch: BranchContext::new(branch, "main"),
        current_version: current,
        previous_version: previous,
    }
}

fn merge_event(source: Option<&str>, destination: &str) -> MergeEvent {
    MergeEvent {
        pr_id: "42".to_string(),
        source_branch: source.map(str::to_string),
        destination_branch: destination.to_string(),
    }
}

#[test]
fn test_cut_release_branch_minor() {
    let (dir, manifests) = project("1.2.3", true);
    let repo = MockRepository::on_branch("main");
    let settings = FlowSettings::default();
    let ctx = ReleaseContext::gather(&repo, &manifests, "main").unwrap();

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let release = flow
        .cut_release_branch(&ctx, IncrementKind::Minor, &manifests)
        .unwrap()
        .done()
        .expect("branch should be cut");

    assert_eq!(release.previous, Version::new(1, 2, 3));
    assert_eq!(release.version, Version::new(1, 3, 0));
    assert_eq!(release.branch, "release/v1.3.0");
    assert!(release.pushed);
    assert!(release.warnings.is_empty());

    assert_eq!(
        flow.history(),
        &[
            Stage::Idle,
            Stage::BranchRequested,
            Stage::BranchCreated,
            Stage::Committed,
            Stage::Pushed
        ]
    );
    assert_eq!(
        repo.operations(),
        vec![
            GitOperation::CreateBranch("release/v1.3.0".to_string()),
            GitOperation::Commit("Bump version to 1.3.0".to_string()),
            GitOperation::Push {
                remote: "origin".to_string(),
                refname: "refs/heads/release/v1.3.0".to_string(),
                set_upstream: true,
            },
        ]
    );

    assert_eq!(read_version(&dir.path().join("package.json")), "1.3.0");
    assert_eq!(read_version(&dir.path().join("src/manifest.json")), "1.3.0");
}

#[test]
fn test_cut_release_branch_major_resets_lower_parts() {
    let (_dir, manifests) = project("1.9.9", true);
    let repo = MockRepository::on_branch("main");
    let settings = FlowSettings::default();
    let ctx = context("main", Version::new(1, 9, 9), None);

    let release = ReleaseFlow::new(&repo, &settings)
        .cut_release_branch(&ctx, IncrementKind::Major, &manifests)
        .unwrap()
        .done()
        .unwrap();

    assert_eq!(release.branch, "release/v2.0.0");
}

#[test]
fn test_cut_release_branch_rejects_overflowing_increment() {
    let (dir, manifests) = project("1.2.18446744073709551615", true);
    let repo = MockRepository::on_branch("main");
    let settings = FlowSettings::default();
    let ctx = ReleaseContext::gather(&repo, &manifests, "main").unwrap();

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let err = flow
        .cut_release_branch(&ctx, IncrementKind::Patch, &manifests)
        .unwrap_err();

    assert!(matches!(err, ReleaseError::VersionOverflow { .. }));
    assert_eq!(flow.stage(), Stage::Failed);
    assert!(repo.operations().is_empty());
    assert_eq!(
        read_version(&dir.path().join("package.json")),
        "1.2.18446744073709551615"
    );
}

#[test]
fn test_cut_release_branch_from_detached_head() {
    let (_dir, manifests) = project("1.2.3", true);
    let repo = MockRepository::on_branch("HEAD");
    let settings = FlowSettings::default();
    let ctx = ReleaseContext::gather(&repo, &manifests, "main").unwrap();

    let err = ReleaseFlow::new(&repo, &settings)
        .cut_release_branch(&ctx, IncrementKind::Patch, &manifests)
        .unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::NotOnTrunk { ref current, .. } if current == "HEAD"
    ));
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test]
fn test_cut_release_branch_requires_trunk() {
    let (dir, manifests) = project("1.2.3", true);
    let repo = MockRepository::on_branch("feature/login");
    let settings = FlowSettings::default();
    let ctx = ReleaseContext::gather(&repo, &manifests, "main").unwrap();

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let err = flow
        .cut_release_branch(&ctx, IncrementKind::Patch, &manifests)
        .unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::NotOnTrunk { ref trunk, ref current } if trunk == "main" && current == "feature/login"
    ));
    assert_eq!(flow.stage(), Stage::Failed);
    assert_eq!(flow.history(), &[Stage::Idle, Stage::Failed]);
    assert!(repo.operations().is_empty());
    assert_eq!(read_version(&dir.path().join("package.json")), "1.2.3");
}

#[test]
fn test_cut_release_branch_requires_clean_tree() {
    let (dir, manifests) = project("1.2.3", true);
    let repo = MockRepository::on_branch("main").with_dirty_tree();
    let settings = FlowSettings::default();
    let ctx = context("main", Version::new(1, 2, 3), None);

    let err = ReleaseFlow::new(&repo, &settings)
        .cut_release_branch(&ctx, IncrementKind::Patch, &manifests)
        .unwrap_err();

    assert!(matches!(err, ReleaseError::DirtyWorkingTree));
    assert!(repo.operations().is_empty());
    assert_eq!(read_version(&dir.path().join("package.json")), "1.2.3");
}

#[test]
fn test_cut_release_branch_refuses_existing_branch() {
    let (_dir, manifests) = project("1.2.3", true);
    let repo = MockRepository::on_branch("main").with_branch("release/v1.3.0");
    let settings = FlowSettings::default();
    let ctx = context("main", Version::new(1, 2, 3), None);

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let err = flow
        .cut_release_branch(&ctx, IncrementKind::Minor, &manifests)
        .unwrap_err();

    assert!(matches!(err, ReleaseError::BranchExists(ref b) if b == "release/v1.3.0"));
    assert_eq!(
        flow.history(),
        &[Stage::Idle, Stage::BranchRequested, Stage::Failed]
    );
    assert!(repo.operations().is_empty());
}

#[test]
fn test_push_failure_after_commit_is_a_warning() {
    let (_dir, manifests) = project("1.2.3", true);
    let repo = MockRepository::on_branch("main").failing_push("authentication required");
    let settings = FlowSettings::default();
    let ctx = context("main", Version::new(1, 2, 3), None);

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let release = flow
        .cut_release_branch(&ctx, IncrementKind::Patch, &manifests)
        .unwrap()
        .done()
        .unwrap();

    assert!(!release.pushed);
    assert_eq!(flow.stage(), Stage::Committed);
    assert!(matches!(
        release.warnings.as_slice(),
        [ReleaseWarning::PushFailed { target, remote, .. }]
            if target == "release/v1.2.4" && remote == "origin"
    ));
}

#[test]
fn test_commit_version_warns_on_missing_extension_manifest() {
    let (dir, manifests) = project("1.3.0", false);
    let repo = MockRepository::on_branch("release/v1.3.0");
    let settings = FlowSettings::default();

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let commit = flow
        .commit_version(Version::new(1, 3, 1), &manifests)
        .unwrap()
        .done()
        .unwrap();

    assert_eq!(commit.branch, "release/v1.3.0");
    assert!(commit.pushed);
    assert_eq!(
        commit.warnings,
        vec![ReleaseWarning::ManifestMissing {
            path: "src/manifest.json".to_string()
        }]
    );
    assert_eq!(flow.history(), &[Stage::Idle, Stage::Committed, Stage::Pushed]);
    assert_eq!(read_version(&dir.path().join("package.json")), "1.3.1");
    assert!(repo.operations().contains(&GitOperation::Push {
        remote: "origin".to_string(),
        refname: "refs/heads/release/v1.3.0".to_string(),
        set_upstream: false,
    }));
}

#[test]
fn test_commit_failure_fails_flow() {
    let (_dir, manifests) = project("1.3.0", true);
    let repo = MockRepository::on_branch("main").failing_commit("index locked");
    let settings = FlowSettings::default();

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let err = flow
        .commit_version(Version::new(1, 3, 1), &manifests)
        .unwrap_err();

    assert!(matches!(err, ReleaseError::Git(_)));
    assert_eq!(flow.stage(), Stage::Failed);
    assert!(repo.operations().is_empty());
}

#[test]
fn test_tag_on_version_change_skips_unchanged_version() {
    let repo = MockRepository::on_branch("main");
    let settings = FlowSettings::default();
    let ctx = context("main", Version::new(2, 0, 0), Some(Version::new(2, 0, 0)));

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let outcome = flow.tag_on_version_change(&ctx).unwrap();

    assert_eq!(
        outcome,
        Outcome::Skipped(SkipReason::VersionUnchanged(Version::new(2, 0, 0)))
    );
    assert_eq!(flow.history(), &[Stage::Idle, Stage::Skipped]);
    assert!(repo.operations().is_empty());
}

#[test]
fn test_tag_on_version_change_creates_and_pushes_tag() {
    let repo = MockRepository::on_branch("main");
    let settings = FlowSettings::default();
    let ctx = context("main", Version::new(2, 0, 0), Some(Version::new(1, 9, 0)));

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let tag = flow.tag_on_version_change(&ctx).unwrap().done().unwrap();

    assert_eq!(tag.tag, "v2.0.0");
    assert_eq!(tag.previous, Some(Version::new(1, 9, 0)));
    assert_eq!(
        flow.history(),
        &[Stage::Idle, Stage::TagRequested, Stage::Tagged]
    );

    let operations = repo.operations();
    assert_eq!(operations.len(), 2);
    match &operations[0] {
        GitOperation::Tag { name, message } => {
            assert_eq!(name, "v2.0.0");
            assert!(message.starts_with("Release version 2.0.0"));
            assert!(message.contains("Previous version: 1.9.0"));
        }
        other => panic!("expected tag, got {:?}", other),
    }
    assert_eq!(
        operations[1],
        GitOperation::Push {
            remote: "origin".to_string(),
            refname: "refs/tags/v2.0.0".to_string(),
            set_upstream: false,
        }
    );
}

#[test]
fn test_tag_on_version_change_skips_existing_tag() {
    let repo = MockRepository::on_branch("main").with_tag("v2.0.0");
    let settings = FlowSettings::default();
    let ctx = context("main", Version::new(2, 0, 0), Some(Version::new(1, 9, 0)));

    let outcome = ReleaseFlow::new(&repo, &settings)
        .tag_on_version_change(&ctx)
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Skipped(SkipReason::TagExists("v2.0.0".to_string()))
    );
    assert!(repo.created_tags().is_empty());
}

#[test]
fn test_tag_on_version_change_requires_trunk() {
    let repo = MockRepository::on_branch("develop");
    let settings = FlowSettings::default();
    let ctx = context("develop", Version::new(2, 0, 0), Some(Version::new(1, 9, 0)));

    let err = ReleaseFlow::new(&repo, &settings)
        .tag_on_version_change(&ctx)
        .unwrap_err();

    assert!(matches!(err, ReleaseError::NotOnTrunk { .. }));
    assert!(repo.operations().is_empty());
}

#[test]
fn test_tag_push_failure_is_fatal() {
    let repo = MockRepository::on_branch("main").failing_push("connection reset");
    let settings = FlowSettings::default();
    let ctx = context("main", Version::new(2, 0, 0), None);

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let err = flow.tag_on_version_change(&ctx).unwrap_err();

    assert!(matches!(err, ReleaseError::Remote(_)));
    assert_eq!(flow.stage(), Stage::Failed);
    assert_eq!(repo.created_tags(), vec!["v2.0.0".to_string()]);
}

#[test]
fn test_tag_merged_release_is_idempotent() {
    // no local trunk: the pipeline clone only has the release branch
    let repo = MockRepository::on_branch("release/v1.4.0");
    let settings = FlowSettings::default();
    let event = merge_event(Some("release/v1.4.0"), "main");

    let first = ReleaseFlow::new(&repo, &settings)
        .tag_merged_release(&event, None)
        .unwrap()
        .done()
        .unwrap();
    assert_eq!(first.tag, "v1.4.0");

    let operations = repo.operations();
    assert_eq!(
        operations[0],
        GitOperation::Pull {
            remote: "origin".to_string(),
            branch: "main".to_string()
        }
    );
    assert_eq!(operations[1], GitOperation::Checkout("main".to_string()));
    match &operations[2] {
        GitOperation::Tag { message, .. } => {
            assert!(message.contains("PR #42"));
            assert!(message.contains("Source branch: release/v1.4.0"));
            assert!(message.contains("Merged to: main"));
        }
        other => panic!("expected tag, got {:?}", other),
    }

    let mut rerun = ReleaseFlow::new(&repo, &settings);
    let second = rerun.tag_merged_release(&event, None).unwrap();
    assert_eq!(
        second,
        Outcome::Skipped(SkipReason::TagExists("v1.4.0".to_string()))
    );
    assert_eq!(
        rerun.history(),
        &[Stage::Idle, Stage::TagRequested, Stage::Skipped]
    );
    assert_eq!(repo.created_tags(), vec!["v1.4.0".to_string()]);
}

#[test]
fn test_tag_merged_release_ignores_other_destinations() {
    let repo = MockRepository::on_branch("develop");
    let settings = FlowSettings::default();
    let event = merge_event(Some("release/v1.4.0"), "develop");

    let outcome = ReleaseFlow::new(&repo, &settings)
        .tag_merged_release(&event, None)
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Skipped(SkipReason::NotTargetingTrunk {
            destination: "develop".to_string()
        })
    );
    assert!(repo.operations().is_empty());
}

#[test]
fn test_tag_merged_release_reports_version_mismatch() {
    let (_dir, manifests) = project("1.3.0", true);
    let repo = MockRepository::on_branch("main");
    let settings = FlowSettings::default();
    let event = merge_event(Some("release/v1.4.0"), "main");

    let tag = ReleaseFlow::new(&repo, &settings)
        .tag_merged_release(&event, Some(&manifests))
        .unwrap()
        .done()
        .unwrap();

    assert_eq!(tag.tag, "v1.4.0");
    assert_eq!(
        tag.warnings,
        vec![ReleaseWarning::VersionMismatch {
            branch_version: Version::new(1, 4, 0),
            manifest_version: Version::new(1, 3, 0),
        }]
    );
}

#[test]
fn test_handle_merge_falls_back_to_version_change() {
    let (_dir, manifests) = project("2.0.0", true);
    let repo = MockRepository::on_branch("main").with_file_at(
        "HEAD~1",
        "package.json",
        r#"{"version": "1.9.0"}"#,
    );
    let settings = FlowSettings::default();
    let event = merge_event(Some("feature/login"), "main");

    let tag = handle_merge(&repo, &settings, Some(&event), &manifests)
        .unwrap()
        .done()
        .unwrap();

    assert_eq!(tag.tag, "v2.0.0");
    assert_eq!(tag.previous, Some(Version::new(1, 9, 0)));
    assert!(!repo
        .operations()
        .iter()
        .any(|op| matches!(op, GitOperation::Pull { .. })));
}

#[test]
fn test_handle_merge_without_metadata() {
    let (_dir, manifests) = project("2.0.0", true);
    let repo = MockRepository::on_branch("main").with_file_at(
        "HEAD~1",
        "package.json",
        r#"{"version": "2.0.0"}"#,
    );
    let settings = FlowSettings::default();

    let outcome = handle_merge(&repo, &settings, None, &manifests).unwrap();
    assert!(outcome.is_skipped());
    assert!(repo.operations().is_empty());
}

#[test]
fn test_handle_merge_into_other_branch_is_skipped() {
    let (_dir, manifests) = project("2.0.0", true);
    let repo = MockRepository::on_branch("develop");
    let settings = FlowSettings::default();
    let event = merge_event(Some("feature/login"), "develop");

    let outcome = handle_merge(&repo, &settings, Some(&event), &manifests).unwrap();
    assert!(matches!(
        outcome,
        Outcome::Skipped(SkipReason::NotTargetingTrunk { .. })
    ));
}

#[test]
fn test_merge_back_flow_needs_no_repository() {
    let host = MockHost::accepting();
    let settings = FlowSettings::default();

    let mut flow = MergeBackFlow::new(&settings);
    let opened = flow
        .open(&host, Version::new(1, 3, 0))
        .unwrap()
        .done()
        .unwrap();

    assert_eq!(opened.created.id, Some(1));
    assert_eq!(opened.spec.title, "Release v1.3.0");
    assert_eq!(opened.spec.source_branch, "release/v1.3.0");
    assert_eq!(opened.spec.destination_branch, "main");
    assert!(!opened.spec.close_source_branch);
    assert_eq!(
        flow.history(),
        &[Stage::Idle, Stage::PrRequested, Stage::PrCreated]
    );
    assert_eq!(host.requests(), vec![opened.spec]);
}

#[test]
fn test_merge_back_flow_rejected() {
    let host = MockHost::rejecting(400, r#"{"error": {"message": "branch not found"}}"#);
    let settings = FlowSettings::default();

    let mut flow = MergeBackFlow::new(&settings);
    let err = flow
        .open(&host, Version::new(1, 3, 0))
        .unwrap_err();

    match err {
        ReleaseError::PullRequestRejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("branch not found"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(flow.stage(), Stage::Failed);
}

#[test]
fn test_write_version_env() {
    let dir = TempDir::new().unwrap();
    let path = write_version_env(dir.path(), &Version::new(1, 3, 0)).unwrap();

    assert_eq!(path, dir.path().join("version.env"));
    assert_eq!(fs::read_to_string(path).unwrap(), "export VERSION=1.3.0\n");
}
