use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use git_release_flow::config::{self, Config};
use git_release_flow::domain::{IncrementKind, Version};
use git_release_flow::git::Git2Repository;
use git_release_flow::hosting::{BitbucketAuth, BitbucketClient};
use git_release_flow::package::Packager;
use git_release_flow::release::{
    self, MergeBackFlow, MergeEvent, Outcome, ReleaseContext, ReleaseFlow, TagRelease,
};
use git_release_flow::ui;
use git_release_flow::update_xml::UpdateManifest;
use git_release_flow::ReleaseError;

#[derive(Parser)]
#[command(
    name = "git-release-flow",
    version,
    about = "Cut release branches, bump versions, tag releases and open merge-back pull requests"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[arg(long, global = true, help = "Override the trunk branch name")]
    trunk: Option<String>,

    #[arg(long, global = true, help = "Override the remote name")]
    remote: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create release/vX.Y.Z from trunk with the incremented version committed
    CreateBranch {
        #[arg(long = "type", env = "TYPE", value_name = "Major|Minor|Patch")]
        increment: Option<String>,

        #[arg(
            long,
            env = "BITBUCKET_CLONE_DIR",
            help = "Directory that receives version.env"
        )]
        version_env_dir: Option<PathBuf>,
    },

    /// Set an explicit version in the manifests, commit and push
    BumpVersion {
        #[arg(value_name = "VERSION")]
        version: String,
    },

    /// Tag trunk when the manifest version changed in the last commit
    Tag,

    /// Tag trunk after a pull request was merged
    HandleMerge {
        #[arg(long, env = "BITBUCKET_PR_ID")]
        pr_id: Option<String>,

        #[arg(long, env = "BITBUCKET_PR_SOURCE_BRANCH")]
        source_branch: Option<String>,

        #[arg(long, env = "BITBUCKET_PR_DESTINATION_BRANCH")]
        destination_branch: Option<String>,
    },

    /// Open the pull request merging release/vX.Y.Z back into trunk
    CreatePr {
        #[arg(long, env = "VERSION")]
        version: Option<String>,

        #[arg(long, env = "BITBUCKET_WORKSPACE")]
        workspace: Option<String>,

        #[arg(long, env = "BITBUCKET_REPO_SLUG")]
        repo_slug: Option<String>,

        #[arg(long, env = "BITBUCKET_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,

        #[arg(long, env = "BITBUCKET_USERNAME")]
        username: Option<String>,

        #[arg(long, env = "BITBUCKET_APP_PASSWORD", hide_env_values = true)]
        app_password: Option<String>,
    },

    /// Write the update-check XML for the current version
    UpdateXml {
        #[arg(long, env = "CRX_BASE_URL")]
        crx_base_url: Option<String>,

        #[arg(long, env = "EXTENSION_ID")]
        extension_id: Option<String>,
    },

    /// Sign and pack the built extension
    Package {
        #[arg(long, env = "EXTENSION_PRIVATE_KEY", hide_env_values = true)]
        private_key: Option<String>,
    },
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> Result<()> {
    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(trunk) = args.trunk {
        config.trunk = trunk;
    }
    if let Some(remote) = args.remote {
        config.remote = remote;
    }

    match args.command {
        Command::CreateBranch {
            increment,
            version_env_dir,
        } => create_branch(&config, increment, version_env_dir),
        Command::BumpVersion { version } => bump_version(&config, &version),
        Command::Tag => tag(&config),
        Command::HandleMerge {
            pr_id,
            source_branch,
            destination_branch,
        } => handle_merge(&config, pr_id, source_branch, destination_branch),
        Command::CreatePr {
            version,
            workspace,
            repo_slug,
            access_token,
            username,
            app_password,
        } => {
            if workspace.is_some() {
                config.bitbucket.workspace = workspace;
            }
            if repo_slug.is_some() {
                config.bitbucket.repo_slug = repo_slug;
            }
            let auth = BitbucketAuth::from_credentials(access_token, username, app_password)?;
            create_pr(&config, version, auth)
        }
        Command::UpdateXml {
            crx_base_url,
            extension_id,
        } => update_xml(&config, crx_base_url, extension_id),
        Command::Package { private_key } => package(&config, private_key),
    }
}

fn open_repository() -> Result<Git2Repository> {
    Git2Repository::open(".").context("Not inside a git repository")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn create_branch(
    config: &Config,
    increment: Option<String>,
    version_env_dir: Option<PathBuf>,
) -> Result<()> {
    let kind: IncrementKind = non_empty(increment)
        .ok_or_else(|| ReleaseError::missing_config("TYPE"))?
        .parse()?;

    let repo = open_repository()?;
    let settings = config.flow_settings();
    let manifests = config.manifests(".");
    let ctx = ReleaseContext::gather(&repo, &manifests, &settings.trunk)?;

    ui::display_status(&format!(
        "Current version: {} ({} increment)",
        ctx.current_version, kind
    ));

    let mut flow = ReleaseFlow::new(&repo, &settings);
    let release = match flow.cut_release_branch(&ctx, kind, &manifests)? {
        Outcome::Done(release) => release,
        Outcome::Skipped(reason) => {
            ui::display_skip(&reason);
            return Ok(());
        }
    };

    ui::display_warnings(&release.warnings);
    if release.pushed {
        ui::display_success(&format!(
            "Created and pushed {} ({} -> {})",
            release.branch, release.previous, release.version
        ));
    } else {
        ui::display_success(&format!(
            "Created {} locally ({} -> {})",
            release.branch, release.previous, release.version
        ));
    }

    let dir = version_env_dir.unwrap_or_else(|| PathBuf::from("."));
    let path = release::write_version_env(&dir, &release.version)?;
    ui::display_status(&format!("Wrote {}", path.display()));

    Ok(())
}

fn bump_version(config: &Config, version: &str) -> Result<()> {
    let version = Version::parse(version)?;

    let repo = open_repository()?;
    let settings = config.flow_settings();
    let manifests = config.manifests(".");

    let mut flow = ReleaseFlow::new(&repo, &settings);
    if let Outcome::Done(commit) = flow.commit_version(version, &manifests)? {
        ui::display_warnings(&commit.warnings);
        let location = if commit.pushed { "and pushed " } else { "" };
        ui::display_success(&format!(
            "Version {} committed {}on {}",
            commit.version, location, commit.branch
        ));
    }

    Ok(())
}

fn tag(config: &Config) -> Result<()> {
    let repo = open_repository()?;
    let settings = config.flow_settings();
    let manifests = config.manifests(".");
    let ctx = ReleaseContext::gather(&repo, &manifests, &settings.trunk)?;

    let outcome = ReleaseFlow::new(&repo, &settings).tag_on_version_change(&ctx)?;
    report_tag(outcome);
    Ok(())
}

fn handle_merge(
    config: &Config,
    pr_id: Option<String>,
    source_branch: Option<String>,
    destination_branch: Option<String>,
) -> Result<()> {
    let event = match (non_empty(pr_id), non_empty(destination_branch)) {
        (Some(pr_id), Some(destination_branch)) => Some(MergeEvent {
            pr_id,
            source_branch: non_empty(source_branch),
            destination_branch,
        }),
        _ => None,
    };

    match &event {
        Some(event) => ui::display_status(&format!(
            "Handling merge of PR #{} into {}",
            event.pr_id, event.destination_branch
        )),
        None => ui::display_status("No PR metadata, checking for a version change"),
    }

    let repo = open_repository()?;
    let settings = config.flow_settings();
    let manifests = config.manifests(".");

    let outcome = release::handle_merge(&repo, &settings, event.as_ref(), &manifests)?;
    report_tag(outcome);
    Ok(())
}

fn report_tag(outcome: Outcome<TagRelease>) {
    match outcome {
        Outcome::Done(tag) => {
            ui::display_warnings(&tag.warnings);
            match tag.previous {
                Some(previous) => ui::display_success(&format!(
                    "Created and pushed tag {} (previous version {})",
                    tag.tag, previous
                )),
                None => ui::display_success(&format!("Created and pushed tag {}", tag.tag)),
            }
        }
        Outcome::Skipped(reason) => ui::display_skip(&reason),
    }
}

fn create_pr(config: &Config, version: Option<String>, auth: BitbucketAuth) -> Result<()> {
    let version = Version::parse(
        &non_empty(version).ok_or_else(|| ReleaseError::missing_config("VERSION"))?,
    )?;
    let (workspace, repo_slug) = config.bitbucket_repository()?;
    let host = BitbucketClient::new(&config.bitbucket.api_base, workspace, repo_slug, auth)?;
    let settings = config.flow_settings();

    ui::display_status(&format!(
        "Opening pull request for release v{} into {}",
        version, settings.trunk
    ));
    let outcome = MergeBackFlow::new(&settings).open(&host, version)?;
    if let Outcome::Done(opened) = outcome {
        ui::display_pull_request(&opened.created);
    }

    Ok(())
}

fn update_xml(
    config: &Config,
    crx_base_url: Option<String>,
    extension_id: Option<String>,
) -> Result<()> {
    let manifest = UpdateManifest::new(
        extension_id.unwrap_or_default(),
        crx_base_url.unwrap_or_default(),
        config.extension.crx_file.clone(),
    )?;
    let version = config.manifests(".").current_version()?;

    let path = Path::new(&config.extension.update_xml);
    manifest.write(path, &version)?;
    ui::display_success(&format!(
        "Wrote {} for version {} ({})",
        path.display(),
        version,
        manifest.crx_url()
    ));

    Ok(())
}

fn package(config: &Config, private_key: Option<String>) -> Result<()> {
    let packager = Packager {
        packer: config.extension.packer.clone(),
        dist_dir: PathBuf::from(&config.extension.dist_dir),
        output: PathBuf::from(&config.extension.crx_file),
    };

    ui::display_status(&format!(
        "Packing {} with {}",
        packager.dist_dir.display(),
        packager.packer
    ));
    let report = packager.package(private_key.as_deref().unwrap_or_default())?;
    ui::display_warnings(&report.warnings);
    ui::display_success(&format!("Packed {}", report.output.display()));

    Ok(())
}
