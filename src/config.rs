use crate::error::{ReleaseError, Result};
use crate::hosting::bitbucket::DEFAULT_API_BASE;
use crate::manifest::ManifestSet;
use crate::release::FlowSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the project-level configuration file
pub const CONFIG_FILE_NAME: &str = "releaseflow.toml";

/// Represents the complete configuration for git-release-flow.
///
/// Assembled once at startup from the configuration file and command-line or
/// environment overrides, then passed down explicitly.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_trunk")]
    pub trunk: String,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default)]
    pub manifest: ManifestConfig,

    #[serde(default)]
    pub bitbucket: BitbucketConfig,

    #[serde(default)]
    pub extension: ExtensionConfig,
}

fn default_trunk() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_package_json() -> String {
    "package.json".to_string()
}

fn default_extension_manifest() -> Option<String> {
    Some("src/manifest.json".to_string())
}

/// Files that carry the project version.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ManifestConfig {
    #[serde(default = "default_package_json")]
    pub package_json: String,

    /// Mirrored when present; `None` disables it
    #[serde(default = "default_extension_manifest")]
    pub extension_manifest: Option<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        ManifestConfig {
            package_json: default_package_json(),
            extension_manifest: default_extension_manifest(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

/// Bitbucket repository that pull requests are opened against.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BitbucketConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub workspace: Option<String>,

    #[serde(default)]
    pub repo_slug: Option<String>,
}

impl Default for BitbucketConfig {
    fn default() -> Self {
        BitbucketConfig {
            api_base: default_api_base(),
            workspace: None,
            repo_slug: None,
        }
    }
}

fn default_dist_dir() -> String {
    "dist".to_string()
}

fn default_crx_file() -> String {
    "complaint.crx".to_string()
}

fn default_update_xml() -> String {
    "update.xml".to_string()
}

fn default_packer() -> String {
    "crx3".to_string()
}

/// Packaging and update manifest settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExtensionConfig {
    #[serde(default = "default_dist_dir")]
    pub dist_dir: String,

    #[serde(default = "default_crx_file")]
    pub crx_file: String,

    #[serde(default = "default_update_xml")]
    pub update_xml: String,

    #[serde(default = "default_packer")]
    pub packer: String,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        ExtensionConfig {
            dist_dir: default_dist_dir(),
            crx_file: default_crx_file(),
            update_xml: default_update_xml(),
            packer: default_packer(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            trunk: default_trunk(),
            remote: default_remote(),
            manifest: ManifestConfig::default(),
            bitbucket: BitbucketConfig::default(),
            extension: ExtensionConfig::default(),
        }
    }
}

impl Config {
    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            trunk: self.trunk.clone(),
            remote: self.remote.clone(),
        }
    }

    /// Manifest files resolved against `root`
    pub fn manifests(&self, root: impl Into<PathBuf>) -> ManifestSet {
        ManifestSet::new(
            root,
            self.manifest.package_json.clone(),
            self.manifest.extension_manifest.clone(),
        )
    }

    /// Workspace and repository slug, failing on whichever is missing.
    pub fn bitbucket_repository(&self) -> Result<(&str, &str)> {
        let workspace = self
            .bitbucket
            .workspace
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ReleaseError::missing_config("BITBUCKET_WORKSPACE"))?;
        let repo_slug = self
            .bitbucket
            .repo_slug
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ReleaseError::missing_config("BITBUCKET_REPO_SLUG"))?;

        Ok((workspace, repo_slug))
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `releaseflow.toml` in current directory
/// 3. `.releaseflow.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        PathBuf::from(path)
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        PathBuf::from(CONFIG_FILE_NAME)
    } else if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if path.exists() {
            path
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path).map_err(|e| {
        ReleaseError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;

    toml::from_str(&config_str)
        .map_err(|e| ReleaseError::config(format!("Invalid {}: {}", path.display(), e)))
}
