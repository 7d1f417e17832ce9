use crate::domain::version::{Version, VERSION_PATTERN};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Prefix every release branch carries before its version.
pub const RELEASE_BRANCH_PREFIX: &str = "release/v";

fn release_branch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!("^{}{}$", regex::escape(RELEASE_BRANCH_PREFIX), VERSION_PATTERN);
        Regex::new(&pattern).expect("release branch pattern is valid")
    })
}

/// A release branch, `release/vMAJOR.MINOR.PATCH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseBranch {
    version: Version,
}

impl ReleaseBranch {
    pub fn new(version: Version) -> Self {
        ReleaseBranch { version }
    }

    /// Recognise a release branch name and extract its version.
    ///
    /// Returns `None` for anything that is not exactly
    /// `release/vMAJOR.MINOR.PATCH`.
    pub fn parse(name: &str) -> Option<Self> {
        let caps = release_branch_regex().captures(name)?;
        Version::from_captures(name, &caps, 1)
            .ok()
            .map(ReleaseBranch::new)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn name(&self) -> String {
        format!("{}{}", RELEASE_BRANCH_PREFIX, self.version)
    }
}

impl fmt::Display for ReleaseBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", RELEASE_BRANCH_PREFIX, self.version)
    }
}

/// The branch a command runs on, relative to the configured trunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    pub name: String,
    pub is_trunk: bool,
}

impl BranchContext {
    /// Create a new branch context
    pub fn new(name: impl Into<String>, trunk: &str) -> Self {
        let name_str = name.into();
        let is_trunk = name_str == trunk;

        BranchContext {
            name: name_str,
            is_trunk,
        }
    }
}
