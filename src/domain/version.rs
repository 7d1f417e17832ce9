use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Source text for a bare `major.minor.patch` version, without anchors.
///
/// Shared with the release branch parser so both accept exactly the same
/// version grammar.
pub(crate) const VERSION_PATTERN: &str = r"([0-9]+)\.([0-9]+)\.([0-9]+)";

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^{}$", VERSION_PATTERN)).expect("version pattern is valid")
    })
}

/// Semantic version representation.
///
/// Immutable: [`Version::increment`] returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a strict `major.minor.patch` string.
    ///
    /// No `v` prefix, no pre-release or build suffix, no surrounding
    /// whitespace. Anything else fails with [`ReleaseError::InvalidVersionFormat`].
    pub fn parse(text: &str) -> Result<Self> {
        let caps = version_regex()
            .captures(text)
            .ok_or_else(|| ReleaseError::InvalidVersionFormat(text.to_string()))?;

        Self::from_captures(text, &caps, 1)
    }

    /// Build a version from three consecutive capture groups starting at `first`.
    pub(crate) fn from_captures(text: &str, caps: &regex::Captures<'_>, first: usize) -> Result<Self> {
        let component = |idx: usize| -> Result<u64> {
            caps.get(idx)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .ok_or_else(|| ReleaseError::InvalidVersionFormat(text.to_string()))
        };

        Ok(Version {
            major: component(first)?,
            minor: component(first + 1)?,
            patch: component(first + 2)?,
        })
    }

    /// Increment according to kind, resetting lower components to zero.
    ///
    /// Fails when the bumped component would not fit in a `u64`.
    pub fn increment(&self, kind: IncrementKind) -> Result<Self> {
        let overflow = || ReleaseError::VersionOverflow {
            version: self.to_string(),
            kind: kind.to_string(),
        };

        Ok(match kind {
            IncrementKind::Major => Version {
                major: self.major.checked_add(1).ok_or_else(overflow)?,
                minor: 0,
                patch: 0,
            },
            IncrementKind::Minor => Version {
                major: self.major,
                minor: self.minor.checked_add(1).ok_or_else(overflow)?,
                patch: 0,
            },
            IncrementKind::Patch => Version {
                major: self.major,
                minor: self.minor,
                patch: self.patch.checked_add(1).ok_or_else(overflow)?,
            },
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

/// Which version component a release bumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementKind {
    Major,
    Minor,
    Patch,
}

impl IncrementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncrementKind::Major => "Major",
            IncrementKind::Minor => "Minor",
            IncrementKind::Patch => "Patch",
        }
    }
}

impl fmt::Display for IncrementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncrementKind {
    type Err = ReleaseError;

    /// Accepts `Major`, `Minor` or `Patch` (ASCII case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(IncrementKind::Major),
            "minor" => Ok(IncrementKind::Minor),
            "patch" => Ok(IncrementKind::Patch),
            _ => Err(ReleaseError::InvalidIncrementKind(s.to_string())),
        }
    }
}
