//! Update-check document served to the browser's extension updater.
//!
//! The updater is strict about the layout, so the document is produced from a
//! fixed template rather than an XML writer: single-quoted attributes, this
//! attribute order, two-space indentation and a trailing newline.

use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Settings for one update manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateManifest {
    pub extension_id: String,
    pub crx_base_url: String,
    pub crx_file: String,
}

impl UpdateManifest {
    pub fn new(
        extension_id: impl Into<String>,
        crx_base_url: impl Into<String>,
        crx_file: impl Into<String>,
    ) -> Result<Self> {
        let manifest = UpdateManifest {
            extension_id: extension_id.into(),
            crx_base_url: crx_base_url.into(),
            crx_file: crx_file.into(),
        };

        if manifest.extension_id.is_empty() {
            return Err(ReleaseError::missing_config("EXTENSION_ID"));
        }
        if manifest.crx_base_url.is_empty() {
            return Err(ReleaseError::missing_config("CRX_BASE_URL"));
        }

        Ok(manifest)
    }

    /// Public URL of the packaged extension
    pub fn crx_url(&self) -> String {
        format!(
            "{}/{}",
            self.crx_base_url.trim_end_matches('/'),
            self.crx_file
        )
    }

    pub fn render(&self, version: &Version) -> String {
        render(&self.extension_id, &version.to_string(), &self.crx_url())
    }

    /// Render and write the document to `path`
    pub fn write(&self, path: &Path, version: &Version) -> Result<()> {
        fs::write(path, self.render(version))?;
        debug!("wrote update manifest for {} to {}", version, path.display());
        Ok(())
    }
}

/// Escape a value for a single-quoted XML attribute
fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

pub fn render(extension_id: &str, version: &str, crx_url: &str) -> String {
    format!(
        "<?xml version='1.0' encoding='UTF-8'?>\n\
         <gupdate xmlns='http://www.google.com/update2/response' protocol='2.0'>\n\
         \x20 <app appid='{}'>\n\
         \x20   <updatecheck codebase='{}' version='{}' />\n\
         \x20 </app>\n\
         </gupdate>\n",
        escape_attr(extension_id),
        escape_attr(crx_url),
        escape_attr(version)
    )
}
