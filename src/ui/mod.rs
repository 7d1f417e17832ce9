//! User interface module.
//!
//! The tool runs unattended in CI pipelines, so there are no prompts: only
//! formatted output lives here.

pub mod formatter;

pub use formatter::{
    display_error, display_pull_request, display_skip, display_status, display_success,
    display_warning, display_warnings,
};
