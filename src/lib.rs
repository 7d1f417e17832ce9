pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod hosting;
pub mod manifest;
pub mod package;
pub mod release;
pub mod ui;
pub mod update_xml;
pub mod warning;

pub use error::{ReleaseError, Result};
