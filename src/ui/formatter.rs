//! Formatting functions for console output.
//!
//! Progress goes to stdout, warnings and errors to stderr. Styling is
//! dropped automatically when the stream is not a terminal (CI logs).

use console::style;

use crate::hosting::CreatedPullRequest;
use crate::release::SkipReason;
use crate::warning::ReleaseWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a non-fatal release warning.
///
/// # Arguments
/// * `warning` - The warning raised by a release step
pub fn display_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Display every warning in order
pub fn display_warnings(warnings: &[ReleaseWarning]) {
    for warning in warnings {
        display_warning(warning);
    }
}

/// Display why a step did nothing. Skips are not failures.
pub fn display_skip(reason: &SkipReason) {
    println!("{} {}", style("−").dim(), reason);
}

/// Display the id and link of a created pull request.
///
/// Hosts may omit either field; missing ones are left out.
pub fn display_pull_request(created: &CreatedPullRequest) {
    println!("{}", format_pull_request(created));
}

fn format_pull_request(created: &CreatedPullRequest) -> String {
    let mut line = String::from("Pull request created");
    if let Some(id) = created.id {
        line.push_str(&format!(": #{}", id));
    }
    if let Some(url) = &created.url {
        line.push_str(&format!("\n  {}", style(url).cyan()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_functions_do_not_panic() {
        display_error("test error");
        display_success("test success");
        display_status("test status");
        display_skip(&SkipReason::TagExists("v1.0.0".to_string()));
        display_warnings(&[ReleaseWarning::ManifestMissing {
            path: "src/manifest.json".to_string(),
        }]);
    }

    #[test]
    fn test_format_pull_request() {
        console::set_colors_enabled(false);

        let created = CreatedPullRequest {
            id: Some(42),
            url: Some("https://bitbucket.org/acme/ext/pull-requests/42".to_string()),
        };
        assert_eq!(
            format_pull_request(&created),
            "Pull request created: #42\n  https://bitbucket.org/acme/ext/pull-requests/42"
        );

        assert_eq!(
            format_pull_request(&CreatedPullRequest::default()),
            "Pull request created"
        );
    }
}
