//! Decides whether progress bars are worth drawing

use std::env;
use std::io::{IsTerminal, stderr};

const CI_VARIABLES: &[&str] = &["CI", "CONTINUOUS_INTEGRATION", "GITHUB_ACTIONS", "GITLAB_CI", "BUILDKITE"];

/// Bars go to stderr, so only stderr has to be a capable terminal
pub fn should_show_progress() -> bool {
    stderr().is_terminal() && supports_ansi() && !is_ci_environment()
}

fn supports_ansi() -> bool {
    match env::var("TERM") {
        Ok(term) => !term.is_empty() && term != "dumb",
        // Windows consoles do not set TERM
        Err(_) => cfg!(windows),
    }
}

fn is_ci_environment() -> bool {
    CI_VARIABLES.iter().any(|var| env::var_os(var).is_some())
}
