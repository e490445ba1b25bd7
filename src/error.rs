use thiserror::Error;

/// Errors surfaced to the caller of a comparison run.
///
/// Only these three stop a run. Everything that goes wrong inside a single
/// extraction or classification step is a [`Fault`] and is recovered where it
/// happens.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("could not open a WebDriver session at {url}: {reason}")]
    WebDriver { url: String, reason: String },

    #[error("navigation to {url} failed after {attempts} attempt(s): {reason}")]
    Navigation {
        url: String,
        attempts: usize,
        reason: String,
    },
}

/// A recoverable failure of one payload, card or element.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("webdriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Missing(&'static str),
}
