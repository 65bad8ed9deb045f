use caseflow_core::ConfigError;
use thiserror::Error;

/// Error surface for the remote trigger.
///
/// Only the build request itself can produce these for the caller; failures
/// in the optional enrichment steps are swallowed by
/// [`crate::best_effort::best_effort`].
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Jenkins answered {url} with HTTP {status}: {body}")]
    Rejected {
        url: String,
        status: u16,
        body: String,
    },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("queue item {url} was cancelled")]
    QueueCancelled { url: String },
}

/// Longest response body kept for diagnostics.
const MAX_BODY_CHARS: usize = 2_000;

pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> TriggerError {
    match err {
        ureq::Error::Status(status, response) => TriggerError::Rejected {
            url: url.to_string(),
            status,
            body: read_body(response),
        },
        ureq::Error::Transport(transport) => TriggerError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

pub(crate) fn read_body(response: ureq::Response) -> String {
    match response.into_string() {
        Ok(body) => body.chars().take(MAX_BODY_CHARS).collect(),
        Err(err) => format!("<unreadable body: {err}>"),
    }
}
