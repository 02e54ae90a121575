use http::StatusCode;
use url::Url;

/// Why a single purge call failed. Every variant ends the run.
#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    #[error("purge request to {url} failed with status {status}: {body}")]
    Status {
        url: Url,
        status: StatusCode,
        body: String,
    },

    /// no response at all: DNS, connect, timeout.
    #[error("purge request to {url} failed")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    /// `.` or `..` segments would move the request off the purge endpoint.
    #[error("refusing to purge {path:?}: contains a `.` or `..` segment")]
    InvalidPath { path: String },

    #[error("could not build purge url for {path:?}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

impl PurgeError {
    /// attribute value for the error counter
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Transport { source, .. } if source.is_timeout() => "timeout",
            Self::Transport { .. } => "transport",
            Self::InvalidPath { .. } => "invalid_path",
            Self::InvalidUrl { .. } => "invalid_url",
        }
    }
}
