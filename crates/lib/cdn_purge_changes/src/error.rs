use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum ChangesError {
    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("expected at least two deploys in the release list, found {found}")]
    NotEnoughReleases { found: usize },

    #[error("malformed release line: {0:?}")]
    MalformedRelease(String),
}
