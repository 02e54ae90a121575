//! Where the paths to purge come from: the two newest deploys of a Heroku
//! app, and the files git reports as changed between them.

mod command;
mod config;
mod error;
mod git;
mod heroku;

pub use config::Config;
pub use error::ChangesError;
pub use git::{GitChangeSet, parse_name_status};
pub use heroku::{HerokuReleases, parse_releases};

/// The newest deploy and the one before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Releases {
    pub current: String,
    pub previous: String,
}

pub trait ReleaseSource {
    fn latest_releases(&self) -> impl Future<Output = Result<Releases, ChangesError>> + Send;
}

pub trait ChangeSetSource {
    /// Paths added, modified or deleted between `previous` and `current`.
    fn changed_files(
        &self,
        previous: &str,
        current: &str,
    ) -> impl Future<Output = Result<Vec<String>, ChangesError>> + Send;
}
