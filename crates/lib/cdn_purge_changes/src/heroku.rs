use crate::{ChangesError, ReleaseSource, Releases, command::run_command};
use regex::Regex;
use std::{path::PathBuf, sync::LazyLock};
use tracing::{info, instrument};

static DEPLOY_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^v\d+\s+Deploy\s").unwrap());

/// Releases of a Heroku app, read through `heroku releases`.
#[derive(Debug, Clone)]
pub struct HerokuReleases {
    heroku_bin: PathBuf,
    app: String,
}

impl HerokuReleases {
    pub fn new(heroku_bin: impl Into<PathBuf>, app: impl Into<String>) -> Self {
        Self {
            heroku_bin: heroku_bin.into(),
            app: app.into(),
        }
    }
}

impl ReleaseSource for HerokuReleases {
    #[instrument(skip(self), fields(app = %self.app))]
    async fn latest_releases(&self) -> Result<Releases, ChangesError> {
        let output = run_command(
            &self.heroku_bin,
            ["releases", "--app", self.app.as_str()],
            None,
        ).await?;
        let releases = parse_releases(&output)?;
        info!(current = %releases.current, previous = %releases.previous, "found releases");
        Ok(releases)
    }
}

/// Pick the two newest deploys from `heroku releases` output.
///
/// Releases that aren't deploys (config changes, rollbacks, add-ons) are
/// skipped. The commit id is the third column of a deploy line:
///
/// ```text
/// v42  Deploy 1a2b3c4  dev@example.com  2024/05/01 10:00:00
/// ```
pub fn parse_releases(output: &str) -> Result<Releases, ChangesError> {
    let mut deploys = output
        .lines()
        .filter(|line| DEPLOY_LINE.is_match(line))
        .map(|line| {
            line.split_whitespace()
                .nth(2)
                .map(str::to_owned)
                .ok_or_else(|| ChangesError::MalformedRelease(line.to_owned()))
        });

    match (deploys.next(), deploys.next()) {
        (Some(current), Some(previous)) => Ok(Releases {
            current: current?,
            previous: previous?,
        }),
        (Some(_), None) => Err(ChangesError::NotEnoughReleases { found: 1 }),
        _ => Err(ChangesError::NotEnoughReleases { found: 0 }),
    }
}
