use anyhow::{Context as _, Result, bail};
use cdn_purge::{Config, purge_deploy};
use cdn_purge_changes::{GitChangeSet, HerokuReleases};
use cdn_purge_config::AppConfig as _;
use cdn_purge_dispatch::Dispatcher;
use cdn_purge_fastly::Cdn;
use cdn_purge_opentelemetry::get_meter_provider;
use clap::{Parser, Subcommand};
use std::{num::NonZeroUsize, path::PathBuf, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = CommandLine::parse();

    let _guard = cdn_purge_logging::init(cdn_purge_logging::Config::from_environment()?)
        .context("error initializing logging")?;

    // crash-only: the first error ends the process, purges still running
    // in the background are abandoned.
    if let Err(err) = args.handle_args().await {
        eprintln!("error running purge: {:?}", err);
        drop(_guard);
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    version,
    rename_all = "kebab-case",
)]
struct CommandLine {
    /// Print the URL and response body of every purge request
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fastly API key, overrides CDN_PURGE_FASTLY_API_TOKEN
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Fastly service ID, overrides CDN_PURGE_FASTLY_SERVICE_ID
    #[arg(long, global = true)]
    service_id: Option<String>,

    /// Maximum number of purge requests in flight, overrides CDN_PURGE_MAX_CONCURRENCY
    #[arg(long, global = true)]
    max_concurrency: Option<NonZeroUsize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Purge the files changed between the two latest Heroku deploys
    Deploy {
        /// Heroku app instance name
        #[arg(long)]
        heroku_app: String,

        /// git checkout of the deployed app
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },

    /// Purge the given paths
    Paths {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

impl CommandLine {
    async fn handle_args(self) -> Result<()> {
        let mut config = Config::from_environment()?;
        if let Some(api_key) = self.api_key {
            config.fastly.api_token = Some(api_key);
        }
        if let Some(service_id) = self.service_id {
            config.fastly.service_id = Some(service_id);
        }
        if let Some(max_concurrency) = self.max_concurrency {
            config.max_concurrency = max_concurrency;
        }
        config.fastly.verbose |= self.verbose;

        if !config.fastly.is_valid() {
            bail!(
                "Fastly credentials missing, pass --api-key and --service-id \
                 or set CDN_PURGE_FASTLY_API_TOKEN and CDN_PURGE_FASTLY_SERVICE_ID"
            );
        }

        let meter_provider = get_meter_provider(&config.opentelemetry)?;
        let cdn = Cdn::from_config(&config.fastly, &meter_provider)?;
        let dispatcher = Dispatcher::new(Arc::new(cdn), &meter_provider);

        let summary = match self.command {
            Command::Deploy { heroku_app, repo } => {
                purge_deploy(
                    &HerokuReleases::new(&config.changes.heroku_bin, heroku_app),
                    &GitChangeSet::new(&config.changes.git_bin, repo),
                    &dispatcher,
                    config.max_concurrency,
                )
                .await?
            }
            Command::Paths { paths } => dispatcher.run(paths, config.max_concurrency).await?,
        };

        info!(
            purged = summary.purged,
            workers = summary.workers,
            "all files purged"
        );

        meter_provider
            .force_flush()
            .context("failed to flush metrics")?;

        Ok(())
    }
}
