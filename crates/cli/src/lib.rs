mod clear;
mod index;
mod query;
mod status;
mod watch;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vscmirror_api::models::{SortBy, SortOrder};
use vscmirror_core::MirrorConfig;

#[derive(Parser)]
#[command(
    name = "vscmirror",
    version,
    about = "Catalog engine for an offline VS Code extension marketplace mirror",
    long_about = "vscmirror indexes the extension metadata written by the mirror's sync process, \
                  keeps a compressed cache of the resulting catalog, and answers marketplace \
                  gallery queries against it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Locations shared by every command. Flags win over the environment.
#[derive(Args, Clone, Debug, Default)]
pub struct MirrorArgs {
    /// Artifacts root holding the `extensions/` tree (env: ARTIFACTS)
    #[arg(long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,
    /// Directory for the catalog cache file (env: CACHE_DIR)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
    /// Public URL prefix for asset links (env: URL_ROOT)
    #[arg(long, value_name = "URL")]
    pub url_root: Option<String>,
    /// Worker threads for indexing (env: VSCMIRROR_WORKERS)
    #[arg(long)]
    pub workers: Option<usize>,
}

impl MirrorArgs {
    pub fn resolve(&self) -> Result<MirrorConfig, Box<dyn std::error::Error>> {
        let config = MirrorConfig::from_lookup(|key| self.lookup(key))?;
        vscmirror_runtime::validate(&config)?;
        Ok(config)
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let flag = match key {
            "ARTIFACTS" => self.artifacts.as_ref().map(|p| p.display().to_string()),
            "CACHE_DIR" => self.cache_dir.as_ref().map(|p| p.display().to_string()),
            "URL_ROOT" => self.url_root.clone(),
            "VSCMIRROR_WORKERS" => self.workers.map(|w| w.to_string()),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Installs,
    Rating,
    Weighted,
    Updated,
    Published,
    Publisher,
    Title,
}

impl From<SortKey> for SortBy {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Installs => SortBy::InstallCount,
            SortKey::Rating => SortBy::AverageRating,
            SortKey::Weighted => SortBy::WeightedRating,
            SortKey::Updated => SortBy::LastUpdatedDate,
            SortKey::Published => SortBy::PublishedDate,
            SortKey::Publisher => SortBy::PublisherName,
            SortKey::Title => SortBy::Title,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the catalog and write the cache
    #[command(
        long_about = "Publishes the cache when it is newer than the extensions tree, otherwise \
                      scans every extension directory and rewrites the cache. Use --force to \
                      always rescan."
    )]
    Index {
        #[command(flatten)]
        mirror: MirrorArgs,
        /// Ignore the cache and rescan the extensions tree
        #[arg(long)]
        force: bool,
    },
    /// Run a gallery query against the catalog
    #[command(
        long_about = "Evaluates a marketplace extension query. Either build one from the flags \
                      or pass a raw request body with --request."
    )]
    Query {
        #[command(flatten)]
        mirror: MirrorArgs,
        /// Free-text search over identities, display names and descriptions
        #[arg(value_name = "TEXT")]
        text: Option<String>,
        /// Exact `publisher.name` identity (repeatable)
        #[arg(long = "name", value_name = "IDENTITY")]
        names: Vec<String>,
        /// Marketplace extension id (repeatable)
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,
        /// Sort key
        #[arg(long, value_enum)]
        sort_by: Option<SortKey>,
        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,
        /// JSON request body to run instead of the flags
        #[arg(long, value_name = "FILE", conflicts_with_all = ["text", "names", "ids"])]
        request: Option<PathBuf>,
        /// Print the raw response
        #[arg(long)]
        json: bool,
        /// Rows to print in table mode
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show catalog, refresh and cache status
    Status {
        #[command(flatten)]
        mirror: MirrorArgs,
        /// Print the raw status report
        #[arg(long)]
        json: bool,
    },
    /// Keep the catalog current until interrupted
    #[command(
        long_about = "Starts the refresh scheduler: one refresh immediately, then one per \
                      REFRESH_INTERVAL or whenever an updated.json marker changes."
    )]
    Watch {
        #[command(flatten)]
        mirror: MirrorArgs,
    },
    /// Delete the catalog cache file
    Clear {
        #[command(flatten)]
        mirror: MirrorArgs,
    },
}

pub(crate) fn sort_request(sort_by: Option<SortKey>, ascending: bool) -> (Option<SortBy>, Option<SortOrder>) {
    let order = if ascending {
        SortOrder::Ascending
    } else {
        SortOrder::Descending
    };
    (sort_by.map(SortBy::from), sort_by.map(|_| order))
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The long-running command logs to stderr as well as the log file
    let (component, to_stderr) = match &cli.command {
        Commands::Watch { .. } => ("watch", true),
        _ => ("cli", false),
    };
    let _guard = vscmirror_runtime::init_logging(component, to_stderr);

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Index { mirror, force } => rt.block_on(index::run(mirror.resolve()?, force)),
        Commands::Query {
            mirror,
            text,
            names,
            ids,
            sort_by,
            ascending,
            request,
            json,
            limit,
        } => {
            let request = match request {
                Some(path) => query::read_request(&path)?,
                None => query::build_request(text, names, ids, sort_by, ascending),
            };
            rt.block_on(query::run(mirror.resolve()?, request, json, limit))
        }
        Commands::Status { mirror, json } => rt.block_on(status::run(mirror.resolve()?, json)),
        Commands::Watch { mirror } => rt.block_on(watch::run(mirror.resolve()?)),
        Commands::Clear { mirror } => rt.block_on(clear::run(mirror.resolve()?)),
    }
}
