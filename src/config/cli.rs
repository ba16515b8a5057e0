use std::path::PathBuf;

use clap::{Args, FromArgMatches, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the sitewire binary.
#[derive(Debug, Parser)]
#[command(name = "sitewire", version, about = "Sitewire content gateway")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SITEWIRE_CONFIG_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    /// The command to run. A bare invocation is `serve`, parsed through clap
    /// so its environment fallbacks still apply.
    pub fn resolved_command(&self) -> Result<Command, clap::Error> {
        if let Some(command) = self.command.as_ref() {
            return Ok(command.clone());
        }
        let matches =
            ServeArgs::augment_args(clap::Command::new("serve")).try_get_matches_from(["serve"])?;
        let args = ServeArgs::from_arg_matches(&matches)?;
        Ok(Command::Serve(Box::new(args)))
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Query a running server's blog listing.
    Query(QueryArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Sanity project to query.
    #[arg(long = "cms-project-id", value_name = "ID")]
    pub cms_project_id: Option<String>,

    /// Sanity dataset name.
    #[arg(long = "cms-dataset", value_name = "NAME")]
    pub cms_dataset: Option<String>,

    /// Serve content from a local JSON fixture instead of the CMS.
    #[arg(long = "cms-fixtures", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub cms_fixtures: Option<PathBuf>,

    /// Shared secret for webhook signatures.
    #[arg(
        long = "revalidate-secret",
        env = "SANITY_REVALIDATE_SECRET",
        hide_env_values = true,
        value_name = "SECRET"
    )]
    pub revalidate_secret: Option<String>,

    /// Wait applied after a valid signature before invalidating.
    #[arg(long = "revalidate-consistency-window-ms", value_name = "MILLIS")]
    pub revalidate_consistency_window_ms: Option<u64>,

    /// Toggle the query cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the number of cached query results.
    #[arg(long = "cache-query-limit", value_name = "COUNT")]
    pub cache_query_limit: Option<usize>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Base URL of the sitewire server.
    #[arg(long = "server", value_name = "URL", value_hint = ValueHint::Url)]
    pub server: Option<String>,

    /// Raw query string to start from, e.g. `search=grid&sort=asc`.
    #[arg(long = "url-query", value_name = "QUERY")]
    pub url_query: Option<String>,

    /// Search term.
    #[arg(long)]
    pub search: Option<String>,

    /// Category id, or `all`.
    #[arg(long)]
    pub category: Option<String>,

    /// Publication date ordering.
    #[arg(long, value_parser = ["asc", "desc"])]
    pub sort: Option<String>,
}
