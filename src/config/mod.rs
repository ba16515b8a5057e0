//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::*;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "sitewire";
const ENV_PREFIX: &str = "SITEWIRE";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DATASET: &str = "production";
const DEFAULT_API_VERSION: &str = "2024-01-01";
const DEFAULT_CONSISTENCY_WINDOW_MS: u64 = 3000;
const DEFAULT_CACHE_QUERY_LIMIT: usize = 256;
const DEFAULT_CLIENT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cms: CmsSettings,
    pub revalidation: RevalidationSettings,
    pub cache: CacheSettings,
    pub client: ClientSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Where blog content comes from. A `project_id` selects the CMS API and
/// takes precedence over `fixtures`.
#[derive(Debug, Clone)]
pub struct CmsSettings {
    pub project_id: Option<String>,
    pub dataset: String,
    pub api_version: String,
    pub token: Option<String>,
    pub use_cdn: bool,
    pub api_host: Option<String>,
    pub fixtures: Option<PathBuf>,
}

impl CmsSettings {
    fn ensure_backend(&self) -> Result<(), LoadError> {
        if self.project_id.is_none() && self.fixtures.is_none() {
            return Err(LoadError::invalid(
                "cms",
                "either cms.project_id or cms.fixtures must be set",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RevalidationSettings {
    /// Absent secrets are reported per request rather than at startup.
    pub secret: Option<String>,
    pub consistency_window: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub query_limit: usize,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub search_debounce: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("failed to read command-line arguments: {0}")]
    Cli(#[from] clap::Error),
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    let command = cli.resolved_command()?;
    match &command {
        Command::Serve(args) => raw.apply_serve_overrides(&args.overrides),
        Command::Query(args) => raw.apply_query_overrides(args),
    }

    let settings = Settings::from_raw(raw)?;
    if matches!(command, Command::Serve(_)) {
        settings.cms.ensure_backend()?;
    }
    Ok(settings)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cms: RawCmsSettings,
    revalidation: RawRevalidationSettings,
    cache: RawCacheSettings,
    client: RawClientSettings,
}

impl RawSettings {
    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        self.apply_logging_overrides(&overrides.logging);

        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(project_id) = overrides.cms_project_id.as_ref() {
            self.cms.project_id = Some(project_id.clone());
        }
        if let Some(dataset) = overrides.cms_dataset.as_ref() {
            self.cms.dataset = Some(dataset.clone());
        }
        if let Some(path) = overrides.cms_fixtures.as_ref() {
            self.cms.fixtures = Some(path.clone());
        }
        if let Some(secret) = overrides.revalidate_secret.as_ref() {
            self.revalidation.secret = Some(secret.clone());
        }
        if let Some(window) = overrides.revalidate_consistency_window_ms {
            self.revalidation.consistency_window_ms = Some(window);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(limit) = overrides.cache_query_limit {
            self.cache.query_limit = Some(limit);
        }
    }

    fn apply_query_overrides(&mut self, args: &QueryArgs) {
        self.apply_logging_overrides(&args.logging);

        if let Some(server) = args.server.as_ref() {
            self.client.base_url = Some(server.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cms,
            revalidation,
            cache,
            client,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            cms: build_cms_settings(cms)?,
            revalidation: build_revalidation_settings(revalidation),
            cache: build_cache_settings(cache)?,
            client: build_client_settings(client)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cms_settings(cms: RawCmsSettings) -> Result<CmsSettings, LoadError> {
    let dataset = non_blank(cms.dataset).unwrap_or_else(|| DEFAULT_DATASET.to_string());
    if !dataset
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(LoadError::invalid(
            "cms.dataset",
            "only ASCII letters, digits, `_` and `-` are allowed",
        ));
    }

    let api_version = non_blank(cms.api_version)
        .map(|value| value.trim_start_matches('v').to_string())
        .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
    if time::Date::parse(
        &api_version,
        &time::macros::format_description!("[year]-[month]-[day]"),
    )
    .is_err()
    {
        return Err(LoadError::invalid(
            "cms.api_version",
            format!("expected a YYYY-MM-DD date, got `{api_version}`"),
        ));
    }

    let api_host = non_blank(cms.api_host);
    if let Some(host) = api_host.as_deref() {
        Url::parse(host)
            .map_err(|err| LoadError::invalid("cms.api_host", format!("invalid URL: {err}")))?;
    }

    let fixtures = cms.fixtures.filter(|path| !path.as_os_str().is_empty());

    Ok(CmsSettings {
        project_id: non_blank(cms.project_id),
        dataset,
        api_version,
        token: non_blank(cms.token),
        use_cdn: cms.use_cdn.unwrap_or(false),
        api_host,
        fixtures,
    })
}

fn build_revalidation_settings(revalidation: RawRevalidationSettings) -> RevalidationSettings {
    let window_ms = revalidation
        .consistency_window_ms
        .unwrap_or(DEFAULT_CONSISTENCY_WINDOW_MS);

    RevalidationSettings {
        secret: non_blank(revalidation.secret),
        consistency_window: Duration::from_millis(window_ms),
    }
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let query_limit = cache.query_limit.unwrap_or(DEFAULT_CACHE_QUERY_LIMIT);
    if query_limit == 0 {
        return Err(LoadError::invalid(
            "cache.query_limit",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        query_limit,
    })
}

fn build_client_settings(client: RawClientSettings) -> Result<ClientSettings, LoadError> {
    let base_url =
        non_blank(client.base_url).unwrap_or_else(|| DEFAULT_CLIENT_BASE_URL.to_string());
    let parsed = Url::parse(&base_url)
        .map_err(|err| LoadError::invalid("client.base_url", format!("invalid URL: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "client.base_url",
            "scheme must be http or https",
        ));
    }

    let debounce_ms = client
        .search_debounce_ms
        .unwrap_or(DEFAULT_SEARCH_DEBOUNCE_MS);

    Ok(ClientSettings {
        base_url,
        search_debounce: Duration::from_millis(debounce_ms),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCmsSettings {
    project_id: Option<String>,
    dataset: Option<String>,
    api_version: Option<String>,
    token: Option<String>,
    use_cdn: Option<bool>,
    api_host: Option<String>,
    fixtures: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRevalidationSettings {
    secret: Option<String>,
    consistency_window_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    query_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawClientSettings {
    base_url: Option<String>,
    search_debounce_ms: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests;
