use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 8460;
const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1";

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── Environment ─────────────────────────────────────────────────────────────

/// Runtime environment. The error reporter is active only in `Production`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    /// Anything other than "production" (case-insensitive) is development.
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP server port (default: 8460).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" behind a proxy).
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,spacesd=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default) | "json".
    log_format: Option<String>,
    /// Runtime environment: "production" | "development" (default).
    environment: Option<String>,
    /// Shared secret for identity webhook verification ("whsec_…").
    webhook_secret: Option<String>,
    /// Discord webhook URL for error reports.
    discord_webhook_url: Option<String>,
    /// Notion integration token for the bug-tracker database.
    notion_token: Option<String>,
    /// Notion database id that receives error pages.
    notion_database_id: Option<String>,
    /// Override the Notion API base URL (default: https://api.notion.com/v1).
    notion_api_base: Option<String>,
    /// Public address of this deployment, shown inside error reports.
    server_address: Option<String>,
    /// Log SQLite queries that exceed this threshold (milliseconds).
    /// Default: 100. Set to 0 to disable slow query logging.
    slow_query_threshold_ms: Option<u64>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── AppConfig ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub log: String,
    /// "pretty" (default) | "json" (structured for log aggregators).
    pub log_format: String,
    /// Bind address for the HTTP server (SPACESD_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    /// Gates the error reporter: sinks fire only in production.
    pub environment: Environment,
    /// Identity-provider webhook shared secret (SPACESD_WEBHOOK_SECRET).
    /// None means every webhook delivery is rejected — nothing can be verified.
    pub webhook_secret: Option<String>,
    /// Discord webhook URL (SPACESD_DISCORD_WEBHOOK_URL). None disables the sink.
    pub discord_webhook_url: Option<String>,
    /// Notion integration token (SPACESD_NOTION_TOKEN). None disables the sink.
    pub notion_token: Option<String>,
    /// Notion database id (SPACESD_NOTION_DATABASE_ID).
    pub notion_database_id: Option<String>,
    /// Notion API base URL (SPACESD_NOTION_API_BASE).
    pub notion_api_base: String,
    /// Display-only serving address embedded in error reports.
    pub server_address: String,
    /// Slow-query logging threshold in milliseconds (0 = disabled).
    pub slow_query_threshold_ms: u64,
}

impl AppConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("SPACESD_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let log_format = std::env::var("SPACESD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let environment = std::env::var("SPACESD_ENV")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.environment)
            .map(|s| Environment::parse(&s))
            .unwrap_or(Environment::Development);

        let webhook_secret = std::env::var("SPACESD_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.webhook_secret);

        let discord_webhook_url = std::env::var("SPACESD_DISCORD_WEBHOOK_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.discord_webhook_url);

        let notion_token = std::env::var("SPACESD_NOTION_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.notion_token);

        let notion_database_id = std::env::var("SPACESD_NOTION_DATABASE_ID")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.notion_database_id);

        let notion_api_base = std::env::var("SPACESD_NOTION_API_BASE")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.notion_api_base)
            .unwrap_or_else(|| DEFAULT_NOTION_API_BASE.to_string());

        let server_address = std::env::var("SPACESD_SERVER_ADDRESS")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.server_address)
            .unwrap_or_else(|| format!("http://{bind_address}:{port}"));

        let slow_query_threshold_ms = toml.slow_query_threshold_ms.unwrap_or(100);

        Self {
            port,
            data_dir,
            log,
            log_format,
            bind_address,
            environment,
            webhook_secret,
            discord_webhook_url,
            notion_token,
            notion_database_id,
            notion_api_base,
            server_address,
            slow_query_threshold_ms,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/spacesd
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("spacesd");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/spacesd or ~/.local/share/spacesd
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("spacesd");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("spacesd");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\spacesd
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("spacesd");
        }
    }
    // Fallback
    PathBuf::from(".spacesd")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
