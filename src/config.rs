use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;

/// Effective default ports for the two profiles.
const DEFAULT_HTTPS_PORT: u16 = 8443;
const DEFAULT_HTTP_PORT: u16 = 9999;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub serve: ServeConfig,
    pub tls: TlsConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// Listen port. When unset the profile default applies
    /// (8443 with TLS enabled, 9999 without).
    pub port: Option<u16>,
    pub workers: Option<usize>,
}

/// What to serve and how routes behave.
#[derive(Debug, Deserialize, Clone)]
pub struct ServeConfig {
    /// Root directory of the served tree.
    pub root: String,
    /// Serve the index document for extensionless routes that miss on disk.
    pub spa: bool,
    /// Add `Access-Control-Allow-Origin: *` to every response.
    pub cors: bool,
}

/// HTTPS profile settings. With `enabled = false` the server speaks plain HTTP
/// and the remaining fields are ignored.
#[derive(Debug, Deserialize, Clone)]
pub struct TlsConfig {
    pub enabled: bool,
    /// Directory holding `<host>.crt` / `<host>.key`.
    pub cert_dir: String,
    /// Certificate common name and primary DNS SAN.
    pub host: String,
    /// Regenerate the certificate pair even if one already exists.
    pub regenerate: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    /// Ceiling on time spent reading request headers (TLS profile only),
    /// guarding against slow-header clients.
    pub header_read_timeout: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("DEVSERVE"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("serve.root", ".")?
            .set_default("serve.spa", true)?
            .set_default("serve.cors", true)?
            .set_default("tls.enabled", true)?
            .set_default("tls.cert_dir", ".certs")?
            .set_default("tls.host", "localhost")?
            .set_default("tls.regenerate", false)?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.header_read_timeout", 10)?
            .build()?;

        settings.try_deserialize()
    }

    /// Listen port after applying the per-profile default.
    pub fn effective_port(&self) -> u16 {
        self.server.port.unwrap_or(if self.tls.enabled {
            DEFAULT_HTTPS_PORT
        } else {
            DEFAULT_HTTP_PORT
        })
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.effective_port())
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

pub struct AppState {
    pub config: Config,

    // Cached config values for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            cached_access_log: AtomicBool::new(config.logging.access_log),
        }
    }
}
