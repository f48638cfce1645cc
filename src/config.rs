use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::http::mime;

/// Environment variable naming an optional YAML configuration file.
pub const CONFIG_ENV: &str = "THREADED_SERVER_CONFIG";
/// Environment variable overriding `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

pub const USAGE: &str = "usage: threaded_server [<port>] [<host>]";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Seconds a connection may sit idle before it is closed.
    pub idle_timeout_secs: u64,
    /// Largest request head (request line plus headers) accepted.
    pub max_head_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory to serve. `None` serves the working directory.
    pub root: Option<PathBuf>,
    /// File served for directory requests.
    pub index: String,
    /// MIME databases, first readable one wins.
    pub mime_types: Vec<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            idle_timeout_secs: 5,
            max_head_bytes: 8192,
        }
    }
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: None,
            index: "index.html".to_string(),
            mime_types: mime::default_databases(),
        }
    }
}

impl Config {
    /// Loads the YAML file named by `THREADED_SERVER_CONFIG` (defaults when
    /// unset), then applies the `LISTEN` override.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            cfg.server.listen_addr = listen_addr;
        }
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Applies the positional `[<port>] [<host>]` command-line arguments.
    ///
    /// A missing host keeps the configured one.
    pub fn apply_args<S: AsRef<str>>(&mut self, args: &[S]) -> anyhow::Result<()> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        match args.as_slice() {
            [] => Ok(()),
            ["-h" | "--help"] => bail!(USAGE),
            [port] => self.set_listen(port, None),
            [port, host] => self.set_listen(port, Some(host)),
            _ => bail!(USAGE),
        }
    }

    fn set_listen(&mut self, port: &str, host: Option<&str>) -> anyhow::Result<()> {
        let port: u16 = match port.parse() {
            Ok(port) if port >= 1 => port,
            _ => bail!("invalid port number: port must be between 1 and {}", u16::MAX),
        };
        let host = match host {
            Some(host) => host.to_string(),
            None => self
                .server
                .listen_addr
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string()),
        };
        self.server.listen_addr = format!("{host}:{port}");
        Ok(())
    }
}
