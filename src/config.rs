use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Names the optional YAML file read by [`Config::load`].
pub const CONFIG_PATH_VAR: &str = "PAGESERVE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Depth of the kernel queue of not-yet-accepted connections.
    pub backlog: u32,
    /// Worker pool capacity.
    pub max_workers: usize,
    /// Submissions allowed to wait for a worker. `None` means unbounded.
    pub max_queued: Option<usize>,
    /// Byte budget for the single read of a request.
    pub read_buffer_size: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub root: PathBuf,
    /// Reject targets with `..` or absolute components. Off by default.
    pub confine_to_root: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            backlog: 5,
            max_workers: 5,
            max_queued: None,
            read_buffer_size: 1024,
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("pages"),
            confine_to_root: false,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// Defaults are overlaid by the YAML file named in `PAGESERVE_CONFIG`
    /// (if set) and then by the individual variables `HOST`, `PORT`,
    /// `BACKLOG`, `MAX_WORKERS`, `MAX_QUEUED`, `READ_BUFFER_SIZE` and
    /// `STATIC_ROOT`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] but reads variables through `lookup`.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_yaml_file(&path)?,
            None => Self::default(),
        };

        if let Some(host) = lookup("HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            cfg.server.port = port;
        }
        if let Some(backlog) = parse_var(&lookup, "BACKLOG")? {
            cfg.server.backlog = backlog;
        }
        if let Some(workers) = parse_var(&lookup, "MAX_WORKERS")? {
            cfg.server.max_workers = workers;
        }
        if let Some(queued) = parse_var(&lookup, "MAX_QUEUED")? {
            cfg.server.max_queued = Some(queued);
        }
        if let Some(size) = parse_var(&lookup, "READ_BUFFER_SIZE")? {
            cfg.server.read_buffer_size = size;
        }
        if let Some(root) = lookup("STATIC_ROOT") {
            cfg.static_files.root = PathBuf::from(root);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_workers == 0 {
            return Err(invalid("max_workers", "0"));
        }
        if self.server.backlog == 0 {
            return Err(invalid("backlog", "0"));
        }
        if self.server.read_buffer_size == 0 {
            return Err(invalid("read_buffer_size", "0"));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, &raw)),
        None => Ok(None),
    }
}
