//! Service configuration loading.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level skillfuzz configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillfuzzConfig {
    #[serde(default)]
    pub server: ServerSettings,
    /// Pipeline definition overrides. Unset variants use the built-ins.
    #[serde(default)]
    pub pipelines: PipelinePaths,
    /// Max concurrent requests when scoring a batch offline.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

/// Where the HTTP service listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow cross-origin requests from any origin.
    #[serde(default = "default_cors")]
    pub cors_permissive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelinePaths {
    #[serde(default)]
    pub topic: Option<PathBuf>,
    #[serde(default)]
    pub quiz: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_cors() -> bool {
    true
}
fn default_parallelism() -> usize {
    4
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: default_cors(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

impl Default for SkillfuzzConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            pipelines: PipelinePaths::default(),
            parallelism: default_parallelism(),
        }
    }
}

impl SkillfuzzConfig {
    /// Apply host/port overrides, as read from `SKILLFUZZ_HOST` and
    /// `SKILLFUZZ_PORT`.
    pub fn apply_overrides(&mut self, host: Option<String>, port: Option<String>) -> Result<()> {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port
                .parse()
                .with_context(|| format!("invalid SKILLFUZZ_PORT: {port}"))?;
        }
        Ok(())
    }

    /// Expand `${VAR}` references in the pipeline paths.
    fn resolve_paths(&mut self) {
        let resolve = |p: &PathBuf| PathBuf::from(resolve_env_vars(&p.to_string_lossy()));
        self.pipelines.topic = self.pipelines.topic.as_ref().map(resolve);
        self.pipelines.quiz = self.pipelines.quiz.as_ref().map(resolve);
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables expand to the empty string.
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `skillfuzz.toml` in the current directory
/// 2. `~/.config/skillfuzz/config.toml`
///
/// Environment variable overrides: `SKILLFUZZ_HOST`, `SKILLFUZZ_PORT`.
pub fn load_config() -> Result<SkillfuzzConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<SkillfuzzConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("skillfuzz.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<SkillfuzzConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => SkillfuzzConfig::default(),
    };

    config.apply_overrides(
        std::env::var("SKILLFUZZ_HOST").ok(),
        std::env::var("SKILLFUZZ_PORT").ok(),
    )?;
    config.resolve_paths();

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("skillfuzz"))
}
