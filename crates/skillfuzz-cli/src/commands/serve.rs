//! The `skillfuzz serve` command.

use std::path::PathBuf;

use anyhow::Result;
use skillfuzz_server::{load_config_from, run_server, AppState};

pub async fn execute(config: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config_from(config.as_deref())?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = AppState::from_config(&config)?;
    run_server(state, &config.server).await
}
