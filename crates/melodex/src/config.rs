//! Config resolution for the CLI: file, environment, then flags.
//!
//! Core receives a finished `EngineConfig` and `Session`; nothing below
//! `melodex-config` reads the disk.

use std::path::PathBuf;

use melodex_config::Config;
use melodex_core::{RelationshipEngine, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config` or the platform default.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(melodex_config::config_path)
}

/// Load the config file and apply `--server`, `--timeout` and `--insecure`.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = melodex_config::load_config_from(&active_config_path(global))?;

    if let Some(ref server) = global.server {
        cfg.server.base_url.clone_from(server);
    }
    if let Some(timeout) = global.timeout {
        cfg.server.timeout = timeout;
    }
    if global.insecure {
        cfg.server.insecure = true;
    }
    Ok(cfg)
}

/// Build an engine from the resolved config and the stored session.
pub fn build_engine(global: &GlobalOpts) -> Result<RelationshipEngine, CliError> {
    let engine_config = resolve(global)?.engine_config()?;

    let session = match melodex_config::resolve_token(&melodex_config::session_path())? {
        Some(token) => Session::with_token(token),
        None => Session::new(),
    };
    tracing::debug!(
        base_url = %engine_config.base_url,
        signed_in = session.is_authenticated(),
        "building engine"
    );

    Ok(RelationshipEngine::new(engine_config, session)?)
}
