//! Shared helper functions for CLI commands
//!
//! Configuration loading with the global `--config` / `--data` overrides and
//! opening the gate from it.

use std::path::PathBuf;
use storygate_core::{error::Result, GateConfig, IntakeGate};
use tracing::debug;

/// Options shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub data: Option<PathBuf>,
}

/// Load layered configuration and apply command-line overrides
pub fn load_config(options: &GlobalOptions) -> Result<GateConfig> {
    let mut config = GateConfig::load(options.config.as_deref())?;
    if let Some(data) = &options.data {
        debug!("Using document {}", data.display());
        config.storage.path = data.clone();
    }
    Ok(config)
}

/// Open the gate described by the effective configuration
pub async fn open_gate(options: &GlobalOptions) -> Result<IntakeGate> {
    IntakeGate::open(load_config(options)?).await
}
