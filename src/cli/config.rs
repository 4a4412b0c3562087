//! Configuration management command

use super::helpers::{load_config, GlobalOptions};
use clap::Subcommand;
use storygate_core::{error::Result, GateConfig};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML (secrets omitted)
    Show,

    /// Print the built-in defaults as a starting configuration file
    Init,

    /// Validate the configuration and report which collaborators are active
    Check,
}

/// Handle configuration management command
pub async fn handle(options: &GlobalOptions, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(options)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init => {
            print!("{}", GateConfig::default().to_toml()?);
        }
        ConfigAction::Check => {
            let config = load_config(options)?;
            let thresholds = config.tier_thresholds()?;

            println!("✓ Configuration is valid");
            println!("  Event:    {} ({})", config.event.name, config.event.event_id);
            println!(
                "  Limit:    {} per {}s",
                config.limits.max_requests_per_user,
                config.limits.window.as_secs()
            );
            let tiers: Vec<String> = thresholds
                .iter()
                .map(|t| format!("{}>={}", t.tier_name, t.min_score))
                .collect();
            println!("  Tiers:    {}", tiers.join(", "));
            println!("  Document: {}", config.storage.path.display());
            let scorer = if !config.evaluator.enabled {
                "heuristic only (disabled)"
            } else if config.evaluator.api_key.is_empty() {
                "heuristic only (ANTHROPIC_API_KEY not set)"
            } else {
                "remote with heuristic fallback"
            };
            println!("  Scorer:   {}", scorer);
            println!(
                "  Mail:     {}",
                match (config.notify.enabled, config.notify.dry_run) {
                    (false, _) => "disabled",
                    (true, true) => "dry run (logged only)",
                    (true, false) => "enabled",
                }
            );
        }
    }
    Ok(())
}
