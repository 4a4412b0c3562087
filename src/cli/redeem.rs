//! Reward code redemption command

use super::helpers::{open_gate, GlobalOptions};
use storygate_core::error::Result;

/// Handle redemption command
pub async fn handle(options: &GlobalOptions, code: String, vendor: String) -> Result<()> {
    let gate = open_gate(options).await?;
    let redemption = gate.redeem(&code, &vendor).await?;

    let description = gate
        .config()
        .tiers
        .iter()
        .find(|t| t.name == redemption.tier)
        .map(|t| t.description.clone())
        .unwrap_or_default();

    println!("✓ Redeemed {} ({} tier)", redemption.code, redemption.tier);
    if !description.is_empty() {
        println!("  Reward: {}", description);
    }
    println!(
        "  At: {} by {}",
        redemption.redeemed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        redemption.vendor_id
    );
    Ok(())
}
