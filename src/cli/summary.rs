//! Analytics summary command

use super::helpers::{open_gate, GlobalOptions};
use storygate_core::error::Result;

/// Handle summary command
pub async fn handle(options: &GlobalOptions, json: bool) -> Result<()> {
    let gate = open_gate(options).await?;

    if json {
        let summary = gate.summary().await;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", gate.report().await);
    }
    Ok(())
}
