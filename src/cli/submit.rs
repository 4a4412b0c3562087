//! Submission command

use super::helpers::{open_gate, GlobalOptions};
use std::io::Read;
use storygate_core::{error::Result, SubmitRequest};

/// Handle submission command
pub async fn handle(
    options: &GlobalOptions,
    user: String,
    contact: Option<String>,
    text: String,
    json: bool,
) -> Result<()> {
    let text = if text == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        text
    };

    let gate = open_gate(options).await?;
    let mut request = SubmitRequest::new(user, text);
    if let Some(contact) = contact {
        request = request.with_contact(contact);
    }

    let response = gate.handle(request).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.accepted {
        println!("✓ {}", response.message);
        if let (Some(tier), Some(code)) = (&response.tier, &response.code) {
            println!("  Tier: {}", tier);
            println!("  Code: {}", code);
        }
        if let Some(rationale) = &response.rationale {
            println!("  Why:  {}", rationale);
        }
    } else {
        println!("✗ {}", response.message);
    }
    println!("  Submissions left in window: {}", response.remaining);
    Ok(())
}
