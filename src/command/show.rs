use anyhow::{Context, Result};
use serde_json::Value;

use super::CommandContext;
use crate::domain::Checkpoint;

/// Decoded command description when `object` looks like a checkpoint.
fn checkpoint_description(object: &Value) -> Option<String> {
    object.get("parentHashes")?;
    let command_desc = object.get("commandDesc")?.as_str()?;
    let checkpoint = Checkpoint {
        command_desc: command_desc.to_string(),
        ..Default::default()
    };
    checkpoint.description().ok()
}

pub async fn run_show(ctx: &CommandContext, hash: &str) -> Result<()> {
    let conn = ctx.connection()?;
    let object = match conn.fetch_object(hash).await {
        Ok(object) => object,
        // Retro servers answer 500 when the object store has no such hash
        Err(e) if e.status() == Some(500) => {
            return Err(e).with_context(|| format!("No object {} on {}", hash, conn.base_url()))
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to fetch object {}", hash)),
    };

    let Some(object) = object else {
        anyhow::bail!("Object {} came back empty", hash);
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&object).context("Failed to format object")?
    );

    if let Some(description) = checkpoint_description(&object) {
        println!("\nCommand:\n{}", description);
    }

    Ok(())
}
