use anyhow::{Context, Result};

use super::format::ref_lines;
use super::CommandContext;
use crate::api::RefSource;

pub async fn run_refs(ctx: &CommandContext) -> Result<()> {
    let conn = ctx.connection()?;
    let refs = conn
        .fetch_refs()
        .await
        .with_context(|| format!("Failed to list refs of {}", conn.base_url()))?;

    if refs.is_empty() {
        println!("No refs on {}", conn.base_url());
        return Ok(());
    }

    for line in ref_lines(&refs, ctx.settings.default_ref.as_deref()) {
        println!("{}", line);
    }

    Ok(())
}
