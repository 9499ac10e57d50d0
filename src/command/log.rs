use anyhow::{Context, Result};
use chrono::Utc;
use tracing::warn;

use super::format::{affix_lines, checkpoint_line, end_note};
use super::CommandContext;
use crate::api::RefSource;
use crate::domain::{short_hash, RefSet};

pub struct LogOptions {
    /// Ref name or checkpoint hash; the default ref when absent
    pub target: Option<String>,
    pub max_depth: Option<usize>,
    pub affix: bool,
    pub json: bool,
}

/// Pick the checkpoint a walk starts from.
fn resolve_start(
    target: Option<&str>,
    refs: Option<&RefSet>,
    preferred: Option<&str>,
) -> Result<String> {
    match (target, refs) {
        (Some(target), Some(refs)) => Ok(refs.resolve(target).to_string()),
        (Some(target), None) => Ok(target.to_string()),
        (None, Some(refs)) => refs
            .default_ref(preferred)
            .map(|r| r.hash.clone())
            .context("The server has no refs; pass a checkpoint hash instead"),
        (None, None) => anyhow::bail!("No ref listing available; pass a checkpoint hash"),
    }
}

pub async fn run_log(ctx: &CommandContext, options: LogOptions) -> Result<()> {
    let conn = ctx.connection()?;

    let refs = match conn.fetch_refs().await {
        Ok(refs) => Some(refs),
        Err(e) if options.target.is_some() => {
            warn!("Could not list refs, using the argument as a hash: {}", e);
            None
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to list refs of {}", conn.base_url()))
        }
    };

    let start = resolve_start(
        options.target.as_deref(),
        refs.as_ref(),
        ctx.settings.default_ref.as_deref(),
    )?;

    let history = ctx.walker(options.max_depth).walk(&conn, &start).await;

    if options.json {
        let json = serde_json::to_string_pretty(&history).context("Failed to serialize history")?;
        println!("{}", json);
        return Ok(());
    }

    if history.is_empty() {
        let reason = end_note(&history).unwrap_or_default();
        anyhow::bail!("No history for {}. {}", start, reason);
    }

    let now = Utc::now();
    for checkpoint in &history.checkpoints {
        println!("{}", checkpoint_line(checkpoint, now));

        if options.affix && !checkpoint.affix_hash.is_empty() {
            match conn.fetch_affix(&checkpoint.affix_hash).await {
                Ok(Some(affix)) => {
                    println!(
                        "    affix {} ({} events)",
                        short_hash(&affix.hash),
                        affix.event_count()
                    );
                    for line in affix_lines(&affix) {
                        println!("{}", line);
                    }
                }
                Ok(None) => println!("    (empty affix)"),
                Err(e) => warn!("Failed to fetch affix {}: {}", checkpoint.affix_hash, e),
            }
        }
    }

    if let Some(note) = end_note(&history) {
        println!("\n{}", note);
    }

    Ok(())
}
