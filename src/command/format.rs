//! Terminal rendering of refs and checkpoint histories.

use chrono::{DateTime, Utc};

use crate::domain::{short_hash, Affix, Checkpoint, RefSet};
use crate::history::{History, HistoryEnd};

/// Longest description shown on one history line
const MAX_DESCRIPTION_CHARS: usize = 96;

/// Render a ref listing, marking the default with `*`.
pub fn ref_lines(refs: &RefSet, preferred: Option<&str>) -> Vec<String> {
    let default = refs.default_ref(preferred).map(|r| r.name.as_str());
    let width = refs.iter().map(|r| r.name.len()).max().unwrap_or(0);

    refs.iter()
        .map(|r| {
            let marker = if Some(r.name.as_str()) == default { '*' } else { ' ' };
            format!(
                "{} {:<width$}  {}",
                marker,
                r.name,
                short_hash(&r.hash),
                width = width
            )
        })
        .collect()
}

/// Relative age such as `5m ago`.
pub fn format_age(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - date).num_seconds();
    if secs < 0 {
        return "future".to_string();
    }
    match secs {
        0..=59 => "just now".to_string(),
        60..=3_599 => format!("{}m ago", secs / 60),
        3_600..=86_399 => format!("{}h ago", secs / 3_600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

/// Single-line description: whitespace collapsed, long text cut off.
pub fn one_line_description(checkpoint: &Checkpoint) -> String {
    let text = match checkpoint.description() {
        Ok(text) => text,
        Err(_) => return "<undecodable command description>".to_string(),
    };
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_DESCRIPTION_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(MAX_DESCRIPTION_CHARS - 1).collect();
    cut.push('…');
    cut
}

pub fn checkpoint_line(checkpoint: &Checkpoint, now: DateTime<Utc>) -> String {
    let age = checkpoint
        .date()
        .map(|d| format_age(d, now))
        .unwrap_or_else(|| "?".to_string());
    let session = checkpoint.session().map(short_hash).unwrap_or("-");

    format!(
        "{:<8}  {:>9}  {:<8}  {}",
        checkpoint.short_hash(),
        age,
        session,
        one_line_description(checkpoint)
    )
}

pub fn affix_lines(affix: &Affix) -> Vec<String> {
    affix
        .partitions
        .iter()
        .map(|(partition, events)| {
            let events: Vec<&str> = events.iter().map(|e| short_hash(e)).collect();
            format!("    {}: {}", partition, events.join(", "))
        })
        .collect()
}

/// Note explaining why a walk stopped early, `None` for complete histories.
pub fn end_note(history: &History) -> Option<String> {
    match &history.end {
        HistoryEnd::Root => None,
        HistoryEnd::Missing { hash } if hash.is_empty() => {
            Some("No checkpoint selected.".to_string())
        }
        HistoryEnd::Missing { hash } => Some(format!(
            "History ends early: {} came back empty.",
            short_hash(hash)
        )),
        HistoryEnd::FetchFailed { hash, error } => Some(format!(
            "History ends early: could not fetch {}: {}",
            short_hash(hash),
            error
        )),
        HistoryEnd::Cycle { hash } => Some(format!(
            "History ends early: {} is its own ancestor.",
            short_hash(hash)
        )),
        HistoryEnd::DepthLimit { limit } => Some(format!(
            "Showing the first {} checkpoints (use --max-depth to see more).",
            limit
        )),
    }
}
