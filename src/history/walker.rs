use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::ObjectSource;
use crate::domain::Checkpoint;

/// Upper bound on checkpoints fetched by one walk
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Why a walk stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum HistoryEnd {
    /// Reached a checkpoint without parents
    Root,
    /// The server answered without a body
    Missing { hash: String },
    /// The request failed or the payload could not be decoded
    FetchFailed { hash: String, error: String },
    /// The parent chain led back to a checkpoint already visited
    Cycle { hash: String },
    DepthLimit { limit: usize },
}

/// First-parent history, starting checkpoint first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub start: String,
    pub checkpoints: Vec<Checkpoint>,
    pub end: HistoryEnd,
}

impl History {
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// True when the walk reached a root checkpoint.
    pub fn is_complete(&self) -> bool {
        self.end == HistoryEnd::Root
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWalker {
    max_depth: usize,
}

impl Default for HistoryWalker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl HistoryWalker {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    /// Walk the first-parent chain starting at `start`.
    pub async fn walk<S>(&self, source: &S, start: &str) -> History
    where
        S: ObjectSource + ?Sized,
    {
        let mut checkpoints: Vec<Checkpoint> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut next = start.to_string();

        let end = loop {
            if next.is_empty() {
                debug!("No checkpoint hash to walk from");
                break HistoryEnd::Missing { hash: next };
            }
            if checkpoints.len() >= self.max_depth {
                warn!(
                    "History of {} exceeds {} checkpoints, stopping",
                    start, self.max_depth
                );
                break HistoryEnd::DepthLimit {
                    limit: self.max_depth,
                };
            }
            if !seen.insert(next.clone()) {
                warn!("Checkpoint {} is its own ancestor, stopping", next);
                break HistoryEnd::Cycle { hash: next };
            }

            match source.fetch_checkpoint(&next).await {
                Ok(Some(checkpoint)) => {
                    let parent = checkpoint.first_parent().map(str::to_owned);
                    checkpoints.push(checkpoint);
                    match parent {
                        Some(parent) => next = parent,
                        None => break HistoryEnd::Root,
                    }
                }
                Ok(None) => {
                    warn!("Checkpoint {} came back empty", next);
                    break HistoryEnd::Missing { hash: next };
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!("Failed to fetch checkpoint {}, giving up after retries: {}", next, e);
                    } else {
                        warn!("Failed to fetch checkpoint {}: {}", next, e);
                    }
                    break HistoryEnd::FetchFailed {
                        hash: next,
                        error: e.to_string(),
                    };
                }
            }
        };

        debug!(
            "Walked {} checkpoint(s) from {} ({:?})",
            checkpoints.len(),
            start,
            end
        );

        History {
            start: start.to_string(),
            checkpoints,
            end,
        }
    }
}

/// Checkpoints from `start` toward its ancestors, first parent only.
///
/// Empty when `start` itself cannot be fetched. A failure further up the
/// chain ends the sequence at the last checkpoint that could be fetched.
#[cfg(test)]
pub async fn fetch_history<S>(source: &S, start: &str) -> Vec<Checkpoint>
where
    S: ObjectSource + ?Sized,
{
    HistoryWalker::default()
        .walk(source, start)
        .await
        .checkpoints
}
