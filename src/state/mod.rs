//! Browser state machine.
//!
//! The whole browser state is one plain value. `AppState::reduce` is a pure
//! transition: it consumes the current state and an [`Action`] and returns
//! the next state plus the [`Effect`]s (network work) the caller has to run.
//! Effects report back by dispatching result actions that carry the
//! generation they were started under; results from superseded generations
//! are dropped, so a slow response for an old selection can never overwrite
//! a newer one.

use tracing::{debug, info, warn};
use url::Url;

use crate::domain::RefSet;
use crate::history::History;

/// Load state of something fetched from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Idle
    }
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }
}

/// Coarse phase of the browser, for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    LoadingRefs,
    RefsReady,
    LoadingHistory,
    HistoryReady,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::LoadingRefs => "loading refs",
            Phase::RefsReady => "refs ready",
            Phase::LoadingHistory => "loading history",
            Phase::HistoryReady => "history ready",
            Phase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// State transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Point the browser at a server; invalidates everything fetched so far
    SetServerUrl(Url),
    RefsLoaded { generation: u64, refs: RefSet },
    RefsFailed { generation: u64, error: String },
    /// Show the history of a checkpoint hash
    SelectRef { hash: String },
    HistoryLoaded { generation: u64, history: History },
    HistoryFailed { generation: u64, error: String },
}

/// Work the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchRefs {
        server: Url,
        generation: u64,
    },
    WalkHistory {
        server: Url,
        hash: String,
        generation: u64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub server_url: Option<Url>,
    pub refs: Loadable<RefSet>,
    /// Hash whose history is shown
    pub selected_hash: Option<String>,
    pub history: Loadable<History>,
    /// Ref to select by default when a listing arrives
    pub preferred_ref: Option<String>,
    refs_generation: u64,
    history_generation: u64,
}

impl AppState {
    pub fn new(preferred_ref: Option<String>) -> Self {
        Self {
            preferred_ref,
            ..Self::default()
        }
    }

    pub fn refs_generation(&self) -> u64 {
        self.refs_generation
    }

    pub fn history_generation(&self) -> u64 {
        self.history_generation
    }

    pub fn phase(&self) -> Phase {
        match (&self.refs, &self.history) {
            (Loadable::Failed(_), _) | (_, Loadable::Failed(_)) => Phase::Failed,
            (Loadable::Loading, _) => Phase::LoadingRefs,
            (_, Loadable::Loading) => Phase::LoadingHistory,
            (_, Loadable::Ready(_)) => Phase::HistoryReady,
            (Loadable::Ready(_), Loadable::Idle) => Phase::RefsReady,
            (Loadable::Idle, Loadable::Idle) => Phase::Idle,
        }
    }

    /// Name of the ref pointing at the selected hash, if any.
    pub fn selected_ref_name(&self) -> Option<&str> {
        let hash = self.selected_hash.as_deref()?;
        self.refs
            .ready()?
            .iter()
            .find(|r| r.hash == hash)
            .map(|r| r.name.as_str())
    }

    /// Apply one action.
    pub fn reduce(mut self, action: Action) -> (AppState, Vec<Effect>) {
        let mut effects = Vec::new();

        match action {
            Action::SetServerUrl(server) => {
                info!("Browsing {}", server);
                self.refs_generation += 1;
                self.history_generation += 1;
                self.refs = Loadable::Loading;
                self.history = Loadable::Idle;
                self.selected_hash = None;
                self.server_url = Some(server.clone());
                effects.push(Effect::FetchRefs {
                    server,
                    generation: self.refs_generation,
                });
            }

            Action::RefsLoaded { generation, refs } => {
                if generation != self.refs_generation {
                    debug!("Dropping ref listing from generation {}", generation);
                    return (self, effects);
                }
                let default = refs
                    .default_ref(self.preferred_ref.as_deref())
                    .map(|r| r.hash.clone());
                self.refs = Loadable::Ready(refs);

                // A selection made while the listing was loading stays
                if self.selected_hash.is_some() {
                    return (self, effects);
                }
                if let Some(hash) = default {
                    return self.reduce(Action::SelectRef { hash });
                }
            }

            Action::RefsFailed { generation, error } => {
                if generation != self.refs_generation {
                    return (self, effects);
                }
                warn!("Could not list refs: {}", error);
                self.refs = Loadable::Failed(error);
            }

            Action::SelectRef { hash } => {
                let Some(server) = self.server_url.clone() else {
                    warn!("No server selected, ignoring selection of {}", hash);
                    return (self, effects);
                };
                self.history_generation += 1;
                self.history = Loadable::Loading;
                self.selected_hash = Some(hash.clone());
                effects.push(Effect::WalkHistory {
                    server,
                    hash,
                    generation: self.history_generation,
                });
            }

            Action::HistoryLoaded {
                generation,
                history,
            } => {
                if generation != self.history_generation {
                    debug!("Dropping history of {} from generation {}", history.start, generation);
                    return (self, effects);
                }
                self.history = Loadable::Ready(history);
            }

            Action::HistoryFailed { generation, error } => {
                if generation != self.history_generation {
                    return (self, effects);
                }
                warn!("Could not load history: {}", error);
                self.history = Loadable::Failed(error);
            }
        }

        (self, effects)
    }
}
