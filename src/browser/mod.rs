//! Browser controller.
//!
//! Owns the [`AppState`] and is the only place it changes. Every change goes
//! through [`Browser::dispatch`], which applies the pure transition under the
//! watch channel's lock and then starts the returned effects as tasks. The
//! tasks report back through `dispatch` as well, tagged with the generation
//! they were started under.
//!
//! ## Usage
//!
//! ```ignore
//! let browser = Browser::new(client, HistoryWalker::default(), None);
//! browser.set_server("http://localhost:8080")?;
//! let state = browser.settled().await;
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::api::{parse_server_url, ApiClient, ApiError, RefSource, ServerConnection};
use crate::history::{HistoryEnd, HistoryWalker};
use crate::state::{Action, AppState, Effect};

struct BrowserInner {
    client: Arc<ApiClient>,
    walker: HistoryWalker,
    state: watch::Sender<AppState>,
}

/// Handle to the browser. Clones share the same state.
#[derive(Clone)]
pub struct Browser {
    inner: Arc<BrowserInner>,
}

impl Browser {
    pub fn new(client: Arc<ApiClient>, walker: HistoryWalker, preferred_ref: Option<String>) -> Self {
        let (state, _) = watch::channel(AppState::new(preferred_ref));
        Self {
            inner: Arc::new(BrowserInner {
                client,
                walker,
                state,
            }),
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified after every transition.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.inner.state.subscribe()
    }

    /// Apply an action and start the work it asks for.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, action: Action) {
        let mut effects = Vec::new();
        self.inner.state.send_modify(|state| {
            let (next, requested) = std::mem::take(state).reduce(action);
            *state = next;
            effects = requested;
        });

        for effect in effects {
            self.spawn_effect(effect);
        }
    }

    /// Point the browser at a server.
    pub fn set_server(&self, server_url: &str) -> Result<(), ApiError> {
        let server = parse_server_url(server_url)?;
        self.dispatch(Action::SetServerUrl(server));
        Ok(())
    }

    /// Show the history of a ref name or a literal checkpoint hash.
    pub fn select(&self, name_or_hash: &str) {
        let hash = {
            let state = self.inner.state.borrow();
            match state.refs.ready() {
                Some(refs) => refs.resolve(name_or_hash).to_string(),
                None => name_or_hash.to_string(),
            }
        };
        self.dispatch(Action::SelectRef { hash });
    }

    /// Wait until the state satisfies `predicate`.
    pub async fn wait_for(&self, predicate: impl FnMut(&AppState) -> bool) -> AppState {
        let mut rx = self.subscribe();
        let result = rx.wait_for(predicate).await.map(|state| state.clone());
        match result {
            Ok(state) => state,
            // Unreachable while `self` holds the sender
            Err(_) => self.snapshot(),
        }
    }

    /// Wait until nothing is loading.
    pub async fn settled(&self) -> AppState {
        self.wait_for(|s| !s.refs.is_loading() && !s.history.is_loading())
            .await
    }

    fn spawn_effect(&self, effect: Effect) {
        let browser = self.clone();
        match effect {
            Effect::FetchRefs { server, generation } => {
                tokio::spawn(async move {
                    let conn = ServerConnection::new(browser.inner.client.clone(), server);
                    let action = match conn.fetch_refs().await {
                        Ok(refs) => Action::RefsLoaded { generation, refs },
                        Err(e) => Action::RefsFailed {
                            generation,
                            error: e.to_string(),
                        },
                    };
                    browser.dispatch(action);
                });
            }
            Effect::WalkHistory {
                server,
                hash,
                generation,
            } => {
                tokio::spawn(async move {
                    debug!("Walking history of {} (generation {})", hash, generation);
                    let conn = ServerConnection::new(browser.inner.client.clone(), server);
                    let history = browser.inner.walker.walk(&conn, &hash).await;

                    let action = match &history.end {
                        HistoryEnd::FetchFailed { error, .. } if history.is_empty() => {
                            Action::HistoryFailed {
                                generation,
                                error: error.clone(),
                            }
                        }
                        _ => Action::HistoryLoaded {
                            generation,
                            history,
                        },
                    };
                    browser.dispatch(action);
                });
            }
        }
    }
}
