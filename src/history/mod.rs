//! Checkpoint history traversal.
//!
//! A walk starts at one checkpoint and follows the first parent of each
//! checkpoint until it reaches a root. Every step depends on the previous
//! response, so the fetches are strictly sequential. A walk never fails as
//! a whole: it returns whatever it could fetch together with the reason it
//! stopped.

mod walker;
#[cfg(test)]
mod tests;

#[cfg(test)]
pub use walker::fetch_history;
pub use walker::{History, HistoryEnd, HistoryWalker, DEFAULT_MAX_DEPTH};
