//! HTTP client for Retro object-database servers.
//!
//! Covers the two read endpoints the browser needs: the ref listing
//! (`GET /ref/`) and the object database (`GET /obj/{hash}`).

mod client;
mod http;
mod objects;
mod refs;
mod server;
mod types;

pub use client::{parse_server_url, ApiClient, DEFAULT_TIMEOUT_SECS};
pub use http::{RetryPolicy, DEFAULT_MAX_RETRIES};
pub use server::{ObjectSource, RefSource, ServerConnection};
pub use types::ApiError;
