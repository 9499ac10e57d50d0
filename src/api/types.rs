//! Request and response types for the Retro ref and object endpoints.
//!
//! The server is written in Go, so nil slices and maps arrive as JSON
//! `null` and byte slices arrive as base64 strings. Everything here
//! normalises that before handing out domain types.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use super::http::{is_retriable_send_error, is_retriable_status};
use crate::domain::{Affix, Checkpoint, Ref, RefSet};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Checkpoint object as served by `GET /obj/{hash}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CheckpointPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_hashes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub affix_hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub command_desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: BTreeMap<String, String>,
}

impl CheckpointPayload {
    /// Attach the hash the object was fetched under.
    pub fn into_checkpoint(self, hash: &str) -> Checkpoint {
        Checkpoint {
            hash: hash.to_string(),
            parent_hashes: self.parent_hashes,
            affix_hash: self.affix_hash,
            command_desc: self.command_desc,
            summary: self.summary,
            fields: self.fields,
        }
    }
}

/// Affix object: partition name to the hashes of the events written there
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub(super) struct AffixPayload(BTreeMap<String, Option<Vec<String>>>);

impl AffixPayload {
    pub fn into_affix(self, hash: &str) -> Affix {
        Affix {
            hash: hash.to_string(),
            partitions: self
                .0
                .into_iter()
                .map(|(partition, events)| (partition, events.unwrap_or_default()))
                .collect(),
        }
    }
}

/// Ref listing from `GET /ref/`.
///
/// Deserialised entry by entry so the server's ordering survives; a
/// `HashMap` would scramble it and the default ref depends on it.
#[derive(Debug)]
pub(super) struct RefListing(pub RefSet);

impl<'de> Deserialize<'de> for RefListing {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ListingVisitor;

        impl<'de> Visitor<'de> for ListingVisitor {
            type Value = RefListing;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping ref names to hashes")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut refs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, hash)) = map.next_entry::<String, String>()? {
                    refs.push(Ref::new(name, hash));
                }
                Ok(RefListing(RefSet::new(refs)))
            }
        }

        deserializer.deserialize_map(ListingVisitor)
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Failure talking to a Retro server.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid server URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}{}", format_body(.body))]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

fn format_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

impl ApiError {
    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport { source, .. } => is_retriable_send_error(source),
            ApiError::Status { status, .. } => is_retriable_status(*status),
            ApiError::InvalidUrl { .. } | ApiError::Decode { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_listing_keeps_server_order() {
        let raw = r#"{"refs/heads/zeta":"sha256:01","refs/heads/alpha":"sha256:02","refs/heads/mid":"sha256:03"}"#;
        let listing: RefListing = serde_json::from_str(raw).unwrap();
        let names: Vec<_> = listing.0.iter().map(|r| r.name.clone()).collect();
        assert_eq!(
            names,
            vec!["refs/heads/zeta", "refs/heads/alpha", "refs/heads/mid"]
        );
        assert_eq!(listing.0.default_ref(None).unwrap().hash, "sha256:03");
    }

    #[test]
    fn test_ref_listing_rejects_arrays() {
        assert!(serde_json::from_str::<RefListing>(r#"["main"]"#).is_err());
    }

    #[test]
    fn test_checkpoint_payload_tolerates_go_nulls() {
        let raw = r#"{"affixHash":"sha256:af","parentHashes":null,"fields":null,"summary":"","commandDesc":null}"#;
        let payload: CheckpointPayload = serde_json::from_str(raw).unwrap();
        let cp = payload.into_checkpoint("sha256:cp");
        assert_eq!(cp.hash, "sha256:cp");
        assert!(cp.parent_hashes.is_empty());
        assert!(cp.fields.is_empty());
        assert_eq!(cp.command_desc, "");
        assert_eq!(cp.affix_hash, "sha256:af");
    }

    #[test]
    fn test_checkpoint_payload_ignores_unknown_members() {
        let raw = r#"{"parentHashes":["sha256:p1","sha256:p2"],"commandDesc":"e30=","extra":1}"#;
        let payload: CheckpointPayload = serde_json::from_str(raw).unwrap();
        let cp = payload.into_checkpoint("sha256:cp");
        assert_eq!(cp.first_parent(), Some("sha256:p1"));
        assert_eq!(cp.description().unwrap(), "{}");
    }

    #[test]
    fn test_affix_payload() {
        let raw = r#"{"users/1":["sha256:e1","sha256:e2"],"empty":null}"#;
        let payload: AffixPayload = serde_json::from_str(raw).unwrap();
        let affix = payload.into_affix("sha256:af");
        assert_eq!(affix.event_count(), 2);
        assert!(affix.partitions["empty"].is_empty());
    }

    #[test]
    fn test_status_error_classification() {
        let err = ApiError::Status {
            url: "http://localhost:8080/obj/x".to_string(),
            status: 503,
            body: String::new(),
        };
        assert!(err.is_transient());
        assert_eq!(err.status(), Some(503));
        assert_eq!(
            err.to_string(),
            "http://localhost:8080/obj/x returned HTTP 503"
        );

        let err = ApiError::Status {
            url: "http://localhost:8080/obj/x".to_string(),
            status: 400,
            body: "Bad Request\n".to_string(),
        };
        assert!(!err.is_transient());
        assert_eq!(
            err.to_string(),
            "http://localhost:8080/obj/x returned HTTP 400: Bad Request"
        );

        let err = ApiError::Status {
            url: "http://localhost:8080/obj/x".to_string(),
            status: 500,
            body: "object not found".to_string(),
        };
        assert!(!err.is_transient());
    }
}
