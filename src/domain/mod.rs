//! Domain types shared across modules.
//!
//! These are the refs, checkpoints and affixes as the rest of the
//! application sees them. Wire payloads are decoded in `api::types` and
//! converted into these types, so the walker, the state machine and the
//! terminal views never touch raw JSON.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of hex digits shown for abbreviated hashes
pub const SHORT_HASH_LEN: usize = 8;

/// Named pointer to a checkpoint hash, analogous to a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ref {
    pub name: String,
    pub hash: String,
}

impl Ref {
    pub fn new(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
        }
    }
}

/// Refs of one server, kept in the order the server listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefSet {
    refs: Vec<Ref>,
}

impl RefSet {
    pub fn new(refs: Vec<Ref>) -> Self {
        refs.into_iter().collect()
    }

    /// Add a ref. A repeated name keeps its original position and takes the
    /// newer hash.
    pub fn insert(&mut self, entry: Ref) {
        match self.refs.iter_mut().find(|r| r.name == entry.name) {
            Some(existing) => existing.hash = entry.hash,
            None => self.refs.push(entry),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ref> {
        self.refs.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Ref> {
        self.refs.iter().find(|r| r.name == name)
    }

    /// The ref selected when nobody picked one yet.
    ///
    /// A configured preference wins when the server lists it; otherwise the
    /// last entry as returned by the server.
    pub fn default_ref(&self, preferred: Option<&str>) -> Option<&Ref> {
        preferred
            .and_then(|name| self.get(name))
            .or_else(|| self.refs.last())
    }

    /// Resolve user input to a checkpoint hash: ref names map to their
    /// hash, anything else is taken as a literal hash.
    pub fn resolve<'a>(&'a self, name_or_hash: &'a str) -> &'a str {
        self.get(name_or_hash)
            .map(|r| r.hash.as_str())
            .unwrap_or(name_or_hash)
    }
}

impl FromIterator<Ref> for RefSet {
    fn from_iter<I: IntoIterator<Item = Ref>>(iter: I) -> Self {
        let mut set = RefSet::default();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

/// Error decoding a checkpoint's command description
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    #[error("command description is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Immutable record of one command execution, identified by its hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// The key this checkpoint was fetched under. Not part of the payload.
    pub hash: String,
    pub parent_hashes: Vec<String>,
    pub affix_hash: String,
    /// Base64-encoded command description
    pub command_desc: String,
    pub summary: String,
    pub fields: BTreeMap<String, String>,
}

impl Checkpoint {
    /// First parent, the only one history traversal follows.
    pub fn first_parent(&self) -> Option<&str> {
        self.parent_hashes.first().map(String::as_str)
    }

    /// Decode the command description.
    pub fn description(&self) -> Result<String, DescriptionError> {
        let encoded = self.command_desc.trim();
        if encoded.is_empty() {
            return Ok(String::new());
        }
        let bytes = STANDARD.decode(encoded)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn short_hash(&self) -> &str {
        short_hash(&self.hash)
    }

    /// Time the checkpoint was recorded, from the `date` field.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        let raw = self.field("date")?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    pub fn session(&self) -> Option<&str> {
        self.field("session").filter(|s| !s.is_empty())
    }

    // Field names are matched case-insensitively, the server does the same.
    fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Events a checkpoint wrote, grouped by partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Affix {
    pub hash: String,
    pub partitions: BTreeMap<String, Vec<String>>,
}

impl Affix {
    pub fn event_count(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }
}

/// Abbreviate `algo:hex` hashes to the first few hex digits.
pub fn short_hash(hash: &str) -> &str {
    let digest = hash.split_once(':').map(|(_, hex)| hex).unwrap_or(hash);
    digest.get(..SHORT_HASH_LEN).unwrap_or(digest)
}
