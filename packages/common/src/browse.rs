//! Client-held browse contexts.
//!
//! A browse context records the ordered result set a user was looking at when
//! they opened a single product, so the product page can offer previous/next
//! links and a "result N of M" banner. The context lives entirely on the client
//! (session storage) as a JSON object; the server never keeps a copy.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::FilterSelection;

/// Session-storage key the client keeps the current context under.
pub const BROWSE_CONTEXT_KEY: &str = "productBrowseContext";

/// Contexts older than this are treated as absent.
pub const DEFAULT_CONTEXT_TTL: TimeDelta = TimeDelta::minutes(30);

/// How far a context timestamp may run ahead of the server clock.
pub const MAX_CLOCK_SKEW: TimeDelta = TimeDelta::minutes(1);

/// Snapshot of a filtered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseContext {
    #[serde(flatten)]
    pub selection: FilterSelection,
    pub product_ids: Vec<i32>,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
}

/// Opaque serialized form of a [`BrowseContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextToken(String);

impl ContextToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for ContextToken {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Outcome of reading a token back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Active(BrowseContext),
    /// Parsed fine but older than the TTL. Callers must treat this like `Absent`.
    Expired,
    Absent,
}

impl Resolution {
    /// Collapses `Expired` into `None`.
    pub fn into_active(self) -> Option<BrowseContext> {
        match self {
            Resolution::Active(ctx) => Some(ctx),
            Resolution::Expired | Resolution::Absent => None,
        }
    }
}

/// Where a product sits inside an ordered id list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Adjacency {
    pub previous_id: Option<i32>,
    pub next_id: Option<i32>,
    /// 1-based.
    pub position: usize,
    pub total: usize,
}

impl Adjacency {
    /// Locates `current` in `ids`. `None` when it is not present.
    pub fn locate(ids: &[i32], current: i32) -> Option<Self> {
        let index = ids.iter().position(|&id| id == current)?;
        Some(Self {
            previous_id: index.checked_sub(1).map(|i| ids[i]),
            next_id: ids.get(index + 1).copied(),
            position: index + 1,
            total: ids.len(),
        })
    }
}

/// Captures and resolves browse-context tokens against a fixed TTL.
#[derive(Debug, Clone, Copy)]
pub struct BrowseContextTracker {
    ttl: TimeDelta,
}

impl Default for BrowseContextTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_TTL)
    }
}

impl BrowseContextTracker {
    pub fn new(ttl: TimeDelta) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn capture(
        &self,
        selection: FilterSelection,
        result_ids: Vec<i32>,
        now: DateTime<Utc>,
    ) -> ContextToken {
        let context = BrowseContext {
            selection,
            product_ids: result_ids,
            timestamp: now.timestamp_millis(),
        };
        // Plain structs with integer/string fields always serialize.
        let raw = serde_json::to_string(&context).unwrap_or_default();
        ContextToken(raw)
    }

    /// Never fails: unparseable input resolves to `Absent`.
    pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> Resolution {
        if token.trim().is_empty() {
            return Resolution::Absent;
        }
        let context: BrowseContext = match serde_json::from_str(token) {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::debug!("Discarding malformed browse context: {e}");
                return Resolution::Absent;
            }
        };

        let age = now.timestamp_millis().saturating_sub(context.timestamp);
        if age < -MAX_CLOCK_SKEW.num_milliseconds() {
            tracing::debug!(age_ms = age, "Discarding browse context stamped in the future");
            return Resolution::Absent;
        }
        if age > self.ttl.num_milliseconds() {
            Resolution::Expired
        } else {
            Resolution::Active(context)
        }
    }

    /// `None` means "use the unscoped ordering": the context is missing,
    /// expired, or no longer contains the product.
    pub fn adjacency(&self, token: &str, current_id: i32, now: DateTime<Utc>) -> Option<Adjacency> {
        let context = self.resolve(token, now).into_active()?;
        Adjacency::locate(&context.product_ids, current_id)
    }
}

/// Key/value storage scoped to one browsing session.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String);
    fn remove_item(&mut self, key: &str);
}

impl SessionStorage for HashMap<String, String> {
    fn get_item(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }

    fn remove_item(&mut self, key: &str) {
        self.remove(key);
    }
}

/// The single context slot a browsing session holds under [`BROWSE_CONTEXT_KEY`].
///
/// Separate sessions (e.g. two browser tabs) each own their storage and never
/// interfere with one another.
#[derive(Debug)]
pub struct BrowseSession<S> {
    storage: S,
    tracker: BrowseContextTracker,
}

impl<S: SessionStorage> BrowseSession<S> {
    pub fn new(storage: S, tracker: BrowseContextTracker) -> Self {
        Self { storage, tracker }
    }

    /// Replaces whatever context the session held.
    pub fn capture(
        &mut self,
        selection: FilterSelection,
        result_ids: Vec<i32>,
        now: DateTime<Utc>,
    ) -> ContextToken {
        let token = self.tracker.capture(selection, result_ids, now);
        self.storage
            .set_item(BROWSE_CONTEXT_KEY, token.as_str().to_string());
        token
    }

    /// Expired or malformed entries are dropped from storage on read.
    pub fn resolve(&mut self, now: DateTime<Utc>) -> Resolution {
        let Some(raw) = self.storage.get_item(BROWSE_CONTEXT_KEY) else {
            return Resolution::Absent;
        };
        let resolution = self.tracker.resolve(&raw, now);
        if !matches!(resolution, Resolution::Active(_)) {
            self.storage.remove_item(BROWSE_CONTEXT_KEY);
        }
        resolution
    }

    pub fn adjacency(&mut self, current_id: i32, now: DateTime<Utc>) -> Option<Adjacency> {
        let context = self.resolve(now).into_active()?;
        Adjacency::locate(&context.product_ids, current_id)
    }

    /// Explicit invalidation ("new search", "clear filters").
    pub fn discard(&mut self) {
        self.storage.remove_item(BROWSE_CONTEXT_KEY);
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
