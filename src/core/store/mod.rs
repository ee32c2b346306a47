mod sqlite;

#[cfg(test)]
pub(crate) mod memory;

pub use sqlite::SqliteArticleStore;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Author tag carried by articles produced from a real backend completion.
pub const GENERATOR_AUTHOR: &str = "AI Blog Generator";

/// Author tag carried by placeholder articles written when the backend is unusable.
pub const FALLBACK_AUTHOR: &str = "AI Blog Generator (Fallback)";

/// A run claim older than this is treated as abandoned by a crashed process.
pub const RUN_CLAIM_TTL: TimeDelta = TimeDelta::minutes(15);

/// An article payload that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub author: String,
}

impl ArticleDraft {
    pub fn is_fallback(&self) -> bool {
        self.author == FALLBACK_AUTHOR
    }
}

/// A persisted article. `created_at == updated_at` for everything this crate writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored timestamp is not valid RFC 3339: {0}")]
    Timestamp(String),
    #[error("article store unavailable: {0}")]
    Unavailable(String),
}

/// Storage collaborator used by the generation job.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Persist a draft stamped with the current time.
    async fn create(&self, draft: &ArticleDraft) -> Result<ArticleRecord, StoreError>;

    /// Persist a draft with both timestamps set to `timestamp`.
    async fn create_with_timestamp(
        &self,
        draft: &ArticleDraft,
        timestamp: DateTime<Utc>,
    ) -> Result<ArticleRecord, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// Claim the run lock shared by every process using this store.
    /// `false` means another owner holds a live claim.
    async fn try_claim_run(&self, owner: &str) -> Result<bool, StoreError>;

    /// Drop the claim if `owner` still holds it.
    async fn release_run(&self, owner: &str) -> Result<(), StoreError>;
}

/// Empty authors are stored under the generator tag, matching the column default.
pub(crate) fn effective_author(draft: &ArticleDraft) -> &str {
    if draft.author.trim().is_empty() {
        GENERATOR_AUTHOR
    } else {
        &draft.author
    }
}
