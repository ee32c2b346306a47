use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::info;

use super::{
    ArticleDraft, ArticleRecord, ArticleStore, RUN_CLAIM_TTL, StoreError, effective_author,
};

const ARTICLE_JOB_LOCK: &str = "article_job";

pub struct SqliteArticleStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteArticleStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub async fn open<P: AsRef<Path>>(db_path: P) -> anyhow::Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
        }

        let db = Connection::open(db_path)?;
        let store = Self::from_connection(db)?;
        info!("Article store opened at {}", db_path.display());
        Ok(store)
    }

    pub fn from_connection(db: Connection) -> Result<Self, StoreError> {
        // `serve` and one-off commands open the same file from different processes.
        db.busy_timeout(Duration::from_secs(5))?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                author TEXT NOT NULL DEFAULT 'AI Blog Generator',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at DESC)",
            [],
        )?;

        // One row per named job; `owner` is NULL while nobody is generating.
        db.execute(
            "CREATE TABLE IF NOT EXISTS job_lock (
                name TEXT PRIMARY KEY,
                owner TEXT,
                claimed_at TEXT
            )",
            [],
        )?;
        db.execute(
            "INSERT OR IGNORE INTO job_lock (name, owner, claimed_at) VALUES (?1, NULL, NULL)",
            [ARTICLE_JOB_LOCK],
        )?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Shared handle so the credential vault can live in the same database file.
    pub fn get_db(&self) -> Arc<Mutex<Connection>> {
        self.db.clone()
    }

    async fn insert(
        &self,
        draft: &ArticleDraft,
        timestamp: DateTime<Utc>,
    ) -> Result<ArticleRecord, StoreError> {
        let author = effective_author(draft).to_string();
        let stamp = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);

        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO articles (title, content, author, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![draft.title, draft.content, author, stamp],
        )?;
        let id = db.last_insert_rowid();
        drop(db);

        // Round-trip through the stored text so the record matches what a reader would load.
        let stored = parse_timestamp(&stamp)?;
        Ok(ArticleRecord {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            author,
            created_at: stored,
            updated_at: stored,
        })
    }

    #[cfg(test)]
    async fn load(&self, id: i64) -> Result<Option<ArticleRecord>, StoreError> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT id, title, content, author, created_at, updated_at FROM articles WHERE id = ?1",
        )?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let created: String = row.get(4)?;
        let updated: String = row.get(5)?;
        Ok(Some(ArticleRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            author: row.get(3)?,
            created_at: parse_timestamp(&created)?,
            updated_at: parse_timestamp(&updated)?,
        }))
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StoreError::Timestamp(raw.to_string()))
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    async fn create(&self, draft: &ArticleDraft) -> Result<ArticleRecord, StoreError> {
        self.insert(draft, Utc::now()).await
    }

    async fn create_with_timestamp(
        &self,
        draft: &ArticleDraft,
        timestamp: DateTime<Utc>,
    ) -> Result<ArticleRecord, StoreError> {
        self.insert(draft, timestamp).await
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let db = self.db.lock().await;
        let count: i64 = db.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count)
    }

    async fn try_claim_run(&self, owner: &str) -> Result<bool, StoreError> {
        let now = Utc::now();
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let stale_before = (now - RUN_CLAIM_TTL).to_rfc3339_opts(SecondsFormat::Millis, true);

        let db = self.db.lock().await;
        let claimed = db.execute(
            "UPDATE job_lock SET owner = ?1, claimed_at = ?2
             WHERE name = ?3 AND (owner IS NULL OR claimed_at < ?4)",
            params![owner, stamp, ARTICLE_JOB_LOCK, stale_before],
        )?;
        Ok(claimed == 1)
    }

    async fn release_run(&self, owner: &str) -> Result<(), StoreError> {
        let db = self.db.lock().await;
        db.execute(
            "UPDATE job_lock SET owner = NULL, claimed_at = NULL WHERE name = ?1 AND owner = ?2",
            params![ARTICLE_JOB_LOCK, owner],
        )?;
        Ok(())
    }
}
