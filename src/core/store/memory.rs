use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{ArticleDraft, ArticleRecord, ArticleStore, StoreError, effective_author};

/// In-process store for job tests. Writes can be made to fail on demand.
#[derive(Default)]
pub struct MemoryArticleStore {
    records: Mutex<Vec<ArticleRecord>>,
    fail_writes: AtomicBool,
    claim: Mutex<Option<String>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(n: usize) -> Self {
        let store = Self::new();
        {
            let mut records = store.records.lock().unwrap();
            for i in 0..n {
                let now = Utc::now();
                records.push(ArticleRecord {
                    id: i as i64 + 1,
                    title: format!("Seed {}", i + 1),
                    content: "seed".to_string(),
                    author: super::GENERATOR_AUTHOR.to_string(),
                    created_at: now,
                    updated_at: now,
                });
            }
        }
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn claimed_by(&self) -> Option<String> {
        self.claim.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<ArticleRecord> {
        self.records.lock().unwrap().clone()
    }

    fn push(&self, draft: &ArticleDraft, at: DateTime<Utc>) -> Result<ArticleRecord, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        let record = ArticleRecord {
            id: records.len() as i64 + 1,
            title: draft.title.clone(),
            content: draft.content.clone(),
            author: effective_author(draft).to_string(),
            created_at: at,
            updated_at: at,
        };
        records.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn create(&self, draft: &ArticleDraft) -> Result<ArticleRecord, StoreError> {
        self.push(draft, Utc::now())
    }

    async fn create_with_timestamp(
        &self,
        draft: &ArticleDraft,
        timestamp: DateTime<Utc>,
    ) -> Result<ArticleRecord, StoreError> {
        self.push(draft, timestamp)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.records.lock().unwrap().len() as i64)
    }

    async fn try_claim_run(&self, owner: &str) -> Result<bool, StoreError> {
        let mut claim = self.claim.lock().unwrap();
        if claim.is_some() {
            return Ok(false);
        }
        *claim = Some(owner.to_string());
        Ok(true)
    }

    async fn release_run(&self, owner: &str) -> Result<(), StoreError> {
        let mut claim = self.claim.lock().unwrap();
        if claim.as_deref() == Some(owner) {
            *claim = None;
        }
        Ok(())
    }
}
