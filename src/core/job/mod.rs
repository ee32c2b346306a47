//! The article generation job.
//!
//! `ArticleJob` is the one coordinator every trigger goes through: the daily
//! cron firing, the manual `generate` command and the startup backfill. Normal
//! runs are single-flight through [`RunGuard`] inside a process and through
//! [`RunLease`] across processes sharing one database; a caller that loses
//! either race gets [`RunOutcome::Skipped`] back immediately instead of waiting.

mod backfill;
mod guard;
mod lease;

pub use backfill::{BackfillPolicy, BackfillReport};
pub use guard::{RunGuard, RunPermit};
pub use lease::RunLease;

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::llm::ArticleGenerator;
use crate::core::store::{ArticleRecord, ArticleStore, StoreError};

#[derive(Debug)]
pub enum RunOutcome {
    Created(ArticleRecord),
    /// Another run held the guard or the lease; nothing was generated or written.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("article store error: {0}")]
    Store(#[from] StoreError),
}

pub struct ArticleJob {
    generator: Arc<ArticleGenerator>,
    store: Arc<dyn ArticleStore>,
    guard: RunGuard,
}

impl ArticleJob {
    pub fn new(generator: Arc<ArticleGenerator>, store: Arc<dyn ArticleStore>) -> Self {
        Self {
            generator,
            store,
            guard: RunGuard::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Generate one article and persist it with the current time.
    pub async fn run_once(&self) -> Result<RunOutcome, JobError> {
        let Some(_permit) = self.guard.try_acquire() else {
            info!("Article generation already in progress, skipping...");
            return Ok(RunOutcome::Skipped);
        };
        let Some(lease) = RunLease::acquire(&self.store).await? else {
            info!("Article generation already in progress in another process, skipping...");
            return Ok(RunOutcome::Skipped);
        };

        info!("Starting article generation...");
        let draft = self.generator.generate().await;
        if draft.is_fallback() {
            warn!("Saving fallback content for \"{}\"", draft.title);
        }
        let saved = self.store.create(&draft).await;
        lease.release().await;
        let record = saved.inspect_err(|e| {
            error!("Error saving generated article: {}", e);
        })?;

        info!(
            "Article created successfully! ID: {}, Title: \"{}\"",
            record.id, record.title
        );
        Ok(RunOutcome::Created(record))
    }
}

#[cfg(test)]
impl ArticleJob {
    pub(crate) fn hold_guard(&self) -> RunPermit<'_> {
        self.guard.try_acquire().expect("guard should be free")
    }
}
