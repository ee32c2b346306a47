use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use std::time::Duration;
use tracing::info;

use super::{ArticleJob, JobError};
use crate::core::store::ArticleRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct BackfillPolicy {
    /// Corpus size the backfill tops up to.
    pub minimum: u32,
    /// Pause between consecutive generations.
    pub delay: Duration,
    /// Local wall-clock time stamped on every backfilled article.
    pub publish_at: NaiveTime,
}

impl Default for BackfillPolicy {
    fn default() -> Self {
        Self {
            minimum: 3,
            delay: Duration::from_secs(5),
            publish_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

#[derive(Debug, Default)]
pub struct BackfillReport {
    /// Corpus size observed before anything was written.
    pub existing: i64,
    pub created: Vec<ArticleRecord>,
}

/// Timestamps for `needed` backfilled articles, oldest first, one local day apart,
/// the last one landing on `today` at `publish_at`.
pub fn backfill_timestamps(
    needed: u32,
    today: NaiveDate,
    publish_at: NaiveTime,
) -> Vec<DateTime<Utc>> {
    (0..needed)
        .map(|i| {
            let days_back = u64::from(needed - 1 - i);
            let date = today - Days::new(days_back);
            local_instant(date.and_time(publish_at))
        })
        .collect()
}

// Ambiguous local times take the earlier instant; times inside a DST gap move past it.
fn local_instant(naive: NaiveDateTime) -> DateTime<Utc> {
    let local = Local.from_local_datetime(&naive).earliest().or_else(|| {
        Local
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest()
    });
    match local {
        Some(t) => t.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

impl ArticleJob {
    /// Bring the corpus up to `policy.minimum` articles with synthetic history.
    ///
    /// Runs outside the single-flight guard: it is meant for process startup,
    /// before any trigger is armed. The first failure aborts the remaining cycles.
    pub async fn ensure_minimum_corpus(
        &self,
        policy: &BackfillPolicy,
    ) -> Result<BackfillReport, JobError> {
        self.ensure_minimum_corpus_on(policy, Local::now().date_naive())
            .await
    }

    pub(crate) async fn ensure_minimum_corpus_on(
        &self,
        policy: &BackfillPolicy,
        today: NaiveDate,
    ) -> Result<BackfillReport, JobError> {
        let existing = self.store.count().await?;
        let minimum = i64::from(policy.minimum);
        if existing >= minimum {
            info!(
                "Already have {} articles. No need to generate initial content.",
                existing
            );
            return Ok(BackfillReport {
                existing,
                created: Vec::new(),
            });
        }

        let needed = (minimum - existing) as u32;
        info!(
            "Current articles: {}/{}. Generating {} initial article(s)...",
            existing, policy.minimum, needed
        );

        let stamps = backfill_timestamps(needed, today, policy.publish_at);
        let mut created = Vec::with_capacity(stamps.len());
        for (i, stamp) in stamps.into_iter().enumerate() {
            info!("Generating article {}/{}...", i + 1, needed);
            let draft = self.generator.generate().await;
            let record = self.store.create_with_timestamp(&draft, stamp).await?;
            info!(
                "Article created! ID: {}, Title: \"{}\", Date: {}",
                record.id,
                record.title,
                record.created_at.to_rfc3339()
            );
            created.push(record);

            if i + 1 < needed as usize {
                tokio::time::sleep(policy.delay).await;
            }
        }

        Ok(BackfillReport { existing, created })
    }
}
