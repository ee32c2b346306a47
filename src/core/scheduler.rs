use anyhow::{Result, anyhow};
use chrono::NaiveTime;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use uuid::Uuid;

use crate::core::job::{ArticleJob, RunOutcome};

/// Daily at 09:00 (sec min hour day month weekday).
pub const DEFAULT_SCHEDULE: &str = "0 0 9 * * *";

/// The wall-clock time a daily schedule fires at, when its second, minute and
/// hour fields are plain numbers. Five-field expressions have no seconds.
/// Anything with steps, ranges, lists or wildcards in those fields yields `None`.
pub fn fixed_time_of_day(schedule: &str) -> Option<NaiveTime> {
    let fields: Vec<&str> = schedule.split_whitespace().collect();
    let (sec, min, hour) = match fields.len() {
        5 => ("0", fields[0], fields[1]),
        6 | 7 => (fields[0], fields[1], fields[2]),
        _ => return None,
    };
    let number = |field: &str| -> Option<u32> {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        field.parse().ok()
    };
    NaiveTime::from_hms_opt(number(hour)?, number(min)?, number(sec)?)
}

/// Fires the article job on a cron schedule in the process-local timezone.
/// A firing that lands on an in-flight run is dropped; missed firings are never replayed.
pub struct ArticleScheduler {
    scheduler: JobScheduler,
    job: Arc<ArticleJob>,
}

impl ArticleScheduler {
    pub async fn new(job: Arc<ArticleJob>) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self { scheduler, job })
    }

    pub async fn arm(&self, schedule: &str) -> Result<Uuid> {
        let job_for_cron = self.job.clone();
        let cron_job = Job::new_async_tz(schedule, chrono::Local, move |_uuid, _l| {
            let job = job_for_cron.clone();
            Box::pin(async move {
                info!("Daily article generation triggered");
                fire(&job).await;
            })
        })
        .map_err(|e| anyhow!("Invalid cron expression '{}': {}", schedule, e))?;

        let id = self.scheduler.add(cron_job).await?;
        info!("Article scheduler armed with schedule '{}'", schedule);
        Ok(id)
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler.start().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}

async fn fire(job: &ArticleJob) {
    match job.run_once().await {
        Ok(RunOutcome::Created(_)) => {}
        Ok(RunOutcome::Skipped) => {
            info!("Scheduled run skipped: a generation was already in flight");
        }
        Err(e) => error!("Scheduled article generation failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::llm::{ArticleGenerator, ScriptedBackend};
    use crate::core::store::memory::MemoryArticleStore;

    fn job(store: Arc<MemoryArticleStore>) -> Arc<ArticleJob> {
        let backend = Arc::new(ScriptedBackend::always(|| Ok("Scheduled body".to_string())));
        Arc::new(ArticleJob::new(
            Arc::new(ArticleGenerator::new(backend)),
            store,
        ))
    }

    #[test]
    fn fixed_time_is_read_from_plain_fields() {
        let at = |h, m, s| NaiveTime::from_hms_opt(h, m, s);
        assert_eq!(fixed_time_of_day(DEFAULT_SCHEDULE), at(9, 0, 0));
        assert_eq!(fixed_time_of_day("0 30 8 * * *"), at(8, 30, 0));
        assert_eq!(fixed_time_of_day("45 6 * * 1-5"), at(6, 45, 0));
        assert_eq!(fixed_time_of_day("0 0 9 * * * 2030"), at(9, 0, 0));
    }

    #[test]
    fn recurring_or_malformed_schedules_have_no_fixed_time() {
        for schedule in [
            "* * * * * *",
            "0 */15 * * * *",
            "0 0 9,18 * * *",
            "0 0 8-10 * * *",
            "0 0 25 * * *",
            "every morning",
            "",
        ] {
            assert_eq!(fixed_time_of_day(schedule), None, "{}", schedule);
        }
    }

    #[tokio::test]
    async fn default_schedule_is_accepted() {
        let store = Arc::new(MemoryArticleStore::new());
        let scheduler = ArticleScheduler::new(job(store)).await.unwrap();
        assert!(scheduler.arm(DEFAULT_SCHEDULE).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_schedule_is_rejected() {
        let store = Arc::new(MemoryArticleStore::new());
        let scheduler = ArticleScheduler::new(job(store)).await.unwrap();
        let err = scheduler.arm("every morning").await.unwrap_err();
        assert!(err.to_string().contains("Invalid cron expression"));
    }

    #[tokio::test]
    async fn firing_creates_an_article() {
        let store = Arc::new(MemoryArticleStore::new());
        let job = job(store.clone());
        fire(&job).await;
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn firing_during_a_run_is_dropped() {
        let store = Arc::new(MemoryArticleStore::new());
        let job = job(store.clone());

        let _held = job.hold_guard();
        fire(&job).await;
        assert!(store.records().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn every_second_schedule_fires_the_job() {
        let store = Arc::new(MemoryArticleStore::new());
        let mut scheduler = ArticleScheduler::new(job(store.clone())).await.unwrap();
        scheduler.arm("* * * * * *").await.unwrap();
        scheduler.start().await.unwrap();

        let mut fired = false;
        for _ in 0..40 {
            if !store.records().is_empty() {
                fired = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        scheduler.shutdown().await.unwrap();
        assert!(fired, "cron job never fired");
    }
}
