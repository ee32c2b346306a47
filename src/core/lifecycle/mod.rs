use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::job::{ArticleJob, BackfillPolicy};
use crate::core::scheduler::ArticleScheduler;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LifecycleState {
    Init,
    Backfill,
    Armed,
    Ready,
    Shutdown,
}

/// Startup ordering for the long-running service: backfill first, then arm the
/// daily trigger, then start the scheduler.
pub struct LifecycleManager {
    state: LifecycleState,
    job: Arc<ArticleJob>,
    scheduler: ArticleScheduler,
    schedule: String,
    backfill: BackfillPolicy,
}

impl LifecycleManager {
    pub async fn new(
        job: Arc<ArticleJob>,
        schedule: &str,
        backfill: BackfillPolicy,
    ) -> Result<Self> {
        let scheduler = ArticleScheduler::new(job.clone()).await?;
        Ok(Self {
            state: LifecycleState::Init,
            job,
            scheduler,
            schedule: schedule.to_string(),
            backfill,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub async fn start(&mut self) -> Result<()> {
        info!("Lifecycle Phase: Backfill");
        self.state = LifecycleState::Backfill;
        match self.job.ensure_minimum_corpus(&self.backfill).await {
            Ok(report) if !report.created.is_empty() => {
                info!("Backfill created {} article(s)", report.created.len());
            }
            Ok(_) => {}
            Err(e) => {
                error!("Error during initial content generation: {}", e);
                warn!("Continuing with a partial corpus");
            }
        }

        info!("Lifecycle Phase: Arm Trigger");
        self.scheduler.arm(&self.schedule).await?;
        self.state = LifecycleState::Armed;

        info!("Lifecycle Phase: Ready (Starting Scheduler)");
        self.scheduler.start().await?;
        self.state = LifecycleState::Ready;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Lifecycle Phase: Shutdown");
        self.state = LifecycleState::Shutdown;
        if self.job.is_running() {
            warn!("An article generation is still in flight and will be abandoned");
        }
        if let Err(e) = self.scheduler.shutdown().await {
            warn!("Scheduler shutdown error: {}", e);
        }
        Ok(())
    }
}
