use anyhow::Result;
use console::style;
use tracing::info;

use super::runtime::Runtime;
use crate::core::lifecycle::LifecycleManager;
use crate::core::terminal::{self, GuideSection};

pub async fn run_serve() -> Result<()> {
    terminal::print_banner();

    let rt = Runtime::open(false).await?;
    let job = rt.article_job().await?;
    info!(
        "Starting autoblog (data dir: {})",
        rt.config.data_dir.display()
    );

    let mut lifecycle =
        LifecycleManager::new(job, &rt.config.job.schedule, rt.config.backfill_policy()).await?;
    lifecycle.start().await?;

    GuideSection::new("Scheduler running")
        .status("Schedule", &rt.config.job.schedule)
        .status("Database", &rt.config.database_path.display().to_string())
        .status("Log file", &rt.config.log_path().display().to_string())
        .blank()
        .text(&format!("Press {} to stop.", style("Ctrl+C").bold().yellow()))
        .print();

    tokio::signal::ctrl_c().await?;
    lifecycle.shutdown().await?;
    terminal::print_goodbye();
    Ok(())
}
