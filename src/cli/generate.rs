use anyhow::Result;
use console::style;

use super::runtime::Runtime;
use crate::core::job::RunOutcome;
use crate::core::store::ArticleRecord;
use crate::core::terminal::{self, GuideSection, print_success, print_warn};

fn print_record(record: &ArticleRecord) -> Result<()> {
    let label = if record.author == crate::core::store::FALLBACK_AUTHOR {
        style("fallback").yellow().to_string()
    } else {
        style("generated").green().to_string()
    };
    GuideSection::new(&format!("Article #{}", record.id))
        .status("Title", &record.title)
        .status("Author", &format!("{} ({})", record.author, label))
        .status("Created", &record.created_at.to_rfc3339())
        .print();
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

pub async fn run_generate(offline: bool) -> Result<()> {
    let rt = Runtime::open(false).await?;
    let job = if offline {
        rt.offline_job()
    } else {
        rt.article_job().await?
    };

    match job.run_once().await? {
        RunOutcome::Created(record) => {
            print_success("Article generated and saved.");
            print_record(&record)?;
        }
        RunOutcome::Skipped => {
            print_warn("Article generation already in progress; nothing was created.");
        }
    }
    Ok(())
}

pub async fn run_backfill(min_override: Option<u32>) -> Result<()> {
    let rt = Runtime::open(false).await?;
    let job = rt.article_job().await?;

    let mut policy = rt.config.backfill_policy();
    if let Some(min) = min_override {
        policy.minimum = min;
    }

    let report = job.ensure_minimum_corpus(&policy).await?;
    if report.created.is_empty() {
        terminal::print_info(&format!(
            "Corpus already has {} article(s); minimum is {}.",
            report.existing, policy.minimum
        ));
        return Ok(());
    }

    print_success(&format!(
        "Backfilled {} article(s) on top of {} existing.",
        report.created.len(),
        report.existing
    ));
    for record in &report.created {
        println!(
            "  #{} {}  {}",
            record.id,
            style(record.created_at.format("%Y-%m-%d %H:%M UTC")).dim(),
            record.title
        );
    }
    Ok(())
}
