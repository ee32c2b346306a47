use anyhow::Result;
use console::style;

use super::runtime::Runtime;
use crate::core::config::{API_KEY_ENV, API_KEY_VAULT_KEY};
use crate::core::store::ArticleStore;
use crate::core::terminal::GuideSection;

pub async fn run_status() -> Result<()> {
    let rt = Runtime::open(true).await?;
    let config = &rt.config;
    let count = rt.store.count().await?;

    let credential = if config.api_key.is_some() {
        style(format!("from {}", API_KEY_ENV)).green().to_string()
    } else if matches!(rt.vault.get(API_KEY_VAULT_KEY).await, Ok(Some(_))) {
        style(format!("from vault ({})", API_KEY_VAULT_KEY))
            .green()
            .to_string()
    } else {
        style("missing").red().bold().to_string()
    };

    let corpus = if count >= i64::from(config.job.min_articles) {
        format!("{} (minimum {})", count, config.job.min_articles)
    } else {
        format!(
            "{} (minimum {}, backfill pending)",
            count, config.job.min_articles
        )
    };

    GuideSection::new("autoblog status")
        .status("Data dir", &config.data_dir.display().to_string())
        .status("Database", &config.database_path.display().to_string())
        .status("Articles", &corpus)
        .status("Schedule", &config.job.schedule)
        .status("Model", &config.backend.endpoint)
        .status("Credential", &credential)
        .status("Log level", &config.log_level)
        .print();
    Ok(())
}
