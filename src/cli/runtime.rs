use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

use crate::core::config::{API_KEY_VAULT_KEY, AppConfig};
use crate::core::job::ArticleJob;
use crate::core::llm::{ArticleGenerator, HuggingFaceBackend};
use crate::core::store::SqliteArticleStore;
use crate::core::vault::CredentialVault;
use crate::logging::init_logging;

/// Everything a command needs once the data dir is known: config, the article
/// database and the vault sharing its connection.
pub(crate) struct Runtime {
    pub config: AppConfig,
    pub store: Arc<SqliteArticleStore>,
    pub vault: CredentialVault,
}

impl Runtime {
    pub async fn open(quiet: bool) -> Result<Self> {
        let config = AppConfig::load()?;
        init_logging(&config, quiet);

        let store = Arc::new(SqliteArticleStore::open(&config.database_path).await?);
        let vault = CredentialVault::open(store.get_db()).await?;
        Ok(Self {
            config,
            store,
            vault,
        })
    }

    /// Credential from the environment, else the vault. Unreadable vault entries
    /// are treated as absent.
    pub async fn api_key(&self) -> Result<String> {
        if let Some(key) = &self.config.api_key {
            return Ok(key.clone());
        }
        let from_vault = match self.vault.get(API_KEY_VAULT_KEY).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Could not read {} from vault: {}", API_KEY_VAULT_KEY, e);
                None
            }
        };
        Ok(self.config.require_api_key(from_vault)?)
    }

    pub async fn article_job(&self) -> Result<Arc<ArticleJob>> {
        let api_key = self.api_key().await?;
        let backend = HuggingFaceBackend::new(
            self.config.backend.endpoint.clone(),
            api_key,
            self.config.request_timeout(),
        )?;

        let generator = ArticleGenerator::new(Arc::new(backend))
            .with_topics(self.config.job.topics.clone())
            .with_params(self.config.sampling_params())
            .with_retry(self.config.retry_policy());

        Ok(Arc::new(ArticleJob::new(
            Arc::new(generator),
            self.store.clone(),
        )))
    }

    /// A job that never calls the model; every article it saves is a placeholder.
    pub fn offline_job(&self) -> Arc<ArticleJob> {
        let generator =
            ArticleGenerator::without_backend().with_topics(self.config.job.topics.clone());
        Arc::new(ArticleJob::new(Arc::new(generator), self.store.clone()))
    }
}
