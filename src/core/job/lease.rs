use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::core::store::{ArticleStore, StoreError};

/// Cross-process counterpart of [`RunPermit`](super::RunPermit): a claim on the
/// lock row in the article database, so `serve` and a one-off `generate`
/// pointed at the same file never write concurrently.
pub struct RunLease {
    store: Arc<dyn ArticleStore>,
    owner: String,
    released: bool,
}

impl RunLease {
    /// `None` means another process holds a live claim.
    pub async fn acquire(store: &Arc<dyn ArticleStore>) -> Result<Option<Self>, StoreError> {
        let owner = Uuid::new_v4().to_string();
        if !store.try_claim_run(&owner).await? {
            return Ok(None);
        }
        Ok(Some(Self {
            store: store.clone(),
            owner,
            released: false,
        }))
    }

    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = self.store.release_run(&self.owner).await {
            warn!("Could not release the article job lock: {}", e);
        }
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Cancelled mid-run: hand the release to the runtime. If there is none,
        // the claim expires on its own.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let store = self.store.clone();
        let owner = std::mem::take(&mut self.owner);
        handle.spawn(async move {
            if let Err(e) = store.release_run(&owner).await {
                warn!("Could not release the article job lock: {}", e);
            }
        });
    }
}
