use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tracing::info;

use crate::{
    common::error::LedgerError,
    domain::party::{PartyId, normalize_name},
    io::store::LedgerStore,
    worker::{
        cache::LedgerCache,
        debounce::{Debouncer, FlushSink, RenameFailure, RenameSink},
    },
};

/// One user session over a store: a loaded cache plus the debounced rename
/// queue. Consumers borrow the cache from here rather than from a global.
pub struct LedgerSession {
    cache: Arc<LedgerCache>,
    renames: Debouncer<PartyId, String>,
    rename_failures: mpsc::UnboundedReceiver<RenameFailure>,
}

impl LedgerSession {
    /// Creates the cache and loads both collections.
    pub async fn start(
        store: Arc<dyn LedgerStore>,
        rename_delay: Duration,
    ) -> Result<Self, LedgerError> {
        let cache = Arc::new(LedgerCache::new(store));
        cache.load().await?;
        let (failures, rename_failures) = mpsc::unbounded_channel();
        let sink: Arc<dyn FlushSink<PartyId, String>> =
            Arc::new(RenameSink::new(cache.clone(), failures));
        info!(rename_delay_ms = rename_delay.as_millis() as u64, "ledger session started");
        Ok(Self {
            cache,
            renames: Debouncer::new(rename_delay, sink),
            rename_failures,
        })
    }

    pub fn cache(&self) -> &Arc<LedgerCache> {
        &self.cache
    }

    /// Queues a live edit of a party name. Edits arriving within the delay
    /// coalesce into one store call with the final name.
    pub async fn rename_debounced(&self, party: PartyId, name: &str) -> Result<(), LedgerError> {
        let name = normalize_name(name)?;
        if self.cache.party(party).await.is_none() {
            return Err(LedgerError::not_found("party", party));
        }
        self.renames.push(party, name).await;
        Ok(())
    }

    /// Debounced renames the cache refused since the last call.
    pub fn rename_failures(&mut self) -> Vec<RenameFailure> {
        let mut failures = Vec::new();
        while let Ok(failure) = self.rename_failures.try_recv() {
            failures.push(failure);
        }
        failures
    }

    /// Flushes pending renames and waits for those already sent, then closes
    /// the cache. Returns the renames that were refused and not yet collected.
    pub async fn close(mut self) -> Vec<RenameFailure> {
        self.renames.flush_all().await;
        self.cache.teardown().await;
        info!("ledger session closed");
        self.rename_failures()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{io::memory::MemoryStore, worker::cache::LoadState};

    #[tokio::test(start_paused = true)]
    async fn close_flushes_pending_rename() {
        let store = Arc::new(MemoryStore::new());
        let bob = store.create_party("Bob").await.unwrap();
        let session = LedgerSession::start(store.clone(), Duration::from_millis(500))
            .await
            .unwrap();
        let cache = session.cache().clone();

        session.rename_debounced(bob.id, "Robert").await.unwrap();
        let failures = session.close().await;

        assert!(failures.is_empty());
        assert_eq!(store.list_parties().await.unwrap()[0].name, "Robert");
        assert_eq!(cache.state().await, LoadState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn close_returns_refused_renames() {
        let store = Arc::new(MemoryStore::new());
        let bob = store.create_party("Bob").await.unwrap();
        let session = LedgerSession::start(store.clone(), Duration::from_millis(500))
            .await
            .unwrap();

        session.rename_debounced(bob.id, "Robert").await.unwrap();
        session.cache().remove_party(bob.id).await.unwrap();
        let failures = session.close().await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].party, bob.id);
        assert_eq!(failures[0].error.status(), Some(404));
    }

    #[tokio::test]
    async fn rename_debounced_validates_eagerly() {
        let session = LedgerSession::start(Arc::new(MemoryStore::new()), Duration::from_millis(500))
            .await
            .unwrap();

        assert!(matches!(
            session.rename_debounced(PartyId::new(), " ").await,
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            session.rename_debounced(PartyId::new(), "Zed").await,
            Err(LedgerError::NotFound { .. })
        ));
    }
}
