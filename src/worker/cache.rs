use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    common::{error::LedgerError, money::Money},
    domain::{
        balance::Totals,
        ledger::Ledger,
        party::{Party, PartyId},
        transaction::{Transaction, TransactionId},
    },
    io::store::LedgerStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    /// A load is in flight, or the last one failed and the mirror is stale.
    Loading,
    Loaded,
    /// The session was torn down; in-flight loads are discarded.
    Closed,
}

#[derive(Debug)]
struct Mirror {
    ledger: Ledger,
    state: LoadState,
}

/// In-memory mirror of the store's parties and transactions.
///
/// Every mutation goes to the store first and is merged into the mirror only
/// after the store confirms it. The mirror lock is never held across a store
/// call, so results are merged in the order they resolve.
pub struct LedgerCache {
    pub(crate) store: Arc<dyn LedgerStore>,
    mirror: RwLock<Mirror>,
    generation: AtomicU64,
}

impl LedgerCache {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            mirror: RwLock::new(Mirror {
                ledger: Ledger::new(),
                state: LoadState::Unloaded,
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Fetches both collections and replaces the mirror with them.
    ///
    /// On failure the state stays `Loading` and the previous mirror is kept;
    /// calling `load` again retries.
    pub async fn load(&self) -> Result<(), LedgerError> {
        let generation = {
            let mut mirror = self.mirror.write().await;
            if mirror.state == LoadState::Closed {
                return Err(LedgerError::Closed);
            }
            mirror.state = LoadState::Loading;
            self.generation.load(Ordering::SeqCst)
        };

        let fetched = tokio::try_join!(self.store.list_parties(), self.store.list_transactions());
        let (parties, transactions) = match fetched {
            Ok(lists) => lists,
            Err(e) => {
                warn!(error = %e, "failed to load ledger");
                return Err(e.into());
            }
        };

        let mut mirror = self.mirror.write().await;
        if self.generation.load(Ordering::SeqCst) != generation || mirror.state == LoadState::Closed
        {
            debug!("discarding ledger load for a closed session");
            return Ok(());
        }
        info!(
            parties = parties.len(),
            transactions = transactions.len(),
            "ledger loaded"
        );
        mirror.ledger = Ledger::from_parts(parties, transactions);
        mirror.state = LoadState::Loaded;
        Ok(())
    }

    /// Ends the session. Loads still in flight will not be applied.
    pub async fn teardown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.mirror.write().await.state = LoadState::Closed;
        debug!("ledger session closed");
    }

    pub async fn state(&self) -> LoadState {
        self.mirror.read().await.state
    }

    pub async fn parties(&self) -> Vec<Party> {
        self.mirror.read().await.ledger.parties().to_vec()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.mirror.read().await.ledger.transactions().to_vec()
    }

    pub async fn party(&self, id: PartyId) -> Option<Party> {
        self.mirror.read().await.ledger.party(id).cloned()
    }

    pub async fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.mirror.read().await.ledger.transaction(id).cloned()
    }

    /// Copy of the whole mirror.
    pub async fn snapshot(&self) -> Ledger {
        self.mirror.read().await.ledger.clone()
    }

    /// Net balance for every known party, recomputed from the mirror.
    pub async fn consolidated(&self) -> HashMap<PartyId, Money> {
        self.mirror.read().await.ledger.consolidated()
    }

    pub async fn balance(&self, id: PartyId) -> Money {
        self.mirror.read().await.ledger.balance(id)
    }

    pub async fn totals(&self) -> Totals {
        self.mirror.read().await.ledger.totals()
    }

    pub async fn statement(&self, id: PartyId) -> Vec<Transaction> {
        self.mirror.read().await.ledger.statement(id)
    }

    /// Runs `check` against the mirror of an open session.
    pub(crate) async fn inspect<T>(
        &self,
        check: impl FnOnce(&Ledger) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mirror = self.mirror.read().await;
        if mirror.state == LoadState::Closed {
            return Err(LedgerError::Closed);
        }
        check(&mirror.ledger)
    }

    /// Applies a store-confirmed change to the mirror.
    pub(crate) async fn merge<T>(&self, apply: impl FnOnce(&mut Ledger) -> T) -> T {
        let mut mirror = self.mirror.write().await;
        apply(&mut mirror.ledger)
    }
}

/// Logs a rejected cache operation before it is handed back to the caller.
pub(crate) fn rejected(op: &'static str) -> impl Fn(&LedgerError) {
    move |e: &LedgerError| warn!(op, error = %e, status = ?e.status(), "ledger operation rejected")
}
