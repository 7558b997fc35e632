use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    common::{error::StoreError, money::Money},
    domain::{
        ledger::Ledger,
        party::{Party, PartyId},
        transaction::{NewTransaction, Transaction, TransactionId, TransactionPatch},
    },
    io::{snapshot, store::LedgerStore},
};

/// In-process ledger store.
///
/// All state sits behind one mutex, so a party delete and its transaction
/// cascade happen as a single step. With a snapshot path every successful
/// mutation is written to disk before it becomes visible; if the write fails
/// the mutation is dropped and the caller gets a `Transport` error.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Ledger>,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            state: Mutex::new(ledger),
            snapshot: None,
        }
    }

    /// Opens a store backed by a JSON snapshot, creating it on first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let ledger = snapshot::read(&path).await?;
        info!(
            path = %path.display(),
            parties = ledger.parties().len(),
            transactions = ledger.transactions().len(),
            "opened ledger snapshot"
        );
        Ok(Self {
            state: Mutex::new(ledger),
            snapshot: Some(path),
        })
    }

    /// Applies `mutate` to a copy of the state and commits it once persisted.
    async fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut Ledger) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let out = mutate(&mut next)?;
        if let Some(path) = &self.snapshot {
            snapshot::write(path, &next).await?;
            debug!(path = %path.display(), "snapshot written");
        }
        *state = next;
        Ok(out)
    }
}

fn party_not_found(id: PartyId) -> StoreError {
    StoreError::NotFound(format!("party {id}"))
}

fn transaction_not_found(id: TransactionId) -> StoreError {
    StoreError::NotFound(format!("transaction {id}"))
}

fn required_name(name: &str) -> Result<String, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::InvalidInput("name required".into()));
    }
    Ok(name.to_string())
}

fn positive_amount(amount: Money) -> Result<(), StoreError> {
    if !amount.is_positive() {
        return Err(StoreError::InvalidInput(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

fn within_volume(
    ledger: &Ledger,
    replacing: Option<TransactionId>,
    amount: Money,
) -> Result<(), StoreError> {
    match ledger.volume_with(replacing, amount) {
        Some(_) => Ok(()),
        None => Err(StoreError::InvalidInput(format!(
            "amount {amount} would overflow the ledger total"
        ))),
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn list_parties(&self) -> Result<Vec<Party>, StoreError> {
        Ok(self.state.lock().await.parties().to_vec())
    }

    async fn create_party(&self, name: &str) -> Result<Party, StoreError> {
        let name = required_name(name)?;
        self.commit(|ledger| {
            let party = Party::new(PartyId::new(), name);
            ledger.insert_party(party.clone());
            Ok(party)
        })
        .await
    }

    async fn update_party(&self, id: PartyId, name: &str) -> Result<Party, StoreError> {
        let name = required_name(name)?;
        self.commit(|ledger| {
            let party = Party::new(id, name);
            if !ledger.replace_party(party.clone()) {
                return Err(party_not_found(id));
            }
            Ok(party)
        })
        .await
    }

    async fn delete_party(&self, id: PartyId) -> Result<(), StoreError> {
        self.commit(|ledger| {
            if ledger.party(id).is_none() {
                return Err(party_not_found(id));
            }
            let balance = ledger.balance(id);
            if !balance.is_zero() {
                return Err(StoreError::InvalidInput(format!(
                    "party {id} has outstanding balance {balance}"
                )));
            }
            ledger.remove_party(id);
            Ok(())
        })
        .await
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.state.lock().await.transactions().to_vec())
    }

    async fn create_transaction(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        positive_amount(new.amount)?;
        self.commit(|ledger| {
            if ledger.party(new.party_id).is_none() {
                return Err(StoreError::InvalidInput(format!(
                    "unknown party {}",
                    new.party_id
                )));
            }
            within_volume(ledger, None, new.amount)?;
            let tx = Transaction::from_new(TransactionId::new(), new);
            ledger.insert_transaction(tx.clone());
            Ok(tx)
        })
        .await
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, StoreError> {
        if let Some(amount) = patch.amount {
            positive_amount(amount)?;
        }
        self.commit(|ledger| {
            let mut tx = ledger
                .transaction(id)
                .cloned()
                .ok_or_else(|| transaction_not_found(id))?;
            if let Some(amount) = patch.amount {
                within_volume(ledger, Some(id), amount)?;
            }
            tx.apply(&patch);
            ledger.replace_transaction(tx.clone());
            Ok(tx)
        })
        .await
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<(), StoreError> {
        self.commit(|ledger| {
            ledger
                .remove_transaction(id)
                .map(|_| ())
                .ok_or_else(|| transaction_not_found(id))
        })
        .await
    }
}
