//! Contract of the authoritative ledger store.

use async_trait::async_trait;

use crate::{
    common::error::StoreError,
    domain::{
        party::{Party, PartyId},
        transaction::{NewTransaction, Transaction, TransactionId, TransactionPatch},
    },
};

/// Durable record of parties and transactions; the single source of truth.
///
/// Implementations assign ids on create and report failures with the status
/// class preserved in [`StoreError`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn list_parties(&self) -> Result<Vec<Party>, StoreError>;

    async fn create_party(&self, name: &str) -> Result<Party, StoreError>;

    /// Fails with `NotFound` if `id` is absent.
    async fn update_party(&self, id: PartyId, name: &str) -> Result<Party, StoreError>;

    /// Deletes the party and every transaction that references it as one
    /// atomic step. Fails with `NotFound` if `id` is absent.
    async fn delete_party(&self, id: PartyId) -> Result<(), StoreError>;

    async fn list_transactions(&self) -> Result<Vec<Transaction>, StoreError>;

    async fn create_transaction(&self, new: NewTransaction) -> Result<Transaction, StoreError>;

    async fn update_transaction(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, StoreError>;

    async fn delete_transaction(&self, id: TransactionId) -> Result<(), StoreError>;
}
