use tracing::info;

use crate::{
    common::{error::LedgerError, money::Money},
    domain::{
        ledger::Ledger,
        transaction::{NewTransaction, Transaction, TransactionId, TransactionPatch},
    },
    worker::cache::{LedgerCache, rejected},
};

impl LedgerCache {
    pub async fn add_transaction(&self, new: NewTransaction) -> Result<Transaction, LedgerError> {
        self.try_add_transaction(new)
            .await
            .inspect_err(rejected("add_transaction"))
    }

    pub async fn update_transaction(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, LedgerError> {
        self.try_update_transaction(id, patch)
            .await
            .inspect_err(rejected("update_transaction"))
    }

    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), LedgerError> {
        self.try_delete_transaction(id)
            .await
            .inspect_err(rejected("delete_transaction"))
    }

    async fn try_add_transaction(&self, new: NewTransaction) -> Result<Transaction, LedgerError> {
        new.validate()?;
        // the party must be in the mirror at creation time
        self.inspect(|ledger| match ledger.party(new.party_id) {
            Some(_) => fits(ledger, None, new.amount),
            None => Err(LedgerError::not_found("party", new.party_id)),
        })
        .await?;

        let tx = self.store.create_transaction(new).await?;
        self.merge(|ledger| ledger.insert_transaction(tx.clone()))
            .await;
        info!(tx = %tx.id, party = %tx.party_id, amount = %tx.amount, kind = %tx.kind, "transaction added");
        Ok(tx)
    }

    async fn try_update_transaction(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, LedgerError> {
        patch.validate()?;
        self.inspect(|ledger| match (ledger.transaction(id), patch.amount) {
            (Some(_), Some(amount)) => fits(ledger, Some(id), amount),
            (Some(_), None) => Ok(()),
            (None, _) => Err(LedgerError::not_found("transaction", id)),
        })
        .await?;

        let tx = self.store.update_transaction(id, patch).await?;
        self.merge(|ledger| ledger.replace_transaction(tx.clone()))
            .await;
        info!(tx = %id, amount = %tx.amount, kind = %tx.kind, "transaction updated");
        Ok(tx)
    }

    async fn try_delete_transaction(&self, id: TransactionId) -> Result<(), LedgerError> {
        self.inspect(|ledger| match ledger.transaction(id) {
            Some(_) => Ok(()),
            None => Err(LedgerError::not_found("transaction", id)),
        })
        .await?;

        self.store.delete_transaction(id).await?;
        self.merge(|ledger| ledger.remove_transaction(id)).await;
        info!(tx = %id, "transaction deleted");
        Ok(())
    }
}

fn fits(
    ledger: &Ledger,
    replacing: Option<TransactionId>,
    amount: Money,
) -> Result<(), LedgerError> {
    match ledger.volume_with(replacing, amount) {
        Some(_) => Ok(()),
        None => Err(LedgerError::validation(
            "amount",
            format!("{amount} would overflow the ledger total"),
        )),
    }
}
