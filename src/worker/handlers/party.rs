use tracing::info;

use crate::{
    common::error::LedgerError,
    domain::party::{Party, PartyId, normalize_name},
    worker::cache::{LedgerCache, rejected},
};

impl LedgerCache {
    pub async fn add_party(&self, name: &str) -> Result<Party, LedgerError> {
        self.try_add_party(name)
            .await
            .inspect_err(rejected("add_party"))
    }

    pub async fn rename_party(&self, id: PartyId, name: &str) -> Result<Party, LedgerError> {
        self.try_rename_party(id, name)
            .await
            .inspect_err(rejected("rename_party"))
    }

    /// Removes a party and its transactions. Refused while the party's
    /// balance is not exactly zero; no store call is made in that case.
    pub async fn remove_party(&self, id: PartyId) -> Result<(), LedgerError> {
        self.try_remove_party(id)
            .await
            .inspect_err(rejected("remove_party"))
    }

    async fn try_add_party(&self, name: &str) -> Result<Party, LedgerError> {
        let name = normalize_name(name)?;
        self.inspect(|_| Ok(())).await?;

        let party = self.store.create_party(&name).await?;
        self.merge(|ledger| ledger.insert_party(party.clone()))
            .await;
        info!(party = %party.id, name = %party.name, "party added");
        Ok(party)
    }

    async fn try_rename_party(&self, id: PartyId, name: &str) -> Result<Party, LedgerError> {
        let name = normalize_name(name)?;
        self.inspect(|ledger| match ledger.party(id) {
            Some(_) => Ok(()),
            None => Err(LedgerError::not_found("party", id)),
        })
        .await?;

        let party = self.store.update_party(id, &name).await?;
        self.merge(|ledger| ledger.replace_party(party.clone()))
            .await;
        info!(party = %id, name = %party.name, "party renamed");
        Ok(party)
    }

    async fn try_remove_party(&self, id: PartyId) -> Result<(), LedgerError> {
        self.inspect(|ledger| {
            if ledger.party(id).is_none() {
                return Err(LedgerError::not_found("party", id));
            }
            let balance = ledger.balance(id);
            if !balance.is_zero() {
                return Err(LedgerError::BalanceNotZero { party: id, balance });
            }
            Ok(())
        })
        .await?;

        self.store.delete_party(id).await?;
        let removed = self.merge(|ledger| ledger.remove_party(id)).await;
        let dropped = removed.map(|(_, txs)| txs.len()).unwrap_or_default();
        info!(party = %id, transactions = dropped, "party removed");
        Ok(())
    }
}
