use crate::{
    common::{error::LedgerError, event::LedgerCommand},
    domain::{
        party::{Party, PartyId},
        transaction::{Transaction, TransactionId},
    },
    worker::cache::LedgerCache,
};

/// What a processed command left in the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Party(Party),
    PartyRemoved(PartyId),
    Transaction(Transaction),
    TransactionDeleted(TransactionId),
}

#[derive(Debug, Default)]
pub struct Processor {
    applied: usize,
}
impl Processor {
    pub fn new() -> Self {
        Self { applied: 0 }
    }

    /// Number of commands that completed successfully.
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub async fn process(
        &mut self,
        cache: &LedgerCache,
        command: LedgerCommand,
    ) -> Result<Outcome, LedgerError> {
        let outcome = match command {
            LedgerCommand::AddParty { name } => Outcome::Party(cache.add_party(&name).await?),
            LedgerCommand::RenameParty { party, name } => {
                Outcome::Party(cache.rename_party(party, &name).await?)
            }
            LedgerCommand::RemoveParty { party } => {
                cache.remove_party(party).await?;
                Outcome::PartyRemoved(party)
            }
            LedgerCommand::AddTransaction(new) => {
                Outcome::Transaction(cache.add_transaction(new).await?)
            }
            LedgerCommand::UpdateTransaction { tx, patch } => {
                Outcome::Transaction(cache.update_transaction(tx, patch).await?)
            }
            LedgerCommand::DeleteTransaction { tx } => {
                cache.delete_transaction(tx).await?;
                Outcome::TransactionDeleted(tx)
            }
        };
        self.applied += 1;
        Ok(outcome)
    }
}
