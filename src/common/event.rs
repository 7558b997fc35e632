use crate::domain::{
    party::PartyId,
    transaction::{NewTransaction, TransactionId, TransactionPatch},
};

/// A ledger mutation, sent from the command line to the processor.
#[derive(Debug, Clone)]
pub enum LedgerCommand {
    AddParty { name: String },
    RenameParty { party: PartyId, name: String },
    RemoveParty { party: PartyId },
    AddTransaction(NewTransaction),
    UpdateTransaction { tx: TransactionId, patch: TransactionPatch },
    DeleteTransaction { tx: TransactionId },
}
