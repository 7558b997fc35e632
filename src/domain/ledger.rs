use std::collections::HashMap;

use crate::{
    common::money::Money,
    domain::{
        balance::{self, Totals},
        party::{Party, PartyId},
        transaction::{Transaction, TransactionId},
    },
};

/// Parties and transactions in the order the store returned or created them.
///
/// Used both as the cache's mirror and as the in-memory store's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    parties: Vec<Party>,
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            parties: Vec::new(),
            transactions: Vec::new(),
        }
    }

    pub fn from_parts(parties: Vec<Party>, transactions: Vec<Transaction>) -> Self {
        Self {
            parties,
            transactions,
        }
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn party(&self, id: PartyId) -> Option<&Party> {
        self.parties.iter().find(|p| p.id == id)
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn insert_party(&mut self, party: Party) {
        self.parties.push(party);
    }

    /// Replaces the party with the same id. Returns false if it is not present.
    pub fn replace_party(&mut self, party: Party) -> bool {
        match self.parties.iter_mut().find(|p| p.id == party.id) {
            Some(slot) => {
                *slot = party;
                true
            }
            None => false,
        }
    }

    /// Removes a party together with every transaction that references it.
    pub fn remove_party(&mut self, id: PartyId) -> Option<(Party, Vec<Transaction>)> {
        let pos = self.parties.iter().position(|p| p.id == id)?;
        let party = self.parties.remove(pos);
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.transactions)
            .into_iter()
            .partition(|t| t.party_id == id);
        self.transactions = kept;
        Some((party, removed))
    }

    pub fn insert_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    pub fn replace_transaction(&mut self, tx: Transaction) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == tx.id) {
            Some(slot) => {
                *slot = tx;
                true
            }
            None => false,
        }
    }

    pub fn remove_transaction(&mut self, id: TransactionId) -> Option<Transaction> {
        let pos = self.transactions.iter().position(|t| t.id == id)?;
        Some(self.transactions.remove(pos))
    }

    /// Sum of every transaction amount with `amount` added and the transaction
    /// `replacing` left out, or `None` if it does not fit in `Money`.
    ///
    /// Every balance and total is bounded by this volume, so a ledger whose
    /// volume fits can be consolidated without overflow.
    pub fn volume_with(&self, replacing: Option<TransactionId>, amount: Money) -> Option<Money> {
        self.transactions
            .iter()
            .filter(|t| Some(t.id) != replacing)
            .try_fold(amount.abs(), |acc, t| acc.checked_add(t.amount.abs()))
    }

    pub fn volume(&self) -> Option<Money> {
        self.volume_with(None, Money::zero())
    }

    pub fn consolidated(&self) -> HashMap<PartyId, Money> {
        balance::consolidate(self.parties.iter().map(|p| &p.id), &self.transactions)
    }

    /// Net balance of one party; zero when it has no transactions.
    pub fn balance(&self, id: PartyId) -> Money {
        self.transactions
            .iter()
            .filter(|t| t.party_id == id)
            .map(Transaction::signed_amount)
            .sum()
    }

    pub fn totals(&self) -> Totals {
        let balances = self.consolidated();
        Totals::from_balances(self.parties.iter().map(|p| &p.id), &balances)
    }

    /// A party's transactions, newest date first.
    pub fn statement(&self, id: PartyId) -> Vec<Transaction> {
        let mut txs: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.party_id == id)
            .cloned()
            .collect();
        txs.sort_by(|a, b| b.date.cmp(&a.date));
        txs
    }
}
