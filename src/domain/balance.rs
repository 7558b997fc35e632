use std::collections::HashMap;

use crate::{
    common::money::Money,
    domain::{party::PartyId, transaction::Transaction},
};

/// Maps every known party to its net balance.
///
/// Each party in `party_ids` starts at zero. Each transaction then adds its
/// signed amount to the entry for its `party_id`; a transaction pointing at an
/// unknown party gets an entry of its own instead of being dropped.
///
/// Money is fixed point, so the result is exact and independent of the order
/// of `transactions`.
pub fn consolidate<'a>(
    party_ids: impl IntoIterator<Item = &'a PartyId>,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> HashMap<PartyId, Money> {
    let mut balances: HashMap<PartyId, Money> = party_ids
        .into_iter()
        .map(|id| (*id, Money::zero()))
        .collect();

    for tx in transactions {
        *balances.entry(tx.party_id).or_default() += tx.signed_amount();
    }
    balances
}

/// Summary across parties: what others owe the user, what the user owes, and
/// the difference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub owed: Money,
    pub owe: Money,
    pub net: Money,
}

impl Totals {
    pub fn from_balances<'a>(
        party_ids: impl IntoIterator<Item = &'a PartyId>,
        balances: &HashMap<PartyId, Money>,
    ) -> Self {
        let mut totals = Totals::default();
        for id in party_ids {
            let balance = balances.get(id).copied().unwrap_or_default();
            if balance.is_positive() {
                totals.owed += balance;
            } else {
                totals.owe += balance.abs();
            }
        }
        totals.net = totals.owed - totals.owe;
        totals
    }
}
