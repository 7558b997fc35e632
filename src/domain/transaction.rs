use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::LedgerError;
use crate::common::money::Money;
use crate::domain::party::PartyId;

/// Store-assigned identifier of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Direction of a transaction. The amount itself is always a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    /// The party owes the user.
    Owed,
    /// The user owes the party.
    Owe,
}

impl TxKind {
    /// Contribution of `amount` to the party's balance.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            TxKind::Owed => amount,
            TxKind::Owe => -amount,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TxKind::Owed => "owed",
            TxKind::Owe => "owe",
        })
    }
}

impl FromStr for TxKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owed" | "given" => Ok(TxKind::Owed),
            "owe" | "taken" => Ok(TxKind::Owe),
            other => Err(format!("unknown transaction kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub party_id: PartyId,
    pub date: NaiveDate,
    pub amount: Money,
    pub kind: TxKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    pub fn from_new(id: TransactionId, new: NewTransaction) -> Self {
        Self {
            id,
            party_id: new.party_id,
            date: new.date,
            amount: new.amount,
            kind: new.kind,
            description: new.description,
        }
    }

    pub fn signed_amount(&self) -> Money {
        self.kind.signed(self.amount)
    }

    pub fn apply(&mut self, patch: &TransactionPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(description) = &patch.description {
            self.description = clean_description(Some(description.clone()));
        }
    }
}

/// Fields of a transaction before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub party_id: PartyId,
    pub date: NaiveDate,
    pub amount: Money,
    pub kind: TxKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTransaction {
    pub fn new(party_id: PartyId, date: NaiveDate, amount: Money, kind: TxKind) -> Self {
        Self {
            party_id,
            date,
            amount,
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = clean_description(Some(description.into()));
        self
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)
    }
}

/// Partial update of a transaction. `id` and `party_id` cannot be patched.
/// An empty `description` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TxKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
            && self.description.is_none()
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        match self.amount {
            Some(amount) => validate_amount(amount),
            None => Ok(()),
        }
    }
}

fn validate_amount(amount: Money) -> Result<(), LedgerError> {
    if !amount.is_positive() {
        return Err(LedgerError::validation(
            "amount",
            format!("must be greater than zero, got {amount}"),
        ));
    }
    Ok(())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample(kind: TxKind, amount: i64) -> Transaction {
        let new = NewTransaction::new(PartyId::new(), day("2024-01-01"), Money::from_units(amount), kind);
        Transaction::from_new(TransactionId::new(), new)
    }

    #[test]
    fn kind_sets_the_sign() {
        assert_eq!(sample(TxKind::Owed, 50).signed_amount(), Money::from_units(50));
        assert_eq!(sample(TxKind::Owe, 50).signed_amount(), Money::from_units(-50));
    }

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("OWED".parse::<TxKind>().unwrap(), TxKind::Owed);
        assert_eq!("taken".parse::<TxKind>().unwrap(), TxKind::Owe);
        assert!("refund".parse::<TxKind>().is_err());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let new = NewTransaction::new(PartyId::new(), day("2024-01-01"), Money::zero(), TxKind::Owed);
        assert!(matches!(
            new.validate(),
            Err(LedgerError::Validation { field: "amount", .. })
        ));

        let patch = TransactionPatch {
            amount: Some(Money::from_units(-1)),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        assert!(TransactionPatch::default().validate().is_ok());
    }

    #[test]
    fn apply_patch_keeps_unset_fields() {
        let mut tx = sample(TxKind::Owed, 100);
        tx.description = Some("lunch".into());
        let before = tx.clone();

        tx.apply(&TransactionPatch {
            amount: Some(Money::from_units(200)),
            ..Default::default()
        });

        assert_eq!(tx.amount, Money::from_units(200));
        assert_eq!(tx.kind, before.kind);
        assert_eq!(tx.date, before.date);
        assert_eq!(tx.description.as_deref(), Some("lunch"));
    }

    #[test]
    fn empty_description_patch_clears_it() {
        let mut tx = sample(TxKind::Owe, 10);
        tx.description = Some("taxi".into());
        tx.apply(&TransactionPatch {
            description: Some("  ".into()),
            ..Default::default()
        });
        assert_eq!(tx.description, None);
    }

    #[test]
    fn wire_format_uses_camel_case_and_lowercase_kind() {
        let tx = sample(TxKind::Owe, 40);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["partyId"], serde_json::json!(tx.party_id.to_string()));
        assert_eq!(json["kind"], "owe");
        assert_eq!(json["amount"], 40);
        assert_eq!(json["date"], "2024-01-01");
        assert!(json.get("description").is_none());

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }
}
