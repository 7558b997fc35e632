use std::{collections::HashMap, io::Write};

use crate::{
    common::money::{Money, format_currency_short},
    domain::party::{Party, PartyId},
};

#[derive(serde::Serialize)]
/// Internal CSV output row representation.
///
/// Headers written (in this order): `party,name,balance,short`.
struct OutputRow<'a> {
    party: String,
    name: &'a str,
    balance: String,
    short: String,
}

/// Writes one row per party with its consolidated balance.
///
/// Rows are sorted by name, then by id, so the report is stable. A party
/// missing from `balances` is reported as zero.
///
/// # Errors
///
/// Returns a `csv::Error` if writing/serializing any row fails.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use debt_ledger::common::money::Money;
/// use debt_ledger::domain::party::{Party, PartyId};
/// use debt_ledger::io::writer::write_balances;
///
/// let bob = Party::new(PartyId::new(), "Bob");
/// let mut balances = HashMap::new();
/// balances.insert(bob.id, Money::from_units(2_500));
///
/// let mut out = Vec::new();
/// write_balances(&mut out, &[bob.clone()], &balances).unwrap();
///
/// let s = String::from_utf8(out).unwrap();
/// assert!(s.starts_with("party,name,balance,short\n"));
/// assert!(s.contains(&format!("{},Bob,2500.00,2.5 K", bob.id)));
/// ```
pub fn write_balances<W: Write>(
    writer: W,
    parties: &[Party],
    balances: &HashMap<PartyId, Money>,
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    let mut sorted: Vec<&Party> = parties.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    for party in sorted {
        let balance = balances.get(&party.id).copied().unwrap_or_default();
        wtr.serialize(OutputRow {
            party: party.id.to_string(),
            name: &party.name,
            balance: balance.to_string(),
            short: format_currency_short(balance),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // Helper: writes balances to a Vec<u8> and returns UTF-8 string.
    fn write_to_string(parties: &[Party], balances: &HashMap<PartyId, Money>) -> String {
        let mut out = Vec::new();
        write_balances(&mut out, parties, balances).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn writes_header_and_rows_sorted_by_name() {
        let zoe = Party::new(PartyId::new(), "Zoe");
        let amir = Party::new(PartyId::new(), "Amir");
        let mut balances = HashMap::new();
        balances.insert(zoe.id, Money::from_str("-150000").unwrap());
        balances.insert(amir.id, Money::from_str("12.5").unwrap());

        let s = write_to_string(&[zoe.clone(), amir.clone()], &balances);
        let lines: Vec<&str> = s.lines().collect();

        assert_eq!(lines.len(), 3, "expected header + 2 rows");
        assert_eq!(lines[0], "party,name,balance,short");
        assert_eq!(lines[1], format!("{},Amir,12.50,12.5", amir.id));
        assert_eq!(lines[2], format!("{},Zoe,-150000.00,-1.5 L", zoe.id));
    }

    #[test]
    fn party_without_balance_reports_zero() {
        let solo = Party::new(PartyId::new(), "Solo");
        let s = write_to_string(&[solo.clone()], &HashMap::new());
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[1], format!("{},Solo,0.00,0", solo.id));
    }
}
