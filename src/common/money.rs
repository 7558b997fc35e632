use bigdecimal::{BigDecimal, ParseBigDecimalError, ToPrimitive};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

const SCALE: i64 = 10_000;
const DECIMALS: u32 = 4;
const THOUSAND: i64 = 1_000;
const LAKH: i64 = 100_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
/// A monetary value stored as a signed count of 1/10000 units.
///
/// Amounts and balances are both `Money`. Balances are plain integer sums, so
/// consolidating a party's transactions is exact and does not depend on the
/// order the transactions are visited in.
///
/// # Examples
/// ```
/// use debt_ledger::common::money::Money;
///
/// let amount: Money = "12.5".parse().unwrap();
/// assert_eq!(amount.as_i64(), 125_000);
/// assert_eq!(amount.to_string(), "12.50");
/// ```
pub struct Money(i64);

impl Money {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Whole currency units, e.g. `Money::from_units(100)` is 100.00.
    pub fn from_units(units: i64) -> Self {
        Money(units * SCALE)
    }

    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * SCALE as f64).round();
        if scaled.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Money(scaled as i64))
    }

    pub fn zero() -> Self {
        Money(0)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn abs(&self) -> Money {
        Money(self.0.saturating_abs())
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    pub fn to_string_4dp(&self) -> String {
        format_fixed(self.0, DECIMALS)
    }

    pub fn to_string_2dp(&self) -> String {
        format_fixed(div_round(self.0, SCALE / 100), 2)
    }
}

/// Formats an amount in Indian short notation: lakhs (`L`) from 1,00,000 and
/// thousands (`K`) from 1,000, rounded to two decimals with trailing zeros
/// dropped. Smaller values are printed as they are.
///
/// ```
/// use debt_ledger::common::money::{format_currency_short, Money};
///
/// assert_eq!(format_currency_short(Money::from_units(150_000)), "1.5 L");
/// assert_eq!(format_currency_short(Money::from_units(2_500)), "2.5 K");
/// assert_eq!(format_currency_short(Money::from_units(500)), "500");
/// ```
pub fn format_currency_short(amount: Money) -> String {
    let raw = amount.as_i64();
    let magnitude = raw.unsigned_abs();

    if magnitude >= (LAKH * SCALE) as u64 {
        let hundredths = div_round(raw, LAKH * SCALE / 100);
        format!("{} L", trim_zeros(format_fixed(hundredths, 2)))
    } else if magnitude >= (THOUSAND * SCALE) as u64 {
        let hundredths = div_round(raw, THOUSAND * SCALE / 100);
        format!("{} K", trim_zeros(format_fixed(hundredths, 2)))
    } else {
        trim_zeros(format_fixed(raw, DECIMALS))
    }
}

// Integer division rounding half away from zero.
fn div_round(value: i64, divisor: i64) -> i64 {
    let value = value as i128;
    let divisor = divisor as i128;
    let half = divisor / 2;
    let rounded = if value >= 0 {
        (value + half) / divisor
    } else {
        (value - half) / divisor
    };
    rounded as i64
}

fn format_fixed(value: i64, decimals: u32) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    if decimals == 0 {
        return format!("{sign}{magnitude}");
    }
    let unit = 10u64.pow(decimals);
    format!(
        "{sign}{}.{:0width$}",
        magnitude / unit,
        magnitude % unit,
        width = decimals as usize
    )
}

fn trim_zeros(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl std::str::FromStr for Money {
    type Err = ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.is_empty() {
            return Err(ParseBigDecimalError::Other("empty amount".into()));
        }

        let bd: BigDecimal = t.parse()?;

        // Scale to 4 decimal places
        let scaled = (bd * BigDecimal::from(SCALE)).round(0);
        let value: i64 = scaled
            .to_i64()
            .ok_or_else(|| ParseBigDecimalError::Other("amount overflow".into()))?;

        Ok(Money(value))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_2dp())
    }
}

/// Whole amounts are written as integers and fractional ones as floats. An
/// amount the float would not carry back exactly is written as a decimal
/// string instead, which `Deserialize` accepts as well.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % SCALE == 0 {
            serializer.serialize_i64(self.0 / SCALE)
        } else if Money::from_f64(self.to_f64()) == Some(*self) {
            serializer.serialize_f64(self.to_f64())
        } else {
            serializer.serialize_str(&trim_zeros(self.to_string_4dp()))
        }
    }
}

/// Accepts a JSON number or a string holding one.
struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a numeric amount or a string containing one")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(SCALE)
            .map(Money)
            .ok_or_else(|| E::custom("amount overflow"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        let v = i64::try_from(v).map_err(|_| E::custom("amount overflow"))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_f64(v).ok_or_else(|| E::custom(format!("amount {v} is not representable")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(|e| E::custom(format!("amount {v:?}: {e}")))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

// Operators saturate at the i64 bounds. Ledgers only admit transactions whose
// combined volume fits (see `Ledger::volume_with`), so balances never reach them.
impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn test_from_str_valid() {
        assert_eq!(money("1"), Money(10000));
        assert_eq!(money("1.5"), Money(15000));
        assert_eq!(money("0.01"), Money(100));
        assert_eq!(money("  2.0000 "), Money(20000));
        assert_eq!(money("-3.25"), Money(-32500));
    }

    #[test]
    fn test_from_str_rounding() {
        assert_eq!(money("1.99999"), Money(20000));
        assert_eq!(money("0.00001"), Money(0));
    }

    #[test]
    fn test_from_str_invalid() {
        assert!(Money::from_str("").is_err());
        assert!(Money::from_str("   ").is_err());
        assert!(Money::from_str("abc").is_err());
    }

    #[test]
    fn test_display_is_two_decimals() {
        assert_eq!(Money::from_units(100).to_string(), "100.00");
        assert_eq!(money("0.005").to_string(), "0.01");
        assert_eq!(money("-12.344").to_string(), "-12.34");
        assert_eq!(money("1.2345").to_string_4dp(), "1.2345");
    }

    #[test]
    fn test_arithmetic() {
        let mut m = money("10.10");
        m += money("0.20");
        assert_eq!(m, money("10.30"));
        m -= money("10.30");
        assert!(m.is_zero());
        assert_eq!(-money("5"), money("-5"));
        assert_eq!(money("-5").abs(), money("5"));
    }

    #[test]
    fn test_decimal_sums_are_exact() {
        // 0.1 + 0.2 would drift as f64; fixed point must not.
        let total: Money = ["0.1", "0.2", "-0.3"].iter().map(|s| money(s)).sum();
        assert_eq!(total, Money::zero());
    }

    #[test]
    fn short_format_matches_reference_values() {
        assert_eq!(format_currency_short(Money::from_units(150_000)), "1.5 L");
        assert_eq!(format_currency_short(Money::from_units(2_500)), "2.5 K");
        assert_eq!(format_currency_short(Money::from_units(500)), "500");
    }

    #[test]
    fn short_format_edges() {
        assert_eq!(format_currency_short(Money::from_units(100_000)), "1 L");
        assert_eq!(format_currency_short(Money::from_units(1_000)), "1 K");
        assert_eq!(format_currency_short(Money::from_units(999)), "999");
        assert_eq!(format_currency_short(money("12.5")), "12.5");
        assert_eq!(format_currency_short(Money::from_units(-2_500)), "-2.5 K");
        assert_eq!(format_currency_short(Money::from_units(123_456)), "1.23 L");
        assert_eq!(format_currency_short(Money::from_units(1_235)), "1.24 K");
        assert_eq!(format_currency_short(Money::zero()), "0");
    }

    #[test]
    fn deserializes_numbers_and_numeric_strings() {
        let m: Money = serde_json::from_str("100").unwrap();
        assert_eq!(m, Money::from_units(100));
        let m: Money = serde_json::from_str("12.75").unwrap();
        assert_eq!(m, money("12.75"));
        let m: Money = serde_json::from_str("\"40.5\"").unwrap();
        assert_eq!(m, money("40.5"));
        assert!(serde_json::from_str::<Money>("\"forty\"").is_err());
    }

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&Money::from_units(50)).unwrap(), "50");
        assert_eq!(serde_json::to_string(&money("0.25")).unwrap(), "0.25");
    }

    #[test]
    fn large_fractional_amounts_survive_json() {
        let amount = money("987654321012.3457");
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"987654321012.3457\"");

        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let big = Money::new(i64::MAX - 1);
        assert_eq!(big.checked_add(Money::new(1)), Some(Money::new(i64::MAX)));
        assert_eq!(big.checked_add(Money::new(2)), None);
        assert_eq!(Money::new(i64::MIN).checked_sub(Money::new(1)), None);
        assert_eq!(big + Money::new(5), Money::new(i64::MAX));
        assert_eq!(-Money::new(i64::MIN), Money::new(i64::MAX));
    }
}
