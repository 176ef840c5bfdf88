//! Currency-tagged fixed-point money.
//!
//! A [`Money`] value is a whole number of major units plus a fractional
//! part expressed in nanos (10^-9 of a unit). Arithmetic is performed on
//! the combined nano count in 128-bit integers, so carries between nanos
//! and units are exact and overflow is detected instead of wrapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of nanos in one major unit.
pub const NANOS_PER_UNIT: i32 = 1_000_000_000;

const NANOS_MOD: i128 = NANOS_PER_UNIT as i128;

/// Errors produced by money construction and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Operands carry different currency codes.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// The result does not fit in the units range.
    #[error("money overflow while computing {operation}")]
    Overflow { operation: &'static str },

    /// Nanos out of range or with a sign opposite to units.
    #[error("invalid money value: units={units}, nanos={nanos}")]
    InvalidValue { units: i64, nanos: i32 },

    /// Currency code is not three ASCII letters.
    #[error("invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),
}

/// Returns true if `code` looks like an ISO 4217 code (three ASCII letters).
pub fn is_valid_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic())
}

/// A currency-tagged amount of money.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMoney", into = "RawMoney")]
pub struct Money {
    currency_code: String,
    units: i64,
    nanos: i32,
}

#[derive(Serialize, Deserialize)]
struct RawMoney {
    currency_code: String,
    #[serde(default)]
    units: i64,
    #[serde(default)]
    nanos: i32,
}

impl TryFrom<RawMoney> for Money {
    type Error = MoneyError;

    fn try_from(raw: RawMoney) -> Result<Self, Self::Error> {
        Money::new(raw.currency_code, raw.units, raw.nanos)
    }
}

impl From<Money> for RawMoney {
    fn from(money: Money) -> Self {
        RawMoney {
            currency_code: money.currency_code,
            units: money.units,
            nanos: money.nanos,
        }
    }
}

impl Money {
    /// Creates a validated money value.
    ///
    /// `nanos` must lie in `-999_999_999..=999_999_999` and must not have
    /// a sign opposite to a nonzero `units`.
    pub fn new(currency_code: impl Into<String>, units: i64, nanos: i32) -> Result<Self, MoneyError> {
        let currency_code = currency_code.into();
        if !is_valid_currency_code(&currency_code) {
            return Err(MoneyError::InvalidCurrencyCode(currency_code));
        }
        let in_range = nanos.unsigned_abs() < NANOS_PER_UNIT as u32;
        let sign_ok = (units >= 0 && nanos >= 0) || (units <= 0 && nanos <= 0);
        if !in_range || !sign_ok {
            return Err(MoneyError::InvalidValue { units, nanos });
        }
        Ok(Self {
            currency_code,
            units,
            nanos,
        })
    }

    /// Returns a zero amount in the given currency.
    pub fn zero(currency_code: impl Into<String>) -> Result<Self, MoneyError> {
        Self::new(currency_code, 0, 0)
    }

    /// Creates an amount from minor units with two decimal places (cents).
    pub fn from_cents(currency_code: impl Into<String>, cents: i64) -> Result<Self, MoneyError> {
        let units = cents / 100;
        let nanos = (cents % 100) as i32 * 10_000_000;
        Self::new(currency_code, units, nanos)
    }

    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    pub fn units(&self) -> i64 {
        self.units
    }

    pub fn nanos(&self) -> i32 {
        self.nanos
    }

    /// Returns the same amount re-tagged with another currency.
    ///
    /// Only meant for conversion backends that compute the amount themselves.
    pub fn with_currency(&self, currency_code: impl Into<String>) -> Result<Self, MoneyError> {
        Self::new(currency_code, self.units, self.nanos)
    }

    /// Adds two amounts of the same currency.
    pub fn sum(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency_code != other.currency_code {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency_code.clone(),
                right: other.currency_code.clone(),
            });
        }
        let total = self
            .total_nanos()
            .checked_add(other.total_nanos())
            .ok_or(MoneyError::Overflow { operation: "sum" })?;
        Self::from_total_nanos(&self.currency_code, total, "sum")
    }

    /// Scales the amount by a non-negative quantity.
    ///
    /// Equivalent to adding the amount to itself `quantity` times.
    pub fn multiply(&self, quantity: u32) -> Result<Money, MoneyError> {
        let total = self
            .total_nanos()
            .checked_mul(i128::from(quantity))
            .ok_or(MoneyError::Overflow {
                operation: "multiply",
            })?;
        Self::from_total_nanos(&self.currency_code, total, "multiply")
    }

    fn total_nanos(&self) -> i128 {
        i128::from(self.units) * NANOS_MOD + i128::from(self.nanos)
    }

    fn from_total_nanos(
        currency_code: &str,
        total: i128,
        operation: &'static str,
    ) -> Result<Money, MoneyError> {
        // Truncating division gives the remainder the dividend's sign.
        let units = i64::try_from(total / NANOS_MOD).map_err(|_| MoneyError::Overflow { operation })?;
        let nanos = (total % NANOS_MOD) as i32;
        Ok(Money {
            currency_code: currency_code.to_string(),
            units,
            nanos,
        })
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.units < 0 || self.nanos < 0 { "-" } else { "" };
        let fraction = format!("{:09}", self.nanos.unsigned_abs());
        let trimmed = fraction.trim_end_matches('0');
        let fraction = if trimmed.len() < 2 { &fraction[..2] } else { trimmed };
        write!(
            f,
            "{sign}{}.{fraction} {}",
            self.units.unsigned_abs(),
            self.currency_code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn usd(units: i64, nanos: i32) -> Money {
        Money::new("USD", units, nanos).unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_range_nanos() {
        assert!(matches!(
            Money::new("USD", 1, NANOS_PER_UNIT),
            Err(MoneyError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_new_rejects_mismatched_signs() {
        assert!(Money::new("USD", 1, -5).is_err());
        assert!(Money::new("USD", -1, 5).is_err());
        assert!(Money::new("USD", 0, -5).is_ok());
    }

    #[test]
    fn test_new_rejects_bad_currency_code() {
        assert!(matches!(
            Money::new("US", 1, 0),
            Err(MoneyError::InvalidCurrencyCode(_))
        ));
    }

    #[test]
    fn test_from_cents() {
        let m = Money::from_cents("USD", 1234).unwrap();
        assert_eq!(m.units(), 12);
        assert_eq!(m.nanos(), 340_000_000);

        let negative = Money::from_cents("USD", -1234).unwrap();
        assert_eq!(negative.units(), -12);
        assert_eq!(negative.nanos(), -340_000_000);
    }

    #[test]
    fn test_sum_carries_nanos_into_units() {
        let total = usd(1, 600_000_000).sum(&usd(2, 500_000_000)).unwrap();
        assert_eq!(total, usd(4, 100_000_000));
    }

    #[test]
    fn test_sum_borrows_across_signs() {
        let total = usd(5, 0).sum(&usd(-1, -250_000_000)).unwrap();
        assert_eq!(total, usd(3, 750_000_000));

        let total = usd(1, 0).sum(&usd(-3, -500_000_000)).unwrap();
        assert_eq!(total, usd(-2, -500_000_000));
    }

    #[test]
    fn test_sum_currency_mismatch() {
        let eur = Money::new("EUR", 1, 0).unwrap();
        assert_eq!(
            usd(1, 0).sum(&eur),
            Err(MoneyError::CurrencyMismatch {
                left: "USD".to_string(),
                right: "EUR".to_string(),
            })
        );
    }

    #[test]
    fn test_sum_overflow_is_reported() {
        let result = usd(i64::MAX, 0).sum(&usd(1, 0));
        assert!(matches!(result, Err(MoneyError::Overflow { .. })));
    }

    #[test]
    fn test_multiply() {
        assert_eq!(usd(10, 0).multiply(2).unwrap(), usd(20, 0));
        assert_eq!(usd(0, 999_999_999).multiply(3).unwrap(), usd(2, 999_999_997));
        assert_eq!(usd(7, 50).multiply(0).unwrap(), usd(0, 0));
    }

    #[test]
    fn test_multiply_large_quantity_overflows_cleanly() {
        let result = usd(i64::MAX / 2, 0).multiply(3);
        assert!(matches!(result, Err(MoneyError::Overflow { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(usd(12, 340_000_000).to_string(), "12.34 USD");
        assert_eq!(usd(5, 0).to_string(), "5.00 USD");
        assert_eq!(usd(0, 1).to_string(), "0.000000001 USD");
        assert_eq!(usd(-3, -500_000_000).to_string(), "-3.50 USD");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Money =
            serde_json::from_str(r#"{"currency_code":"USD","units":3,"nanos":5}"#).unwrap();
        assert_eq!(ok, usd(3, 5));

        let bad = serde_json::from_str::<Money>(r#"{"currency_code":"USD","units":3,"nanos":-5}"#);
        assert!(bad.is_err());
    }

    fn money_strategy() -> impl Strategy<Value = Money> {
        (
            -1_000_000_000_000i64..1_000_000_000_000i64,
            0i32..NANOS_PER_UNIT,
        )
            .prop_map(|(units, nanos)| {
                let nanos = if units < 0 { -nanos } else { nanos };
                Money::new("USD", units, nanos).unwrap()
            })
    }

    proptest! {
        #[test]
        fn sum_is_commutative_and_normalized(a in money_strategy(), b in money_strategy()) {
            let ab = a.sum(&b).unwrap();
            let ba = b.sum(&a).unwrap();
            prop_assert_eq!(&ab, &ba);
            prop_assert!(ab.nanos().abs() < NANOS_PER_UNIT);
            prop_assert!(ab.units() == 0 || ab.nanos() == 0 || (ab.units() > 0) == (ab.nanos() > 0));
        }

        #[test]
        fn multiply_matches_repeated_addition(a in money_strategy(), q in 0u32..50) {
            let mut expected = Money::zero("USD").unwrap();
            for _ in 0..q {
                expected = expected.sum(&a).unwrap();
            }
            prop_assert_eq!(a.multiply(q).unwrap(), expected);
        }
    }
}
