//! Exact monetary amounts.
//!
//! Amounts use a decimal representation so that summing many transactions
//! never drifts by a cent. They are stored in the database as integer cents.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

use crate::ValidationError;

/// The number of digits after the decimal point that an amount may have.
pub const AMOUNT_SCALE: u32 = 2;

/// The largest amount a single transaction may have: 99,999,999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, AMOUNT_SCALE);

/// A positive amount of money with at most cent precision.
///
/// Refunds and reversals are not modelled, so an amount is always in the
/// range `(0, 99_999_999.99]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] for the field "amount" if `value` is not
    /// greater than zero, exceeds [MAX_AMOUNT], or has more than two
    /// fractional digits. Extra precision is rejected rather than rounded.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        let value = value.normalize();

        if value <= Decimal::ZERO {
            return Err(ValidationError::new(
                "amount",
                format!("amount must be greater than 0, got {value}"),
            )
            .with_value(value));
        }

        if value > MAX_AMOUNT {
            return Err(ValidationError::new(
                "amount",
                format!("amount exceeds maximum value of {MAX_AMOUNT}, got {value}"),
            )
            .with_value(value));
        }

        if value.scale() > AMOUNT_SCALE {
            return Err(ValidationError::new(
                "amount",
                format!("amount cannot have more than {AMOUNT_SCALE} decimal places, got {value}"),
            )
            .with_value(value));
        }

        let mut value = value;
        value.rescale(AMOUNT_SCALE);

        Ok(Self(value))
    }

    /// Create an amount from the source text of a JSON number.
    ///
    /// The digits are read directly into a decimal, never through a float, so
    /// `10.000000000000000001` is rejected for its precision instead of being
    /// rounded to `10`.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] if `raw` is not a JSON number or fails the
    /// checks in [Amount::new].
    pub fn from_json_number(raw: &RawValue) -> Result<Self, ValidationError> {
        let text = raw.get().trim();

        let value = parse_exact(text).ok_or_else(|| {
            ValidationError::new("amount", "amount must be a number").with_value(text)
        })?;

        Amount::new(value)
    }

    /// Create an amount from a whole number of cents without validation.
    ///
    /// The caller should ensure that `cents` is within the valid range, e.g.
    /// because it was read back from the database.
    pub fn from_cents_unchecked(cents: i64) -> Self {
        Self(Decimal::new(cents, AMOUNT_SCALE))
    }

    /// The amount as a whole number of cents.
    pub fn cents(&self) -> i64 {
        // Always in range: the scale is fixed at two and the value is at most
        // 9,999,999,999 cents.
        self.0.mantissa() as i64
    }

    /// The amount as a decimal number.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_exact(s.trim()).ok_or_else(|| {
            ValidationError::new("amount", "amount must be a decimal number").with_value(s)
        })?;

        Amount::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_decimal(&self.0, serializer)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let cents = value.as_i64()?;

        if cents <= 0 {
            return Err(FromSqlError::OutOfRange(cents));
        }

        Ok(Self::from_cents_unchecked(cents))
    }
}

/// Convert a total in cents, e.g. the result of `SUM(amount)`, into a decimal.
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, AMOUNT_SCALE)
}

/// Parse decimal or scientific notation, failing instead of rounding when
/// the number has more digits than a [Decimal] holds.
fn parse_exact(text: &str) -> Option<Decimal> {
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str_exact(text).ok()
    }
}

/// Serialize a decimal as a JSON number with its exact digits, e.g. `20.50`.
pub fn serialize_decimal<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let number = RawValue::from_string(value.to_string()).map_err(serde::ser::Error::custom)?;

    number.serialize(serializer)
}

#[cfg(test)]
mod amount_tests {
    use rust_decimal::Decimal;
    use serde_json::value::RawValue;

    use super::{Amount, MAX_AMOUNT};

    #[test]
    fn max_amount_is_just_under_one_hundred_million() {
        assert_eq!(MAX_AMOUNT, Decimal::new(9_999_999_999, 2));
    }

    #[test]
    fn rejects_zero_and_negative_amounts() {
        assert!(Amount::new(Decimal::ZERO).is_err());
        assert!(Amount::new(Decimal::new(-1, 2)).is_err());
        assert!(Amount::new(Decimal::new(-10_000, 0)).is_err());
    }

    #[test]
    fn accepts_amounts_in_range() {
        assert!(Amount::new(Decimal::new(1, 2)).is_ok());
        assert!(Amount::new(Decimal::new(12_345, 2)).is_ok());
        assert!(Amount::new(MAX_AMOUNT).is_ok());
    }

    #[test]
    fn rejects_amounts_above_maximum() {
        let error = Amount::new(Decimal::new(10_000_000_000, 2)).unwrap_err();

        assert_eq!(error.field, "amount");
        assert_eq!(error.value.as_deref(), Some("100000000"));
    }

    #[test]
    fn rejects_sub_cent_precision() {
        assert!(Amount::new(Decimal::new(12_345, 3)).is_err());
        assert!("0.001".parse::<Amount>().is_err());
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        let amount: Amount = "12.3000".parse().unwrap();

        assert_eq!(amount.cents(), 1230);
    }

    fn raw(text: &str) -> Box<RawValue> {
        RawValue::from_string(text.to_owned()).unwrap()
    }

    #[test]
    fn reads_json_numbers_exactly() {
        assert_eq!(Amount::from_json_number(&raw("10.1")).unwrap().cents(), 1010);
        assert_eq!(Amount::from_json_number(&raw("0.3")).unwrap().cents(), 30);
        assert_eq!(Amount::from_json_number(&raw("45")).unwrap().cents(), 4500);
        assert_eq!(Amount::from_json_number(&raw("1.5e1")).unwrap().cents(), 1500);
        assert_eq!(
            Amount::from_json_number(&raw("99999999.99")).unwrap().cents(),
            9_999_999_999
        );
    }

    #[test]
    fn json_numbers_beyond_cent_precision_are_not_rounded() {
        let error = Amount::from_json_number(&raw("10.000000000000000001")).unwrap_err();

        assert_eq!(error.field, "amount");
        assert!(Amount::from_json_number(&raw("10.123")).is_err());
        assert!(Amount::from_json_number(&raw("0.0000000000000000000000000000001")).is_err());
    }

    #[test]
    fn rejects_json_values_that_are_not_numbers() {
        assert!(Amount::from_json_number(&raw("\"10\"")).is_err());
        assert!(Amount::from_json_number(&raw("null")).is_err());
        assert!(Amount::from_json_number(&raw("true")).is_err());
        assert!(Amount::from_json_number(&raw("1e400")).is_err());
    }

    #[test]
    fn cents_round_trip() {
        let amount = Amount::from_cents_unchecked(4_599);

        assert_eq!(amount.cents(), 4_599);
        assert_eq!(amount.to_string(), "45.99");
    }

    #[test]
    fn serializes_as_json_number_with_exact_digits() {
        let amount: Amount = "20.5".parse().unwrap();

        assert_eq!(serde_json::to_string(&amount).unwrap(), "20.50");
    }

    #[test]
    fn large_amounts_serialize_without_float_rounding() {
        let amount = Amount::from_cents_unchecked(9_999_999_999);

        assert_eq!(serde_json::to_string(&amount).unwrap(), "99999999.99");
    }
}
