//! Common types used across the platform

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places in the store currency's minor unit
pub const MONEY_SCALE: u32 = 2;

/// Error returned when a stored or submitted enum value is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Convert a money amount to integer minor units (cents).
///
/// Returns `None` when the amount carries more precision than the currency
/// allows or does not fit in an `i64`.
pub fn to_cents(amount: Decimal) -> Option<i64> {
    if amount.normalize().scale() > MONEY_SCALE {
        return None;
    }
    amount.checked_mul(Decimal::ONE_HUNDRED)?.trunc().to_i64()
}

/// Convert integer minor units back to a money amount with two decimals
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, MONEY_SCALE)
}

/// Inclusive date range for queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting one whose start is after its end
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }
}
