//! Sales ledger models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{UnknownVariant, MONEY_SCALE};

/// How a sale was paid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::CreditCard,
        PaymentMethod::BankTransfer,
        PaymentMethod::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Other => "other",
        }
    }

    /// Human readable label ("Credit Card")
    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Other => "Other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("payment_method", s))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger entry. Never updated in place; an edit is a delete plus a new sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleRecord {
    pub id: i64,
    pub phone_id: i64,
    pub client_id: Option<i64>,
    pub user_id: i64,
    pub quantity: i64,
    /// Price captured at the time of sale
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    pub sale_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Sale joined with display fields for the sales list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleListEntry {
    pub id: i64,
    pub sale_date: NaiveDate,
    /// "brand model", or `None` if the phone row is gone
    pub phone: Option<String>,
    pub client_name: Option<String>,
    pub quantity: i64,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
}

/// Line total for a sale: `quantity * unit_price` kept at currency precision.
///
/// `None` if the product overflows.
pub fn compute_total(quantity: i64, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .map(|total| total.round_dp(MONEY_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_payment_method_round_trip_names() {
        for method in PaymentMethod::ALL {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serde_names() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"bank_transfer\"");
        assert_eq!(PaymentMethod::CreditCard.display_name(), "Credit Card");
    }

    #[test]
    fn test_compute_total() {
        assert_eq!(compute_total(3, Decimal::new(19999, 2)), Some(Decimal::new(59997, 2)));
        assert_eq!(compute_total(1, Decimal::ZERO), Some(Decimal::ZERO));
    }

    #[test]
    fn test_compute_total_overflow() {
        assert_eq!(compute_total(2, Decimal::MAX), None);
        assert_eq!(compute_total(1, Decimal::MAX), Some(Decimal::MAX));
    }

    #[test]
    fn test_compute_total_no_float_drift() {
        // 0.10 * 3 is exactly 0.30, unlike binary floating point
        assert_eq!(compute_total(3, Decimal::new(10, 2)), Some(Decimal::new(30, 2)));
    }

    proptest! {
        #[test]
        fn prop_total_is_exact_product(quantity in 1i64..1000, cents in 0i64..10_000_000) {
            let unit_price = Decimal::new(cents, 2);
            let total = compute_total(quantity, unit_price);
            prop_assert_eq!(total, Some(Decimal::new(cents * quantity, 2)));
        }
    }
}
