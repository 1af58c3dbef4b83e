//! Phone catalog models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::UnknownVariant;

/// Physical condition of a handset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhoneCondition {
    #[default]
    New,
    Used,
    Refurbished,
}

impl PhoneCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneCondition::New => "new",
            PhoneCondition::Used => "used",
            PhoneCondition::Refurbished => "refurbished",
        }
    }
}

impl FromStr for PhoneCondition {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(PhoneCondition::New),
            "used" => Ok(PhoneCondition::Used),
            "refurbished" => Ok(PhoneCondition::Refurbished),
            other => Err(UnknownVariant::new("condition", other)),
        }
    }
}

impl fmt::Display for PhoneCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog entry: one type of handset and its on-hand quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhoneItem {
    pub id: i64,
    pub brand: String,
    pub model: String,
    /// Hardware identifier, unique when present
    pub imei: Option<String>,
    pub color: Option<String>,
    pub storage: Option<String>,
    pub ram: Option<String>,
    pub condition: PhoneCondition,
    /// Current unit sale price
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    /// On-hand quantity, never negative
    pub quantity: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PhoneItem {
    /// Display name used on lists and invoices
    pub fn label(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }

    /// Value of the on-hand stock at the current price
    pub fn stock_value(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    pub fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }
}
