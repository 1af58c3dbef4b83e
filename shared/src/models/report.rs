//! Sales and stock report shapes

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::UnknownVariant;

/// Default threshold for the low stock filter (strictly less than)
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Grouping dimension for a sales report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SalesGroupBy {
    Day,
    /// ISO-8601 week, Monday start, keyed by ISO year and week number
    Week,
    Month,
    Year,
    Product,
    PaymentMethod,
}

impl SalesGroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesGroupBy::Day => "day",
            SalesGroupBy::Week => "week",
            SalesGroupBy::Month => "month",
            SalesGroupBy::Year => "year",
            SalesGroupBy::Product => "product",
            SalesGroupBy::PaymentMethod => "payment_method",
        }
    }
}

impl FromStr for SalesGroupBy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(SalesGroupBy::Day),
            "week" => Ok(SalesGroupBy::Week),
            "month" => Ok(SalesGroupBy::Month),
            "year" => Ok(SalesGroupBy::Year),
            "product" => Ok(SalesGroupBy::Product),
            "payment_method" => Ok(SalesGroupBy::PaymentMethod),
            other => Err(UnknownVariant::new("group_by", other)),
        }
    }
}

impl fmt::Display for SalesGroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bucket of a sales report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupRow {
    pub label: String,
    pub sales_count: i64,
    pub total_quantity: i64,
    pub total_sales: Decimal,
}

/// Grouped sales summary over a date range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesReport {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub group_by: SalesGroupBy,
    pub rows: Vec<GroupRow>,
    /// Sum over every sale in range, computed independently of the rows
    pub grand_total: Decimal,
}

/// Which phones a stock report lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockFilter {
    All,
    LowStock { threshold: i64 },
    /// Exact, case-sensitive brand match
    ByBrand { brand: String },
}

impl StockFilter {
    pub fn low_stock() -> Self {
        StockFilter::LowStock {
            threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

/// One phone line of a stock report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockRow {
    pub id: i64,
    pub brand: String,
    pub model: String,
    pub imei: Option<String>,
    pub price: Decimal,
    pub quantity: i64,
    pub line_value: Decimal,
}

/// Stock listing with the store-wide valuation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockReport {
    pub filter: StockFilter,
    pub rows: Vec<StockRow>,
    /// `price * quantity` over the whole catalog, not only the listed rows
    pub grand_total_value: Decimal,
}
