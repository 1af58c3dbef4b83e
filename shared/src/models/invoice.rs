//! Flat invoice record handed to renderers

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PaymentMethod;

/// Everything an invoice renderer needs for one sale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceData {
    pub store_name: String,
    pub store_address: String,
    pub store_phone: String,
    pub store_email: Option<String>,
    pub store_tax_number: Option<String>,

    /// Invoice number is the sale id
    pub invoice_number: i64,
    pub date: NaiveDate,
    pub seller_name: String,

    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_address: Option<String>,

    pub phone_brand: String,
    pub phone_model: String,
    pub phone_imei: Option<String>,

    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_method_label: String,
    pub notes: Option<String>,

    pub footer: Vec<String>,
}
