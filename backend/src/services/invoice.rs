//! Invoice data assembly
//!
//! Gathers one sale, its phone, client, seller and the store profile into a
//! flat `InvoiceData`. Rendering (PDF, print) is left to the caller.

use chrono::NaiveDate;
use shared::{from_cents, InvoiceData, PaymentMethod, StoreProfile};
use sqlx::{FromRow, SqlitePool};

use super::store::{StoreRow, STORE_SELECT};
use crate::error::{AppError, AppResult};

/// Invoice service
#[derive(Clone)]
pub struct InvoiceService {
    db: SqlitePool,
}

#[derive(Debug, FromRow)]
struct InvoiceSaleRow {
    id: i64,
    phone_id: i64,
    quantity: i64,
    unit_price_cents: i64,
    total_price_cents: i64,
    payment_method: String,
    sale_date: NaiveDate,
    notes: Option<String>,
    brand: Option<String>,
    model: Option<String>,
    imei: Option<String>,
    client_name: Option<String>,
    client_phone: Option<String>,
    client_address: Option<String>,
    username: Option<String>,
    full_name: Option<String>,
}

impl InvoiceService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Assemble invoice data for a sale
    pub async fn assemble(&self, sale_id: i64) -> AppResult<InvoiceData> {
        // Single read transaction: sale and store profile from one snapshot
        let mut tx = self.db.begin().await?;

        let sale = sqlx::query_as::<_, InvoiceSaleRow>(
            r#"
            SELECT s.id, s.phone_id, s.quantity, s.unit_price_cents, s.total_price_cents,
                   s.payment_method, s.sale_date, s.notes,
                   p.brand, p.model, p.imei,
                   c.name AS client_name, c.phone AS client_phone, c.address AS client_address,
                   u.username, u.full_name
            FROM sales s
            LEFT JOIN phones p ON p.id = s.phone_id
            LEFT JOIN clients c ON c.id = s.client_id
            LEFT JOIN users u ON u.id = s.user_id
            WHERE s.id = ?
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let store: StoreProfile = sqlx::query_as::<_, StoreRow>(STORE_SELECT)
            .fetch_optional(&mut *tx)
            .await?
            .map(StoreProfile::from)
            .ok_or_else(|| AppError::StorageError("store profile row is missing".to_string()))?;

        tx.commit().await?;

        let (phone_brand, phone_model) = match (sale.brand, sale.model) {
            (Some(brand), Some(model)) => (brand, model),
            _ => {
                return Err(AppError::OrphanedReference {
                    sale_id: sale.id,
                    phone_id: sale.phone_id,
                })
            }
        };

        let payment_method = sale
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|e| AppError::StorageError(format!("sale {}: {}", sale.id, e)))?;

        let seller_name = sale
            .full_name
            .filter(|n| !n.trim().is_empty())
            .or(sale.username)
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(InvoiceData {
            footer: store.footer_lines(),
            store_name: store.name,
            store_address: store.address,
            store_phone: store.phone,
            store_email: store.email,
            store_tax_number: store.tax_number,
            invoice_number: sale.id,
            date: sale.sale_date,
            seller_name,
            client_name: sale.client_name,
            client_phone: sale.client_phone,
            client_address: sale.client_address,
            phone_brand,
            phone_model,
            phone_imei: sale.imei,
            quantity: sale.quantity,
            unit_price: from_cents(sale.unit_price_cents),
            total_price: from_cents(sale.total_price_cents),
            payment_method_label: payment_method.display_name().to_string(),
            payment_method,
            notes: sale.notes,
        })
    }
}
