//! Sales service: the only path that creates or removes ledger entries
//!
//! Every sale moves stock. Creating a sale decrements the phone's quantity and
//! deleting one restores it; both happen inside one SQLite transaction whose
//! first statement is the conditional write, so the stock check and the
//! mutation are a single compare-and-swap on the phone row.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    compute_total, from_cents, parse_iso_date, to_cents, validate_sale_quantity, Actor, DateRange,
    PaymentMethod, SaleListEntry, SaleRecord,
};
use sqlx::{FromRow, SqlitePool};

use super::{money_to_cents, require_privileged};
use crate::error::{AppError, AppResult};

/// Sales service
#[derive(Clone)]
pub struct SalesService {
    db: SqlitePool,
}

/// Input for recording a sale
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleInput {
    pub phone_id: i64,
    pub client_id: Option<i64>,
    pub quantity: i64,
    /// Defaults to the phone's current catalog price
    pub unit_price: Option<Decimal>,
    pub payment_method: PaymentMethod,
    /// `YYYY-MM-DD`, defaults to today
    pub sale_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: i64,
    phone_id: i64,
    client_id: Option<i64>,
    user_id: i64,
    quantity: i64,
    unit_price_cents: i64,
    total_price_cents: i64,
    payment_method: String,
    sale_date: NaiveDate,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for SaleRecord {
    type Error = AppError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let payment_method = row
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|e| AppError::StorageError(format!("sale {}: {}", row.id, e)))?;

        Ok(SaleRecord {
            id: row.id,
            phone_id: row.phone_id,
            client_id: row.client_id,
            user_id: row.user_id,
            quantity: row.quantity,
            unit_price: from_cents(row.unit_price_cents),
            total_price: from_cents(row.total_price_cents),
            payment_method,
            sale_date: row.sale_date,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SaleListRow {
    id: i64,
    sale_date: NaiveDate,
    brand: Option<String>,
    model: Option<String>,
    client_name: Option<String>,
    quantity: i64,
    total_price_cents: i64,
    payment_method: String,
}

impl TryFrom<SaleListRow> for SaleListEntry {
    type Error = AppError;

    fn try_from(row: SaleListRow) -> Result<Self, Self::Error> {
        let payment_method = row
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|e| AppError::StorageError(format!("sale {}: {}", row.id, e)))?;

        let phone = match (row.brand, row.model) {
            (Some(brand), Some(model)) => Some(format!("{} {}", brand, model)),
            _ => None,
        };

        Ok(SaleListEntry {
            id: row.id,
            sale_date: row.sale_date,
            phone,
            client_name: row.client_name,
            quantity: row.quantity,
            total_price: from_cents(row.total_price_cents),
            payment_method,
        })
    }
}

const SALE_COLUMNS: &str = "id, phone_id, client_id, user_id, quantity, unit_price_cents, \
     total_price_cents, payment_method, sale_date, notes, created_at";

const SALE_LIST_SELECT: &str = r#"
    SELECT s.id, s.sale_date, p.brand, p.model, c.name AS client_name,
           s.quantity, s.total_price_cents, s.payment_method
    FROM sales s
    LEFT JOIN phones p ON p.id = s.phone_id
    LEFT JOIN clients c ON c.id = s.client_id
"#;

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Record a sale and take its quantity out of stock.
    ///
    /// Fails with `InsufficientStock` when the phone holds fewer units than
    /// requested; nothing is written in that case.
    pub async fn create_sale(&self, actor: &Actor, input: CreateSaleInput) -> AppResult<SaleRecord> {
        validate_sale_quantity(input.quantity).map_err(|m| AppError::validation("quantity", m))?;

        let explicit_price_cents = input
            .unit_price
            .map(|p| money_to_cents("unit_price", p))
            .transpose()?;

        let sale_date = match input.sale_date.as_deref() {
            Some(raw) => parse_iso_date(raw).map_err(|m| AppError::validation("sale_date", m))?,
            None => Utc::now().date_naive(),
        };
        let notes = input
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        // Conditional decrement: succeeds only while enough stock remains
        let catalog_price_cents = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE phones
            SET quantity = quantity - ?1, updated_at = ?2
            WHERE id = ?3 AND quantity >= ?1
            RETURNING price_cents
            "#,
        )
        .bind(input.quantity)
        .bind(now)
        .bind(input.phone_id)
        .fetch_optional(&mut *tx)
        .await?;

        let catalog_price_cents = match catalog_price_cents {
            Some(price) => price,
            None => {
                let available =
                    sqlx::query_scalar::<_, i64>("SELECT quantity FROM phones WHERE id = ?")
                        .bind(input.phone_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .ok_or_else(|| AppError::NotFound("Phone".to_string()))?;

                tracing::warn!(
                    phone_id = input.phone_id,
                    available,
                    requested = input.quantity,
                    "Sale rejected: insufficient stock"
                );
                return Err(AppError::InsufficientStock {
                    available,
                    requested: input.quantity,
                });
            }
        };

        if let Some(client_id) = input.client_id {
            let client_count =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients WHERE id = ?")
                    .bind(client_id)
                    .fetch_one(&mut *tx)
                    .await?;

            if client_count == 0 {
                return Err(AppError::NotFound("Client".to_string()));
            }
        }

        let unit_price = from_cents(explicit_price_cents.unwrap_or(catalog_price_cents));
        let total_price_cents = compute_total(input.quantity, unit_price)
            .and_then(to_cents)
            .ok_or_else(|| AppError::validation("unit_price", "Amount is out of range"))?;

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            INSERT INTO sales (
                phone_id, client_id, user_id, quantity, unit_price_cents, total_price_cents,
                payment_method, sale_date, notes, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(input.phone_id)
        .bind(input.client_id)
        .bind(actor.user_id)
        .bind(input.quantity)
        .bind(explicit_price_cents.unwrap_or(catalog_price_cents))
        .bind(total_price_cents)
        .bind(input.payment_method.as_str())
        .bind(sale_date)
        .bind(&notes)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let sale = SaleRecord::try_from(row)?;
        tracing::info!(
            sale_id = sale.id,
            phone_id = sale.phone_id,
            quantity = sale.quantity,
            total = %sale.total_price,
            user_id = actor.user_id,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Delete a sale and return its quantity to stock. Administrators only.
    ///
    /// If the phone row has disappeared the deletion is rejected with
    /// `OrphanedReference` and the sale is kept.
    pub async fn delete_sale(&self, actor: &Actor, sale_id: i64) -> AppResult<()> {
        require_privileged(actor, "delete sales")?;

        let mut tx = self.db.begin().await?;

        let (phone_id, quantity) = sqlx::query_as::<_, (i64, i64)>(
            "DELETE FROM sales WHERE id = ? RETURNING phone_id, quantity",
        )
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let restored = sqlx::query(
            "UPDATE phones SET quantity = quantity + ?, updated_at = ? WHERE id = ?",
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(phone_id)
        .execute(&mut *tx)
        .await?;

        if restored.rows_affected() == 0 {
            tracing::warn!(sale_id, phone_id, "Sale deletion rejected: phone no longer exists");
            return Err(AppError::OrphanedReference { sale_id, phone_id });
        }

        tx.commit().await?;

        tracing::info!(
            sale_id,
            phone_id,
            restored = quantity,
            user_id = actor.user_id,
            "Sale deleted and stock restored"
        );
        Ok(())
    }

    /// Get a sale by id
    pub async fn get_sale(&self, sale_id: i64) -> AppResult<SaleRecord> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?"
        ))
        .bind(sale_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        SaleRecord::try_from(row)
    }

    /// List every sale, newest first
    pub async fn list_sales(&self) -> AppResult<Vec<SaleListEntry>> {
        let rows = sqlx::query_as::<_, SaleListRow>(&format!(
            "{SALE_LIST_SELECT} ORDER BY s.sale_date DESC, s.id DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(SaleListEntry::try_from).collect()
    }

    /// Search sales by phone brand/model, client name or payment method
    pub async fn search_sales(&self, term: &str) -> AppResult<Vec<SaleListEntry>> {
        let pattern = format!("%{}%", term.trim());
        let rows = sqlx::query_as::<_, SaleListRow>(&format!(
            r#"{SALE_LIST_SELECT}
            WHERE p.brand LIKE ?1 OR p.model LIKE ?1 OR c.name LIKE ?1 OR s.payment_method LIKE ?1
            ORDER BY s.sale_date DESC, s.id DESC
            "#
        ))
        .bind(&pattern)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(SaleListEntry::try_from).collect()
    }

    /// List sales dated within an inclusive range, newest first
    pub async fn list_sales_between(&self, from: &str, to: &str) -> AppResult<Vec<SaleListEntry>> {
        let range = parse_range(from, to)?;

        let rows = sqlx::query_as::<_, SaleListRow>(&format!(
            r#"{SALE_LIST_SELECT}
            WHERE s.sale_date BETWEEN ? AND ?
            ORDER BY s.sale_date DESC, s.id DESC
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(SaleListEntry::try_from).collect()
    }
}

/// Parse an inclusive `YYYY-MM-DD` range, rejecting malformed or inverted bounds
pub(crate) fn parse_range(from: &str, to: &str) -> AppResult<DateRange> {
    let start = parse_iso_date(from)
        .map_err(|_| AppError::InvalidRange(format!("'{}' is not a valid start date", from)))?;
    let end = parse_iso_date(to)
        .map_err(|_| AppError::InvalidRange(format!("'{}' is not a valid end date", to)))?;

    DateRange::new(start, end)
        .ok_or_else(|| AppError::InvalidRange(format!("{} is after {}", start, end)))
}
