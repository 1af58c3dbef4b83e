//! Phone catalog service: the stock pool that sales draw from

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    from_cents, validate_imei, validate_stock_quantity, Actor, PhoneCondition, PhoneItem,
};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

use super::{money_to_cents, require_privileged};
use crate::error::{AppError, AppResult};

/// Catalog service for phone records
#[derive(Clone)]
pub struct CatalogService {
    db: SqlitePool,
}

/// Input for adding a phone to the catalog
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePhoneInput {
    #[validate(length(min = 1, max = 100, message = "Brand is required"))]
    pub brand: String,
    #[validate(length(min = 1, max = 100, message = "Model is required"))]
    pub model: String,
    pub imei: Option<String>,
    pub color: Option<String>,
    pub storage: Option<String>,
    pub ram: Option<String>,
    #[serde(default)]
    pub condition: PhoneCondition,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub description: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

/// Input for editing a phone; absent fields keep their current value
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePhoneInput {
    #[validate(length(min = 1, max = 100, message = "Brand cannot be empty"))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Model cannot be empty"))]
    pub model: Option<String>,
    pub imei: Option<String>,
    pub color: Option<String>,
    pub storage: Option<String>,
    pub ram: Option<String>,
    pub condition: Option<PhoneCondition>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    /// Stock count correction; sales never go through this path
    pub quantity: Option<i64>,
    pub description: Option<String>,
}

/// Row as stored in `phones`
#[derive(Debug, FromRow)]
pub(crate) struct PhoneRow {
    id: i64,
    brand: String,
    model: String,
    imei: Option<String>,
    color: Option<String>,
    storage: Option<String>,
    ram: Option<String>,
    condition: String,
    price_cents: i64,
    cost_price_cents: Option<i64>,
    quantity: i64,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PhoneRow> for PhoneItem {
    type Error = AppError;

    fn try_from(row: PhoneRow) -> Result<Self, Self::Error> {
        let condition = row
            .condition
            .parse::<PhoneCondition>()
            .map_err(|e| AppError::StorageError(format!("phone {}: {}", row.id, e)))?;

        Ok(PhoneItem {
            id: row.id,
            brand: row.brand,
            model: row.model,
            imei: row.imei,
            color: row.color,
            storage: row.storage,
            ram: row.ram,
            condition,
            price: from_cents(row.price_cents),
            cost_price: row.cost_price_cents.map(from_cents),
            quantity: row.quantity,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) const PHONE_COLUMNS: &str = "id, brand, model, imei, color, storage, ram, condition, \
     price_cents, cost_price_cents, quantity, description, created_at, updated_at";

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Add a phone to the catalog
    pub async fn create_phone(&self, actor: &Actor, input: CreatePhoneInput) -> AppResult<PhoneItem> {
        require_privileged(actor, "edit the catalog")?;
        input.validate()?;

        validate_stock_quantity(input.quantity).map_err(|m| AppError::validation("quantity", m))?;
        let price_cents = money_to_cents("price", input.price)?;
        let cost_price_cents = input
            .cost_price
            .map(|c| money_to_cents("cost_price", c))
            .transpose()?;
        let imei = normalize_imei(input.imei)?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, PhoneRow>(&format!(
            r#"
            INSERT INTO phones (
                brand, model, imei, color, storage, ram, condition,
                price_cents, cost_price_cents, quantity, description, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {PHONE_COLUMNS}
            "#
        ))
        .bind(input.brand.trim())
        .bind(input.model.trim())
        .bind(&imei)
        .bind(&input.color)
        .bind(&input.storage)
        .bind(&input.ram)
        .bind(input.condition.as_str())
        .bind(price_cents)
        .bind(cost_price_cents)
        .bind(input.quantity)
        .bind(&input.description)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(map_imei_conflict)?;

        let phone = PhoneItem::try_from(row)?;
        tracing::info!(phone_id = phone.id, quantity = phone.quantity, "Phone added to catalog");
        Ok(phone)
    }

    /// Update a phone's catalog fields
    pub async fn update_phone(
        &self,
        actor: &Actor,
        phone_id: i64,
        input: UpdatePhoneInput,
    ) -> AppResult<PhoneItem> {
        require_privileged(actor, "edit the catalog")?;
        input.validate()?;

        if let Some(quantity) = input.quantity {
            validate_stock_quantity(quantity).map_err(|m| AppError::validation("quantity", m))?;
        }
        let price_cents = input.price.map(|p| money_to_cents("price", p)).transpose()?;
        let cost_price_cents = input
            .cost_price
            .map(|c| money_to_cents("cost_price", c))
            .transpose()?;
        let imei = normalize_imei(input.imei)?;

        // COALESCE keeps untouched columns, so a concurrent sale's quantity
        // change is never overwritten unless a quantity was supplied.
        let row = sqlx::query_as::<_, PhoneRow>(&format!(
            r#"
            UPDATE phones
            SET brand = COALESCE(?, brand),
                model = COALESCE(?, model),
                imei = COALESCE(?, imei),
                color = COALESCE(?, color),
                storage = COALESCE(?, storage),
                ram = COALESCE(?, ram),
                condition = COALESCE(?, condition),
                price_cents = COALESCE(?, price_cents),
                cost_price_cents = COALESCE(?, cost_price_cents),
                quantity = COALESCE(?, quantity),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ?
            RETURNING {PHONE_COLUMNS}
            "#
        ))
        .bind(input.brand.as_deref().map(str::trim))
        .bind(input.model.as_deref().map(str::trim))
        .bind(&imei)
        .bind(&input.color)
        .bind(&input.storage)
        .bind(&input.ram)
        .bind(input.condition.map(|c| c.as_str()))
        .bind(price_cents)
        .bind(cost_price_cents)
        .bind(input.quantity)
        .bind(&input.description)
        .bind(Utc::now())
        .bind(phone_id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_imei_conflict)?
        .ok_or_else(|| AppError::NotFound("Phone".to_string()))?;

        tracing::info!(phone_id, "Phone updated");
        PhoneItem::try_from(row)
    }

    /// Remove a phone that no sale references
    pub async fn delete_phone(&self, actor: &Actor, phone_id: i64) -> AppResult<()> {
        require_privileged(actor, "edit the catalog")?;

        let mut tx = self.db.begin().await?;

        let sale_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales WHERE phone_id = ?")
                .bind(phone_id)
                .fetch_one(&mut *tx)
                .await?;

        if sale_count > 0 {
            return Err(AppError::Conflict(format!(
                "Phone {} is referenced by {} sale(s); delete those sales first",
                phone_id, sale_count
            )));
        }

        let result = sqlx::query("DELETE FROM phones WHERE id = ?")
            .bind(phone_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Phone".to_string()));
        }

        tx.commit().await?;
        tracing::info!(phone_id, "Phone removed from catalog");
        Ok(())
    }

    /// Get a phone by id
    pub async fn get_phone(&self, phone_id: i64) -> AppResult<PhoneItem> {
        let row = sqlx::query_as::<_, PhoneRow>(&format!(
            "SELECT {PHONE_COLUMNS} FROM phones WHERE id = ?"
        ))
        .bind(phone_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Phone".to_string()))?;

        PhoneItem::try_from(row)
    }

    /// List the whole catalog ordered by brand and model
    pub async fn list_phones(&self) -> AppResult<Vec<PhoneItem>> {
        let rows = sqlx::query_as::<_, PhoneRow>(&format!(
            "SELECT {PHONE_COLUMNS} FROM phones ORDER BY brand, model, id"
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PhoneItem::try_from).collect()
    }

    /// Search brand, model and IMEI for a substring
    pub async fn search_phones(&self, term: &str) -> AppResult<Vec<PhoneItem>> {
        let pattern = format!("%{}%", term.trim());
        let rows = sqlx::query_as::<_, PhoneRow>(&format!(
            r#"
            SELECT {PHONE_COLUMNS} FROM phones
            WHERE brand LIKE ?1 OR model LIKE ?1 OR imei LIKE ?1
            ORDER BY brand, model, id
            "#
        ))
        .bind(&pattern)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PhoneItem::try_from).collect()
    }

    /// Phones that can currently be sold (quantity above zero)
    pub async fn sellable_phones(&self) -> AppResult<Vec<PhoneItem>> {
        let rows = sqlx::query_as::<_, PhoneRow>(&format!(
            "SELECT {PHONE_COLUMNS} FROM phones WHERE quantity > 0 ORDER BY brand, model, id"
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PhoneItem::try_from).collect()
    }
}

/// Blank IMEIs are stored as NULL so the UNIQUE constraint ignores them
fn normalize_imei(imei: Option<String>) -> AppResult<Option<String>> {
    match imei.map(|i| i.trim().to_string()) {
        Some(i) if i.is_empty() => Ok(None),
        Some(i) => {
            validate_imei(&i).map_err(|m| AppError::validation("imei", m))?;
            Ok(Some(i))
        }
        None => Ok(None),
    }
}

fn map_imei_conflict(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("A phone with this IMEI already exists".to_string())
        }
        _ => AppError::DatabaseError(err),
    }
}
