//! Store profile service

use serde::Deserialize;
use shared::{validate_contact_number, Actor, StoreProfile};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

use super::require_privileged;
use crate::error::{AppError, AppResult};

/// Store profile service
#[derive(Clone)]
pub struct StoreService {
    db: SqlitePool,
}

/// Replacement store profile
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStoreInput {
    #[validate(length(min = 1, max = 200, message = "Store name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 500, message = "Store address is required"))]
    pub address: String,
    pub phone: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub tax_number: Option<String>,
    #[serde(default)]
    pub invoice_footer: String,
}

#[derive(Debug, FromRow)]
pub(crate) struct StoreRow {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub tax_number: Option<String>,
    pub invoice_footer: String,
}

impl From<StoreRow> for StoreProfile {
    fn from(row: StoreRow) -> Self {
        StoreProfile {
            name: row.name,
            address: row.address,
            phone: row.phone,
            email: row.email,
            tax_number: row.tax_number,
            invoice_footer: row.invoice_footer,
        }
    }
}

pub(crate) const STORE_SELECT: &str =
    "SELECT name, address, phone, email, tax_number, invoice_footer FROM store_info WHERE id = 1";

impl StoreService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// The store profile printed on invoices
    pub async fn get_profile(&self) -> AppResult<StoreProfile> {
        sqlx::query_as::<_, StoreRow>(STORE_SELECT)
            .fetch_optional(&self.db)
            .await?
            .map(StoreProfile::from)
            .ok_or_else(|| AppError::StorageError("store profile row is missing".to_string()))
    }

    /// Replace the store profile. Administrators only.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        input: UpdateStoreInput,
    ) -> AppResult<StoreProfile> {
        require_privileged(actor, "edit the store profile")?;
        input.validate()?;
        validate_contact_number(&input.phone).map_err(|m| AppError::validation("phone", m))?;

        let row = sqlx::query_as::<_, StoreRow>(
            r#"
            INSERT INTO store_info (id, name, address, phone, email, tax_number, invoice_footer)
            VALUES (1, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                phone = excluded.phone,
                email = excluded.email,
                tax_number = excluded.tax_number,
                invoice_footer = excluded.invoice_footer
            RETURNING name, address, phone, email, tax_number, invoice_footer
            "#,
        )
        .bind(input.name.trim())
        .bind(input.address.trim())
        .bind(input.phone.trim())
        .bind(&input.email)
        .bind(&input.tax_number)
        .bind(&input.invoice_footer)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = actor.user_id, "Store profile updated");
        Ok(row.into())
    }
}
