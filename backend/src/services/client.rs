//! Client directory service

use chrono::Utc;
use serde::Deserialize;
use shared::{validate_contact_number, Client};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Client service
#[derive(Clone)]
pub struct ClientService {
    db: SqlitePool,
}

/// Input for registering a client
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientInput {
    #[validate(length(min = 1, max = 200, message = "Client name is required"))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: i64,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    created_at: chrono::DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

impl ClientService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Register a client
    pub async fn create_client(&self, input: CreateClientInput) -> AppResult<Client> {
        input.validate()?;
        if let Some(phone) = input.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            validate_contact_number(phone).map_err(|m| AppError::validation("phone", m))?;
        }

        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            INSERT INTO clients (name, phone, email, address, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, phone, email, address, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(client_id = row.id, "Client registered");
        Ok(row.into())
    }

    /// Get a client by id
    pub async fn get_client(&self, client_id: i64) -> AppResult<Client> {
        sqlx::query_as::<_, ClientRow>(
            "SELECT id, name, phone, email, address, created_at FROM clients WHERE id = ?",
        )
        .bind(client_id)
        .fetch_optional(&self.db)
        .await?
        .map(Client::from)
        .ok_or_else(|| AppError::NotFound("Client".to_string()))
    }

    /// List clients by name
    pub async fn list_clients(&self) -> AppResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>(
            "SELECT id, name, phone, email, address, created_at FROM clients ORDER BY name, id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    /// Search clients by name, phone or email
    pub async fn search_clients(&self, term: &str) -> AppResult<Vec<Client>> {
        let pattern = format!("%{}%", term.trim());
        let rows = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT id, name, phone, email, address, created_at FROM clients
            WHERE name LIKE ?1 OR phone LIKE ?1 OR email LIKE ?1
            ORDER BY name, id
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }
}
