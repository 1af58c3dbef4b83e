//! Shared fixtures for integration tests
//!
//! Each test gets its own in-memory SQLite database with the real migrations
//! applied. The pool holds exactly one connection so the database lives as
//! long as the pool does. Tests that need writers racing each other use
//! `FileDb`, a throwaway on-disk database opened through `db::connect`.

#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use pos_server::config::{
    BootstrapConfig, Config, DatabaseConfig, JwtConfig, ReportsConfig, ServerConfig,
};
use pos_server::services::catalog::{CatalogService, CreatePhoneInput};
use pos_server::services::client::{ClientService, CreateClientInput};
use pos_server::services::sales::{CreateSaleInput, SalesService};
use pos_server::{db, AppState};
use rust_decimal::Decimal;
use shared::{Actor, PaymentMethod, PhoneCondition, PhoneItem, SaleRecord, UserRole};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: 3600,
        },
        reports: ReportsConfig::default(),
        bootstrap: BootstrapConfig::default(),
    }
}

pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    db::migrate(&pool).await.unwrap();
    pool
}

static FILE_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// On-disk WAL database with a multi-connection pool, removed on drop
pub struct FileDb {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl FileDb {
    pub async fn open(max_connections: u32) -> Self {
        let path = std::env::temp_dir().join(format!(
            "phone-store-test-{}-{}-{}.db",
            std::process::id(),
            FILE_DB_COUNTER.fetch_add(1, Ordering::SeqCst),
            Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        ));

        let pool = db::connect(&DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections,
            min_connections: 1,
        })
        .await
        .unwrap();
        db::migrate(&pool).await.unwrap();

        Self { pool, path }
    }
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub fn test_state(pool: SqlitePool) -> AppState {
    AppState {
        db: pool,
        config: Arc::new(test_config()),
    }
}

/// Insert a user row directly (no bcrypt) and return it as an actor
pub async fn seed_user(pool: &SqlitePool, username: &str, role: UserRole) -> Actor {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (username, password_hash, role, full_name, created_at)
        VALUES (?, 'not-a-hash', ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(role.as_str())
    .bind(format!("{} (test)", username))
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .unwrap();

    Actor::new(id, role)
}

pub async fn seed_admin(pool: &SqlitePool) -> Actor {
    seed_user(pool, "owner", UserRole::Admin).await
}

pub async fn seed_seller(pool: &SqlitePool) -> Actor {
    seed_user(pool, "clerk", UserRole::Seller).await
}

pub fn phone_input(brand: &str, model: &str, price: &str, quantity: i64) -> CreatePhoneInput {
    CreatePhoneInput {
        brand: brand.to_string(),
        model: model.to_string(),
        imei: None,
        color: None,
        storage: Some("128GB".to_string()),
        ram: None,
        condition: PhoneCondition::New,
        price: dec(price),
        cost_price: None,
        quantity,
        description: None,
    }
}

pub async fn seed_phone(
    pool: &SqlitePool,
    admin: &Actor,
    brand: &str,
    model: &str,
    price: &str,
    quantity: i64,
) -> PhoneItem {
    CatalogService::new(pool.clone())
        .create_phone(admin, phone_input(brand, model, price, quantity))
        .await
        .unwrap()
}

pub async fn seed_client(pool: &SqlitePool, name: &str) -> shared::Client {
    ClientService::new(pool.clone())
        .create_client(CreateClientInput {
            name: name.to_string(),
            phone: Some("+1 555 0100".to_string()),
            email: Some("client@example.com".to_string()),
            address: Some("42 Side Street".to_string()),
        })
        .await
        .unwrap()
}

pub fn sale_input(phone_id: i64, quantity: i64) -> CreateSaleInput {
    CreateSaleInput {
        phone_id,
        client_id: None,
        quantity,
        unit_price: None,
        payment_method: PaymentMethod::Cash,
        sale_date: None,
        notes: None,
    }
}

/// Record a sale on a given date at an explicit unit price
pub async fn seed_sale_on(
    pool: &SqlitePool,
    actor: &Actor,
    phone_id: i64,
    date: &str,
    quantity: i64,
    unit_price: &str,
) -> SaleRecord {
    let mut input = sale_input(phone_id, quantity);
    input.sale_date = Some(date.to_string());
    input.unit_price = Some(dec(unit_price));
    SalesService::new(pool.clone())
        .create_sale(actor, input)
        .await
        .unwrap()
}

pub async fn phone_quantity(pool: &SqlitePool, phone_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT quantity FROM phones WHERE id = ?")
        .bind(phone_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn sale_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales")
        .fetch_one(pool)
        .await
        .unwrap()
}
