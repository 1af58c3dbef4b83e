//! Authentication service for store users: login, tokens and accounts

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::{validate_password, Actor, User, UserRole};
use sqlx::SqlitePool;
use validator::Validate;

use super::require_privileged;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Username of the account created on first start
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: SqlitePool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for creating a store user
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: UserRole,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub username: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// The actor a request runs as
    pub fn actor(&self) -> AppResult<Actor> {
        let user_id = self
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;
        let role = self
            .role
            .parse::<UserRole>()
            .map_err(|_| AppError::Unauthorized("Invalid role in token".to_string()))?;
        Ok(Actor::new(user_id, role))
    }
}

/// Issued access token
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
    full_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(|e| AppError::StorageError(format!("user {}: {}", row.id, e)))?;

        Ok(User {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            role,
            created_at: row.created_at,
        })
    }
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Authenticate with username and password
    pub async fn login(&self, username: &str, password: &str) -> AppResult<AuthTokens> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, full_name, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username.trim())
        .fetch_optional(&self.db)
        .await?;

        // Same error for unknown user and wrong password
        let row = match row {
            Some(row) => row,
            None => {
                tracing::debug!(username, "Login failed: unknown user");
                return Err(AppError::InvalidCredentials);
            }
        };

        let valid = verify(password, &row.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            tracing::debug!(user_id = row.id, "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let user = User::try_from(row)?;
        let access_token = self.generate_token(&user)?;

        tracing::info!(user_id = user.id, role = %user.role, "User logged in");

        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user,
        })
    }

    /// Validate access token and return claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// Create a store user. Administrators only.
    pub async fn create_user(&self, actor: &Actor, input: CreateUserInput) -> AppResult<User> {
        require_privileged(actor, "manage users")?;
        input.validate()?;
        validate_password(&input.password).map_err(|m| AppError::validation("password", m))?;

        let user = self
            .insert_user(input.username.trim(), &input.password, input.full_name.as_deref(), input.role)
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, created_by = actor.user_id, "User created");
        Ok(user)
    }

    /// List store users. Administrators only.
    pub async fn list_users(&self, actor: &Actor) -> AppResult<Vec<User>> {
        require_privileged(actor, "manage users")?;

        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, full_name, created_at FROM users ORDER BY username",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Create the `admin` account when the users table is empty.
    ///
    /// Returns `true` when an account was created.
    pub async fn ensure_default_admin(&self, password: &str) -> AppResult<bool> {
        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;

        if existing > 0 {
            return Ok(false);
        }

        let user = self
            .insert_user(DEFAULT_ADMIN_USERNAME, password, Some("Administrator"), UserRole::Admin)
            .await?;

        tracing::warn!(user_id = user.id, "Created default admin account; change its password");
        Ok(true)
    }

    async fn insert_user(
        &self,
        username: &str,
        password: &str,
        full_name: Option<&str>,
        role: UserRole,
    ) -> AppResult<User> {
        let password_hash = hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash, role, full_name, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, username, password_hash, role, full_name, created_at
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(full_name)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(format!("Username '{}' is already taken", username))
            }
            _ => AppError::DatabaseError(e),
        })?;

        User::try_from(row)
    }

    /// Sign an access token for a user
    fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}
