//! Authentication and user management handlers

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use shared::User;

use crate::error::AppResult;
use crate::extract::Json;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, AuthTokens, CreateUserInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Exchange credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let tokens = service.login(&input.username, &input.password).await?;
    Ok(Json(tokens))
}

/// List store users
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    Ok(Json(service.list_users(&actor).await?))
}

/// Create a store user
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<(StatusCode, Json<User>)> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let user = service.create_user(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
