//! Client directory handlers

use axum::{extract::State, http::StatusCode};
use shared::Client;

use super::SearchQuery;
use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::middleware::CurrentUser;
use crate::services::client::{ClientService, CreateClientInput};
use crate::AppState;

pub async fn list_clients(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Client>>> {
    let service = ClientService::new(state.db.clone());
    let clients = match query.term() {
        Some(term) => service.search_clients(term).await?,
        None => service.list_clients().await?,
    };
    Ok(Json(clients))
}

pub async fn get_client(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(client_id): Path<i64>,
) -> AppResult<Json<Client>> {
    let service = ClientService::new(state.db.clone());
    Ok(Json(service.get_client(client_id).await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<CreateClientInput>,
) -> AppResult<(StatusCode, Json<Client>)> {
    let service = ClientService::new(state.db.clone());
    let client = service.create_client(input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}
