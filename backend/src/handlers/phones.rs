//! Phone catalog handlers

use axum::{extract::State, http::StatusCode};
use shared::PhoneItem;

use super::SearchQuery;
use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::middleware::CurrentUser;
use crate::services::catalog::{CatalogService, CreatePhoneInput, UpdatePhoneInput};
use crate::AppState;

/// List the catalog, optionally filtered by `?q=`
pub async fn list_phones(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<PhoneItem>>> {
    let service = CatalogService::new(state.db.clone());
    let phones = match query.term() {
        Some(term) => service.search_phones(term).await?,
        None => service.list_phones().await?,
    };
    Ok(Json(phones))
}

/// Phones with stock on hand, for the sale form
pub async fn list_available_phones(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<PhoneItem>>> {
    let service = CatalogService::new(state.db.clone());
    Ok(Json(service.sellable_phones().await?))
}

pub async fn get_phone(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(phone_id): Path<i64>,
) -> AppResult<Json<PhoneItem>> {
    let service = CatalogService::new(state.db.clone());
    Ok(Json(service.get_phone(phone_id).await?))
}

pub async fn create_phone(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<CreatePhoneInput>,
) -> AppResult<(StatusCode, Json<PhoneItem>)> {
    let service = CatalogService::new(state.db.clone());
    let phone = service.create_phone(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(phone)))
}

pub async fn update_phone(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(phone_id): Path<i64>,
    Json(input): Json<UpdatePhoneInput>,
) -> AppResult<Json<PhoneItem>> {
    let service = CatalogService::new(state.db.clone());
    Ok(Json(service.update_phone(&actor, phone_id, input).await?))
}

pub async fn delete_phone(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(phone_id): Path<i64>,
) -> AppResult<StatusCode> {
    let service = CatalogService::new(state.db.clone());
    service.delete_phone(&actor, phone_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
