//! Store profile handlers

use axum::extract::State;
use shared::StoreProfile;

use crate::error::AppResult;
use crate::extract::Json;
use crate::middleware::CurrentUser;
use crate::services::store::{StoreService, UpdateStoreInput};
use crate::AppState;

pub async fn get_store(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<StoreProfile>> {
    let service = StoreService::new(state.db.clone());
    Ok(Json(service.get_profile().await?))
}

pub async fn update_store(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<UpdateStoreInput>,
) -> AppResult<Json<StoreProfile>> {
    let service = StoreService::new(state.db.clone());
    Ok(Json(service.update_profile(&actor, input).await?))
}
