//! Authentication middleware
//!
//! Validates the bearer token on protected routes and makes the caller
//! available to handlers as an `Actor`.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::Actor;

use crate::error::AppError;
use crate::services::AuthService;
use crate::AppState;

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(token) => token,
        None => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response()
        }
    };

    let auth = AuthService::new(state.db.clone(), &state.config);
    let actor = match auth.validate_token(token).and_then(|claims| claims.actor()) {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(actor);

    next.run(request).await
}

/// Extractor for the authenticated caller
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub Actor);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
