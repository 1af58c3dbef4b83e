//! Route definitions for the Phone Store POS API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Login (public)
        .route("/auth/login", post(handlers::login))
        // Everything else requires a bearer token
        .merge(protected_routes(state))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/phones", phone_routes())
        .nest("/clients", client_routes())
        .nest("/sales", sale_routes())
        .nest("/reports", report_routes())
        .route(
            "/store",
            get(handlers::get_store).put(handlers::update_store),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// User management routes
fn user_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_users).post(handlers::create_user))
}

/// Phone catalog routes
fn phone_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_phones).post(handlers::create_phone))
        .route("/available", get(handlers::list_available_phones))
        .route(
            "/:phone_id",
            get(handlers::get_phone)
                .put(handlers::update_phone)
                .delete(handlers::delete_phone),
        )
}

/// Client directory routes
fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_clients).post(handlers::create_client))
        .route("/:client_id", get(handlers::get_client))
}

/// Sales ledger routes
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route(
            "/:sale_id",
            get(handlers::get_sale).delete(handlers::delete_sale),
        )
        .route("/:sale_id/invoice", get(handlers::get_invoice))
}

/// Reporting routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(handlers::get_sales_report))
        .route("/stock", get(handlers::get_stock_report))
        .route("/brands", get(handlers::list_brands))
}
