//! Sales ledger and invoice handlers

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use shared::{InvoiceData, SaleListEntry, SaleRecord};

use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path, Query};
use crate::middleware::CurrentUser;
use crate::services::invoice::InvoiceService;
use crate::services::sales::{CreateSaleInput, SalesService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SalesListQuery {
    pub q: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// List sales, by search term or inclusive date range
pub async fn list_sales(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SalesListQuery>,
) -> AppResult<Json<Vec<SaleListEntry>>> {
    let service = SalesService::new(state.db.clone());
    let term = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let sales = match (term, query.from.as_deref(), query.to.as_deref()) {
        (Some(term), _, _) => service.search_sales(term).await?,
        (None, Some(from), Some(to)) => service.list_sales_between(from, to).await?,
        (None, None, None) => service.list_sales().await?,
        _ => {
            return Err(AppError::InvalidRange(
                "both 'from' and 'to' are required".to_string(),
            ))
        }
    };
    Ok(Json(sales))
}

pub async fn get_sale(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(sale_id): Path<i64>,
) -> AppResult<Json<SaleRecord>> {
    let service = SalesService::new(state.db.clone());
    Ok(Json(service.get_sale(sale_id).await?))
}

/// Record a sale; the phone's stock drops by the sold quantity
pub async fn create_sale(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<(StatusCode, Json<SaleRecord>)> {
    let service = SalesService::new(state.db.clone());
    let sale = service.create_sale(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// Delete a sale and put its units back in stock
pub async fn delete_sale(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(sale_id): Path<i64>,
) -> AppResult<StatusCode> {
    let service = SalesService::new(state.db.clone());
    service.delete_sale(&actor, sale_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Invoice data for one sale
pub async fn get_invoice(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(sale_id): Path<i64>,
) -> AppResult<Json<InvoiceData>> {
    let service = InvoiceService::new(state.db.clone());
    Ok(Json(service.assemble(sale_id).await?))
}
