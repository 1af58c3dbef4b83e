//! Reporting handlers for sales and stock summaries

use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{SalesGroupBy, StockFilter};

use crate::error::{AppError, AppResult};
use crate::extract::{Json, Query};
use crate::middleware::CurrentUser;
use crate::services::reporting::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SalesReportQuery {
    pub from: String,
    pub to: String,
    pub group_by: Option<String>, // day, week, month, year, product, payment_method
    pub format: Option<String>,   // "json" or "csv"
}

#[derive(Debug, Deserialize)]
pub struct StockReportQuery {
    pub filter: Option<String>, // all, low_stock, by_brand
    pub threshold: Option<i64>,
    pub brand: Option<String>,
    pub format: Option<String>,
}

/// Grouped sales report over a date range
pub async fn get_sales_report(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SalesReportQuery>,
) -> AppResult<Response> {
    let group_by = query
        .group_by
        .as_deref()
        .unwrap_or("day")
        .parse::<SalesGroupBy>()
        .map_err(|e| AppError::validation("group_by", e.to_string()))?;

    let service = ReportingService::new(state.db.clone());
    let report = service
        .generate_sales_report(&query.from, &query.to, group_by)
        .await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::sales_report_csv(&report)?;
        Ok(csv_response(csv, report.grand_total, "sales_report.csv"))
    } else {
        Ok(Json(report).into_response())
    }
}

/// Stock listing with store-wide valuation
pub async fn get_stock_report(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<StockReportQuery>,
) -> AppResult<Response> {
    let filter = match query.filter.as_deref().unwrap_or("all") {
        "all" => StockFilter::All,
        "low_stock" => StockFilter::LowStock {
            threshold: query
                .threshold
                .unwrap_or(state.config.reports.low_stock_threshold),
        },
        "by_brand" => StockFilter::ByBrand {
            brand: query.brand.unwrap_or_default(),
        },
        other => {
            return Err(AppError::validation(
                "filter",
                format!("unknown filter '{}'", other),
            ))
        }
    };

    let service = ReportingService::new(state.db.clone());
    let report = service.generate_stock_report(filter).await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::stock_report_csv(&report)?;
        Ok(csv_response(csv, report.grand_total_value, "stock_report.csv"))
    } else {
        Ok(Json(report).into_response())
    }
}

/// Brands present in the catalog, for the by-brand filter
pub async fn list_brands(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<String>>> {
    let service = ReportingService::new(state.db.clone());
    Ok(Json(service.list_brands().await?))
}

const GRAND_TOTAL_HEADER: &str = "x-grand-total";

fn wants_csv(format: Option<&str>) -> bool {
    format == Some("csv")
}

/// CSV download; the grand total is repeated in `X-Grand-Total`
fn csv_response(csv: String, grand_total: Decimal, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (HeaderName::from_static(GRAND_TOTAL_HEADER), grand_total.to_string()),
        ],
        csv,
    )
        .into_response()
}
