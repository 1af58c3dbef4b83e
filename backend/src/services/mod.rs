//! Business logic services for the Phone Store POS

pub mod auth;
pub mod catalog;
pub mod client;
pub mod invoice;
pub mod reporting;
pub mod sales;
pub mod store;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use client::ClientService;
pub use invoice::InvoiceService;
pub use reporting::ReportingService;
pub use sales::SalesService;
pub use store::StoreService;

use rust_decimal::Decimal;
use shared::{to_cents, validate_price, Actor};

use crate::error::{AppError, AppResult};

/// Reject actors without a privileged role
pub(crate) fn require_privileged(actor: &Actor, action: &str) -> AppResult<()> {
    if actor.role.is_privileged() {
        Ok(())
    } else {
        tracing::warn!(user_id = actor.user_id, role = %actor.role, action, "Permission denied");
        Err(AppError::PermissionDenied(format!(
            "Only administrators may {}",
            action
        )))
    }
}

/// Validate a money input and convert it to stored cents
pub(crate) fn money_to_cents(field: &str, amount: Decimal) -> AppResult<i64> {
    validate_price(amount).map_err(|m| AppError::validation(field, m))?;
    to_cents(amount).ok_or_else(|| AppError::validation(field, "Amount is out of range"))
}
