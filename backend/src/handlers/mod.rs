//! HTTP request handlers for the Phone Store POS API

pub mod auth;
pub mod clients;
pub mod health;
pub mod phones;
pub mod reporting;
pub mod sales;
pub mod store;

pub use auth::*;
pub use clients::*;
pub use health::*;
pub use phones::*;
pub use reporting::*;
pub use sales::*;
pub use store::*;

use serde::Deserialize;

/// `?q=` free-text search parameter shared by list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

impl SearchQuery {
    /// The search term, if one was given and is not blank
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}
