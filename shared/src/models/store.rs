//! Store identity model

use serde::{Deserialize, Serialize};

/// The single store profile printed on invoices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreProfile {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub tax_number: Option<String>,
    /// Footer lines, newline separated
    pub invoice_footer: String,
}

impl StoreProfile {
    pub fn footer_lines(&self) -> Vec<String> {
        self.invoice_footer
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }
}
