//! Shared types and models for the Phone Store POS
//!
//! This crate contains the domain records, report shapes and validation rules
//! shared between the backend and any client that renders its data.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
