//! Domain models for the Phone Store POS

mod invoice;
mod phone;
mod report;
mod sale;
mod store;
mod user;

pub use invoice::*;
pub use phone::*;
pub use report::*;
pub use sale::*;
pub use store::*;
pub use user::*;
