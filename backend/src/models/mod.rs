//! Database models for the Retail Stock Count Platform
//!
//! Re-exports models from the shared crate and adds backend-specific models

pub use shared::models::*;
