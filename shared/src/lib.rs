//! Shared types and models for the Retail Stock Count Platform
//!
//! This crate contains the domain entities, taxonomy rules, and validation
//! helpers shared between the backend and other components of the system.

pub mod debounce;
pub mod models;
pub mod rules;
pub mod validation;

pub use debounce::*;
pub use models::*;
pub use rules::*;
pub use validation::*;
