//! HTTP handlers for the Retail Stock Count Platform

pub mod auth;
pub mod autofill;
pub mod health;
pub mod products;
pub mod reconcile;
pub mod scan;
pub mod taxonomy;

pub use auth::*;
pub use autofill::*;
pub use health::*;
pub use products::*;
pub use reconcile::*;
pub use scan::*;
pub use taxonomy::*;
