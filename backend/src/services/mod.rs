//! Business logic services for the Retail Stock Count Platform

pub mod auth;
pub mod identity;
pub mod ledger;
pub mod reconcile;
pub mod scan;
pub mod taxonomy;

pub use auth::AuthService;
pub use identity::IdentityService;
pub use ledger::LedgerService;
pub use reconcile::ReconcileService;
pub use scan::ScanGate;
pub use taxonomy::TaxonomyService;
