//! parsesync engine - schema reconciliation
//!
//! - Converge planning and application (`up`)
//! - Prune (`del`)
//! - Export (`down`)

pub mod error;
pub mod export;
pub mod plan;
pub mod reconcile;

pub use error::{ErrorKind, SyncError};
pub use export::{export, fetch_portable, ExportLayout};
pub use plan::{plan_converge, plan_prune, SchemaOperation, SchemaPlan};
pub use reconcile::Reconciler;
