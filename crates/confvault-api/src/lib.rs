//! Confvault API
//!
//! Controller-facing operations on configuration items: fetch, create,
//! update and delete through an [`ApiGateway`], plus the backup and restore
//! flow built on them.
//!
//! # Example
//!
//! ```rust,ignore
//! use confvault_api::{backup_collection, plan_restore, apply_restore};
//! use confvault_model::catalog::{DEVICE_TEMPLATE, DEVICE_TEMPLATE_INDEX};
//!
//! let report = backup_collection(&gateway, &store, "vmanage1", &DEVICE_TEMPLATE_INDEX, &DEVICE_TEMPLATE)?;
//!
//! let plan = plan_restore(&local, target.as_ref(), &mapping)?;
//! let outcome = apply_restore(&gateway, &local, &plan, &mapping)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod gateway;
pub mod ops;
pub mod outcome;
pub mod restore;

pub use error::{ApiError, ApiResult};
pub use gateway::{join_path, ApiGateway, TransportError};
pub use ops::{create, delete, fetch, fetch_optional, update};
pub use outcome::UpdateOutcome;
pub use restore::{
    apply_restore, backup_collection, plan_restore, restore_item, BackupReport, RestoreOutcome,
    RestorePlan, SkipReason,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
