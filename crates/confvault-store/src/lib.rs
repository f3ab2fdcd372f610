//! Confvault Store
//!
//! Persists configuration records as JSON files, one directory tree per
//! controller node.
//!
//! # Layout
//!
//! ```text
//! <root_dir>/<node_dir>/<kind dir...>/<file name>
//!
//! data/vmanage1/inventory/device_templates.json
//! data/vmanage1/device_templates/template/Branch.json
//! data/vmanage1/device_templates/template/branch_<id>.json   (colliding names)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use confvault_model::{catalog, ConfigRecord, FileKey};
//! use confvault_store::{Store, StoreConfig};
//!
//! let store = Store::new(StoreConfig::new().with_root_dir("backups"));
//! let key = FileKey::item("Branch", id);
//! store.save(&record, "vmanage1", &key)?;
//! let restored: Option<ConfigRecord> = store.load(&catalog::DEVICE_TEMPLATE, "vmanage1", &key)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod store;

pub use config::{StoreConfig, DEFAULT_ROOT_DIR};
pub use error::{StoreError, StoreResult};
pub use store::Store;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
