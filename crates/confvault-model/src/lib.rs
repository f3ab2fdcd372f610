//! Confvault Record Model
//!
//! In-memory records of network controller configuration items, with the
//! identifier remapping and comparison used when restoring a backup into a
//! different controller.
//!
//! # Core Concepts
//!
//! - [`ItemKind`]: Static descriptor of an item family (paths, keys, layout)
//! - [`ConfigRecord`]: One configuration item and its create/update payloads
//! - [`CollectionRecord`]: Index of identity/name pairs with collision detection
//! - [`Identifier`] / [`IdMapping`]: UUID references and their remapping
//! - [`is_equal`]: Key-order-insensitive comparison with ignored keys
//!
//! # Example
//!
//! ```rust
//! use confvault_model::{catalog, ConfigRecord, IdMapping, Identifier};
//! use serde_json::json;
//!
//! let old: Identifier = "11111111-2222-3333-4444-555555555555".parse().unwrap();
//! let new: Identifier = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee".parse().unwrap();
//! let mapping: IdMapping = [(old.clone(), new.clone())].into_iter().collect();
//!
//! let record = ConfigRecord::new(
//!     &catalog::DEVICE_TEMPLATE,
//!     json!({"templateId": "0f0f0f0f-1e1e-2d2d-3c3c-4b4b4b4b4b4b",
//!            "templateName": "branch",
//!            "generalTemplates": [{"templateId": old.as_str()}]}),
//! );
//!
//! let post = record.post_data(&mapping, None);
//! assert!(post.get("templateId").is_none());
//! assert_eq!(post["generalTemplates"][0]["templateId"], new.as_str());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod collection;
mod equality;
mod error;
mod ident;
mod kind;
mod naming;
mod record;

/// Built-in kinds
pub mod catalog;

// Re-exports
pub use catalog::KindRegistry;
pub use collection::{CollectionRecord, IdName, ENVELOPE_KEY};
pub use equality::{canonical_form, is_equal};
pub use error::IdentifierError;
pub use ident::{rewrite_identifiers, scan_identifiers, IdMapping, Identifier, IDENTIFIER_PATTERN};
pub use kind::{
    resolve_path, ApiPath, IndexFields, ItemKind, Operation, PathSource, StoreLayout,
    CONFIG_TYPE_KEY,
};
pub use naming::{sanitize_name, sanitize_name_folded, FileKey};
pub use record::{ConfigRecord, Record, INFO_TAG_KEY, OWNER_KEY, READONLY_KEYS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
