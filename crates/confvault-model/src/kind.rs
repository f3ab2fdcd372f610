//! Item kinds
//!
//! An [`ItemKind`] is a static descriptor of one family of configuration
//! items: where it lives on the controller ([`PathSource`]), which payload keys
//! carry its identity and name, how it is laid out on disk
//! ([`StoreLayout`]) and which keys are dropped on create or ignored on
//! compare.

use std::fmt::{self, Display, Formatter};

use serde_json::Value;

/// REST operation on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Post,
    Put,
    Delete,
}

impl Operation {
    /// Lowercase operation name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URL path templates for the get, post, put and delete operations
///
/// `None` marks an operation the item does not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiPath {
    get: &'static str,
    post: Option<&'static str>,
    put: Option<&'static str>,
    delete: Option<&'static str>,
}

impl ApiPath {
    /// Build from the get path and up to three more in post, put, delete order
    ///
    /// Operations left out inherit the last path given, or the get path when
    /// `others` is empty.
    ///
    /// # Examples
    /// ```
    /// # use confvault_model::{ApiPath, Operation};
    /// let path = ApiPath::new("template/feature/object", &[Some("template/feature")]);
    /// assert_eq!(path.path(Operation::Delete), Some("template/feature"));
    ///
    /// let read_only = ApiPath::new("device/status", &[None]);
    /// assert_eq!(read_only.path(Operation::Put), None);
    /// ```
    #[must_use]
    pub const fn new(get: &'static str, others: &[Option<&'static str>]) -> Self {
        let last = if others.is_empty() {
            Some(get)
        } else {
            others[others.len() - 1]
        };
        Self {
            get,
            post: if !others.is_empty() { others[0] } else { last },
            put: if others.len() > 1 { others[1] } else { last },
            delete: if others.len() > 2 { others[2] } else { last },
        }
    }

    /// Path template for `op`, if supported
    #[inline]
    #[must_use]
    pub const fn path(&self, op: Operation) -> Option<&'static str> {
        match op {
            Operation::Get => Some(self.get),
            Operation::Post => self.post,
            Operation::Put => self.put,
            Operation::Delete => self.delete,
        }
    }

    /// Check whether `op` is supported
    #[inline]
    #[must_use]
    pub const fn supports(&self, op: Operation) -> bool {
        self.path(op).is_some()
    }
}

/// Where a kind's paths come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    /// Same paths for every item of the kind
    Fixed(ApiPath),
    /// Paths depend on the item's `configType`: `"file"` selects `cli`
    Conditional { feature: ApiPath, cli: ApiPath },
}

/// Payload key selecting CLI paths in a [`PathSource::Conditional`]
pub const CONFIG_TYPE_KEY: &str = "configType";

/// Paths for `kind`, given the item's payload when one is at hand
///
/// Without a payload (e.g. before the item is fetched) the feature paths
/// apply.
#[must_use]
pub fn resolve_path(kind: &ItemKind, data: Option<&Value>) -> ApiPath {
    match kind.paths {
        PathSource::Fixed(path) => path,
        PathSource::Conditional { feature, cli } => {
            let is_cli = data
                .and_then(|d| d.get(CONFIG_TYPE_KEY))
                .and_then(Value::as_str)
                .is_some_and(|config_type| config_type == "file");
            if is_cli {
                cli
            } else {
                feature
            }
        }
    }
}

/// On-disk layout of a backed-up kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLayout {
    /// Directory segments below the node directory
    pub dir: &'static [&'static str],
    /// File name template, may contain `{item_name}` and `{item_id}`
    pub file: &'static str,
}

/// Entry fields exposed by a collection kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFields {
    /// Entries are identity/name pairs; enables collision detection
    IdName {
        id: &'static str,
        name: &'static str,
    },
    /// Opaque tuple of fields
    Tuple(&'static [&'static str]),
}

impl IndexFields {
    /// Field keys in iteration order
    #[must_use]
    pub fn keys(&self) -> Vec<&'static str> {
        match *self {
            Self::IdName { id, name } => vec![id, name],
            Self::Tuple(keys) => keys.to_vec(),
        }
    }
}

/// Static descriptor of a family of configuration items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemKind {
    /// Registry name of the kind
    pub name: &'static str,
    /// Controller paths
    pub paths: PathSource,
    /// Top-level key holding the item identifier
    pub id_key: Option<&'static str>,
    /// Top-level key holding the item name
    pub name_key: Option<&'static str>,
    /// Disk layout; `None` for live-only kinds that are never backed up
    pub store: Option<StoreLayout>,
    /// Keys the controller assigns and rejects on create
    pub post_filtered_keys: &'static [&'static str],
    /// Volatile keys ignored when comparing payloads
    pub skip_compare_keys: &'static [&'static str],
    /// Set for kinds whose payload is a list of entries
    pub index_fields: Option<IndexFields>,
}

impl ItemKind {
    /// Kind with no identity, no layout and no filtered keys
    #[must_use]
    pub const fn new(name: &'static str, paths: PathSource) -> Self {
        Self {
            name,
            paths,
            id_key: None,
            name_key: None,
            store: None,
            post_filtered_keys: &[],
            skip_compare_keys: &[],
            index_fields: None,
        }
    }

    /// Set identity and name keys
    #[must_use]
    pub const fn with_identity(self, id_key: &'static str, name_key: &'static str) -> Self {
        Self {
            id_key: Some(id_key),
            name_key: Some(name_key),
            ..self
        }
    }

    /// Set the on-disk layout
    #[must_use]
    pub const fn with_store(self, dir: &'static [&'static str], file: &'static str) -> Self {
        Self {
            store: Some(StoreLayout { dir, file }),
            ..self
        }
    }

    /// Set keys dropped from creation payloads
    #[must_use]
    pub const fn with_post_filtered(self, keys: &'static [&'static str]) -> Self {
        Self {
            post_filtered_keys: keys,
            ..self
        }
    }

    /// Set keys ignored on compare
    #[must_use]
    pub const fn with_skip_compare(self, keys: &'static [&'static str]) -> Self {
        Self {
            skip_compare_keys: keys,
            ..self
        }
    }

    /// Mark as collection kind with the given entry fields
    #[must_use]
    pub const fn with_index_fields(self, fields: IndexFields) -> Self {
        Self {
            index_fields: Some(fields),
            ..self
        }
    }

    /// Check whether items of this kind can be saved and loaded
    #[inline]
    #[must_use]
    pub const fn is_storable(&self) -> bool {
        self.store.is_some()
    }

    /// Keys ignored on compare: the skip set plus the identity key
    #[must_use]
    pub fn compare_ignored_keys(&self) -> Vec<&'static str> {
        let mut keys = self.skip_compare_keys.to_vec();
        if let Some(id_key) = self.id_key {
            if !keys.contains(&id_key) {
                keys.push(id_key);
            }
        }
        keys
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
