//! Configuration records
//!
//! A [`ConfigRecord`] holds one item's payload together with its
//! [`ItemKind`]. Payload construction for create and update never mutates the
//! record; it returns a rewritten copy.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use serde_json::{Map, Value};

use crate::equality;
use crate::ident::{rewrite_identifiers, scan_identifiers, IdMapping, Identifier};
use crate::kind::{resolve_path, ApiPath, ItemKind};

/// Marker keys of read-only items
pub const READONLY_KEYS: [&str; 2] = ["factoryDefault", "readOnly"];
/// Owner key, `"system"` marks system-owned items
pub const OWNER_KEY: &str = "owner";
/// Info tag key, `"aci"` marks system-owned items
pub const INFO_TAG_KEY: &str = "infoTag";

/// Anything built from a controller payload or backup file
pub trait Record: Sized {
    /// Wrap a raw payload of `kind`
    fn from_payload(kind: &'static ItemKind, payload: Value) -> Self;

    /// Kind descriptor
    fn kind(&self) -> &'static ItemKind;

    /// Authoritative payload
    fn data(&self) -> &Value;

    /// Check for "no data": null or a zero-length object, array or string
    fn is_empty(&self) -> bool {
        is_empty_value(self.data())
    }
}

pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(other) => !is_empty_value(other),
    }
}

/// One configuration item
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRecord {
    kind: &'static ItemKind,
    data: Value,
}

impl ConfigRecord {
    /// Create record of `kind` holding `data`
    #[inline]
    #[must_use]
    pub fn new(kind: &'static ItemKind, data: Value) -> Self {
        Self { kind, data }
    }

    /// Consume into the payload
    #[inline]
    #[must_use]
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Item identifier, if the kind has an identity key and it is present
    #[must_use]
    pub fn uuid(&self) -> Option<&str> {
        self.string_field(self.kind.id_key?)
    }

    /// Item name, if the kind has a name key and it is present
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.string_field(self.kind.name_key?)
    }

    fn string_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Factory default or explicitly read-only item
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        READONLY_KEYS
            .iter()
            .any(|key| is_truthy(self.data.get(key)))
    }

    /// Item owned by the controller itself
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.string_field(OWNER_KEY) == Some("system")
            || self.string_field(INFO_TAG_KEY) == Some("aci")
    }

    /// Paths for this item, resolved against its payload
    #[inline]
    #[must_use]
    pub fn api_path(&self) -> ApiPath {
        resolve_path(self.kind, Some(&self.data))
    }

    /// Compare with another payload of the same kind
    ///
    /// The kind's volatile keys and the identity key are ignored.
    #[must_use]
    pub fn is_equal(&self, other: &Value) -> bool {
        equality::is_equal(&self.data, other, &self.kind.compare_ignored_keys())
    }

    /// Payload for creating this item on a controller
    ///
    /// Drops the identity key and the kind's post-filtered keys, renames the
    /// item when `new_name` is given, then rewrites identifiers.
    #[must_use]
    pub fn post_data(&self, mapping: &IdMapping, new_name: Option<&str>) -> Value {
        let payload = match &self.data {
            Value::Object(map) => {
                let mut post: Map<String, Value> = map
                    .iter()
                    .filter(|(key, _)| !self.is_post_filtered(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                if let (Some(name), Some(name_key)) = (new_name, self.kind.name_key) {
                    post.insert(name_key.to_owned(), Value::String(name.to_owned()));
                }
                Value::Object(post)
            }
            other => other.clone(),
        };
        rewrite_identifiers(&payload, mapping)
    }

    /// Payload for updating this item in place: all keys kept, identifiers rewritten
    #[must_use]
    pub fn put_data(&self, mapping: &IdMapping) -> Value {
        rewrite_identifiers(&self.data, mapping)
    }

    fn is_post_filtered(&self, key: &str) -> bool {
        self.kind.id_key == Some(key) || self.kind.post_filtered_keys.contains(&key)
    }

    /// Identifiers of other items this item refers to
    ///
    /// The item's own identity field is left out; identifier-shaped text
    /// anywhere else counts.
    #[must_use]
    pub fn id_references(&self) -> BTreeSet<Identifier> {
        match (&self.data, self.kind.id_key) {
            (Value::Object(map), Some(id_key)) if map.contains_key(id_key) => {
                let filtered: Map<String, Value> = map
                    .iter()
                    .filter(|(key, _)| key.as_str() != id_key)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                scan_identifiers(&Value::Object(filtered))
            }
            (data, _) => scan_identifiers(data),
        }
    }
}

impl Record for ConfigRecord {
    fn from_payload(kind: &'static ItemKind, payload: Value) -> Self {
        Self::new(kind, payload)
    }

    fn kind(&self) -> &'static ItemKind {
        self.kind
    }

    fn data(&self) -> &Value {
        &self.data
    }
}

impl Display for ConfigRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let pretty = serde_json::to_string_pretty(&self.data).map_err(|_| fmt::Error)?;
        f.write_str(&pretty)
    }
}
