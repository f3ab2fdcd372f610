//! Collection records
//!
//! A [`CollectionRecord`] is an index of other items, typically a list of
//! identity/name pairs. Controllers wrap the list in a `{"data": [...]}`
//! envelope; the envelope is removed on construction.

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

use serde_json::Value;

use crate::kind::{IndexFields, ItemKind};
use crate::naming::{sanitize_name_folded, FileKey};
use crate::record::Record;

/// Envelope key of index responses
pub const ENVELOPE_KEY: &str = "data";

static MISSING: Value = Value::Null;

/// Identity and name of one collection entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdName<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

/// Index of items of another kind
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRecord {
    kind: &'static ItemKind,
    data: Value,
    needs_extended_naming: bool,
}

impl CollectionRecord {
    /// Create from a raw index payload, removing the `data` envelope if present
    #[must_use]
    pub fn new(kind: &'static ItemKind, payload: Value) -> Self {
        let data = match payload {
            Value::Object(mut map) => map.remove(ENVELOPE_KEY).unwrap_or(Value::Null),
            other => other,
        };
        let needs_extended_naming = match kind.index_fields {
            Some(IndexFields::IdName { name, .. }) => has_name_collision(&data, name),
            _ => false,
        };
        Self {
            kind,
            data,
            needs_extended_naming,
        }
    }

    /// Entries of the collection; empty when the payload is not a list
    #[must_use]
    pub fn entries(&self) -> &[Value] {
        self.data.as_array().map_or(&[][..], Vec::as_slice)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// True when sanitized, case-folded names collide
    ///
    /// Files of this collection's members must then embed the identifier.
    #[inline]
    #[must_use]
    pub fn needs_extended_naming(&self) -> bool {
        self.needs_extended_naming
    }

    /// Selected fields of every entry; missing fields read as null
    pub fn fields<'a>(&'a self, keys: &'a [&'a str]) -> impl Iterator<Item = Vec<&'a Value>> + 'a {
        self.entries()
            .iter()
            .map(move |entry| keys.iter().map(|key| entry.get(key).unwrap_or(&MISSING)).collect())
    }

    /// The kind's own index fields of every entry
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<&Value>> {
        let keys = self.kind.index_fields.map(|f| f.keys()).unwrap_or_default();
        self.entries()
            .iter()
            .map(|entry| keys.iter().map(|key| entry.get(key).unwrap_or(&MISSING)).collect())
            .collect()
    }

    /// Identity/name pairs of an id/name collection
    ///
    /// Entries without a string identity or name are skipped.
    pub fn id_names(&self) -> impl Iterator<Item = IdName<'_>> + '_ {
        let keys = match self.kind.index_fields {
            Some(IndexFields::IdName { id, name }) => Some((id, name)),
            _ => None,
        };
        self.entries().iter().filter_map(move |entry| {
            let (id_key, name_key) = keys?;
            let id = entry.get(id_key).and_then(Value::as_str);
            let name = entry.get(name_key).and_then(Value::as_str);
            if let (Some(id), Some(name)) = (id, name) {
                Some(IdName { id, name })
            } else {
                tracing::warn!(kind = self.kind.name, %entry, "collection entry lacks identity or name");
                None
            }
        })
    }

    /// File key of a member listed in this collection
    #[must_use]
    pub fn member_file_key<'a>(&self, member: &IdName<'a>) -> FileKey<'a> {
        FileKey::item(member.name, member.id).extended(self.needs_extended_naming)
    }
}

fn has_name_collision(data: &Value, name_key: &str) -> bool {
    let Some(entries) = data.as_array() else {
        return false;
    };
    let distinct: HashSet<String> = entries
        .iter()
        .map(|entry| sanitize_name_folded(&name_text(entry.get(name_key))))
        .collect();
    distinct.len() != entries.len()
}

fn name_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

impl Record for CollectionRecord {
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

impl Display for CollectionRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let pretty = serde_json::to_string_pretty(&self.data).map_err(|_| fmt::Error)?;
        f.write_str(&pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{ApiPath, PathSource};
    use serde_json::json;

    static INDEX: ItemKind = ItemKind::new("index", PathSource::Fixed(ApiPath::new("items", &[None])))
        .with_store(&["inventory"], "items.json")
        .with_index_fields(IndexFields::IdName { id: "id", name: "name" });

    static TUPLES: ItemKind = ItemKind::new("tuples", PathSource::Fixed(ApiPath::new("devices", &[None])))
        .with_index_fields(IndexFields::Tuple(&["uuid", "host-name", "site"]));

    fn names(names: &[&str]) -> Value {
        let entries: Vec<Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| json!({"id": format!("id-{i}"), "name": name}))
            .collect();
        json!({ "data": entries })
    }

    #[test]
    fn collision_after_sanitize_and_fold() {
        // Hyphen is a safe char: "foo-1" and "foo_1" stay distinct
        let collection = CollectionRecord::new(&INDEX, names(&["Foo-1", "foo_1"]));
        assert!(!collection.needs_extended_naming());

        let collection = CollectionRecord::new(&INDEX, names(&["Foo.1", "foo_1"]));
        assert!(collection.needs_extended_naming());
    }

    #[test]
    fn collision_by_case_only() {
        let collection = CollectionRecord::new(&INDEX, names(&["Branch", "BRANCH"]));
        assert!(collection.needs_extended_naming());
    }

    #[test]
    fn distinct_names_do_not_collide() {
        let collection = CollectionRecord::new(&INDEX, names(&["A", "B"]));
        assert!(!collection.needs_extended_naming());
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn envelope_removed() {
        let collection = CollectionRecord::new(&INDEX, names(&["A"]));
        assert!(collection.data().is_array());

        let bare = CollectionRecord::new(&INDEX, json!([{"id": "1", "name": "A"}]));
        assert_eq!(bare.len(), 1);

        let no_data = CollectionRecord::new(&INDEX, json!({"header": {}}));
        assert!(no_data.is_empty());
        assert_eq!(no_data.len(), 0);
        assert!(!no_data.needs_extended_naming());
    }

    #[test]
    fn tuple_collections_never_extend() {
        let collection = CollectionRecord::new(
            &TUPLES,
            json!([{"uuid": "1", "host-name": "a"}, {"uuid": "2", "host-name": "a"}]),
        );
        assert!(!collection.needs_extended_naming());
        assert_eq!(collection.id_names().count(), 0);
    }

    #[test]
    fn rows_fill_missing_with_null() {
        let collection = CollectionRecord::new(&TUPLES, json!([{"uuid": "1", "host-name": "a"}]));
        let rows = collection.rows();
        assert_eq!(rows, vec![vec![&json!("1"), &json!("a"), &Value::Null]]);
    }

    #[test]
    fn fields_selects_custom_keys() {
        let collection = CollectionRecord::new(&INDEX, names(&["A", "B"]));
        let keys = ["name"];
        let selected: Vec<_> = collection.fields(&keys).collect();
        assert_eq!(selected, vec![vec![&json!("A")], vec![&json!("B")]]);
    }

    #[test]
    fn id_names_skip_incomplete_entries() {
        let collection = CollectionRecord::new(
            &INDEX,
            json!([{"id": "1", "name": "A"}, {"id": "2"}, {"name": "C"}]),
        );
        let pairs: Vec<_> = collection.id_names().collect();
        assert_eq!(pairs, vec![IdName { id: "1", name: "A" }]);
    }

    #[test]
    fn member_file_key_follows_collision_flag() {
        let plain = CollectionRecord::new(&INDEX, names(&["A/x", "B"]));
        let member = plain.id_names().next().unwrap();
        assert_eq!(plain.member_file_key(&member).file_name("{item_name}.json"), "A_x.json");

        let colliding = CollectionRecord::new(&INDEX, names(&["A/x", "a_x"]));
        let member = colliding.id_names().next().unwrap();
        assert_eq!(
            colliding.member_file_key(&member).file_name("{item_name}.json"),
            "A_x_id-0.json"
        );
    }
}
