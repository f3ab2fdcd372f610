//! Subcommand implementations, kept free of argument parsing

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use confvault_model::{
    is_equal, ApiPath, CollectionRecord, ConfigRecord, FileKey, IdMapping, Identifier, IndexFields,
    ItemKind, KindRegistry, PathSource, Record,
};
use confvault_store::Store;
use serde_json::Value;

/// Kind for payloads that match no registered kind
static ADHOC: ItemKind = ItemKind::new("adhoc", PathSource::Fixed(ApiPath::new("", &[None])));

/// Kind selection shared by subcommands
#[derive(Debug, Default)]
pub(crate) struct KindArgs {
    pub(crate) kind: Option<String>,
    pub(crate) id_key: Option<String>,
    pub(crate) name_key: Option<String>,
    pub(crate) drop: Vec<String>,
}

/// Registered kind named by `--kind`, with key overrides applied
///
/// Overridden kinds live for the rest of the process.
pub(crate) fn resolve_kind(registry: &KindRegistry, args: &KindArgs) -> Result<&'static ItemKind> {
    let base = match &args.kind {
        Some(name) => registry.get(name).with_context(|| {
            let known: Vec<_> = registry.names().collect();
            format!("unknown kind '{name}' (known: {})", known.join(", "))
        })?,
        None => &ADHOC,
    };
    if args.id_key.is_none() && args.name_key.is_none() && args.drop.is_empty() {
        return Ok(base);
    }

    let mut kind = *base;
    if let Some(id_key) = &args.id_key {
        kind.id_key = Some(id_key.clone().leak());
    }
    if let Some(name_key) = &args.name_key {
        kind.name_key = Some(name_key.clone().leak());
    }
    if !args.drop.is_empty() {
        let mut keys = kind.post_filtered_keys.to_vec();
        keys.extend(args.drop.iter().map(|key| -> &'static str { key.clone().leak() }));
        kind.post_filtered_keys = keys.leak();
    }
    if let (None, Some(id), Some(name)) = (kind.index_fields, kind.id_key, kind.name_key) {
        if args.kind.is_none() {
            kind.index_fields = Some(IndexFields::IdName { id, name });
        }
    }
    Ok(Box::leak(Box::new(kind)))
}

pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON file: {}", path.display()))
}

/// Load `{"old": "new", ...}` identifier pairs
pub(crate) fn read_mapping(path: &Path) -> Result<IdMapping> {
    let pairs: HashMap<String, String> = serde_json::from_value(read_json(path)?)
        .with_context(|| format!("{} is not an object of identifier pairs", path.display()))?;
    let mapping = IdMapping::try_from(pairs).with_context(|| format!("invalid mapping in {}", path.display()))?;
    if mapping.has_chains() {
        tracing::warn!(path = %path.display(), "mapping targets are also mapping sources; rewrite is single-pass");
    }
    Ok(mapping)
}

/// Identifiers referenced by `payload`, excluding its own identity
pub(crate) fn refs(kind: &'static ItemKind, payload: Value) -> Vec<Identifier> {
    ConfigRecord::new(kind, payload).id_references().into_iter().collect()
}

/// Compare two payloads, ignoring the kind's volatile keys and `extra_ignored`
pub(crate) fn diff(kind: &'static ItemKind, left: &Value, right: &Value, extra_ignored: &[String]) -> bool {
    let mut ignored = kind.compare_ignored_keys();
    ignored.extend(extra_ignored.iter().map(String::as_str));
    is_equal(left, right, &ignored)
}

/// Rewrite options
#[derive(Debug, Default)]
pub(crate) struct RewriteArgs<'a> {
    pub(crate) create: bool,
    pub(crate) rename: Option<&'a str>,
}

/// Payload ready to send: a creation payload with `create`, else an update payload
pub(crate) fn rewrite(kind: &'static ItemKind, payload: Value, mapping: &IdMapping, args: &RewriteArgs<'_>) -> Result<Value> {
    let record = ConfigRecord::new(kind, payload);
    if args.rename.is_some() && kind.name_key.is_none() {
        bail!("--rename needs a name key (use --name-key or --kind)");
    }
    Ok(if args.create {
        record.post_data(mapping, args.rename)
    } else {
        record.put_data(mapping)
    })
}

/// Extended naming decision and member file names for an index payload
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct NamesReport {
    pub(crate) extended: bool,
    pub(crate) files: Vec<String>,
}

pub(crate) fn names(kind: &'static ItemKind, payload: Value) -> Result<NamesReport> {
    if !matches!(kind.index_fields, Some(IndexFields::IdName { .. })) {
        bail!("kind '{kind}' has no identity and name fields (use --kind or --id-key with --name-key)");
    }
    let index = CollectionRecord::new(kind, payload);
    let files = index
        .id_names()
        .map(|member| index.member_file_key(&member).file_name("{item_name}.json"))
        .collect();
    Ok(NamesReport {
        extended: index.needs_extended_naming(),
        files,
    })
}

/// Payload of a backed-up item
pub(crate) fn show(
    store: &Store,
    kind: &'static ItemKind,
    node_dir: &str,
    name: Option<&str>,
    id: Option<&str>,
) -> Result<Value> {
    let key = match (kind.index_fields, name) {
        (Some(_), _) => FileKey::fixed(),
        (None, Some(name)) => FileKey::item(name, id.unwrap_or_default()).extended(id.is_some()),
        (None, None) => bail!("kind '{kind}' needs an item name"),
    };
    let record: Option<ConfigRecord> = store.load(kind, node_dir, &key)?;
    match record {
        Some(record) => Ok(record.data().clone()),
        None => bail!(
            "no backup at {}",
            store.file_path(kind, node_dir, &key)?.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confvault_model::catalog::{DEVICE_TEMPLATE, DEVICE_TEMPLATE_INDEX};
    use confvault_store::StoreConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    const A: &str = "11111111-2222-4333-8444-555555555555";
    const B: &str = "aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";
    const C: &str = "00000000-0000-4000-8000-000000000001";

    fn kind_args(kind: Option<&str>) -> KindArgs {
        KindArgs {
            kind: kind.map(str::to_owned),
            ..KindArgs::default()
        }
    }

    #[test]
    fn resolve_registered_kind() {
        let registry = KindRegistry::builtin();
        let kind = resolve_kind(&registry, &kind_args(Some("device_template"))).unwrap();
        assert_eq!(kind.id_key, Some("templateId"));
    }

    #[test]
    fn resolve_unknown_kind_lists_known() {
        let registry = KindRegistry::builtin();
        let err = resolve_kind(&registry, &kind_args(Some("nope"))).unwrap_err();
        assert!(err.to_string().contains("device_template_index"));
    }

    #[test]
    fn resolve_adhoc_with_keys() {
        let registry = KindRegistry::builtin();
        let args = KindArgs {
            id_key: Some("listId".into()),
            name_key: Some("name".into()),
            drop: vec!["references".into()],
            ..KindArgs::default()
        };
        let kind = resolve_kind(&registry, &args).unwrap();
        assert_eq!(kind.id_key, Some("listId"));
        assert_eq!(kind.post_filtered_keys, &["references"]);
        assert_eq!(kind.index_fields, Some(IndexFields::IdName { id: "listId", name: "name" }));
    }

    #[test]
    fn refs_exclude_own_identity() {
        let payload = json!({"templateId": A, "generalTemplates": [{"templateId": B}], "note": format!("see {C}")});
        let found = refs(&DEVICE_TEMPLATE, payload);
        let found: Vec<&str> = found.iter().map(Identifier::as_str).collect();
        assert_eq!(found, vec![C, B]);
    }

    #[test]
    fn diff_with_extra_ignored() {
        let left = json!({"templateId": A, "templateName": "x", "description": "old"});
        let right = json!({"description": "new", "templateName": "x", "templateId": B});
        assert!(!diff(&DEVICE_TEMPLATE, &left, &right, &[]));
        assert!(diff(&DEVICE_TEMPLATE, &left, &right, &["description".to_owned()]));
    }

    #[test]
    fn rewrite_create_payload() {
        let mapping: IdMapping = [(A.parse().unwrap(), B.parse().unwrap())].into_iter().collect();
        let payload = json!({"templateId": C, "templateName": "x", "generalTemplates": [{"templateId": A}]});
        let args = RewriteArgs {
            create: true,
            rename: Some("y"),
        };
        let out = rewrite(&DEVICE_TEMPLATE, payload, &mapping, &args).unwrap();
        assert_eq!(out, json!({"templateName": "y", "generalTemplates": [{"templateId": B}]}));
    }

    #[test]
    fn rewrite_rename_needs_name_key() {
        let registry = KindRegistry::builtin();
        let kind = resolve_kind(&registry, &KindArgs::default()).unwrap();
        let args = RewriteArgs {
            create: true,
            rename: Some("y"),
        };
        assert!(rewrite(kind, json!({}), &IdMapping::new(), &args).is_err());
    }

    #[test]
    fn names_detects_collision() {
        let payload = json!({"data": [
            {"templateId": A, "templateName": "Branch"},
            {"templateId": B, "templateName": "branch"},
        ]});
        let report = names(&DEVICE_TEMPLATE_INDEX, payload).unwrap();
        assert!(report.extended);
        assert_eq!(report.files, vec![format!("Branch_{A}.json"), format!("branch_{B}.json")]);
    }

    #[test]
    fn names_rejects_kind_without_fields() {
        assert!(names(&DEVICE_TEMPLATE, json!([])).is_err());
    }

    #[test]
    fn read_mapping_rejects_non_identifiers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.json");
        fs::write(&path, r#"{"not-an-id": "also-not"}"#).unwrap();
        assert!(read_mapping(&path).is_err());

        fs::write(&path, format!(r#"{{"{A}": "{B}"}}"#)).unwrap();
        assert_eq!(read_mapping(&path).unwrap().len(), 1);
    }

    #[test]
    fn show_backed_up_item() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(StoreConfig::new().with_root_dir(dir.path()));
        let record = ConfigRecord::new(&DEVICE_TEMPLATE, json!({"templateId": A, "templateName": "Branch"}));
        store.save(&record, "node", &FileKey::item("Branch", A)).unwrap();

        let shown = show(&store, &DEVICE_TEMPLATE, "node", Some("Branch"), None).unwrap();
        assert_eq!(shown, json!({"templateId": A, "templateName": "Branch"}));
        assert!(show(&store, &DEVICE_TEMPLATE, "node", Some("Other"), None).is_err());
        assert!(show(&store, &DEVICE_TEMPLATE, "node", None, None).is_err());
    }
}
