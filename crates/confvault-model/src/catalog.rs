//! Built-in item kinds and the kind registry

use indexmap::IndexMap;

use crate::kind::{ApiPath, IndexFields, ItemKind, PathSource};

const TEMPLATE_SKIP_COMPARE: &[&str] = &[
    "createdOn",
    "createdBy",
    "lastUpdatedBy",
    "lastUpdatedOn",
    "@rid",
    "owner",
    "infoTag",
    "templateAttached",
    "templateConfigurationEdited",
];

/// Index of device templates
pub static DEVICE_TEMPLATE_INDEX: ItemKind = ItemKind::new(
    "device_template_index",
    PathSource::Fixed(ApiPath::new("template/device", &[None])),
)
.with_store(&["inventory"], "device_templates.json")
.with_index_fields(IndexFields::IdName {
    id: "templateId",
    name: "templateName",
});

/// Device template; CLI templates use their own post path
pub static DEVICE_TEMPLATE: ItemKind = ItemKind::new(
    "device_template",
    PathSource::Conditional {
        feature: ApiPath::new(
            "template/device/object",
            &[Some("template/device/feature"), Some("template/device")],
        ),
        cli: ApiPath::new(
            "template/device/object",
            &[Some("template/device/cli"), Some("template/device")],
        ),
    },
)
.with_identity("templateId", "templateName")
.with_store(&["device_templates", "template"], "{item_name}.json")
.with_post_filtered(&["feature"])
.with_skip_compare(TEMPLATE_SKIP_COMPARE);

/// Index of feature templates
pub static FEATURE_TEMPLATE_INDEX: ItemKind = ItemKind::new(
    "feature_template_index",
    PathSource::Fixed(ApiPath::new("template/feature", &[None])),
)
.with_store(&["inventory"], "feature_templates.json")
.with_index_fields(IndexFields::IdName {
    id: "templateId",
    name: "templateName",
});

/// Feature template
pub static FEATURE_TEMPLATE: ItemKind = ItemKind::new(
    "feature_template",
    PathSource::Fixed(ApiPath::new(
        "template/feature/object",
        &[Some("template/feature")],
    )),
)
.with_identity("templateId", "templateName")
.with_store(&["feature_templates"], "{item_name}.json")
.with_skip_compare(TEMPLATE_SKIP_COMPARE);

/// Index of VPN policy lists
pub static POLICY_LIST_VPN_INDEX: ItemKind = ItemKind::new(
    "policy_list_vpn_index",
    PathSource::Fixed(ApiPath::new("template/policy/list/vpn", &[None])),
)
.with_store(&["inventory", "policy_lists"], "vpn.json")
.with_index_fields(IndexFields::IdName {
    id: "listId",
    name: "name",
});

/// VPN policy list
pub static POLICY_LIST_VPN: ItemKind = ItemKind::new(
    "policy_list_vpn",
    PathSource::Fixed(ApiPath::new("template/policy/list/vpn", &[])),
)
.with_identity("listId", "name")
.with_store(&["policy_lists", "vpn"], "{item_name}.json")
.with_post_filtered(&["referenceCount", "references", "isActivatedByVsmart"])
.with_skip_compare(&[
    "lastUpdated",
    "referenceCount",
    "references",
    "activatedId",
    "isActivatedByVsmart",
    "owner",
    "infoTag",
]);

/// Live edge inventory; never backed up
pub static EDGE_INVENTORY: ItemKind = ItemKind::new(
    "edge_inventory",
    PathSource::Fixed(ApiPath::new("system/device/vedges", &[None])),
)
.with_index_fields(IndexFields::Tuple(&["uuid", "host-name", "system-ip", "site-id"]));

/// Kinds by registry name, in registration order
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: IndexMap<&'static str, &'static ItemKind>,
}

impl KindRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for kind in [
            &DEVICE_TEMPLATE_INDEX,
            &DEVICE_TEMPLATE,
            &FEATURE_TEMPLATE_INDEX,
            &FEATURE_TEMPLATE,
            &POLICY_LIST_VPN_INDEX,
            &POLICY_LIST_VPN,
            &EDGE_INVENTORY,
        ] {
            registry.register(kind);
        }
        registry
    }

    /// Register `kind`, replacing a kind with the same name
    pub fn register(&mut self, kind: &'static ItemKind) -> Option<&'static ItemKind> {
        self.kinds.insert(kind.name, kind)
    }

    /// Look up a kind by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static ItemKind> {
        self.kinds.get(name).copied()
    }

    /// Registered kind names
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    /// Number of registered kinds
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Check if no kind is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{resolve_path, Operation};
    use serde_json::json;

    #[test]
    fn builtin_registry_lookup() {
        let registry = KindRegistry::builtin();
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.get("device_template"), Some(&DEVICE_TEMPLATE));
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.names().next(), Some("device_template_index"));
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = KindRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.register(&FEATURE_TEMPLATE).is_none());
        assert_eq!(registry.register(&FEATURE_TEMPLATE), Some(&FEATURE_TEMPLATE));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn device_template_post_path_depends_on_config_type() {
        let cli = json!({"configType": "file"});
        let post = |data: Option<&serde_json::Value>| {
            resolve_path(&DEVICE_TEMPLATE, data).path(Operation::Post)
        };
        assert_eq!(post(Some(&cli)), Some("template/device/cli"));
        assert_eq!(post(None), Some("template/device/feature"));
    }

    #[test]
    fn index_kinds_are_read_only() {
        for kind in [&DEVICE_TEMPLATE_INDEX, &FEATURE_TEMPLATE_INDEX, &EDGE_INVENTORY] {
            let path = resolve_path(kind, None);
            assert!(path.supports(Operation::Get));
            assert!(!path.supports(Operation::Post));
        }
    }

    #[test]
    fn inventory_is_not_storable() {
        assert!(!EDGE_INVENTORY.is_storable());
        assert!(DEVICE_TEMPLATE.is_storable());
    }
}
