//! Identifiers and identifier remapping
//!
//! Provides [`Identifier`], [`IdMapping`], [`scan_identifiers`] and
//! [`rewrite_identifiers`].
//!
//! Matching is lexical over the compact JSON text of a payload. An
//! identifier-shaped string inside a free-text field (a description, a
//! string-encoded sub-document) is indistinguishable from a cross-reference
//! and is scanned and rewritten the same way.

use std::borrow::{Borrow, Cow};
use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::IdentifierError;

/// Lowercase canonical UUID text, 8-4-4-4-12 hex digits
pub const IDENTIFIER_PATTERN: &str =
    "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(IDENTIFIER_PATTERN).expect("this regex should always be valid"));

static IDENTIFIER_EXACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{IDENTIFIER_PATTERN}$")).expect("this regex should always be valid")
});

/// Opaque identifier of a configuration item
///
/// Always holds lowercase canonical UUID text. Uppercase UUIDs are not
/// identifiers as far as scanning and rewriting are concerned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Parse and validate identifier text
    ///
    /// # Errors
    /// Returns error if `text` is not a lowercase canonical UUID
    pub fn parse(text: &str) -> Result<Self, IdentifierError> {
        if Self::is_identifier(text) {
            Ok(Self(text.to_owned()))
        } else {
            Err(IdentifierError::Invalid(text.to_owned()))
        }
    }

    /// Check whether `text` is exactly one identifier
    #[inline]
    #[must_use]
    pub fn is_identifier(text: &str) -> bool {
        IDENTIFIER_EXACT_RE.is_match(text)
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the identifier text
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_identifier(&value) {
            Ok(Self(value))
        } else {
            Err(IdentifierError::Invalid(value))
        }
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl From<Uuid> for Identifier {
    fn from(uuid: Uuid) -> Self {
        // Hyphenated formatting is lowercase
        Self(uuid.hyphenated().to_string())
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Old identifier to new identifier correspondence
///
/// Built by the caller, usually by correlating the collections of two
/// controllers by item name. Identifiers absent from the mapping are left
/// alone by [`rewrite_identifiers`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMapping(HashMap<Identifier, Identifier>);

impl IdMapping {
    /// Create empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `old` to `new`, returning the previous target of `old`
    pub fn insert(&mut self, old: Identifier, new: Identifier) -> Option<Identifier> {
        self.0.insert(old, new)
    }

    /// Target of `old`, if mapped
    #[inline]
    #[must_use]
    pub fn get(&self, old: &str) -> Option<&Identifier> {
        self.0.get(old)
    }

    /// Number of mapped identifiers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if nothing is mapped
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if some target is itself a mapped identifier
    ///
    /// Rewriting is only idempotent for mappings without chains.
    #[must_use]
    pub fn has_chains(&self) -> bool {
        self.0.values().any(|new| self.0.contains_key(new))
    }

    /// Iterate over `(old, new)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &Identifier)> {
        self.0.iter()
    }
}

impl FromIterator<(Identifier, Identifier)> for IdMapping {
    fn from_iter<I: IntoIterator<Item = (Identifier, Identifier)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(Identifier, Identifier)> for IdMapping {
    fn extend<I: IntoIterator<Item = (Identifier, Identifier)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl TryFrom<HashMap<String, String>> for IdMapping {
    type Error = IdentifierError;

    fn try_from(raw: HashMap<String, String>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|(old, new)| Ok((Identifier::try_from(old)?, Identifier::try_from(new)?)))
            .collect()
    }
}

/// All distinct identifiers found in the serialized form of `payload`
#[must_use]
pub fn scan_identifiers(payload: &Value) -> BTreeSet<Identifier> {
    let text = payload.to_string();
    IDENTIFIER_RE
        .find_iter(&text)
        .map(|m| Identifier(m.as_str().to_owned()))
        .collect()
}

/// Replace every mapped identifier in `payload`
///
/// Substitution runs over the serialized text, so references are found at any
/// depth, including inside string-encoded JSON. Unmapped identifiers stay
/// byte-identical. Matches have fixed length and alphabet so they never
/// overlap and replacement order does not matter.
///
/// A match can straddle a `\u00XX` escape in the serialized text; if the
/// substituted text no longer parses, each string and key is rewritten on its
/// own instead.
#[must_use]
pub fn rewrite_identifiers(payload: &Value, mapping: &IdMapping) -> Value {
    if mapping.is_empty() {
        return payload.clone();
    }

    let text = payload.to_string();
    let mut replaced = 0_usize;
    let rewritten = substitute(&text, mapping, &mut replaced);
    if replaced == 0 {
        return payload.clone();
    }
    tracing::debug!(replaced, "rewrote identifier references");

    match serde_json::from_str(&rewritten) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "text rewrite broke an escape sequence, rewriting strings individually");
            rewrite_strings(payload, mapping)
        }
    }
}

fn substitute<'t>(text: &'t str, mapping: &IdMapping, replaced: &mut usize) -> Cow<'t, str> {
    IDENTIFIER_RE.replace_all(text, |caps: &Captures<'_>| {
        let matched = &caps[0];
        if let Some(new_id) = mapping.get(matched) {
            *replaced += 1;
            new_id.as_str().to_owned()
        } else {
            matched.to_owned()
        }
    })
}

fn rewrite_strings(value: &Value, mapping: &IdMapping) -> Value {
    let mut replaced = 0_usize;
    match value {
        Value::String(s) => Value::String(substitute(s, mapping, &mut replaced).into_owned()),
        Value::Array(items) => Value::Array(items.iter().map(|item| rewrite_strings(item, mapping)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    (
                        substitute(key, mapping, &mut replaced).into_owned(),
                        rewrite_strings(item, mapping),
                    )
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const A: &str = "11111111-2222-3333-4444-555555555555";
    const B: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";
    const C: &str = "0f0f0f0f-1e1e-2d2d-3c3c-4b4b4b4b4b4b";

    fn id(text: &str) -> Identifier {
        Identifier::parse(text).unwrap()
    }

    fn mapping(pairs: &[(&str, &str)]) -> IdMapping {
        pairs.iter().map(|(old, new)| (id(old), id(new))).collect()
    }

    #[test]
    fn identifier_parse_accepts_lowercase_uuid() {
        assert_eq!(id(A).as_str(), A);
        assert!(Identifier::is_identifier(B));
    }

    #[test]
    fn identifier_parse_rejects_other_text() {
        for text in [
            "",
            "AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE",
            "11111111222233334444555555555555",
            "11111111-2222-3333-4444-5555555555555",
            " 11111111-2222-3333-4444-555555555555",
            "template-1",
        ] {
            assert!(
                matches!(Identifier::parse(text), Err(IdentifierError::Invalid(_))),
                "{text:?} accepted"
            );
        }
    }

    #[test]
    fn identifier_from_uuid_is_lowercase() {
        let uuid = Uuid::from_u128(0xABCD_EF01_2345_6789_ABCD_EF01_2345_6789);
        let ident = Identifier::from(uuid);
        assert_eq!(ident.as_str(), "abcdef01-2345-6789-abcd-ef0123456789");
    }

    #[test]
    fn identifier_serde_validates() {
        let ident: Identifier = serde_json::from_value(json!(A)).unwrap();
        assert_eq!(ident, id(A));
        assert!(serde_json::from_value::<Identifier>(json!("nope")).is_err());
        assert_eq!(serde_json::to_value(&ident).unwrap(), json!(A));
    }

    #[test]
    fn mapping_from_raw_strings() {
        let raw: HashMap<String, String> = [(A.to_owned(), B.to_owned())].into();
        let mapping = IdMapping::try_from(raw).unwrap();
        assert_eq!(mapping.get(A), Some(&id(B)));

        let bad: HashMap<String, String> = [(A.to_owned(), "x".to_owned())].into();
        assert!(IdMapping::try_from(bad).is_err());
    }

    #[test]
    fn mapping_detects_chains() {
        assert!(!mapping(&[(A, B)]).has_chains());
        assert!(mapping(&[(A, B), (B, C)]).has_chains());
    }

    #[test]
    fn scan_finds_nested_and_deduplicates() {
        let payload = json!({
            "templateId": A,
            "generalTemplates": [
                {"templateId": B, "subTemplates": [{"templateId": C}]},
                {"templateId": B}
            ]
        });
        let found = scan_identifiers(&payload);
        assert_eq!(found, [id(A), id(B), id(C)].into_iter().collect());
    }

    #[test]
    fn scan_matches_free_text_and_embedded_json() {
        // Lexical matching: description text and string-encoded JSON count too
        let payload = json!({
            "description": format!("copied from {A}"),
            "definition": format!("{{\"ref\":\"{B}\"}}"),
        });
        let found = scan_identifiers(&payload);
        assert!(found.contains(A));
        assert!(found.contains(B));
    }

    #[test]
    fn scan_ignores_uppercase() {
        let payload = json!({"id": A.to_uppercase()});
        assert!(scan_identifiers(&payload).is_empty());
    }

    #[test]
    fn rewrite_replaces_mapped_only() {
        let payload = json!({"a": A, "list": [B, {"deep": A}], "c": C});
        let rewritten = rewrite_identifiers(&payload, &mapping(&[(A, B)]));
        assert_eq!(rewritten, json!({"a": B, "list": [B, {"deep": B}], "c": C}));
    }

    #[test]
    fn rewrite_reaches_keys_and_embedded_json() {
        let payload = json!({
            A: "keyed by id",
            "definition": format!("{{\"ref\":\"{A}\"}}"),
        });
        let rewritten = rewrite_identifiers(&payload, &mapping(&[(A, C)]));
        assert_eq!(
            rewritten,
            json!({
                C: "keyed by id",
                "definition": format!("{{\"ref\":\"{C}\"}}"),
            })
        );
    }

    #[test]
    fn rewrite_swaps_without_cascading() {
        // A->B and B->A in one pass: each match is looked up once
        let payload = json!([A, B]);
        let rewritten = rewrite_identifiers(&payload, &mapping(&[(A, B), (B, A)]));
        assert_eq!(rewritten, json!([B, A]));
    }

    #[test]
    fn rewrite_survives_match_across_control_escape() {
        // "\u{1f}" serializes as "\u001f", whose hex digits join the text after it
        let payload = json!({"d": "\u{1f}abcd-1111-2222-3333-444444444444", "ref": A});
        let straddling = "001fabcd-1111-2222-3333-444444444444";
        assert!(scan_identifiers(&payload).contains(straddling));

        let map = mapping(&[(straddling, "d8000000-0000-0000-0000-000000000000"), (A, B)]);
        let out = rewrite_identifiers(&payload, &map);
        assert_eq!(out, json!({"d": "\u{1f}abcd-1111-2222-3333-444444444444", "ref": B}));
    }

    #[test]
    fn rewrite_empty_mapping_is_identity() {
        let payload = json!({"a": A, "n": 1.5, "s": "x"});
        assert_eq!(rewrite_identifiers(&payload, &IdMapping::new()), payload);
    }

    fn arb_identifier() -> impl Strategy<Value = Identifier> {
        prop_oneof![Just(A), Just(B), Just(C)]
            .prop_map(id)
            .boxed()
            .prop_union(any::<u128>().prop_map(|n| Identifier::from(Uuid::from_u128(n))).boxed())
    }

    fn arb_payload() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            arb_identifier().prop_map(|i| Value::String(i.into_string())),
            "[a-z ]{0,12}".prop_map(Value::String),
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::Bool),
            Just(Value::Null),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec(("[a-zA-Z]{1,8}", inner), 0..6)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    fn arb_mapping() -> impl Strategy<Value = IdMapping> {
        prop::collection::vec((arb_identifier(), arb_identifier()), 0..4)
            .prop_map(|pairs| pairs.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_rewrite_empty_mapping_unchanged(payload in arb_payload()) {
            prop_assert_eq!(rewrite_identifiers(&payload, &IdMapping::new()), payload);
        }

        #[test]
        fn prop_rewrite_idempotent_without_chains(payload in arb_payload(), mapping in arb_mapping()) {
            prop_assume!(!mapping.has_chains());
            let once = rewrite_identifiers(&payload, &mapping);
            let twice = rewrite_identifiers(&once, &mapping);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_unmapped_identifiers_survive(payload in arb_payload(), mapping in arb_mapping()) {
            let rewritten = rewrite_identifiers(&payload, &mapping);
            let after = scan_identifiers(&rewritten);
            for ident in scan_identifiers(&payload) {
                if mapping.get(ident.as_str()).is_none() {
                    prop_assert!(after.contains(&ident));
                }
            }
        }

        #[test]
        fn prop_mapped_identifiers_replaced(payload in arb_payload(), mapping in arb_mapping()) {
            let rewritten = rewrite_identifiers(&payload, &mapping);
            let after = scan_identifiers(&rewritten);
            for ident in scan_identifiers(&payload) {
                if let Some(new_id) = mapping.get(ident.as_str()) {
                    prop_assert!(after.contains(new_id));
                }
            }
        }
    }
}
