//! Backup of collections and restore of individual items
//!
//! Backup walks an index kind: the index itself is saved, then every member
//! it lists is fetched and saved under its own file name. Restore is split
//! into planning (pure: compare backup against the target) and applying.

use confvault_model::{CollectionRecord, ConfigRecord, FileKey, IdMapping, ItemKind, Record};
use confvault_store::Store;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::gateway::ApiGateway;
use crate::ops::{create, fetch, fetch_optional, update};
use crate::outcome::UpdateOutcome;

/// Counts from one collection backup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupReport {
    /// Member files written
    pub saved: usize,
    /// Members listed in the index but gone or empty on the controller
    pub skipped: usize,
}

/// Back up `index_kind` and every member of `item_kind` it lists
///
/// Members whose sanitized names collide are saved with extended file
/// names.
///
/// # Errors
/// Returns [`ApiError::Transport`] if a fetch fails for a reason other than
/// the member having disappeared, [`ApiError::Store`] if a file cannot be
/// written
pub fn backup_collection(
    api: &dyn ApiGateway,
    store: &Store,
    node_dir: &str,
    index_kind: &'static ItemKind,
    item_kind: &'static ItemKind,
) -> ApiResult<BackupReport> {
    let index: CollectionRecord = fetch(api, index_kind, &[])?;
    store.save(&index, node_dir, &FileKey::fixed())?;
    if index.needs_extended_naming() {
        tracing::info!(kind = index_kind.name, "name collision, using extended file names");
    }

    let mut report = BackupReport::default();
    for member in index.id_names() {
        let key = index.member_file_key(&member);
        let Some(item) = fetch_optional::<ConfigRecord>(api, item_kind, &[member.id])? else {
            tracing::warn!(kind = item_kind.name, name = member.name, "listed item no longer exists");
            report.skipped += 1;
            continue;
        };
        if store.save(&item, node_dir, &key)? {
            report.saved += 1;
        } else {
            report.skipped += 1;
        }
    }

    tracing::info!(
        kind = item_kind.name,
        saved = report.saved,
        skipped = report.skipped,
        "backup complete"
    );
    Ok(report)
}

/// Why restoring an item does nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Factory default, read-only or system-owned item
    Protected,
    /// Target already matches the backup
    Unchanged,
}

/// What restoring an item will do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestorePlan {
    /// Leave the target alone
    Skip(SkipReason),
    /// Replace the existing target item
    Update {
        /// Identifier of the item on the target
        target_id: String,
    },
    /// Item does not exist on the target
    Create,
}

/// Result of applying a [`RestorePlan`]
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// Nothing sent
    Skipped(SkipReason),
    /// Item created; raw controller response
    Created(Value),
    /// Item updated
    Updated(UpdateOutcome),
}

/// Decide how to restore `local` given the target's current payload
///
/// Comparison happens after identifiers in `local` are rewritten with
/// `mapping`, so references already translated to target identifiers do not
/// count as differences.
///
/// # Errors
/// Returns [`ApiError::MissingIdentity`] if the target item exists but
/// carries no identifier
pub fn plan_restore(local: &ConfigRecord, target: Option<&Value>, mapping: &IdMapping) -> ApiResult<RestorePlan> {
    if local.is_readonly() || local.is_system() {
        return Ok(RestorePlan::Skip(SkipReason::Protected));
    }
    let Some(existing) = target else {
        return Ok(RestorePlan::Create);
    };

    let kind = local.kind();
    let rewritten = ConfigRecord::new(kind, local.put_data(mapping));
    if rewritten.is_equal(existing) {
        return Ok(RestorePlan::Skip(SkipReason::Unchanged));
    }

    let target_id = ConfigRecord::new(kind, existing.clone())
        .uuid()
        .map(str::to_owned)
        .ok_or(ApiError::MissingIdentity { kind: kind.name })?;
    Ok(RestorePlan::Update { target_id })
}

/// Carry out `plan` for `local`
///
/// # Errors
/// Returns [`ApiError::Transport`] or [`ApiError::Unsupported`] from the
/// underlying create or update
pub fn apply_restore(
    api: &dyn ApiGateway,
    local: &ConfigRecord,
    plan: &RestorePlan,
    mapping: &IdMapping,
) -> ApiResult<RestoreOutcome> {
    match plan {
        RestorePlan::Skip(reason) => {
            tracing::debug!(kind = local.kind().name, name = local.name(), ?reason, "skipping item");
            Ok(RestoreOutcome::Skipped(*reason))
        }
        RestorePlan::Create => create(api, local, mapping, None).map(RestoreOutcome::Created),
        RestorePlan::Update { target_id } => {
            let outcome = update(api, local, mapping, target_id)?;
            if outcome.needs_reattach() {
                tracing::info!(name = local.name(), "attached devices need re-attach");
            }
            if outcome.needs_reactivate() {
                tracing::info!(name = local.name(), "referencing policies need re-activation");
            }
            Ok(RestoreOutcome::Updated(outcome))
        }
    }
}

/// Restore the backed-up member `key` of `kind` from `node_dir`
///
/// Looks the item up on the target by `target_id` when given, plans, then
/// applies. Returns `Ok(None)` if there is no backup for the item.
///
/// # Errors
/// Any error from loading, fetching, planning or applying
pub fn restore_item(
    api: &dyn ApiGateway,
    store: &Store,
    node_dir: &str,
    kind: &'static ItemKind,
    key: &FileKey<'_>,
    target_id: Option<&str>,
    mapping: &IdMapping,
) -> ApiResult<Option<RestoreOutcome>> {
    let Some(local) = store.load::<ConfigRecord>(kind, node_dir, key)? else {
        tracing::warn!(kind = kind.name, "no backup to restore");
        return Ok(None);
    };

    let existing = match target_id {
        Some(id) => fetch_optional::<ConfigRecord>(api, kind, &[id])?,
        None => None,
    };
    let plan = plan_restore(&local, existing.as_ref().map(Record::data), mapping)?;
    apply_restore(api, &local, &plan, mapping).map(Some)
}
