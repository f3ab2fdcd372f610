//! Item operations against a controller

use confvault_model::{resolve_path, ConfigRecord, IdMapping, ItemKind, Operation, Record};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::gateway::{join_path, ApiGateway};
use crate::outcome::UpdateOutcome;

/// Fetch an item of `kind`, appending `args` to its GET path
///
/// # Errors
/// Returns [`ApiError::Transport`] for any gateway failure, including 404
pub fn fetch<R: Record>(api: &dyn ApiGateway, kind: &'static ItemKind, args: &[&str]) -> ApiResult<R> {
    let template = resolve_path(kind, None).path(Operation::Get).unwrap_or_default();
    let path = join_path(template, args);
    let payload = api.get(&path)?;
    tracing::debug!(kind = kind.name, %path, "fetched item");
    Ok(R::from_payload(kind, payload))
}

/// Fetch an item of `kind`, mapping "not found" to `None`
///
/// # Errors
/// Returns [`ApiError::Transport`] for gateway failures other than 404
pub fn fetch_optional<R: Record>(
    api: &dyn ApiGateway,
    kind: &'static ItemKind,
    args: &[&str],
) -> ApiResult<Option<R>> {
    match fetch(api, kind, args) {
        Ok(record) => Ok(Some(record)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Create `record` on the controller
///
/// The POST path is resolved against the record's own payload.
///
/// # Errors
/// Returns [`ApiError::Unsupported`] if the kind cannot be created,
/// [`ApiError::Transport`] if the request fails
pub fn create(
    api: &dyn ApiGateway,
    record: &ConfigRecord,
    mapping: &IdMapping,
    new_name: Option<&str>,
) -> ApiResult<Value> {
    let kind = record.kind();
    let path = record
        .api_path()
        .path(Operation::Post)
        .ok_or_else(|| ApiError::unsupported(kind.name, Operation::Post))?;
    let response = api.post(path, &record.post_data(mapping, new_name))?;
    tracing::info!(kind = kind.name, name = record.name(), "created item");
    Ok(response)
}

/// Replace item `target_id` on the controller with `record`
///
/// # Errors
/// Returns [`ApiError::Unsupported`] if the kind cannot be updated,
/// [`ApiError::Transport`] if the request fails
pub fn update(
    api: &dyn ApiGateway,
    record: &ConfigRecord,
    mapping: &IdMapping,
    target_id: &str,
) -> ApiResult<UpdateOutcome> {
    let kind = record.kind();
    let template = record
        .api_path()
        .path(Operation::Put)
        .ok_or_else(|| ApiError::unsupported(kind.name, Operation::Put))?;
    let response = api.put(&join_path(template, &[target_id]), &record.put_data(mapping))?;
    tracing::info!(kind = kind.name, name = record.name(), id = target_id, "updated item");
    Ok(UpdateOutcome::new(response))
}

/// Delete item `id` of `kind`
///
/// # Errors
/// Returns [`ApiError::Unsupported`] if the kind cannot be deleted,
/// [`ApiError::Transport`] if the request fails
pub fn delete(api: &dyn ApiGateway, kind: &'static ItemKind, id: &str) -> ApiResult<()> {
    let template = resolve_path(kind, None)
        .path(Operation::Delete)
        .ok_or_else(|| ApiError::unsupported(kind.name, Operation::Delete))?;
    api.delete(&join_path(template, &[id]))?;
    tracing::info!(kind = kind.name, id, "deleted item");
    Ok(())
}
