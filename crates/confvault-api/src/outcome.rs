//! Evaluation of update responses
//!
//! Controllers answer an item update in three shapes: a list of policies
//! that must be re-activated, a master template response wrapped in
//! `{"data": ...}`, or a plain object.

use std::fmt::{self, Display, Formatter};

use serde_json::Value;

/// Key of the attach process started by a template update
pub const PROCESS_ID_KEY: &str = "processId";
/// Key listing master templates touched by a template update
pub const TEMPLATES_AFFECTED_KEY: &str = "masterTemplatesAffected";

/// Normalized update response
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    is_policy: bool,
    is_master: bool,
    data: Value,
}

impl UpdateOutcome {
    /// Evaluate a raw update response
    #[must_use]
    pub fn new(response: Value) -> Self {
        let is_policy = response.is_array();
        let is_master = response.get("data").is_some() && response.is_object();
        let data = match response {
            Value::Object(mut map) if is_master => map.remove("data").unwrap_or(Value::Null),
            other => other,
        };
        Self {
            is_policy,
            is_master,
            data,
        }
    }

    /// Response listed policies
    #[inline]
    #[must_use]
    pub fn is_policy(&self) -> bool {
        self.is_policy
    }

    /// Response came from a master template update
    #[inline]
    #[must_use]
    pub fn is_master(&self) -> bool {
        self.is_master
    }

    /// Unwrapped response payload
    #[inline]
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Attached devices must be re-attached to pick up the change
    #[must_use]
    pub fn needs_reattach(&self) -> bool {
        !self.is_policy && self.data.get(PROCESS_ID_KEY).is_some()
    }

    /// Listed policies must be re-activated to pick up the change
    #[must_use]
    pub fn needs_reactivate(&self) -> bool {
        self.is_policy && self.data.as_array().is_some_and(|policies| !policies.is_empty())
    }

    /// Master templates affected by the change
    pub fn templates_affected(&self) -> impl Iterator<Item = &str> {
        self.data
            .get(TEMPLATES_AFFECTED_KEY)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }
}

impl Display for UpdateOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let pretty = serde_json::to_string_pretty(&self.data).map_err(|_| fmt::Error)?;
        f.write_str(&pretty)
    }
}
