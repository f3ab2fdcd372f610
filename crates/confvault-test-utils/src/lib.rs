//! Testing utilities for Confvault workspace
//!
//! Shared fixtures and an in-memory controller gateway.

#![allow(missing_docs)]

use std::collections::HashMap;

use confvault_api::{ApiGateway, TransportError};
use confvault_model::Identifier;
use confvault_store::{Store, StoreConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use uuid::Uuid;

pub fn new_identifier() -> Identifier {
    Identifier::from(Uuid::new_v4())
}

/// Store rooted in a fresh temporary directory; keep the `TempDir` alive
pub fn temp_store() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let store = Store::new(StoreConfig::new().with_root_dir(dir.path()));
    (dir, store)
}

/// Device template referencing the given feature templates
pub fn device_template(id: &Identifier, name: &str, features: &[&Identifier]) -> Value {
    let general: Vec<Value> = features
        .iter()
        .map(|feature| json!({"templateId": feature.as_str(), "templateType": "cisco_system"}))
        .collect();
    json!({
        "templateId": id.as_str(),
        "templateName": name,
        "templateDescription": format!("{name} template"),
        "deviceType": "vedge-cloud",
        "configType": "template",
        "factoryDefault": false,
        "generalTemplates": general,
        "lastUpdatedOn": 1_700_000_000_000_u64,
    })
}

/// Index response in its `{"data": [...]}` envelope
pub fn template_index<'a>(members: impl IntoIterator<Item = (&'a Identifier, &'a str)>) -> Value {
    let data: Vec<Value> = members
        .into_iter()
        .map(|(id, name)| json!({"templateId": id.as_str(), "templateName": name}))
        .collect();
    json!({ "data": data })
}

/// Recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Get(String),
    Post(String, Value),
    Put(String, Value),
    Delete(String),
}

/// Controller stand-in serving canned payloads by path
///
/// Unknown GET paths answer 404. POST and PUT answer with the
/// response registered for the path, or `{}`.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    resources: Mutex<HashMap<String, Value>>,
    responses: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<Request>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_resource(self, path: impl Into<String>, payload: Value) -> Self {
        self.resources.lock().insert(path.into(), payload);
        self
    }

    #[must_use]
    pub fn with_response(self, path: impl Into<String>, response: Value) -> Self {
        self.responses.lock().insert(path.into(), response);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Payloads sent with POST or PUT, in order
    pub fn submitted(&self) -> Vec<(String, Value)> {
        self.requests
            .lock()
            .iter()
            .filter_map(|request| match request {
                Request::Post(path, payload) | Request::Put(path, payload) => Some((path.clone(), payload.clone())),
                _ => None,
            })
            .collect()
    }

    fn respond(&self, path: &str) -> Value {
        self.responses.lock().get(path).cloned().unwrap_or_else(|| json!({}))
    }
}

impl ApiGateway for MemoryGateway {
    fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.requests.lock().push(Request::Get(path.to_owned()));
        self.resources
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::status(path, 404, "not found"))
    }

    fn post(&self, path: &str, payload: &Value) -> Result<Value, TransportError> {
        self.requests.lock().push(Request::Post(path.to_owned(), payload.clone()));
        Ok(self.respond(path))
    }

    fn put(&self, path: &str, payload: &Value) -> Result<Value, TransportError> {
        self.requests.lock().push(Request::Put(path.to_owned(), payload.clone()));
        Ok(self.respond(path))
    }

    fn delete(&self, path: &str) -> Result<Value, TransportError> {
        self.requests.lock().push(Request::Delete(path.to_owned()));
        self.resources.lock().remove(path);
        Ok(Value::Null)
    }
}
