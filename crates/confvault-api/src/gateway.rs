//! REST gateway seam
//!
//! The transport itself (authentication, sessions, HTTP) lives outside this
//! workspace; it plugs in by implementing [`ApiGateway`].

use serde_json::Value;

/// Failure reported by a gateway implementation
///
/// Surfaces to callers unmodified; nothing in this workspace retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Controller answered with an error status
    #[error("{path}: HTTP {status}: {message}")]
    Status {
        /// Requested path
        path: String,
        /// HTTP status code
        status: u16,
        /// Controller's error text
        message: String,
    },

    /// Request never got an answer
    #[error("{path}: connection failed: {message}")]
    Connection {
        /// Requested path
        path: String,
        /// Failure description
        message: String,
    },
}

impl TransportError {
    /// Create status error
    pub fn status(path: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            path: path.into(),
            status,
            message: message.into(),
        }
    }

    /// Create connection error
    pub fn connection(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if the controller reported the resource as absent
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Authenticated access to one controller
///
/// Paths are relative to the controller's API base, fully expanded (see
/// [`join_path`]).
#[cfg_attr(test, mockall::automock)]
pub trait ApiGateway {
    /// GET `path`
    fn get(&self, path: &str) -> Result<Value, TransportError>;

    /// POST `payload` to `path`
    fn post(&self, path: &str, payload: &Value) -> Result<Value, TransportError>;

    /// PUT `payload` to `path`
    fn put(&self, path: &str, payload: &Value) -> Result<Value, TransportError>;

    /// DELETE `path`
    fn delete(&self, path: &str) -> Result<Value, TransportError>;
}

/// Append path arguments to a path template
///
/// # Examples
/// ```
/// # use confvault_api::join_path;
/// assert_eq!(join_path("template/device/object", &["abc"]), "template/device/object/abc");
/// assert_eq!(join_path("template/device", &[]), "template/device");
/// ```
#[must_use]
pub fn join_path(template: &str, args: &[&str]) -> String {
    args.iter().fold(template.trim_end_matches('/').to_owned(), |mut path, arg| {
        path.push('/');
        path.push_str(arg);
        path
    })
}
