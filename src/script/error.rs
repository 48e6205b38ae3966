//! Failure vocabulary for script execution.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Terminal failure of one execution. Never retried internally.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ScriptError {
    #[error("customer id is missing or empty")]
    InvalidCustomerId,

    #[error("fingerprinting did not finish within its time bound")]
    RequestTimeout,

    #[error("fingerprinting step faulted")]
    RuntimeError,

    #[error("a required remote service could not be reached")]
    ServiceUnavailable,

    #[error("the platform denied a capability required by an enabled sensor")]
    PermissionDenied,

    #[error("a context field failed validation")]
    InvalidParam,
}

impl ScriptError {
    pub const ALL: [ScriptError; 6] = [
        ScriptError::InvalidCustomerId,
        ScriptError::RequestTimeout,
        ScriptError::RuntimeError,
        ScriptError::ServiceUnavailable,
        ScriptError::PermissionDenied,
        ScriptError::InvalidParam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptError::InvalidCustomerId => "invalidCustomerId",
            ScriptError::RequestTimeout => "requestTimeout",
            ScriptError::RuntimeError => "runtimeError",
            ScriptError::ServiceUnavailable => "serviceUnavailable",
            ScriptError::PermissionDenied => "permissionDenied",
            ScriptError::InvalidParam => "invalidParam",
        }
    }

    /// Stable numeric code shared with host-side bindings.
    pub fn code(&self) -> i64 {
        match self {
            ScriptError::InvalidCustomerId => 0,
            ScriptError::RequestTimeout => 1,
            ScriptError::RuntimeError => 2,
            ScriptError::ServiceUnavailable => 3,
            ScriptError::PermissionDenied => 4,
            ScriptError::InvalidParam => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|err| err.code() == code)
    }

    /// Error mapping handed to completion handlers that expect a dictionary.
    pub fn to_map(&self) -> Map<String, Value> {
        match json!({
            "error": self.as_str(),
            "code": self.code(),
            "message": self.to_string(),
        }) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
