//! Seam to the fingerprinting step.
//!
//! The orchestrator only knows `FingerprintEngine`; the algorithm behind it
//! lives with the embedder. `ReferenceEngine` covers the contract end to end
//! without deriving any real risk signal.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::debug::{DebugEvent, DebugSink};
use super::error::ScriptError;
use super::payload::{ExecutionMode, ScriptPayload};
use crate::models::SensorExtra;

pub type ScriptResult = Map<String, Value>;

/// The fingerprinting step. Called on a blocking worker, once per execution.
pub trait FingerprintEngine: Send + Sync + 'static {
    fn run(&self, payload: &ScriptPayload, debug: &DebugSink) -> Result<ScriptResult, ScriptError>;
}

pub const DEVICE_ID_KEY: &str = "deviceId";

pub struct ReferenceEngine {
    device_id: String,
    granted: HashSet<SensorExtra>,
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceEngine {
    /// Fresh device id; every sensor class granted.
    pub fn new() -> Self {
        Self::with_device_id(Uuid::new_v4().to_string())
    }

    pub fn with_device_id(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            granted: [
                SensorExtra::Location,
                SensorExtra::Accelerometer,
                SensorExtra::Gyroscope,
            ]
            .into_iter()
            .collect(),
        }
    }

    /// Simulates the platform refusing access to a sensor class.
    pub fn deny(mut self, extra: SensorExtra) -> Self {
        self.granted.remove(&extra);
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

impl FingerprintEngine for ReferenceEngine {
    fn run(&self, payload: &ScriptPayload, debug: &DebugSink) -> Result<ScriptResult, ScriptError> {
        if !is_valid_endpoint(&payload.request_endpoint) {
            return Err(ScriptError::InvalidParam);
        }

        if let Some(denied) = payload
            .extras
            .iter()
            .find(|extra| !self.granted.contains(*extra))
        {
            debug.emit(DebugEvent::failure(
                format!("{} access denied", denied.as_str()),
                ScriptError::PermissionDenied,
            ));
            return Err(ScriptError::PermissionDenied);
        }

        let mut result = Map::new();
        result.insert(DEVICE_ID_KEY.into(), json!(self.device_id));
        result.insert("sessionId".into(), json!(payload.session_id));

        if payload.mode == ExecutionMode::Full {
            result.insert("customerId".into(), json!(payload.customer_id));
            result.insert("touchCount".into(), json!(payload.touch_events.len()));
            result.insert(
                "transactionCount".into(),
                json!(payload.transaction_entries.len()),
            );
            result.insert("extras".into(), json!(payload.extras));
            result.insert("lite".into(), json!(payload.simility_lite));
            result.insert("collectedAt".into(), json!(Utc::now().to_rfc3339()));
        }

        debug.emit(DebugEvent::info(format!(
            "fingerprint collected ({} touches)",
            payload.touch_events.len()
        )));
        Ok(result)
    }
}

/// Empty means "use the default backend". Anything else must be an http(s)
/// URL with a host.
pub fn is_valid_endpoint(endpoint: &str) -> bool {
    if endpoint.is_empty() {
        return true;
    }
    let rest = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}
