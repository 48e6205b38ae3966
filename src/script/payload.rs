use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Context, SensorExtra, TouchEvent, TransactionEntry};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionMode {
    /// Full collection: transactions, touches, extras.
    Full,
    /// Identity only; yields a device id.
    DeviceId,
}

/// Owned snapshot of a `Context` handed to the fingerprinting step.
///
/// Taken at call time so the caller keeps mutating its context while the step
/// runs elsewhere.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptPayload {
    pub mode: ExecutionMode,
    pub customer_id: String,
    pub session_id: String,
    pub user_id: String,
    pub zone: String,
    pub request_endpoint: String,
    pub simility_lite: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub event_types: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub transaction_sub_customer_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub transaction_info: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transaction_entries: Vec<TransactionEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<SensorExtra>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub touch_events: Vec<TouchEvent>,
}

impl ScriptPayload {
    pub fn full(context: &Context) -> Self {
        let mut payload = Self::identity(context, ExecutionMode::Full);
        payload.metadata = context.metadata.clone();
        payload.event_types = context.event_types.clone();
        payload.transaction_sub_customer_id = context.transaction_sub_customer_id.clone();
        payload.transaction_info = context.transaction_info.clone();
        payload.transaction_entries = context.transaction_entries().to_vec();

        // Lite mode trims the behavioral signal set.
        if !context.simility_lite {
            payload.extras = context.extras().to_vec();
            payload.touch_events = context.touch_events().to_vec();
        }
        payload
    }

    pub fn device_only(context: &Context) -> Self {
        Self::identity(context, ExecutionMode::DeviceId)
    }

    fn identity(context: &Context, mode: ExecutionMode) -> Self {
        Self {
            mode,
            customer_id: context.customer_id.clone(),
            session_id: context.session_id.clone(),
            user_id: context.user_id.clone(),
            zone: context.zone.clone(),
            request_endpoint: context.request_endpoint.clone(),
            simility_lite: context.simility_lite,
            created_at: context.creation_timestamp(),
            metadata: HashMap::new(),
            event_types: String::new(),
            transaction_sub_customer_id: String::new(),
            transaction_info: String::new(),
            transaction_entries: Vec::new(),
            extras: Vec::new(),
            touch_events: Vec::new(),
        }
    }
}
