//! Aggregated session, customer and transaction data for one fingerprinting attempt.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::touch::TouchEvent;
use crate::session::SessionIdentity;

/// Auxiliary sensor classes an embedder can enable for collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SensorExtra {
    Location,
    Accelerometer,
    Gyroscope,
}

impl SensorExtra {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorExtra::Location => "location",
            SensorExtra::Accelerometer => "accelerometer",
            SensorExtra::Gyroscope => "gyroscope",
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            SensorExtra::Location => 0,
            SensorExtra::Accelerometer => 1,
            SensorExtra::Gyroscope => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SensorExtra::Location),
            1 => Some(SensorExtra::Accelerometer),
            2 => Some(SensorExtra::Gyroscope),
            _ => None,
        }
    }
}

/// A business object relevant to the risk evaluation.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    entity: String,
    id: String,
    fields: Map<String, Value>,
}

impl TransactionEntry {
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Owned by the code that created it and mutated from a single thread.
///
/// Identity and transaction strings are plain public fields; nothing is
/// cross-checked on assignment. Collections are append-only and keep
/// insertion order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub customer_id: String,
    pub session_id: String,
    pub user_id: String,
    pub metadata: HashMap<String, Value>,
    pub zone: String,
    pub request_endpoint: String,
    /// Interpreted by the fingerprinting step, not here.
    pub event_types: String,
    pub transaction_sub_customer_id: String,
    pub transaction_info: String,
    pub simility_lite: bool,
    transaction_entries: Vec<TransactionEntry>,
    extras: Vec<SensorExtra>,
    touch_events: Vec<TouchEvent>,
    creation_timestamp: DateTime<Utc>,
}

impl Context {
    /// Empty context stamped with the current time and the identity's current session id.
    pub fn new(identity: &SessionIdentity) -> Self {
        Self {
            customer_id: String::new(),
            session_id: identity.session_id(),
            user_id: String::new(),
            metadata: HashMap::new(),
            zone: String::new(),
            request_endpoint: String::new(),
            event_types: String::new(),
            transaction_sub_customer_id: String::new(),
            transaction_info: String::new(),
            simility_lite: false,
            transaction_entries: Vec::new(),
            extras: Vec::new(),
            touch_events: Vec::new(),
            creation_timestamp: Utc::now(),
        }
    }

    /// Duplicate entities and ids are kept; entries are never merged.
    pub fn add_transaction_entry(
        &mut self,
        entity: impl Into<String>,
        id: impl Into<String>,
        fields: Map<String, Value>,
    ) {
        self.transaction_entries.push(TransactionEntry {
            entity: entity.into(),
            id: id.into(),
            fields,
        });
    }

    pub fn add_touch_event(&mut self, event: TouchEvent) {
        self.touch_events.push(event);
    }

    /// Enables a sensor class. Returns `false` when it was already enabled.
    pub fn add_extra(&mut self, extra: SensorExtra) -> bool {
        if self.extras.contains(&extra) {
            return false;
        }
        self.extras.push(extra);
        true
    }

    pub fn transaction_entries(&self) -> &[TransactionEntry] {
        &self.transaction_entries
    }

    pub fn extras(&self) -> &[SensorExtra] {
        &self.extras
    }

    pub fn touch_events(&self) -> &[TouchEvent] {
        &self.touch_events
    }

    pub fn creation_timestamp(&self) -> DateTime<Utc> {
        self.creation_timestamp
    }

    /// Whether the context carries a usable customer id.
    pub fn has_customer_id(&self) -> bool {
        !self.customer_id.trim().is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
