//! Best-effort diagnostic stream emitted while scripts run.
//!
//! Events may be dropped, arrive after the completion, or not fire at all.
//! Nothing in the crate reads them back; they exist for observers only.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::error::ScriptError;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DebugEvent {
    pub message: String,
    pub is_error: bool,
    pub error: Option<ScriptError>,
}

impl DebugEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: ScriptError) -> Self {
        Self {
            message: message.into(),
            is_error: true,
            error: Some(error),
        }
    }
}

type DebugCallback = Arc<dyn Fn(&DebugEvent) + Send + Sync>;

#[derive(Clone, Default)]
enum SinkTarget {
    #[default]
    Disabled,
    Channel(mpsc::Sender<DebugEvent>),
    Callback(DebugCallback),
}

#[derive(Clone, Default)]
pub struct DebugSink {
    target: SinkTarget,
}

impl DebugSink {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Bounded channel sink. Events are dropped once `capacity` are pending.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DebugEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                target: SinkTarget::Channel(tx),
            },
            rx,
        )
    }

    /// Handler-style sink for hosts that pass a `(message, isError, error)` closure.
    pub fn from_fn<F>(handler: F) -> Self
    where
        F: Fn(&DebugEvent) + Send + Sync + 'static,
    {
        Self {
            target: SinkTarget::Callback(Arc::new(handler)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.target, SinkTarget::Disabled)
    }

    pub fn emit(&self, event: DebugEvent) {
        debug!(
            "debug event (error={}): {}",
            event.is_error, event.message
        );

        match &self.target {
            SinkTarget::Disabled => {}
            SinkTarget::Channel(tx) => match tx.try_send(event) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(dropped)) => {
                    warn!("debug channel full; dropped: {}", dropped.message);
                }
            },
            SinkTarget::Callback(handler) => (handler.as_ref())(&event),
        }
    }
}

impl fmt::Debug for DebugSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.target {
            SinkTarget::Disabled => "disabled",
            SinkTarget::Channel(_) => "channel",
            SinkTarget::Callback(_) => "callback",
        };
        f.debug_struct("DebugSink").field("target", &kind).finish()
    }
}
