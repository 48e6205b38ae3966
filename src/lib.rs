//! On-device core of a behavioral-risk telemetry SDK.
//!
//! An embedder builds a [`Context`], appends [`TouchEvent`]s as they arrive,
//! and hands it to a [`ScriptOrchestrator`], which runs the fingerprinting
//! step off the caller's thread and delivers one [`ScriptOutcome`].

mod utils;

pub mod config;
pub mod models;
pub mod script;
pub mod session;

pub use config::SdkConfig;
pub use models::{Context, Point, SensorExtra, TouchEvent, TouchPhase, TransactionEntry};
pub use script::{
    outcome_to_map, Completion, DebugEvent, DebugSink, ExecutionState, FingerprintEngine,
    ReferenceEngine, ScriptError, ScriptOrchestrator, ScriptOutcome, ScriptResult,
};
pub use session::SessionIdentity;

/// Installs `env_logger` (reads `RUST_LOG`, defaults to info). Safe to call twice.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
