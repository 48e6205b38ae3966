pub mod debug;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod payload;
pub mod state;

pub use debug::{DebugEvent, DebugSink};
pub use engine::{FingerprintEngine, ReferenceEngine, ScriptResult, DEVICE_ID_KEY};
pub use error::ScriptError;
pub use orchestrator::{outcome_to_map, Completion, ScriptOrchestrator, ScriptOutcome};
pub use payload::{ExecutionMode, ScriptPayload};
pub use state::ExecutionState;
