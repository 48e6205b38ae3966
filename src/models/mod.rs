pub mod context;
pub mod touch;

pub use context::{Context, SensorExtra, TransactionEntry};
pub use touch::{Point, TouchEvent, TouchPhase};
