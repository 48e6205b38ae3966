use serde::{Deserialize, Serialize};
use serde_json::json;

/// Lifecycle phase of a touch, in the order the platform reports them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Cancelled,
}

impl TouchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TouchPhase::Began => "began",
            TouchPhase::Moved => "moved",
            TouchPhase::Stationary => "stationary",
            TouchPhase::Ended => "ended",
            TouchPhase::Cancelled => "cancelled",
        }
    }

    /// Ordinal used by the platform touch APIs.
    pub fn code(&self) -> u8 {
        match self {
            TouchPhase::Began => 0,
            TouchPhase::Moved => 1,
            TouchPhase::Stationary => 2,
            TouchPhase::Ended => 3,
            TouchPhase::Cancelled => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TouchPhase::Began),
            1 => Some(TouchPhase::Moved),
            2 => Some(TouchPhase::Stationary),
            3 => Some(TouchPhase::Ended),
            4 => Some(TouchPhase::Cancelled),
            _ => None,
        }
    }
}

/// Device-local coordinates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One captured interaction sample.
///
/// Fields are fixed at construction; `json` is rendered once from them and is
/// what transport collaborators forward verbatim. Inputs are not validated: a
/// zero force (unsupported hardware) or an old timestamp is recorded as given.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TouchEvent {
    timestamp: f64,
    phase: TouchPhase,
    location: Point,
    force: f64,
    #[serde(skip)]
    json: String,
}

impl TouchEvent {
    pub fn new(timestamp: f64, phase: TouchPhase, location: Point, force: f64) -> Self {
        let json = render_json(timestamp, phase, location, force);
        Self {
            timestamp,
            phase,
            location,
            force,
            json,
        }
    }

    /// Seconds on the event clock the touch source reported.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn phase(&self) -> TouchPhase {
        self.phase
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn force(&self) -> f64 {
        self.force
    }

    pub fn json(&self) -> &str {
        &self.json
    }
}

// serde_json's default map is ordered by key, so the rendering is stable for
// equal inputs.
fn render_json(timestamp: f64, phase: TouchPhase, location: Point, force: f64) -> String {
    json!({
        "timestamp": timestamp,
        "phase": phase.as_str(),
        "x": location.x,
        "y": location.y,
        "force": force,
    })
    .to_string()
}
