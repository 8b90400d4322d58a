use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feedback::LabelId;
use crate::modes::Mode;
use crate::reminders::Permission;
use crate::sequencer::StageKind;

/// Every state change in the engagement layer produces an Event.
/// Hosts drain them from the session; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        locked: bool,
        at: DateTime<Utc>,
    },
    ModeRestored {
        mode: Mode,
        on: bool,
        at: DateTime<Utc>,
    },
    ModeToggled {
        mode: Mode,
        on: bool,
        at: DateTime<Utc>,
    },
    AdStarted {
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// The gate opened. Also emitted at load when a previous unlock is still
    /// valid.
    Unlocked {
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    OverlayHidden {
        at: DateTime<Utc>,
    },
    PermissionResolved {
        permission: Permission,
        at: DateTime<Utc>,
    },
    ReminderDelivered {
        message: String,
        at: DateTime<Utc>,
    },
    ReminderFailed {
        error: String,
        at: DateTime<Utc>,
    },
    StageFired {
        stage: StageKind,
        at: DateTime<Utc>,
    },
    FeedbackEmitted {
        x: f64,
        y: f64,
        label: LabelId,
        at: DateTime<Utc>,
    },
    LabelRemoved {
        label: LabelId,
        at: DateTime<Utc>,
    },
    Navigated {
        destination: String,
        at: DateTime<Utc>,
    },
    SessionEnded {
        cancelled_jobs: usize,
        at: DateTime<Utc>,
    },
}

/// Converts epoch milliseconds into an event timestamp.
pub fn timestamp(ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}
