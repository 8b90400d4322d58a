//! # Habitdeck Core Library
//!
//! This library provides the client-side engagement layer of the Habitdeck
//! habit tracker: the pieces that sit between a page of habit controls and
//! the user. Every operation is host-agnostic; the `habitdeck` CLI and any
//! browser or desktop shell drive the same components.
//!
//! ## Architecture
//!
//! - **Unlock Gate**: An expiry-timestamp gate that re-locks a feature after a
//!   fixed window, fronted by a simulated ad flow
//! - **Modes**: Persisted focus (zen) and theme flags mirrored into
//!   presentation
//! - **Reminders**: A background poller that turns server alerts into
//!   notifications, gated on permission
//! - **Sequencer**: Fixed, delayed-effect timelines ending in navigation
//! - **Feedback**: Spark burst and floating label on habit completion
//! - **Session**: The tick-driven owner of all of the above
//!
//! Components never touch markup directly; they emit [`SurfaceOp`]s to a
//! host-provided [`Surface`].
//!
//! ## Key Components
//!
//! - [`EngagementSession`]: Wires every component for one page load
//! - [`UnlockGate`]: Wall-clock unlock state
//! - [`PreferenceStore`]: Injected key-value persistence ([`Database`],
//!   [`MemoryStore`])
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod feedback;
pub mod modes;
pub mod reminders;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod storage;
pub mod surface;
pub mod unlock;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{ConfigError, CoreError, ReminderError, StoreError};
pub use events::Event;
pub use feedback::{CompletionControl, CompletionState, CompletionToggled, FeedbackEmitter};
pub use modes::{Mode, ModeToggle};
pub use reminders::{HttpReminderSource, Notifier, Permission, ReminderPoller, ReminderSource};
pub use scheduler::{Scheduler, TaskHandle};
pub use sequencer::{Sequencer, StageKind, Timeline, TimelineHandle};
pub use session::EngagementSession;
pub use storage::{Config, Database, MemoryStore, PreferenceStore};
pub use surface::{DocumentState, Element, Surface, SurfaceOp};
pub use unlock::{AdUnlockFlow, UnlockGate};
