//! Reminder polling and notification delivery.

mod permission;
mod poller;
mod source;

pub use permission::{
    enable_reminders, request_on_start, MemoryNotifier, Notification, Notifier, Permission,
};
pub use poller::{PollOutcome, PollerHandle, ReminderPoller, ALERT_TITLE, POLL_INTERVAL};
pub use source::{HttpReminderSource, ReminderSignal, ReminderSource};
