//! Recurring reminder poll.
//!
//! Every firing is isolated: it runs as its own task, detached from the
//! ticker, so no single poll can stall the loop however it ends. Shutdown
//! aborts firings still in flight. There is no
//! deduplication; the same pending alert on two polls notifies twice.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use super::permission::{Notification, Notifier, Permission};
use super::source::ReminderSource;
use crate::clock::SharedClock;
use crate::events::{timestamp, Event};

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const ALERT_TITLE: &str = "Mission Alert";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Permission not granted; the source was not contacted.
    Skipped,
    /// Source reported nothing due.
    Quiet,
    Delivered(String),
    Failed(String),
}

pub struct ReminderPoller {
    source: Arc<dyn ReminderSource>,
    notifier: Arc<dyn Notifier>,
    clock: SharedClock,
    interval: Duration,
}

impl ReminderPoller {
    pub fn new(
        source: Arc<dyn ReminderSource>,
        notifier: Arc<dyn Notifier>,
        clock: SharedClock,
    ) -> Self {
        Self {
            source,
            notifier,
            clock,
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One firing. Never fails; failures are reported as `Failed`.
    pub async fn poll_once(&self) -> PollOutcome {
        if self.notifier.permission() != Permission::Granted {
            return PollOutcome::Skipped;
        }
        match self.source.fetch().await {
            Ok(signal) if signal.alert => {
                self.notifier
                    .notify(Notification::new(ALERT_TITLE, &signal.message));
                tracing::info!(message = %signal.message, "reminder delivered");
                PollOutcome::Delivered(signal.message)
            }
            Ok(_) => PollOutcome::Quiet,
            Err(e) => {
                tracing::warn!(error = %e, "reminder check failed");
                PollOutcome::Failed(e.to_string())
            }
        }
    }

    fn outcome_event(&self, outcome: &PollOutcome) -> Option<Event> {
        let at = timestamp(self.clock.now_ms());
        match outcome {
            PollOutcome::Delivered(message) => Some(Event::ReminderDelivered {
                message: message.clone(),
                at,
            }),
            PollOutcome::Failed(error) => Some(Event::ReminderFailed {
                error: error.clone(),
                at,
            }),
            PollOutcome::Skipped | PollOutcome::Quiet => None,
        }
    }

    fn report(&self, events: Option<&mpsc::UnboundedSender<Event>>, outcome: &PollOutcome) {
        if let (Some(tx), Some(event)) = (events, self.outcome_event(outcome)) {
            let _ = tx.send(event);
        }
    }

    /// Start polling on the current tokio runtime. The first firing happens
    /// one interval from now.
    ///
    /// Delivered and failed polls are reported on `events` when given. A
    /// firing that has not finished by the next tick keeps running next to
    /// the new one.
    pub fn spawn(self, events: Option<mpsc::UnboundedSender<Event>>) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let poller = Arc::new(self);
        let period = poller.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut firings = JoinSet::new();
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let firing = Arc::clone(&poller);
                        let events = events.clone();
                        firings.spawn(async move {
                            let outcome = firing.poll_once().await;
                            firing.report(events.as_ref(), &outcome);
                        });
                    }
                    Some(joined) = firings.join_next() => {
                        if let Err(e) = joined {
                            tracing::warn!(error = %e, "reminder poll aborted");
                            poller.report(events.as_ref(), &PollOutcome::Failed(e.to_string()));
                        }
                    }
                }
            }
            firings.abort_all();
            while firings.join_next().await.is_some() {}
            tracing::debug!("reminder poller stopped");
        });

        PollerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running poller. Dropping the handle also stops it.
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Ask the poller to stop. In-flight firings are aborted. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop and wait for the loop to exit.
    pub async fn join(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "reminder poller join failed");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
