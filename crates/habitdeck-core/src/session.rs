//! Engagement session: every component of one page load, wired together.
//!
//! The session owns the surface, the scheduler and the live labels, and is
//! driven like a page event loop: user actions are method calls, and the
//! host calls [`EngagementSession::tick`] whenever [`EngagementSession::next_due`]
//! comes up. Only the reminder poller runs on its own (as a tokio task).
//!
//! Lifecycle:
//!
//! ```text
//! new -> start -> (actions | tick)* -> teardown
//! ```
//!
//! Teardown happens on navigation or when the host calls it. It cancels every
//! pending job and stops the poller; afterwards nothing new is scheduled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::clock::SharedClock;
use crate::error::Result;
use crate::events::{timestamp, Event};
use crate::feedback::{CompletionToggled, FeedbackEmitter, LabelId, Viewport};
use crate::modes::{Mode, ModeToggle};
use crate::reminders::{
    enable_reminders, request_on_start, Notifier, Permission, PollerHandle, ReminderPoller,
    ReminderSource,
};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::sequencer::{Sequencer, Stage, StageKind, Timeline, TimelineHandle};
use crate::storage::{Config, PreferenceStore};
use crate::surface::{Surface, SurfaceOp};
use crate::unlock::{AdPhase, AdUnlockFlow, UnlockGate};

/// Work the session schedules for itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Stage(Stage),
    RemoveLabel(LabelId),
}

impl From<Stage> for Job {
    fn from(stage: Stage) -> Self {
        Job::Stage(stage)
    }
}

pub struct EngagementSession<S, D> {
    clock: SharedClock,
    surface: D,
    zen: ModeToggle<S>,
    theme: ModeToggle<S>,
    gate: UnlockGate<S>,
    ad: AdUnlockFlow,
    feedback: FeedbackEmitter,
    sequencer: Sequencer,
    jobs: Scheduler<Job>,
    labels: HashMap<LabelId, TaskHandle>,
    notifier: Arc<dyn Notifier>,
    reminder_interval: Duration,
    poller: Option<PollerHandle>,
    reminder_events: Option<mpsc::UnboundedReceiver<Event>>,
    events: Vec<Event>,
    started: bool,
    torn_down: bool,
}

impl<S, D> EngagementSession<S, D>
where
    S: PreferenceStore + Clone,
    D: Surface,
{
    /// Session with default tunables.
    pub fn new(store: S, surface: D, notifier: Arc<dyn Notifier>, clock: SharedClock) -> Self {
        Self::with_config(store, surface, notifier, clock, &Config::default())
    }

    pub fn with_config(
        store: S,
        surface: D,
        notifier: Arc<dyn Notifier>,
        clock: SharedClock,
        config: &Config,
    ) -> Self {
        let gate = UnlockGate::new(store.clone(), Arc::clone(&clock))
            .with_duration_ms(config.unlock_duration_ms())
            .with_fade_ms(config.unlock.fade_ms);
        let viewport = Viewport::new(config.feedback.viewport_width, config.feedback.viewport_height);
        let feedback = FeedbackEmitter::new(viewport)
            .with_label_text(&config.feedback.label_text)
            .with_label_duration_ms(config.feedback.label_duration_ms);

        Self {
            zen: ModeToggle::new(Mode::Focus, store.clone()),
            theme: ModeToggle::new(Mode::Theme, store),
            gate,
            ad: AdUnlockFlow::new(config.unlock.ad_duration_ms),
            feedback,
            sequencer: Sequencer::new(Timeline::genie(&config.genie)),
            jobs: Scheduler::new(),
            labels: HashMap::new(),
            notifier,
            reminder_interval: Duration::from_secs(config.reminders.interval_secs.max(1)),
            poller: None,
            reminder_events: None,
            events: Vec::new(),
            started: false,
            torn_down: false,
            clock,
            surface,
        }
    }

    /// Called when the gated content should render.
    pub fn with_render_hook(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.gate = self.gate.with_render_hook(hook);
        self
    }

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    fn emit(&mut self, event: Event) {
        tracing::debug!(?event, "session event");
        self.events.push(event);
    }

    /// Load-time work: restore both modes, check the gate, and ask for
    /// notification permission if it was never decided. Runs once.
    pub fn start(&mut self) {
        if self.started || self.torn_down {
            return;
        }
        self.started = true;
        let at = timestamp(self.now());

        for mode in [Mode::Focus, Mode::Theme] {
            let toggle = match mode {
                Mode::Focus => &mut self.zen,
                Mode::Theme => &mut self.theme,
            };
            let on = toggle.restore(&mut self.surface);
            self.events.push(Event::ModeRestored { mode, on, at });
        }

        let unlocked = self.gate.check(&mut self.surface);
        if unlocked {
            if let Some(expiry) = self.gate.expiry_ms() {
                self.events.push(Event::Unlocked {
                    expires_at: timestamp(expiry),
                    at,
                });
            }
        }

        let permission = request_on_start(self.notifier.as_ref());
        self.events.push(Event::PermissionResolved { permission, at });
        self.emit(Event::SessionStarted {
            locked: !unlocked,
            at,
        });
        tracing::info!(locked = !unlocked, "session started");
    }

    /// Spawn the reminder poller on the current tokio runtime. No-op when a
    /// poller is already running or the session is torn down.
    pub fn start_reminders(&mut self, source: Arc<dyn ReminderSource>) {
        if self.poller.is_some() || self.torn_down {
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ReminderPoller::new(source, Arc::clone(&self.notifier), Arc::clone(&self.clock))
            .with_interval(self.reminder_interval)
            .spawn(Some(tx));
        self.poller = Some(handle);
        self.reminder_events = Some(rx);
    }

    /// Explicit "enable reminders" action.
    pub fn enable_reminders(&mut self) -> Permission {
        let permission = enable_reminders(self.notifier.as_ref());
        let at = timestamp(self.now());
        self.emit(Event::PermissionResolved { permission, at });
        permission
    }

    pub fn toggle_zen(&mut self) -> Result<bool> {
        self.toggle(Mode::Focus)
    }

    pub fn toggle_theme(&mut self) -> Result<bool> {
        self.toggle(Mode::Theme)
    }

    fn toggle(&mut self, mode: Mode) -> Result<bool> {
        let toggle = match mode {
            Mode::Focus => &mut self.zen,
            Mode::Theme => &mut self.theme,
        };
        let on = toggle.toggle(&mut self.surface)?;
        let at = timestamp(self.now());
        self.emit(Event::ModeToggled { mode, on, at });
        Ok(on)
    }

    pub fn zen_on(&self) -> bool {
        self.zen.is_on()
    }

    pub fn theme_on(&self) -> bool {
        self.theme.is_on()
    }

    /// Start the simulated ad. Returns `false` when ignored.
    pub fn begin_unlock(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        let now = self.now();
        match self.ad.begin(now, &mut self.surface) {
            Some(event) => {
                self.emit(event);
                true
            }
            None => false,
        }
    }

    /// Unlock without waiting for the ad.
    pub fn skip_ad(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        let now = self.now();
        if let Some(event) = self.ad.skip(now, &mut self.gate, &mut self.surface)? {
            self.emit(event);
        }
        Ok(())
    }

    pub fn gate(&self) -> &UnlockGate<S> {
        &self.gate
    }

    pub fn ad_phase(&self) -> AdPhase {
        self.ad.phase()
    }

    /// Start a genie timeline. Returns `None` after teardown.
    pub fn trigger_genie(&mut self) -> Option<TimelineHandle> {
        if self.torn_down {
            return None;
        }
        let now = self.now();
        let handle = self.sequencer.trigger(now, &mut self.surface, &mut self.jobs);
        let at = timestamp(now);
        for stage in &handle.fired {
            self.events.push(Event::StageFired { stage: *stage, at });
        }
        if handle.navigated() {
            self.navigated(now);
        }
        Some(handle)
    }

    /// Cancel the stages of a triggered timeline that have not run yet.
    /// Returns how many were cancelled.
    pub fn cancel_timeline(&mut self, handle: &TimelineHandle) -> usize {
        let cancelled = handle.cancel(&mut self.jobs);
        tracing::debug!(cancelled, "timeline cancelled");
        cancelled
    }

    /// React to a completion control toggle. Returns the label spawned, if
    /// the toggle was a completion.
    pub fn on_completion(&mut self, toggled: &CompletionToggled) -> Option<LabelId> {
        if self.torn_down {
            return None;
        }
        let now = self.now();
        let (_, label) = self.feedback.on_completion(toggled, &mut self.surface)?;
        let task = self
            .jobs
            .schedule_after(now, label.duration_ms, Job::RemoveLabel(label.id));
        self.labels.insert(label.id, task);
        self.emit(Event::FeedbackEmitted {
            x: toggled.x,
            y: toggled.y,
            label: label.id,
            at: timestamp(now),
        });
        Some(label.id)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.feedback.set_viewport(viewport);
    }

    /// Labels spawned and not yet removed.
    pub fn live_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Earliest instant at which `tick` has work.
    pub fn next_due(&self) -> Option<u64> {
        if self.torn_down {
            return None;
        }
        match (self.jobs.next_due(), self.ad.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run everything due by now.
    ///
    /// # Errors
    /// An unlock write failure from the ad flow. Scheduled jobs that already
    /// ran stay run.
    pub fn tick(&mut self) -> Result<()> {
        self.collect_reminder_events();
        if self.torn_down {
            return Ok(());
        }
        let now = self.now();

        while let Some((_, job)) = self.jobs.pop_due(now) {
            match job {
                Job::RemoveLabel(id) => {
                    if self.labels.remove(&id).is_some() {
                        self.surface.apply(SurfaceOp::RemoveLabel { id });
                        self.emit(Event::LabelRemoved {
                            label: id,
                            at: timestamp(now),
                        });
                    }
                }
                Job::Stage(stage) => {
                    stage.run(&mut self.surface);
                    self.emit(Event::StageFired {
                        stage: stage.kind,
                        at: timestamp(now),
                    });
                    if stage.is_terminal() {
                        self.navigated(now);
                        return Ok(());
                    }
                }
            }
        }

        while let Some(event) = self.ad.tick(now, &mut self.gate, &mut self.surface)? {
            self.emit(event);
        }
        Ok(())
    }

    fn navigated(&mut self, now: u64) {
        let destination = self
            .sequencer
            .timeline()
            .stages()
            .iter()
            .find(|stage| stage.kind == StageKind::Navigate)
            .and_then(|stage| {
                stage.ops.iter().find_map(|op| match op {
                    SurfaceOp::Navigate { destination } => Some(destination.clone()),
                    _ => None,
                })
            })
            .unwrap_or_default();
        self.emit(Event::Navigated {
            destination,
            at: timestamp(now),
        });
        self.teardown();
    }

    fn collect_reminder_events(&mut self) {
        let Some(rx) = self.reminder_events.as_mut() else {
            return;
        };
        let mut received = Vec::new();
        while let Ok(event) = rx.try_recv() {
            received.push(event);
        }
        self.events.extend(received);
    }

    /// Events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.collect_reminder_events();
        std::mem::take(&mut self.events)
    }

    /// Cancel every pending job, stop the poller and forget live labels.
    /// Idempotent; only the first call reports.
    pub fn teardown(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        self.torn_down = true;
        let mut cancelled = self.jobs.clear();
        if self.ad.next_due().is_some() {
            cancelled += 1;
        }
        self.labels.clear();
        if let Some(mut poller) = self.poller.take() {
            poller.shutdown();
        }
        self.collect_reminder_events();
        self.reminder_events = None;
        let at = timestamp(self.now());
        self.emit(Event::SessionEnded {
            cancelled_jobs: cancelled,
            at,
        });
        tracing::info!(cancelled_jobs = cancelled, "session torn down");
        cancelled
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut D {
        &mut self.surface
    }

    /// Tick until nothing is scheduled, sleeping between due times. Only
    /// meaningful with a clock that follows real time.
    pub async fn settle(&mut self) -> Result<()> {
        while let Some(due) = self.next_due() {
            let wait = due.saturating_sub(self.now());
            if wait > 0 {
                tokio::time::sleep(Duration::from_millis(wait)).await;
            }
            self.tick()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::feedback::CompletionState;
    use crate::reminders::MemoryNotifier;
    use crate::storage::{keys, MemoryStore};
    use crate::surface::{DocumentState, Element};
    use crate::unlock::UNLOCK_DURATION_MS;

    const T0: u64 = 1_700_000_000_000;

    struct Fixture {
        clock: ManualClock,
        store: MemoryStore,
        notifier: Arc<MemoryNotifier>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                clock: ManualClock::new(T0),
                store: MemoryStore::new(),
                notifier: Arc::new(MemoryNotifier::new(Permission::Unknown)),
            }
        }

        fn session(&self) -> EngagementSession<MemoryStore, DocumentState> {
            let notifier: Arc<dyn Notifier> = self.notifier.clone();
            EngagementSession::new(
                self.store.clone(),
                DocumentState::new(),
                notifier,
                Arc::new(self.clock.clone()),
            )
        }
    }

    fn completion(x: f64, y: f64) -> CompletionToggled {
        CompletionToggled {
            habit_id: Some(1),
            prior: CompletionState::Incomplete,
            new: CompletionState::Complete,
            x,
            y,
        }
    }

    #[test]
    fn start_restores_and_asks_permission_once() {
        let fx = Fixture::new();
        fx.store.set(keys::ZEN_MODE, "true").unwrap();
        let mut session = fx.session();
        session.start();
        session.start();

        assert!(session.zen_on());
        assert!(!session.theme_on());
        assert_eq!(fx.notifier.requests(), 1);
        let events = session.drain_events();
        assert!(matches!(
            events.last(),
            Some(Event::SessionStarted { locked: true, .. })
        ));
    }

    #[test]
    fn valid_unlock_hides_overlay_at_start() {
        let fx = Fixture::new();
        fx.store
            .set(keys::UNLOCK_EXPIRY, &(T0 + 1_000).to_string())
            .unwrap();
        let mut session = fx.session();
        session.start();
        assert!(!session.surface().is_visible(Element::AdOverlay));
        assert!(session
            .drain_events()
            .iter()
            .any(|e| matches!(e, Event::Unlocked { .. })));
    }

    #[test]
    fn ad_flow_unlocks_then_hides_overlay() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.start();
        assert!(session.begin_unlock());
        assert!(!session.begin_unlock());

        fx.clock.advance(4_999);
        session.tick().unwrap();
        assert!(session.gate().is_locked());

        fx.clock.advance(1);
        session.tick().unwrap();
        assert!(!session.gate().is_locked());
        assert_eq!(session.gate().remaining_ms(), UNLOCK_DURATION_MS);
        assert_eq!(
            session.surface().visibility(Element::AdOverlay),
            crate::surface::Visibility::Faded
        );

        fx.clock.advance(500);
        session.tick().unwrap();
        assert_eq!(
            session.surface().visibility(Element::AdOverlay),
            crate::surface::Visibility::Hidden
        );
        assert_eq!(session.ad_phase(), AdPhase::Finished);
    }

    #[test]
    fn label_is_removed_exactly_at_its_deadline() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.start();
        let id = session.on_completion(&completion(10.0, 10.0)).unwrap();
        assert_eq!(session.live_labels(), 1);

        fx.clock.advance(799);
        session.tick().unwrap();
        assert_eq!(session.surface().labels().count(), 1);

        fx.clock.advance(1);
        session.tick().unwrap();
        assert_eq!(session.surface().labels().count(), 0);
        assert_eq!(session.live_labels(), 0);

        fx.clock.advance(10_000);
        session.tick().unwrap();
        let removals = session
            .surface()
            .count_ops(|op| matches!(op, SurfaceOp::RemoveLabel { id: removed } if *removed == id));
        assert_eq!(removals, 1);
    }

    #[test]
    fn genie_navigation_tears_the_session_down() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.start();
        session.trigger_genie().unwrap();
        session.on_completion(&completion(1.0, 1.0));

        fx.clock.advance(1_000);
        session.tick().unwrap();
        assert!(session.surface().is_visible(Element::GenieText));

        fx.clock.advance(2_200);
        session.tick().unwrap();
        assert_eq!(session.surface().location(), Some("/genie"));
        assert!(session.is_torn_down());
        assert_eq!(session.pending_jobs(), 0);
        assert_eq!(session.next_due(), None);

        let events = session.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Navigated { destination, .. } if destination == "/genie")));
        assert!(matches!(
            events.last(),
            Some(Event::SessionEnded { .. })
        ));
    }

    #[test]
    fn cancelled_timeline_stops_before_navigation() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.start();
        let first = session.trigger_genie().unwrap();
        let second = session.trigger_genie().unwrap();

        fx.clock.advance(1_000);
        session.tick().unwrap();
        assert_eq!(session.cancel_timeline(&first), 1);
        assert_eq!(session.cancel_timeline(&first), 0);
        assert_eq!(session.cancel_timeline(&second), 1);

        fx.clock.advance(10_000);
        session.tick().unwrap();
        assert_eq!(session.surface().location(), None);
        assert!(!session.is_torn_down());
        assert_eq!(session.next_due(), None);
    }

    #[test]
    fn teardown_is_idempotent_and_cancels_everything() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.start();
        session.trigger_genie();
        session.on_completion(&completion(1.0, 1.0));
        session.begin_unlock();

        assert_eq!(session.teardown(), 4);
        assert_eq!(session.teardown(), 0);

        fx.clock.advance(60_000);
        session.tick().unwrap();
        assert!(session.surface().location().is_none());
        assert!(session.gate().is_locked());
        assert!(session.trigger_genie().is_none());
        assert!(session.on_completion(&completion(1.0, 1.0)).is_none());
    }

    #[test]
    fn toggles_emit_events() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.start();
        session.drain_events();
        assert!(session.toggle_theme().unwrap());
        assert_eq!(fx.store.get(keys::THEME).unwrap().as_deref(), Some("light"));
        assert!(matches!(
            session.drain_events().as_slice(),
            [Event::ModeToggled {
                mode: Mode::Theme,
                on: true,
                ..
            }]
        ));
    }

    #[test]
    fn skip_ad_unlocks_immediately() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.start();
        session.skip_ad().unwrap();
        assert!(!session.gate().is_locked());
    }
}
