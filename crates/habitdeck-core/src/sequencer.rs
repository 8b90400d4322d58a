//! Staged animation sequencer ("genie").
//!
//! A [`Timeline`] is a fixed list of stages anchored at one trigger instant.
//! Stages due at offset zero run synchronously inside `trigger`; the rest
//! are handed to the owner's [`Scheduler`]. Triggers are not guarded: two
//! triggers produce two overlapping timelines.

use serde::{Deserialize, Serialize};

use crate::scheduler::{Scheduler, TaskHandle};
use crate::storage::GenieConfig;
use crate::surface::{Element, Surface, SurfaceOp};

/// Vibration pattern in milliseconds: on, off, on.
pub const HAPTIC_PATTERN_MS: [u64; 3] = [200, 100, 300];
pub const SHAKE_CLASS: &str = "screen-shake";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Haptic,
    Media,
    RevealText,
    Navigate,
}

/// One stage of a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub kind: StageKind,
    pub offset_ms: u64,
    pub ops: Vec<SurfaceOp>,
}

impl Stage {
    fn new(kind: StageKind, offset_ms: u64, ops: Vec<SurfaceOp>) -> Self {
        Self {
            kind,
            offset_ms,
            ops,
        }
    }

    /// Navigation ends the page; whoever runs this stage tears down.
    pub fn is_terminal(&self) -> bool {
        self.kind == StageKind::Navigate
    }

    pub fn run(&self, surface: &mut dyn Surface) {
        for op in &self.ops {
            surface.apply(op.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    stages: Vec<Stage>,
}

impl Timeline {
    pub fn genie(config: &GenieConfig) -> Self {
        let stages = vec![
            Stage::new(
                StageKind::Haptic,
                0,
                vec![SurfaceOp::Vibrate {
                    pattern_ms: HAPTIC_PATTERN_MS.to_vec(),
                }],
            ),
            Stage::new(
                StageKind::Media,
                0,
                vec![
                    SurfaceOp::Show {
                        target: Element::GenieOverlay,
                    },
                    SurfaceOp::add_class(Element::Body, SHAKE_CLASS),
                    SurfaceOp::PlayMedia {
                        target: Element::GenieVideo,
                    },
                ],
            ),
            Stage::new(
                StageKind::RevealText,
                config.reveal_delay_ms,
                vec![SurfaceOp::Show {
                    target: Element::GenieText,
                }],
            ),
            Stage::new(
                StageKind::Navigate,
                config.navigate_delay_ms,
                vec![SurfaceOp::Navigate {
                    destination: config.destination.clone(),
                }],
            ),
        ];
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::genie(&GenieConfig::default())
    }
}

/// One triggered timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineHandle {
    pub started_ms: u64,
    /// Stages run synchronously by `trigger`, in order.
    pub fired: Vec<StageKind>,
    /// Scheduled stages still owned by the scheduler.
    pub pending: Vec<TaskHandle>,
}

impl TimelineHandle {
    /// Whether a stage run by `trigger` ended the page.
    pub fn navigated(&self) -> bool {
        self.fired.contains(&StageKind::Navigate)
    }

    /// Cancel every stage that has not run yet. Returns how many were
    /// cancelled.
    pub fn cancel<J>(&self, scheduler: &mut Scheduler<J>) -> usize {
        self.pending
            .iter()
            .filter(|handle| scheduler.cancel(**handle).is_some())
            .count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    timeline: Timeline,
}

impl Sequencer {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Start a timeline at `now_ms`.
    ///
    /// Immediate stages run against `surface` before this returns, stopping
    /// at a terminal stage. Delayed stages are scheduled on `scheduler`.
    pub fn trigger<J: From<Stage>>(
        &self,
        now_ms: u64,
        surface: &mut dyn Surface,
        scheduler: &mut Scheduler<J>,
    ) -> TimelineHandle {
        let mut handle = TimelineHandle {
            started_ms: now_ms,
            fired: Vec::new(),
            pending: Vec::new(),
        };
        for stage in &self.timeline.stages {
            if stage.offset_ms == 0 {
                stage.run(surface);
                handle.fired.push(stage.kind);
                if stage.is_terminal() {
                    break;
                }
            } else {
                let task = scheduler.schedule_after(now_ms, stage.offset_ms, stage.clone().into());
                handle.pending.push(task);
            }
        }
        tracing::debug!(
            started_ms = now_ms,
            fired = handle.fired.len(),
            pending = handle.pending.len(),
            "timeline triggered"
        );
        handle
    }
}
