//! Completion feedback: a spark burst and a floating label, fired only when a
//! habit moves from incomplete to complete.
//!
//! The control renderer publishes a typed [`CompletionToggled`] event.
//! [`CompletionControl`] adapts a plain link-plus-icon control into that
//! event for hosts that still delegate clicks.

mod burst;
mod label;

pub use burst::{Burst, BurstStyle, Particle, Viewport};
pub use label::{FloatingLabel, LabelId, LABEL_DURATION_MS};

use serde::{Deserialize, Serialize};

use crate::surface::{Surface, SurfaceOp};

pub const DEFAULT_LABEL_TEXT: &str = "PROTOCOL EXECUTED";

/// Route fragment of the completion endpoint.
pub const COMPLETION_ROUTE: &str = "toggle_habit";

/// Icon class of an incomplete habit.
pub const INCOMPLETE_ICON: &str = "bi-square";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    Incomplete,
    Complete,
}

impl CompletionState {
    pub fn flipped(self) -> Self {
        match self {
            CompletionState::Incomplete => CompletionState::Complete,
            CompletionState::Complete => CompletionState::Incomplete,
        }
    }
}

/// Published by the completion control renderer on every toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionToggled {
    pub habit_id: Option<i64>,
    pub prior: CompletionState,
    pub new: CompletionState,
    pub x: f64,
    pub y: f64,
}

impl CompletionToggled {
    pub fn is_completion(&self) -> bool {
        self.prior == CompletionState::Incomplete && self.new == CompletionState::Complete
    }
}

/// A rendered completion control: its link target and its icon classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionControl {
    pub href: String,
    /// `None` when the control renders no icon.
    pub icon_classes: Option<Vec<String>>,
}

impl CompletionControl {
    pub fn new(href: &str, icon_classes: &[&str]) -> Self {
        Self {
            href: href.to_string(),
            icon_classes: Some(icon_classes.iter().map(|c| c.to_string()).collect()),
        }
    }

    pub fn links_to_completion(&self) -> bool {
        self.href.contains(COMPLETION_ROUTE)
    }

    /// State at click time, read from the icon.
    pub fn state(&self) -> Option<CompletionState> {
        let classes = self.icon_classes.as_ref()?;
        if classes.iter().any(|c| c == INCOMPLETE_ICON) {
            Some(CompletionState::Incomplete)
        } else {
            Some(CompletionState::Complete)
        }
    }

    /// Habit id from a `/toggle_habit/<id>` link.
    pub fn habit_id(&self) -> Option<i64> {
        let (_, tail) = self.href.split_once(COMPLETION_ROUTE)?;
        tail.trim_start_matches('/')
            .split(|c: char| c == '/' || c == '?' || c == '#')
            .next()?
            .parse()
            .ok()
    }

    /// Translate a click into a toggle event. Controls that do not link to
    /// the completion route, or render no icon, produce nothing.
    pub fn click(&self, x: f64, y: f64) -> Option<CompletionToggled> {
        if !self.links_to_completion() {
            return None;
        }
        let prior = self.state()?;
        Some(CompletionToggled {
            habit_id: self.habit_id(),
            prior,
            new: prior.flipped(),
            x,
            y,
        })
    }
}

pub struct FeedbackEmitter {
    viewport: Viewport,
    style: BurstStyle,
    label_text: String,
    label_duration_ms: u64,
    next_label: u64,
}

impl FeedbackEmitter {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            style: BurstStyle::default(),
            label_text: DEFAULT_LABEL_TEXT.to_string(),
            label_duration_ms: LABEL_DURATION_MS,
            next_label: 0,
        }
    }

    pub fn with_label_text(mut self, text: &str) -> Self {
        self.label_text = text.to_string();
        self
    }

    pub fn with_label_duration_ms(mut self, duration_ms: u64) -> Self {
        self.label_duration_ms = duration_ms;
        self
    }

    pub fn with_style(mut self, style: BurstStyle) -> Self {
        self.style = style;
        self
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn label_text(&self) -> &str {
        &self.label_text
    }

    pub fn emit_burst(&self, x: f64, y: f64, surface: &mut dyn Surface) -> Burst {
        let burst = Burst::at(x, y, self.viewport, self.style.clone());
        surface.apply(SurfaceOp::Burst {
            burst: burst.clone(),
        });
        burst
    }

    /// Attach a floating label. The caller removes it once
    /// `label.duration_ms` has elapsed.
    pub fn emit_label(
        &mut self,
        x: f64,
        y: f64,
        text: &str,
        surface: &mut dyn Surface,
    ) -> FloatingLabel {
        let id = LabelId(self.next_label);
        self.next_label += 1;
        let label = FloatingLabel::new(id, x, y, text, self.label_duration_ms);
        surface.apply(SurfaceOp::SpawnLabel {
            label: label.clone(),
        });
        label
    }

    /// Fire burst and label for a completion; ignore un-completions.
    pub fn on_completion(
        &mut self,
        event: &CompletionToggled,
        surface: &mut dyn Surface,
    ) -> Option<(Burst, FloatingLabel)> {
        if !event.is_completion() {
            return None;
        }
        let burst = self.emit_burst(event.x, event.y, surface);
        let text = self.label_text.clone();
        let label = self.emit_label(event.x, event.y, &text, surface);
        tracing::debug!(habit_id = ?event.habit_id, label = %label.id, "completion feedback");
        Some((burst, label))
    }
}
