//! User-facing unlock flow: simulated ad, then unlock, then overlay fade.
//!
//! Like the gate it drives, the flow is a wall-clock state machine with no
//! internal timers. The owner calls `tick()` periodically.
//!
//! ```text
//! Idle -> Playing -> Fading -> Finished
//! ```

use serde::{Deserialize, Serialize};

use super::gate::UnlockGate;
use crate::error::Result;
use crate::events::{timestamp, Event};
use crate::storage::PreferenceStore;
use crate::surface::{Element, Surface, SurfaceOp};

/// Length of the simulated ad.
pub const AD_DURATION_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum AdPhase {
    Idle,
    Playing { ends_ms: u64 },
    Fading { hide_ms: u64 },
    Finished,
}

#[derive(Debug, Clone)]
pub struct AdUnlockFlow {
    ad_duration_ms: u64,
    phase: AdPhase,
}

impl Default for AdUnlockFlow {
    fn default() -> Self {
        Self::new(AD_DURATION_MS)
    }
}

impl AdUnlockFlow {
    pub fn new(ad_duration_ms: u64) -> Self {
        Self {
            ad_duration_ms,
            phase: AdPhase::Idle,
        }
    }

    pub fn phase(&self) -> AdPhase {
        self.phase
    }

    /// Due time of the next transition, if one is pending.
    pub fn next_due(&self) -> Option<u64> {
        match self.phase {
            AdPhase::Playing { ends_ms } => Some(ends_ms),
            AdPhase::Fading { hide_ms } => Some(hide_ms),
            AdPhase::Idle | AdPhase::Finished => None,
        }
    }

    /// Start playing. Ignored while an ad is already playing or fading.
    pub fn begin(&mut self, now_ms: u64, surface: &mut dyn Surface) -> Option<Event> {
        match self.phase {
            AdPhase::Playing { .. } | AdPhase::Fading { .. } => None,
            AdPhase::Idle | AdPhase::Finished => {
                surface.apply(SurfaceOp::Hide {
                    target: Element::AdButton,
                });
                surface.apply(SurfaceOp::Show {
                    target: Element::AdLoader,
                });
                surface.apply(SurfaceOp::Show {
                    target: Element::AdText,
                });
                let ends_ms = now_ms.saturating_add(self.ad_duration_ms);
                self.phase = AdPhase::Playing { ends_ms };
                Some(Event::AdStarted {
                    ends_at: timestamp(ends_ms),
                    at: timestamp(now_ms),
                })
            }
        }
    }

    /// Skip the ad and unlock right away.
    pub fn skip<S: PreferenceStore>(
        &mut self,
        now_ms: u64,
        gate: &mut UnlockGate<S>,
        surface: &mut dyn Surface,
    ) -> Result<Option<Event>> {
        if matches!(self.phase, AdPhase::Fading { .. }) {
            return Ok(None);
        }
        self.phase = AdPhase::Playing { ends_ms: now_ms };
        self.tick(now_ms, gate, surface)
    }

    /// Advance the flow.
    ///
    /// Returns `Unlocked` once the ad ends and `OverlayHidden` once the fade
    /// completes. If persisting the unlock fails, the flow resets to `Idle`,
    /// restores the unlock button and returns the error.
    pub fn tick<S: PreferenceStore>(
        &mut self,
        now_ms: u64,
        gate: &mut UnlockGate<S>,
        surface: &mut dyn Surface,
    ) -> Result<Option<Event>> {
        match self.phase {
            AdPhase::Playing { ends_ms } if now_ms >= ends_ms => {
                let expiry = match gate.unlock(surface) {
                    Ok(expiry) => expiry,
                    Err(e) => {
                        self.reset(surface);
                        return Err(e);
                    }
                };
                self.phase = AdPhase::Fading {
                    hide_ms: now_ms.saturating_add(gate.fade_ms()),
                };
                Ok(Some(Event::Unlocked {
                    expires_at: timestamp(expiry),
                    at: timestamp(now_ms),
                }))
            }
            AdPhase::Fading { hide_ms } if now_ms >= hide_ms => {
                surface.apply(SurfaceOp::Hide {
                    target: Element::AdOverlay,
                });
                self.phase = AdPhase::Finished;
                Ok(Some(Event::OverlayHidden {
                    at: timestamp(now_ms),
                }))
            }
            _ => Ok(None),
        }
    }

    fn reset(&mut self, surface: &mut dyn Surface) {
        surface.apply(SurfaceOp::Hide {
            target: Element::AdLoader,
        });
        surface.apply(SurfaceOp::Hide {
            target: Element::AdText,
        });
        surface.apply(SurfaceOp::Show {
            target: Element::AdButton,
        });
        self.phase = AdPhase::Idle;
    }
}
