mod ad;
mod gate;

pub use ad::{AdPhase, AdUnlockFlow, AD_DURATION_MS};
pub use gate::{RenderHook, UnlockGate, OVERLAY_FADE_MS, UNLOCK_DURATION_MS};
