//! Time-gated feature unlock.
//!
//! The gate stores nothing but an expiry timestamp. Lock state is derived on
//! every read:
//!
//! ```text
//! locked = expiry absent || expiry unparsable || now >= expiry
//! ```
//!
//! `unlock()` always writes `now + duration`, independent of the previous
//! value. Lock state follows the wall clock in both directions: adjusting
//! the system clock can make an unlocked gate report locked again, which is
//! accepted.

use crate::clock::SharedClock;
use crate::error::Result;
use crate::storage::{keys, PreferenceStore};
use crate::surface::{Element, Surface, SurfaceOp};

/// 18 hours.
pub const UNLOCK_DURATION_MS: u64 = 18 * 60 * 60 * 1000;

/// Overlay fade after an unlock.
pub const OVERLAY_FADE_MS: u64 = 500;

/// Called whenever the gated content should render: on unlock, and at load
/// when a previous unlock is still valid.
pub type RenderHook = Box<dyn FnMut() + Send>;

pub struct UnlockGate<S> {
    store: S,
    clock: SharedClock,
    duration_ms: u64,
    fade_ms: u64,
    render: RenderHook,
}

impl<S: PreferenceStore> UnlockGate<S> {
    /// Gate with the default window and a no-op render hook.
    pub fn new(store: S, clock: SharedClock) -> Self {
        Self {
            store,
            clock,
            duration_ms: UNLOCK_DURATION_MS,
            fade_ms: OVERLAY_FADE_MS,
            render: Box::new(|| {}),
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_fade_ms(mut self, fade_ms: u64) -> Self {
        self.fade_ms = fade_ms;
        self
    }

    pub fn with_render_hook(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.render = Box::new(hook);
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn fade_ms(&self) -> u64 {
        self.fade_ms
    }

    /// Persisted expiry, if present and parsable.
    pub fn expiry_ms(&self) -> Option<u64> {
        match self.store.get(keys::UNLOCK_EXPIRY) {
            Ok(raw) => raw.and_then(|raw| raw.trim().parse::<u64>().ok()),
            Err(e) => {
                tracing::warn!(error = %e, "unlock expiry read failed, treating as locked");
                None
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        match self.expiry_ms() {
            Some(expiry) => self.clock.now_ms() >= expiry,
            None => true,
        }
    }

    /// Time left in the unlock window; zero when locked.
    pub fn remaining_ms(&self) -> u64 {
        self.expiry_ms()
            .map(|expiry| expiry.saturating_sub(self.clock.now_ms()))
            .unwrap_or(0)
    }

    /// Load-time check. When still unlocked, hides the overlay immediately
    /// and renders the gated content. When locked, the overlay keeps its
    /// default visible state.
    ///
    /// Returns `true` when unlocked.
    pub fn check(&mut self, surface: &mut dyn Surface) -> bool {
        if self.is_locked() {
            tracing::debug!("unlock gate locked");
            return false;
        }
        surface.apply(SurfaceOp::Hide {
            target: Element::AdOverlay,
        });
        (self.render)();
        tracing::debug!(remaining_ms = self.remaining_ms(), "unlock gate open");
        true
    }

    /// Open the gate for another full window.
    ///
    /// Persists `now + duration` (one write), starts the overlay fade and
    /// renders the gated content. The caller hides the overlay once
    /// [`UnlockGate::fade_ms`] has elapsed.
    ///
    /// # Errors
    /// A failed write is returned as-is; there is no retry.
    pub fn unlock(&mut self, surface: &mut dyn Surface) -> Result<u64> {
        let expiry = self.clock.now_ms().saturating_add(self.duration_ms);
        self.store.set(keys::UNLOCK_EXPIRY, &expiry.to_string())?;
        surface.apply(SurfaceOp::FadeOut {
            target: Element::AdOverlay,
            duration_ms: self.fade_ms,
        });
        (self.render)();
        tracing::info!(expiry_ms = expiry, "unlocked");
        Ok(expiry)
    }
}
