//! Persisted two-state mode toggles (focus mode and theme).
//!
//! Each mode owns one preference key and one set of presentation side
//! effects. The persisted value is written before presentation changes, so a
//! failed write leaves both untouched and they never diverge.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{keys, PreferenceStore};
use crate::surface::{Element, Surface, SurfaceOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// "Zen" focus mode: hides distracting page sections.
    Focus,
    /// Light theme. Off means the default dark theme.
    Theme,
}

impl Mode {
    pub fn key(self) -> &'static str {
        match self {
            Mode::Focus => keys::ZEN_MODE,
            Mode::Theme => keys::THEME,
        }
    }

    pub fn encode(self, on: bool) -> &'static str {
        match (self, on) {
            (Mode::Focus, true) => "true",
            (Mode::Focus, false) => "false",
            (Mode::Theme, true) => "light",
            (Mode::Theme, false) => "dark",
        }
    }

    /// Unknown values decode as `None` and are treated as off.
    pub fn decode(self, raw: &str) -> Option<bool> {
        match (self, raw) {
            (Mode::Focus, "true") | (Mode::Theme, "light") => Some(true),
            (Mode::Focus, "false") | (Mode::Theme, "dark") => Some(false),
            _ => None,
        }
    }

    pub fn presentation(self, on: bool) -> Vec<SurfaceOp> {
        match (self, on) {
            (Mode::Focus, true) => vec![
                SurfaceOp::add_class(Element::Body, "zen-mode"),
                SurfaceOp::Hide {
                    target: Element::ZenHidden,
                },
            ],
            (Mode::Focus, false) => vec![
                SurfaceOp::remove_class(Element::Body, "zen-mode"),
                SurfaceOp::Show {
                    target: Element::ZenHidden,
                },
            ],
            (Mode::Theme, true) => {
                let mut ops = vec![SurfaceOp::add_class(Element::Body, "light-mode")];
                ops.extend(SurfaceOp::swap_class(
                    Element::ThemeIcon,
                    "bi-moon-stars",
                    "bi-sun-fill",
                ));
                ops.extend(SurfaceOp::swap_class(
                    Element::ThemeToggle,
                    "btn-outline-light",
                    "btn-outline-dark",
                ));
                ops
            }
            (Mode::Theme, false) => {
                let mut ops = vec![SurfaceOp::remove_class(Element::Body, "light-mode")];
                ops.extend(SurfaceOp::swap_class(
                    Element::ThemeIcon,
                    "bi-sun-fill",
                    "bi-moon-stars",
                ));
                ops.extend(SurfaceOp::swap_class(
                    Element::ThemeToggle,
                    "btn-outline-dark",
                    "btn-outline-light",
                ));
                ops
            }
        }
    }
}

/// One mode flag bound to a preference store.
pub struct ModeToggle<S> {
    mode: Mode,
    store: S,
    on: bool,
}

impl<S: PreferenceStore> ModeToggle<S> {
    /// Starts off; call [`ModeToggle::restore`] once at load.
    pub fn new(mode: Mode, store: S) -> Self {
        Self {
            mode,
            store,
            on: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Persisted value, without touching in-memory state.
    pub fn persisted(&self) -> Option<bool> {
        match self.store.get(self.mode.key()) {
            Ok(raw) => raw.and_then(|raw| self.mode.decode(&raw)),
            Err(e) => {
                tracing::warn!(mode = ?self.mode, error = %e, "preference read failed");
                None
            }
        }
    }

    /// Apply the persisted "on" state without user interaction.
    ///
    /// Does not write. Returns the resulting state.
    pub fn restore(&mut self, surface: &mut dyn Surface) -> bool {
        if self.persisted() == Some(true) && !self.on {
            self.on = true;
            for op in self.mode.presentation(true) {
                surface.apply(op);
            }
        }
        tracing::debug!(mode = ?self.mode, on = self.on, "mode restored");
        self.on
    }

    /// Flip the flag, persist it, mirror it into presentation.
    ///
    /// # Errors
    /// Returns the store error if the write fails; nothing changes then.
    pub fn toggle(&mut self, surface: &mut dyn Surface) -> Result<bool> {
        let next = !self.on;
        self.store.set(self.mode.key(), self.mode.encode(next))?;
        self.on = next;
        for op in self.mode.presentation(next) {
            surface.apply(op);
        }
        tracing::debug!(mode = ?self.mode, on = next, "mode toggled");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::surface::DocumentState;

    #[test]
    fn focus_toggle_persists_and_hides() {
        let store = MemoryStore::new();
        let mut doc = DocumentState::new();
        let mut zen = ModeToggle::new(Mode::Focus, &store);

        assert!(zen.toggle(&mut doc).unwrap());
        assert_eq!(store.get("zenMode").unwrap().as_deref(), Some("true"));
        assert!(doc.has_class(Element::Body, "zen-mode"));
        assert!(!doc.is_visible(Element::ZenHidden));

        assert!(!zen.toggle(&mut doc).unwrap());
        assert_eq!(store.get("zenMode").unwrap().as_deref(), Some("false"));
        assert!(!doc.has_class(Element::Body, "zen-mode"));
        assert!(doc.is_visible(Element::ZenHidden));
    }

    #[test]
    fn theme_toggle_swaps_icon_and_button() {
        let store = MemoryStore::new();
        let mut doc = DocumentState::new();
        let mut theme = ModeToggle::new(Mode::Theme, &store);

        theme.toggle(&mut doc).unwrap();
        assert_eq!(store.get("app-theme").unwrap().as_deref(), Some("light"));
        assert!(doc.has_class(Element::Body, "light-mode"));
        assert_eq!(doc.classes(Element::ThemeIcon), vec!["bi-sun-fill"]);
        assert_eq!(doc.classes(Element::ThemeToggle), vec!["btn-outline-dark"]);

        theme.toggle(&mut doc).unwrap();
        assert_eq!(store.get("app-theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(doc.classes(Element::ThemeIcon), vec!["bi-moon-stars"]);
        assert_eq!(doc.classes(Element::ThemeToggle), vec!["btn-outline-light"]);
    }

    #[test]
    fn restore_applies_persisted_on_without_writing() {
        let store = MemoryStore::new();
        store.set("app-theme", "light").unwrap();
        let mut doc = DocumentState::new();
        let mut theme = ModeToggle::new(Mode::Theme, &store);

        assert!(theme.restore(&mut doc));
        assert!(doc.has_class(Element::Body, "light-mode"));
        // Restoring twice stays idempotent.
        assert!(theme.restore(&mut doc));
        assert_eq!(doc.count_ops(|op| matches!(op, SurfaceOp::AddClass { class, .. } if class == "light-mode")), 1);
    }

    #[test]
    fn restore_ignores_off_and_garbage() {
        for raw in ["false", "dark", "TRUE", ""] {
            let store = MemoryStore::new();
            store.set("zenMode", raw).unwrap();
            let mut doc = DocumentState::new();
            let mut zen = ModeToggle::new(Mode::Focus, &store);
            assert!(!zen.restore(&mut doc));
            assert!(doc.log().is_empty());
        }
    }

    #[test]
    fn modes_do_not_interact() {
        let store = MemoryStore::new();
        let mut doc = DocumentState::new();
        let mut zen = ModeToggle::new(Mode::Focus, &store);
        let mut theme = ModeToggle::new(Mode::Theme, &store);
        zen.toggle(&mut doc).unwrap();
        assert!(store.get("app-theme").unwrap().is_none());
        assert!(!theme.restore(&mut doc));
        assert!(!doc.has_class(Element::Body, "light-mode"));
    }
}
