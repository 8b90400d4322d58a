//! Presentation surface.
//!
//! Components never touch markup. They emit [`SurfaceOp`]s to a [`Surface`]
//! owned by the host (browser bridge, desktop shell, CLI). [`DocumentState`]
//! is the in-memory surface used by the CLI and by tests; it folds every op
//! into a queryable model of the page.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::feedback::{Burst, FloatingLabel, LabelId};

/// Elements the engagement layer manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Body,
    /// Every element marked as hidden while focus mode is on.
    ZenHidden,
    ThemeToggle,
    ThemeIcon,
    AdOverlay,
    AdButton,
    AdLoader,
    AdText,
    GenieOverlay,
    GenieVideo,
    GenieText,
}

/// A single presentation instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceOp {
    AddClass { target: Element, class: String },
    RemoveClass { target: Element, class: String },
    Show { target: Element },
    Hide { target: Element },
    FadeOut { target: Element, duration_ms: u64 },
    PlayMedia { target: Element },
    Vibrate { pattern_ms: Vec<u64> },
    Burst { burst: Burst },
    SpawnLabel { label: FloatingLabel },
    RemoveLabel { id: LabelId },
    Navigate { destination: String },
}

impl SurfaceOp {
    pub fn add_class(target: Element, class: &str) -> Self {
        SurfaceOp::AddClass {
            target,
            class: class.to_string(),
        }
    }

    pub fn remove_class(target: Element, class: &str) -> Self {
        SurfaceOp::RemoveClass {
            target,
            class: class.to_string(),
        }
    }

    /// `remove` then `add` on the same element.
    pub fn swap_class(target: Element, remove: &str, add: &str) -> [Self; 2] {
        [Self::remove_class(target, remove), Self::add_class(target, add)]
    }
}

/// Executes presentation ops.
pub trait Surface {
    fn apply(&mut self, op: SurfaceOp);

    fn apply_all(&mut self, ops: impl IntoIterator<Item = SurfaceOp>)
    where
        Self: Sized,
    {
        for op in ops {
            self.apply(op);
        }
    }
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn apply(&mut self, op: SurfaceOp) {
        (**self).apply(op);
    }
}

/// Element visibility. `Faded` is an element whose opacity reached zero but
/// which still occupies layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Faded,
    Hidden,
}

/// In-memory document model.
///
/// Starts from the page markup: the ad loader and text and the genie overlay
/// and text ship hidden, the theme controls ship in their dark variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentState {
    classes: BTreeMap<Element, BTreeSet<String>>,
    visibility: BTreeMap<Element, Visibility>,
    labels: BTreeMap<LabelId, FloatingLabel>,
    playing: BTreeSet<Element>,
    vibrations: Vec<Vec<u64>>,
    bursts: Vec<Burst>,
    location: Option<String>,
    #[serde(skip)]
    log: Vec<SurfaceOp>,
}

impl Default for DocumentState {
    fn default() -> Self {
        let mut visibility = BTreeMap::new();
        for hidden in [
            Element::AdLoader,
            Element::AdText,
            Element::GenieOverlay,
            Element::GenieText,
        ] {
            visibility.insert(hidden, Visibility::Hidden);
        }
        let mut classes: BTreeMap<Element, BTreeSet<String>> = BTreeMap::new();
        classes
            .entry(Element::ThemeIcon)
            .or_default()
            .insert("bi-moon-stars".to_string());
        classes
            .entry(Element::ThemeToggle)
            .or_default()
            .insert("btn-outline-light".to_string());
        Self {
            classes,
            visibility,
            labels: BTreeMap::new(),
            playing: BTreeSet::new(),
            vibrations: Vec::new(),
            bursts: Vec::new(),
            location: None,
            log: Vec::new(),
        }
    }
}

impl DocumentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_class(&self, target: Element, class: &str) -> bool {
        self.classes
            .get(&target)
            .map(|set| set.contains(class))
            .unwrap_or(false)
    }

    pub fn classes(&self, target: Element) -> Vec<&str> {
        self.classes
            .get(&target)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn visibility(&self, target: Element) -> Visibility {
        self.visibility
            .get(&target)
            .copied()
            .unwrap_or(Visibility::Visible)
    }

    pub fn is_visible(&self, target: Element) -> bool {
        self.visibility(target) == Visibility::Visible
    }

    pub fn is_playing(&self, target: Element) -> bool {
        self.playing.contains(&target)
    }

    /// Labels currently attached to the page.
    pub fn labels(&self) -> impl Iterator<Item = &FloatingLabel> {
        self.labels.values()
    }

    pub fn vibrations(&self) -> &[Vec<u64>] {
        &self.vibrations
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    /// Destination of the last navigation, if the page navigated away.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Every op applied so far, in order.
    pub fn log(&self) -> &[SurfaceOp] {
        &self.log
    }

    /// Count of applied ops matching `pred`.
    pub fn count_ops(&self, pred: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.log.iter().filter(|op| pred(op)).count()
    }
}

impl Surface for DocumentState {
    fn apply(&mut self, op: SurfaceOp) {
        match &op {
            SurfaceOp::AddClass { target, class } => {
                self.classes.entry(*target).or_default().insert(class.clone());
            }
            SurfaceOp::RemoveClass { target, class } => {
                if let Some(set) = self.classes.get_mut(target) {
                    set.remove(class);
                }
            }
            SurfaceOp::Show { target } => {
                self.visibility.insert(*target, Visibility::Visible);
            }
            SurfaceOp::Hide { target } => {
                self.visibility.insert(*target, Visibility::Hidden);
            }
            SurfaceOp::FadeOut { target, .. } => {
                if self.visibility(*target) == Visibility::Visible {
                    self.visibility.insert(*target, Visibility::Faded);
                }
            }
            SurfaceOp::PlayMedia { target } => {
                self.playing.insert(*target);
            }
            SurfaceOp::Vibrate { pattern_ms } => self.vibrations.push(pattern_ms.clone()),
            SurfaceOp::Burst { burst } => self.bursts.push(burst.clone()),
            SurfaceOp::SpawnLabel { label } => {
                self.labels.insert(label.id, label.clone());
            }
            SurfaceOp::RemoveLabel { id } => {
                self.labels.remove(id);
            }
            SurfaceOp::Navigate { destination } => self.location = Some(destination.clone()),
        }
        self.log.push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_markup_visibility() {
        let doc = DocumentState::new();
        assert!(doc.is_visible(Element::AdOverlay));
        assert!(doc.is_visible(Element::AdButton));
        assert!(!doc.is_visible(Element::AdLoader));
        assert!(!doc.is_visible(Element::GenieOverlay));
        assert!(doc.location().is_none());
    }

    #[test]
    fn class_ops_fold_into_state() {
        let mut doc = DocumentState::new();
        doc.apply(SurfaceOp::add_class(Element::Body, "zen-mode"));
        assert!(doc.has_class(Element::Body, "zen-mode"));
        assert_eq!(doc.classes(Element::ThemeIcon), vec!["bi-moon-stars"]);
        doc.apply_all(SurfaceOp::swap_class(Element::ThemeIcon, "bi-moon-stars", "bi-sun-fill"));
        assert_eq!(doc.classes(Element::ThemeIcon), vec!["bi-sun-fill"]);
        doc.apply(SurfaceOp::remove_class(Element::Body, "zen-mode"));
        assert!(!doc.has_class(Element::Body, "zen-mode"));
        assert_eq!(doc.log().len(), 4);
    }

    #[test]
    fn fade_only_affects_visible_elements() {
        let mut doc = DocumentState::new();
        doc.apply(SurfaceOp::FadeOut {
            target: Element::AdOverlay,
            duration_ms: 500,
        });
        assert_eq!(doc.visibility(Element::AdOverlay), Visibility::Faded);
        doc.apply(SurfaceOp::FadeOut {
            target: Element::AdLoader,
            duration_ms: 500,
        });
        assert_eq!(doc.visibility(Element::AdLoader), Visibility::Hidden);
    }

    #[test]
    fn ops_serialize_with_tag() {
        let json = serde_json::to_value(SurfaceOp::Navigate {
            destination: "/genie".into(),
        })
        .unwrap();
        assert_eq!(json["op"], "navigate");
        assert_eq!(json["destination"], "/genie");
    }
}
