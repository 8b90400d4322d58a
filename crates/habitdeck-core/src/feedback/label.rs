use serde::{Deserialize, Serialize};

/// Label lifetime: rise, fade, then removal.
pub const LABEL_DURATION_MS: u64 = 800;

const OFFSET_X_PX: f64 = 15.0;
const OFFSET_Y_PX: f64 = -20.0;
const RISE_PX: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelId(pub u64);

impl std::fmt::Display for LabelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "label-{}", self.0)
    }
}

/// Transient HUD text that floats up from the click point and fades out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingLabel {
    pub id: LabelId,
    pub text: String,
    /// Fixed-position offsets in CSS pixels, slightly up and right of the
    /// cursor.
    pub left_px: f64,
    pub top_px: f64,
    pub rise_px: f64,
    pub duration_ms: u64,
    pub color: String,
    pub font_family: String,
    pub font_size_px: u32,
}

impl FloatingLabel {
    pub fn new(id: LabelId, x: f64, y: f64, text: &str, duration_ms: u64) -> Self {
        Self {
            id,
            text: text.to_string(),
            left_px: x + OFFSET_X_PX,
            top_px: y + OFFSET_Y_PX,
            rise_px: RISE_PX,
            duration_ms,
            color: "#0dcaf0".into(),
            font_family: "'Orbitron', sans-serif".into(),
            font_size_px: 12,
        }
    }
}
