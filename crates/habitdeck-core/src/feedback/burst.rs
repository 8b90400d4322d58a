//! Particle burst ("sparks").

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Launch angle of the burst axis, degrees (straight up).
const LAUNCH_ANGLE_DEG: f64 = 90.0;
const START_VELOCITY: f64 = 45.0;

/// Page viewport in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Click coordinates as fractions of the viewport, clamped to `0..=1`.
    /// A degenerate dimension maps to the centre.
    pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        (fraction(x, self.width), fraction(y, self.height))
    }
}

fn fraction(value: f64, extent: f64) -> f64 {
    if !extent.is_finite() || extent <= 0.0 || !value.is_finite() {
        return 0.5;
    }
    (value / extent).clamp(0.0, 1.0)
}

/// Fixed visual parameters of a burst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstStyle {
    pub particle_count: u32,
    pub spread_deg: f64,
    pub colors: Vec<String>,
    pub gravity: f64,
    pub scalar: f64,
    pub drift: f64,
    /// Lifetime in animation frames.
    pub ticks: u32,
    pub shapes: Vec<String>,
    pub disable_for_reduced_motion: bool,
}

impl Default for BurstStyle {
    /// Small, heavy, short-lived square sparks in cyan, white and gold.
    fn default() -> Self {
        Self {
            particle_count: 50,
            spread_deg: 60.0,
            colors: vec!["#0dcaf0".into(), "#ffffff".into(), "#ffd700".into()],
            gravity: 2.5,
            scalar: 0.7,
            drift: 0.0,
            ticks: 80,
            shapes: vec!["square".into()],
            disable_for_reduced_motion: true,
        }
    }
}

/// A burst anchored at normalized coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Burst {
    pub origin_x: f64,
    pub origin_y: f64,
    pub style: BurstStyle,
}

/// Initial state of one particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub angle_deg: f64,
    pub velocity: f64,
    pub color: String,
    pub shape: String,
}

impl Burst {
    pub fn at(x: f64, y: f64, viewport: Viewport, style: BurstStyle) -> Self {
        let (origin_x, origin_y) = viewport.normalize(x, y);
        Self {
            origin_x,
            origin_y,
            style,
        }
    }

    /// Materialise the burst for hosts that draw particles themselves.
    ///
    /// Angles fall inside the spread cone around the launch axis; colours and
    /// shapes cycle through the style's lists.
    pub fn particles<R: Rng>(&self, rng: &mut R) -> Vec<Particle> {
        let half_spread = self.style.spread_deg / 2.0;
        (0..self.style.particle_count as usize)
            .map(|i| {
                let offset = if half_spread > 0.0 {
                    rng.gen_range(-half_spread..=half_spread)
                } else {
                    0.0
                };
                Particle {
                    angle_deg: LAUNCH_ANGLE_DEG + offset,
                    velocity: START_VELOCITY * 0.5 + rng.gen::<f64>() * START_VELOCITY,
                    color: pick(&self.style.colors, i, "#ffffff"),
                    shape: pick(&self.style.shapes, i, "square"),
                }
            })
            .collect()
    }
}

fn pick(options: &[String], i: usize, fallback: &str) -> String {
    if options.is_empty() {
        fallback.to_string()
    } else {
        options[i % options.len()].clone()
    }
}
