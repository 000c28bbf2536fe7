//! Desaturation and tint effects shared by all three layers

use crate::layer::LayerRole;
use serde::{Deserialize, Serialize};

/// Luminance weights applied to linear RGB
pub const LUMINANCE_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Global visual effect state, applied to every layer at once
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualEffectParams {
    /// Interpolation weight toward luminance, in `[0, 1]`
    pub desaturation: f32,
    /// Blend each layer 50/50 with its fixed hue
    pub tint: bool,
}

impl VisualEffectParams {
    /// Create effect params, clamping desaturation into `[0, 1]`
    pub fn new(desaturation: f32, tint: bool) -> Self {
        let clamped = if desaturation.is_nan() {
            0.0
        } else {
            desaturation.clamp(0.0, 1.0)
        };
        if clamped != desaturation {
            tracing::warn!("desaturation {} clamped to {}", desaturation, clamped);
        }
        Self {
            desaturation: clamped,
            tint,
        }
    }

    /// Tint flag as the float the shaders branch on
    pub fn tint_flag(&self) -> f32 {
        if self.tint {
            1.0
        } else {
            0.0
        }
    }
}

/// Rec.709 luminance of a linear RGB color
pub fn luminance(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMINANCE_WEIGHTS[0] + rgb[1] * LUMINANCE_WEIGHTS[1] + rgb[2] * LUMINANCE_WEIGHTS[2]
}

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Output color of a layer's fragment program
///
/// Desaturation interpolates toward luminance; the midground re-blends the
/// result 50% with its raw color, so it never desaturates past half
/// strength. Tint then mixes 50/50 with the layer hue.
pub fn shade(role: LayerRole, rgb: [f32; 3], effects: &VisualEffectParams) -> [f32; 3] {
    let gray = luminance(rgb);
    let mut desaturated = mix(rgb, [gray; 3], effects.desaturation);
    if role == LayerRole::Midground {
        desaturated = mix(rgb, desaturated, 0.5);
    }

    if effects.tint {
        mix(desaturated, role.tint(), 0.5)
    } else {
        desaturated
    }
}
