//! Depth warp of the spherical proxy
//!
//! Each proxy vertex carries a fixed direction and texture coordinate. A
//! layer samples its depth map(s) at that coordinate, combines them with the
//! cross-layer occlusion policy, and scales the vertex radially by the jump
//! encoding `k / (d + eps)`. These functions are the CPU reference of the
//! vertex programs in `parallax_gpu::shaders`.

use crate::layer::LayerRole;
use crate::math::Vec3;
use serde::Serialize;

/// Numerator of the jump encoding
pub const DEFAULT_DEPTH_SCALE: f32 = 0.3;

/// Raw depth samples at one texture coordinate
///
/// `own` is the layer's own depth map; `midground` and `foreground` are the
/// maps of the layers drawn after it. Values are in `(0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DepthSamples {
    /// Inpainted depth for the background, extrapolated depth for the
    /// midground, video depth for the foreground
    pub own: f32,
    /// Extrapolated depth (consulted by the background only)
    pub midground: f32,
    /// Video depth (consulted by background and midground)
    pub foreground: f32,
}

impl DepthSamples {
    pub fn new(own: f32, midground: f32, foreground: f32) -> Self {
        Self {
            own,
            midground,
            foreground,
        }
    }
}

/// Jump encoding: radial scale for a raw depth sample
///
/// Strictly decreasing in `depth`; tends to `scale / epsilon` as depth
/// approaches zero. Zero or negative samples are guarded only by `epsilon`.
#[inline]
pub fn jump_scale(depth: f32, scale: f32, epsilon: f32) -> f32 {
    scale / (depth + epsilon)
}

/// Depth a layer uses for its own displacement
///
/// The nearest sample among the layer's own map and the maps of every layer
/// drawn after it, so a farther surface never pops through a nearer one.
pub fn effective_depth(role: LayerRole, samples: DepthSamples) -> f32 {
    match role {
        LayerRole::Background => samples.own.min(samples.midground).min(samples.foreground),
        LayerRole::Midground => samples.own.min(samples.foreground),
        LayerRole::Foreground => samples.own,
    }
}

/// Displaced local position of one proxy vertex
pub fn warp_position(
    role: LayerRole,
    position: Vec3,
    samples: DepthSamples,
    scale: f32,
    epsilon: f32,
) -> Vec3 {
    position * jump_scale(effective_depth(role, samples), scale, epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 0.001;

    #[test]
    fn test_jump_scale_strictly_decreasing() {
        let mut previous = f32::INFINITY;
        for step in 1..=100 {
            let d = step as f32 / 100.0;
            let value = jump_scale(d, DEFAULT_DEPTH_SCALE, EPS);
            assert!(value < previous, "not decreasing at d = {d}");
            previous = value;
        }
    }

    #[test]
    fn test_jump_scale_limit_at_zero() {
        let limit = DEFAULT_DEPTH_SCALE / EPS;
        let near_zero = jump_scale(1e-9, DEFAULT_DEPTH_SCALE, EPS);
        assert!((near_zero - limit).abs() / limit < 1e-4);
        assert!((jump_scale(0.0, DEFAULT_DEPTH_SCALE, EPS) - limit).abs() < 1e-2);
    }

    #[test]
    fn test_jump_scale_at_one() {
        let value = jump_scale(1.0, 0.3, 0.002);
        assert!((value - 0.3 / 1.002).abs() < 1e-6);
    }

    #[test]
    fn test_background_takes_min_of_three() {
        let samples = DepthSamples::new(0.8, 0.4, 0.6);
        assert_eq!(effective_depth(LayerRole::Background, samples), 0.4);
        let samples = DepthSamples::new(0.8, 0.9, 0.2);
        assert_eq!(effective_depth(LayerRole::Background, samples), 0.2);
        let samples = DepthSamples::new(0.1, 0.9, 0.2);
        assert_eq!(effective_depth(LayerRole::Background, samples), 0.1);
    }

    #[test]
    fn test_midground_ignores_its_own_slot_below() {
        // the midground never consults the background; `midground` is unused
        let samples = DepthSamples::new(0.7, 0.05, 0.3);
        assert_eq!(effective_depth(LayerRole::Midground, samples), 0.3);
        let samples = DepthSamples::new(0.2, 0.05, 0.3);
        assert_eq!(effective_depth(LayerRole::Midground, samples), 0.2);
    }

    #[test]
    fn test_foreground_uses_own_depth_only() {
        let samples = DepthSamples::new(0.7, 0.01, 0.01);
        assert_eq!(effective_depth(LayerRole::Foreground, samples), 0.7);
    }

    #[test]
    fn test_background_never_nearer_than_upper_layers() {
        // the background is displaced at least as far out as the layers above it
        for (own, mid, fg) in [(0.9, 0.5, 0.3), (0.2, 0.8, 0.6), (0.5, 0.5, 0.5)] {
            let samples = DepthSamples::new(own, mid, fg);
            let bg = jump_scale(effective_depth(LayerRole::Background, samples), 0.3, 0.001);
            let fg_scale = jump_scale(fg, 0.3, 0.003);
            assert!(bg >= fg_scale);
        }
    }

    #[test]
    fn test_warp_keeps_direction() {
        let position = Vec3::new(0.0, 6.0, 0.0);
        let warped = warp_position(
            LayerRole::Foreground,
            position,
            DepthSamples::new(0.5, 1.0, 1.0),
            0.3,
            0.003,
        );
        assert!(warped.x.abs() < 1e-6 && warped.z.abs() < 1e-6);
        assert!((warped.y - 6.0 * 0.3 / 0.503).abs() < 1e-4);
    }
}
