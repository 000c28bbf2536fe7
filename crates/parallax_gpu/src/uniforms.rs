//! Uniform block of a layer draw

use parallax_core::{LayerParams, LayerRole};

/// GPU mirror of `LayerUniforms` in the WGSL prelude
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LayerUniforms {
    pub mvp: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
    pub view_dir: [[f32; 4]; 4],
    pub sphere_center: [f32; 4],
    pub eye_position: [f32; 4],
    pub head_position: [f32; 4],
    /// Layer hue, alpha unused
    pub tint: [f32; 4],
    /// Desaturation, tint flag, epsilon, depth scale
    pub params: [f32; 4],
    /// Disocclusion offset, steepness, midpoint
    pub curve: [f32; 4],
}

impl LayerUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(role: LayerRole, params: &LayerParams) -> Self {
        let [r, g, b] = role.tint();
        Self {
            mvp: params.mvp.to_cols_array_2d(),
            world: params.world.to_cols_array_2d(),
            view_dir: params.view_dir.to_cols_array_2d(),
            sphere_center: params.sphere_center.to_point4(),
            eye_position: params.eye_position.to_point4(),
            head_position: params.head_position.to_point4(),
            tint: [r, g, b, 1.0],
            params: [
                params.effects.desaturation,
                params.effects.tint_flag(),
                params.epsilon,
                params.depth_scale,
            ],
            curve: [
                params.curve.offset,
                params.curve.steepness,
                params.curve.midpoint,
                0.0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_core::alpha::DisocclusionCurve;
    use parallax_core::math::{Mat4, Vec3};
    use parallax_core::VisualEffectParams;

    #[test]
    fn test_size_matches_wgsl_layout() {
        // three mat4x4 plus six vec4, all 16-byte aligned
        assert_eq!(LayerUniforms::SIZE, 288);
        assert_eq!(LayerUniforms::SIZE % 16, 0);
    }

    #[test]
    fn test_packs_layer_params() {
        let mut params = LayerParams::new(0.003, 0.3, DisocclusionCurve::default());
        params.mvp = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        params.head_position = Vec3::new(0.0, 1.6, 0.1);
        params.effects = VisualEffectParams::new(0.25, true);

        let u = LayerUniforms::new(LayerRole::Foreground, &params);
        assert_eq!(u.mvp[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(u.head_position, [0.0, 1.6, 0.1, 1.0]);
        assert_eq!(u.params, [0.25, 1.0, 0.003, 0.3]);
        assert_eq!(u.tint, [0.9, 0.8, 0.2, 1.0]);
        assert_eq!(u.curve, [0.05, 30.0, 0.15, 0.0]);
        assert_eq!(bytemuck::bytes_of(&u).len(), 288);
    }
}
