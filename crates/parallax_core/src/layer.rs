//! Layers of the RGBD panorama
//!
//! Three concentric layers share one proxy mesh: a static inpainted
//! background, a static extrapolated midground, and the foreground video.
//! Each owns its texture bindings, a visibility flag, its depth epsilon and a
//! parameter set that is overwritten before every draw.

use crate::alpha::DisocclusionCurve;
use crate::compositor::BlendMode;
use crate::config::ViewerConfig;
use crate::effects::{self, VisualEffectParams};
use crate::math::{Mat4, Vec3};
use crate::media::TextureSlot;
use crate::warp::{self, DepthSamples};
use serde::Serialize;
use smallvec::{smallvec, SmallVec};

/// Which of the three layers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LayerRole {
    /// Inpainted static layer, always visible and opaque
    Background,
    /// Extrapolated static layer
    Midground,
    /// Video layer
    Foreground,
}

impl LayerRole {
    /// All roles in draw order
    pub const ALL: [LayerRole; 3] = [
        LayerRole::Background,
        LayerRole::Midground,
        LayerRole::Foreground,
    ];

    /// Fixed draw-order slot
    pub fn draw_order(self) -> u32 {
        match self {
            LayerRole::Background => 0,
            LayerRole::Midground => 1,
            LayerRole::Foreground => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LayerRole::Background => "background",
            LayerRole::Midground => "midground",
            LayerRole::Foreground => "foreground",
        }
    }

    /// Epsilon of the jump encoding; distinct per layer so coincident
    /// surfaces never share a depth
    pub fn default_epsilon(self) -> f32 {
        match self {
            LayerRole::Background => 0.001,
            LayerRole::Midground => 0.002,
            LayerRole::Foreground => 0.003,
        }
    }

    /// Hue mixed in when tint is enabled
    pub fn tint(self) -> [f32; 3] {
        match self {
            LayerRole::Background => [0.4, 0.1, 0.8],
            LayerRole::Midground => [0.1, 0.9, 0.7],
            LayerRole::Foreground => [0.9, 0.8, 0.2],
        }
    }

    pub fn blend(self) -> BlendMode {
        match self {
            LayerRole::Background => BlendMode::Opaque,
            LayerRole::Midground | LayerRole::Foreground => BlendMode::Alpha,
        }
    }

    pub fn has_alpha(self) -> bool {
        self != LayerRole::Background
    }

    /// Number of depth maps combined for the displacement
    pub fn depth_sources(self) -> usize {
        match self {
            LayerRole::Background => 3,
            LayerRole::Midground => 2,
            LayerRole::Foreground => 1,
        }
    }

    /// Texture bindings of this role
    pub fn textures(self) -> LayerTextures {
        match self {
            LayerRole::Background => LayerTextures {
                color: TextureSlot::InpaintedColor,
                depth: smallvec![
                    TextureSlot::InpaintedDepth,
                    TextureSlot::ExtrapolatedDepth,
                    TextureSlot::VideoDepth,
                ],
                alpha: None,
            },
            LayerRole::Midground => LayerTextures {
                color: TextureSlot::ExtrapolatedColor,
                depth: smallvec![TextureSlot::ExtrapolatedDepth, TextureSlot::VideoDepth],
                alpha: Some(TextureSlot::ExtrapolatedAlpha),
            },
            LayerRole::Foreground => LayerTextures {
                color: TextureSlot::VideoColor,
                depth: smallvec![TextureSlot::VideoDepth],
                alpha: Some(TextureSlot::VideoAlpha),
            },
        }
    }
}

impl std::fmt::Display for LayerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Texture slots sampled by one layer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerTextures {
    pub color: TextureSlot,
    /// Own depth first, then the depth of every layer drawn after it
    pub depth: SmallVec<[TextureSlot; 3]>,
    pub alpha: Option<TextureSlot>,
}

impl LayerTextures {
    /// Every slot this layer reads
    pub fn slots(&self) -> impl Iterator<Item = TextureSlot> + '_ {
        std::iter::once(self.color)
            .chain(self.depth.iter().copied())
            .chain(self.alpha)
    }
}

/// Per-draw parameter set of one layer
///
/// Written by [`crate::transform::TransformUpdater`] immediately before the
/// layer is drawn for an eye. Background and midground only consume `mvp`;
/// the foreground consumes the full set for its disocclusion correction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LayerParams {
    pub mvp: Mat4,
    pub world: Mat4,
    pub view_dir: Mat4,
    pub sphere_center: Vec3,
    pub eye_position: Vec3,
    pub head_position: Vec3,
    pub effects: VisualEffectParams,
    pub epsilon: f32,
    pub depth_scale: f32,
    pub curve: DisocclusionCurve,
}

impl LayerParams {
    /// Parameters with identity transforms
    pub fn new(epsilon: f32, depth_scale: f32, curve: DisocclusionCurve) -> Self {
        Self {
            mvp: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
            view_dir: Mat4::IDENTITY,
            sphere_center: Vec3::ZERO,
            eye_position: Vec3::ZERO,
            head_position: Vec3::ZERO,
            effects: VisualEffectParams::default(),
            epsilon,
            depth_scale,
            curve,
        }
    }

    /// Clip-space position of a proxy vertex (CPU reference of the vertex stage)
    pub fn clip_position(&self, role: LayerRole, position: Vec3, samples: DepthSamples) -> [f32; 4] {
        let warped = warp::warp_position(role, position, samples, self.depth_scale, self.epsilon);
        self.mvp.transform_point4(warped)
    }

    /// Output RGBA of a fragment (CPU reference of the fragment stage)
    ///
    /// `mask` is the raw alpha sample; the background ignores it.
    pub fn shade_fragment(&self, role: LayerRole, rgb: [f32; 3], mask: f32) -> [f32; 4] {
        let [r, g, b] = effects::shade(role, rgb, &self.effects);
        let alpha = match role {
            LayerRole::Background => 1.0,
            LayerRole::Midground => mask,
            LayerRole::Foreground => {
                self.curve
                    .correct_for_head(mask, self.head_position, self.sphere_center)
            }
        };
        [r, g, b, alpha]
    }
}

/// One layer of the stack
#[derive(Clone, Debug)]
pub struct Layer {
    role: LayerRole,
    textures: LayerTextures,
    visible: bool,
    params: LayerParams,
}

impl Layer {
    pub fn new(role: LayerRole, config: &ViewerConfig) -> Self {
        Self {
            role,
            textures: role.textures(),
            visible: true,
            params: LayerParams::new(
                config.depth.epsilon(role),
                config.depth.scale,
                config.disocclusion,
            ),
        }
    }

    pub fn role(&self) -> LayerRole {
        self.role
    }

    pub fn draw_order(&self) -> u32 {
        self.role.draw_order()
    }

    pub fn textures(&self) -> &LayerTextures {
        &self.textures
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn epsilon(&self) -> f32 {
        self.params.epsilon
    }

    pub fn params(&self) -> &LayerParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut LayerParams {
        &mut self.params
    }
}

/// The three layers, created once and never reallocated
#[derive(Clone, Debug)]
pub struct LayerStack {
    layers: [Layer; 3],
    layer_count: u32,
}

impl LayerStack {
    pub fn new(config: &ViewerConfig) -> Self {
        let mut stack = Self {
            layers: LayerRole::ALL.map(|role| Layer::new(role, config)),
            layer_count: 3,
        };
        stack.set_layer_count(config.playback.initial_layer_count);
        stack
    }

    /// Show the first `count` layers, clamped to `1..=3`
    ///
    /// Only visibility changes; the background stays visible.
    pub fn set_layer_count(&mut self, count: i32) -> u32 {
        let clamped = count.clamp(1, 3) as u32;
        if clamped as i32 != count {
            tracing::warn!("layer count {} clamped to {}", count, clamped);
        }
        self.layer_count = clamped;
        for layer in &mut self.layers {
            layer.visible = layer.role.draw_order() < clamped;
        }
        tracing::debug!("layer count set to {}", clamped);
        clamped
    }

    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }

    /// Apply desaturation and tint to every layer at once
    pub fn set_visual_effects(&mut self, effects: VisualEffectParams) {
        for layer in &mut self.layers {
            layer.params.effects = effects;
        }
    }

    pub fn get(&self, role: LayerRole) -> &Layer {
        &self.layers[role.draw_order() as usize]
    }

    pub fn get_mut(&mut self, role: LayerRole) -> &mut Layer {
        &mut self.layers[role.draw_order() as usize]
    }

    /// All layers in draw order
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Visible layers in draw order
    pub fn visible(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|layer| layer.visible)
    }
}
