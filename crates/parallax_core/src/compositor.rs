//! Ordered draw planning
//!
//! A frame is one clear followed, per eye, by the visible layers in fixed
//! order. The compositor does not touch the GPU; it produces a [`FramePlan`]
//! that a renderer executes verbatim.

use crate::layer::{LayerParams, LayerRole, LayerStack};
use crate::transform::{Eye, FrameTransform, TransformUpdater, Viewport};
use serde::Serialize;

/// Blend state of a layer draw
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BlendMode {
    /// Replaces the target, no blending
    Opaque,
    /// Source-over with the layer's alpha
    Alpha,
}

/// One layer drawn for one eye
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DrawCall {
    pub eye: Eye,
    pub role: LayerRole,
    pub draw_order: u32,
    pub blend: BlendMode,
    pub viewport: Viewport,
    /// Parameter set as it was when this draw was issued
    pub params: LayerParams,
}

/// Draw list of one frame
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FramePlan {
    pub draws: Vec<DrawCall>,
}

impl FramePlan {
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// Draws belonging to one eye, in order
    pub fn for_eye(&self, eye: Eye) -> impl Iterator<Item = &DrawCall> {
        self.draws.iter().filter(move |draw| draw.eye == eye)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Issues draws in fixed layer order, once per eye
pub struct Compositor;

impl Compositor {
    /// Update each visible layer for each eye and record its draw
    pub fn plan(layers: &mut LayerStack, transforms: &[FrameTransform]) -> FramePlan {
        let mut draws = Vec::with_capacity(transforms.len() * LayerRole::ALL.len());

        for transform in transforms {
            for role in LayerRole::ALL {
                let layer = layers.get_mut(role);
                if !layer.is_visible() {
                    continue;
                }
                TransformUpdater::apply(role, transform, layer.params_mut());
                draws.push(DrawCall {
                    eye: transform.eye,
                    role,
                    draw_order: role.draw_order(),
                    blend: role.blend(),
                    viewport: transform.viewport,
                    params: *layer.params(),
                });
            }
        }

        tracing::trace!("planned {} draws for {} eyes", draws.len(), transforms.len());
        FramePlan { draws }
    }
}
