//! Per-eye transform computation
//!
//! The host supplies one [`FrameContext`] per display refresh. For every eye
//! the [`TransformUpdater`] derives a [`FrameTransform`] from the proxy
//! group's world matrix and writes the parts a layer consumes into that
//! layer's [`LayerParams`] right before it is drawn.

use crate::layer::{LayerParams, LayerRole};
use crate::math::{Mat4, Quat, Vec3};
use serde::Serialize;

/// Which eye a draw belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Eye {
    Mono,
    Left,
    Right,
}

/// Normalized sub-rectangle of the render target
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const FULL: Viewport = Viewport::new(0.0, 0.0, 1.0, 1.0);
    pub const LEFT_HALF: Viewport = Viewport::new(0.0, 0.0, 0.5, 1.0);
    pub const RIGHT_HALF: Viewport = Viewport::new(0.5, 0.0, 0.5, 1.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Pixel rectangle for a target of the given size
    pub fn to_pixels(&self, target_width: u32, target_height: u32) -> [f32; 4] {
        [
            self.x * target_width as f32,
            self.y * target_height as f32,
            self.width * target_width as f32,
            self.height * target_height as f32,
        ]
    }
}

/// View data of one eye for one frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EyeView {
    pub view: Mat4,
    pub projection: Mat4,
    /// World position of the eye
    pub position: Vec3,
    pub viewport: Viewport,
}

impl EyeView {
    pub fn new(view: Mat4, projection: Mat4, position: Vec3, viewport: Viewport) -> Self {
        Self {
            view,
            projection,
            position,
            viewport,
        }
    }

    /// Eye at `position` with `orientation`; the view matrix is the inverse
    /// of that rigid pose
    pub fn from_pose(position: Vec3, orientation: Quat, projection: Mat4, viewport: Viewport) -> Self {
        let rotation = orientation.normalize().conjugate().to_mat4();
        let view = rotation * Mat4::translation(-position);
        Self::new(view, projection, position, viewport)
    }

    /// Eye at `position` looking at `target` with +Y up
    pub fn looking_at(position: Vec3, target: Vec3, projection: Mat4, viewport: Viewport) -> Self {
        let view = Mat4::look_at_rh(position, target, Vec3::UP);
        Self::new(view, projection, position, viewport)
    }
}

/// Camera context of one frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum FrameContext {
    /// Single view; the head is the eye
    Mono(EyeView),
    /// Head-mounted display: one head pose shared by two eyes
    Stereo { head: Vec3, eyes: [EyeView; 2] },
}

impl FrameContext {
    /// Stereo context with eyes offset from the head along its local X axis
    pub fn stereo_from_head(
        head: Vec3,
        orientation: Quat,
        ipd: f32,
        projection: Mat4,
    ) -> Self {
        let half = orientation.rotate_vec3(Vec3::new(ipd * 0.5, 0.0, 0.0));
        Self::Stereo {
            head,
            eyes: [
                EyeView::from_pose(head - half, orientation, projection, Viewport::LEFT_HALF),
                EyeView::from_pose(head + half, orientation, projection, Viewport::RIGHT_HALF),
            ],
        }
    }

    /// Head world position
    pub fn head_position(&self) -> Vec3 {
        match self {
            FrameContext::Mono(eye) => eye.position,
            FrameContext::Stereo { head, .. } => *head,
        }
    }

    /// Eyes to render, in order
    pub fn eyes(&self) -> impl Iterator<Item = (Eye, &EyeView)> {
        let views: &[EyeView] = match self {
            FrameContext::Mono(eye) => std::slice::from_ref(eye),
            FrameContext::Stereo { eyes, .. } => eyes,
        };
        let labels: &[Eye] = match self {
            FrameContext::Mono(_) => &[Eye::Mono],
            FrameContext::Stereo { .. } => &[Eye::Left, Eye::Right],
        };
        labels.iter().copied().zip(views.iter())
    }

    pub fn eye_count(&self) -> usize {
        match self {
            FrameContext::Mono(_) => 1,
            FrameContext::Stereo { .. } => 2,
        }
    }
}

/// Everything derived for one eye in one frame; never stored across frames
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrameTransform {
    pub eye: Eye,
    pub world: Mat4,
    pub sphere_center: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub eye_position: Vec3,
    pub head_position: Vec3,
    pub mvp: Mat4,
    pub view_dir: Mat4,
    pub viewport: Viewport,
}

/// Computes per-eye transforms and distributes them to layers
pub struct TransformUpdater;

impl TransformUpdater {
    /// Derive the transform of one eye
    ///
    /// The sphere center is the group's world matrix applied to the local
    /// origin, recomputed from scratch every call.
    pub fn compute(world: &Mat4, eye: Eye, view: &EyeView, head_position: Vec3) -> FrameTransform {
        let sphere_center = world.transform_point(Vec3::ZERO);
        let mvp = view.projection * view.view * *world;
        let view_dir = Mat4::look_rotation(view.position, sphere_center, Vec3::UP);

        FrameTransform {
            eye,
            world: *world,
            sphere_center,
            view: view.view,
            projection: view.projection,
            eye_position: view.position,
            head_position,
            mvp,
            view_dir,
            viewport: view.viewport,
        }
    }

    /// Transforms of every eye of a frame
    pub fn compute_frame(world: &Mat4, context: &FrameContext) -> Vec<FrameTransform> {
        let head = context.head_position();
        context
            .eyes()
            .map(|(eye, view)| Self::compute(world, eye, view, head))
            .collect()
    }

    /// Write the parts of `transform` that `role` consumes into `params`
    pub fn apply(role: LayerRole, transform: &FrameTransform, params: &mut LayerParams) {
        params.mvp = transform.mvp;
        match role {
            LayerRole::Background | LayerRole::Midground => {}
            LayerRole::Foreground => {
                params.world = transform.world;
                params.view_dir = transform.view_dir;
                params.sphere_center = transform.sphere_center;
                params.eye_position = transform.eye_position;
                params.head_position = transform.head_position;
            }
        }
    }
}
