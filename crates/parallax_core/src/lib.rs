//! # Parallax Core
//!
//! Layered RGBD panorama model for head-mounted displays.
//!
//! This crate provides:
//! - **Proxy geometry**: one inverted sphere shared by every layer
//! - **Depth warp** with the jump encoding and cross-layer occlusion policy
//! - **Per-eye transforms** distributed to layers right before each draw
//! - **Synchronized playback** of the color, depth and alpha streams
//! - **Frame plans** that a GPU backend executes in fixed layer order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parallax_core::prelude::*;
//!
//! let mut player = RgbdPlayer::new(ViewerConfig::default(), media, streams)?;
//! let mut scene = Scene::new();
//! player.add_to_scene(&mut scene);
//!
//! // once per display refresh
//! let plan = player.update(&mut scene, &context);
//! renderer.render(&device, &queue, &mut encoder, &view, size, &plan, player.frames());
//! ```

// Linear algebra
pub mod math;

// Shared proxy mesh
pub mod geometry;

// Depth warp and disocclusion models
pub mod alpha;
pub mod warp;

// Color effects
pub mod effects;

// Media hand-off
pub mod media;

// Layers and per-eye updates
pub mod compositor;
pub mod layer;
pub mod transform;

// Video streams
pub mod playback;

// Scene graph and player facade
pub mod player;
pub mod scene;

pub mod config;
pub mod error;

pub mod prelude;

pub use compositor::{BlendMode, Compositor, DrawCall, FramePlan};
pub use config::ViewerConfig;
pub use effects::VisualEffectParams;
pub use error::{ParallaxError, Result};
pub use geometry::{Geometry, ProxySphere, SharedGeometry, Vertex};
pub use layer::{Layer, LayerParams, LayerRole, LayerStack};
pub use media::{DecodedImage, MediaSet, TextureSlot};
pub use playback::{
    CurrentFrames, FrameSequence, PlaybackState, PlaybackSynchronizer, StreamSet, VideoFrame,
    VideoStream,
};
pub use player::RgbdPlayer;
pub use scene::{Group, GroupId, Scene};
pub use transform::{Eye, EyeView, FrameContext, FrameTransform, TransformUpdater, Viewport};
