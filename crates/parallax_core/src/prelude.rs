//! Common imports for hosts embedding the player

pub use crate::compositor::{BlendMode, DrawCall, FramePlan};
pub use crate::config::ViewerConfig;
pub use crate::effects::VisualEffectParams;
pub use crate::error::{ParallaxError, Result};
pub use crate::layer::LayerRole;
pub use crate::math::{Mat4, Quat, Vec3};
pub use crate::media::{DecodedImage, MediaSet, TextureSlot};
pub use crate::playback::{FrameSequence, PlaybackState, StreamSet, VideoFrame, VideoStream};
pub use crate::player::RgbdPlayer;
pub use crate::scene::Scene;
pub use crate::transform::{Eye, EyeView, FrameContext, Viewport};
