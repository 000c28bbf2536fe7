//! RGBD player facade
//!
//! Ties the shared proxy, the layer stack, the playback synchronizer and the
//! scene group together behind the handful of entry points a host needs:
//! add to a scene, update per frame, toggle playback, and the layer-count and
//! visual-effect setters.

use crate::compositor::{Compositor, FramePlan};
use crate::config::ViewerConfig;
use crate::effects::VisualEffectParams;
use crate::error::{ParallaxError, Result};
use crate::geometry::{ProxySphere, SharedGeometry};
use crate::layer::LayerStack;
use crate::media::{MediaSet, TextureSlot};
use crate::playback::{CurrentFrames, PlaybackState, PlaybackSynchronizer, StreamSet, VideoStream};
use crate::scene::{Group, GroupId, Scene};
use crate::transform::{FrameContext, TransformUpdater};

/// Largest duration difference, in seconds, tolerated between streams
const DURATION_TOLERANCE: f64 = 1e-6;

/// Layered RGBD panorama player
pub struct RgbdPlayer<S> {
    config: ViewerConfig,
    proxy: SharedGeometry,
    media: MediaSet,
    layers: LayerStack,
    playback: PlaybackSynchronizer<S>,
    effects: VisualEffectParams,
    group: Option<GroupId>,
    has_initial_position: bool,
}

impl<S: VideoStream> RgbdPlayer<S> {
    /// Build a player from decoded media
    ///
    /// Every stream must already have a decoded frame; the player never waits
    /// for media once constructed.
    pub fn new(config: ViewerConfig, media: MediaSet, streams: StreamSet<S>) -> Result<Self> {
        config.validate()?;

        let mut playback = PlaybackSynchronizer::new(streams);
        playback.refresh();
        for slot in TextureSlot::STREAMED {
            if playback.frames().get(slot).is_none() {
                return Err(ParallaxError::InvalidMedia {
                    slot: slot.name().to_string(),
                    reason: "stream has no decoded frame".to_string(),
                });
            }
        }

        // Starting playback seeks depth and alpha to the color clock, which
        // only lands on the same time when all three streams are equally long
        let streams = playback.streams();
        let master = streams.color.duration();
        for (slot, duration) in [
            (TextureSlot::VideoDepth, streams.depth.duration()),
            (TextureSlot::VideoAlpha, streams.alpha.duration()),
        ] {
            if (duration - master).abs() > DURATION_TOLERANCE {
                return Err(ParallaxError::InvalidMedia {
                    slot: slot.name().to_string(),
                    reason: format!(
                        "stream lasts {:.3}s but the color stream lasts {:.3}s",
                        duration, master
                    ),
                });
            }
        }

        let proxy = ProxySphere::from_config(&config.proxy);
        let layers = LayerStack::new(&config);

        tracing::info!(
            "rgbd player ready: {} proxy triangles, {} layers visible",
            proxy.triangle_count(),
            layers.layer_count()
        );

        Ok(Self {
            config,
            proxy,
            media,
            layers,
            playback,
            effects: VisualEffectParams::default(),
            group: None,
            has_initial_position: false,
        })
    }

    /// Register the proxy group in `scene`
    ///
    /// Adding again replaces the previous group if `scene` holds it; groups
    /// of other scenes are left alone, so detach with
    /// [`RgbdPlayer::remove_from_scene`] before switching scenes.
    pub fn add_to_scene(&mut self, scene: &mut Scene) -> GroupId {
        if let Some(id) = self.group.take() {
            scene.remove(id);
        }
        let id = scene.add(Group::new("rgbd_proxy", self.config.group.position));
        self.group = Some(id);
        id
    }

    /// Detach the proxy group; returns false when it was not in `scene`
    pub fn remove_from_scene(&mut self, scene: &mut Scene) -> bool {
        match self.group.take() {
            Some(id) => scene.remove(id).is_some(),
            None => false,
        }
    }

    /// Per-frame update: refresh video frames, transform every eye and plan
    /// the ordered draws
    ///
    /// Returns an empty plan when the player is not in `scene`.
    pub fn update(&mut self, scene: &mut Scene, context: &FrameContext) -> FramePlan {
        let Some(group) = self.group.and_then(|id| scene.get_mut(id)) else {
            tracing::trace!("update skipped: player not in scene");
            return FramePlan::default();
        };

        if !self.has_initial_position {
            if self.config.group.recenter_on_first_frame {
                group.position = context.head_position();
                tracing::debug!("proxy recentered on head at {:?}", group.position);
            }
            self.has_initial_position = true;
        }

        self.playback.refresh();

        let world = group.world_matrix();
        let transforms = TransformUpdater::compute_frame(&world, context);
        Compositor::plan(&mut self.layers, &transforms)
    }

    /// Recenter on the head again at the next update
    pub fn reset_initial_position(&mut self) {
        self.has_initial_position = false;
    }

    pub fn toggle_playback(&mut self) -> PlaybackState {
        self.playback.toggle()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// Show 1 to 3 layers; returns the applied count
    pub fn set_layer_count(&mut self, count: i32) -> u32 {
        self.layers.set_layer_count(count)
    }

    /// Set desaturation and tint on every layer; persists until changed
    pub fn set_visual_effects(&mut self, desaturation: f32, tint: bool) -> VisualEffectParams {
        self.effects = VisualEffectParams::new(desaturation, tint);
        self.layers.set_visual_effects(self.effects);
        self.effects
    }

    pub fn visual_effects(&self) -> VisualEffectParams {
        self.effects
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn proxy(&self) -> &SharedGeometry {
        &self.proxy
    }

    pub fn media(&self) -> &MediaSet {
        &self.media
    }

    pub fn frames(&self) -> &CurrentFrames {
        self.playback.frames()
    }

    pub fn streams_mut(&mut self) -> &mut StreamSet<S> {
        self.playback.streams_mut()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerRole;
    use crate::math::{Mat4, Quat, Vec3};
    use crate::media::DecodedImage;
    use crate::playback::FrameSequence;
    use crate::transform::{Eye, EyeView, Viewport};

    fn small_config() -> ViewerConfig {
        let mut config = ViewerConfig::default();
        config.proxy.width_segments = 16;
        config.proxy.height_segments = 8;
        config
    }

    fn streams() -> StreamSet<FrameSequence> {
        let frames: Vec<DecodedImage> = (0..30)
            .map(|i| DecodedImage::solid(4, 2, [i as u8, 0, 0, 255]).unwrap())
            .collect();
        StreamSet::new(
            FrameSequence::new(frames.clone(), 30.0),
            FrameSequence::new(frames.clone(), 30.0),
            FrameSequence::new(frames, 30.0),
        )
    }

    fn player() -> RgbdPlayer<FrameSequence> {
        let media = MediaSet::solid(4, 2, [200, 100, 50, 255], 128, 255).unwrap();
        RgbdPlayer::new(small_config(), media, streams()).unwrap()
    }

    fn projection() -> Mat4 {
        Mat4::perspective_rh(1.6, 1.0, 0.05, 100.0)
    }

    fn stereo(head: Vec3) -> FrameContext {
        FrameContext::stereo_from_head(head, Quat::IDENTITY, 0.064, projection())
    }

    #[test]
    fn test_rejects_stream_without_frames() {
        let media = MediaSet::solid(4, 2, [0, 0, 0, 255], 128, 255).unwrap();
        let mut set = streams();
        set.alpha = FrameSequence::new(Vec::new(), 30.0);
        let err = RgbdPlayer::new(small_config(), media, set).err().unwrap();
        assert!(matches!(err, ParallaxError::InvalidMedia { ref slot, .. } if slot == "video_alpha"));
    }

    #[test]
    fn test_rejects_streams_of_different_length() {
        let media = MediaSet::solid(4, 2, [0, 0, 0, 255], 128, 255).unwrap();
        let frames = |len: usize| -> Vec<DecodedImage> {
            (0..len)
                .map(|i| DecodedImage::solid(4, 2, [i as u8, 0, 0, 255]).unwrap())
                .collect()
        };
        let set = StreamSet::new(
            FrameSequence::new(frames(30), 10.0),
            FrameSequence::new(frames(10), 10.0),
            FrameSequence::new(frames(10), 10.0),
        );
        let err = RgbdPlayer::new(small_config(), media, set).err().unwrap();
        assert!(matches!(err, ParallaxError::InvalidMedia { ref slot, .. } if slot == "video_depth"));
    }

    #[test]
    fn test_play_snaps_late_color_clock() {
        let mut player = player();
        player.streams_mut().color.seek(0.8);
        let state = player.toggle_playback();
        assert!(state.playing);
        assert_eq!(state.color_time, 0.8);
        assert_eq!(state.depth_time, state.color_time);
        assert_eq!(state.alpha_time, state.color_time);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let media = MediaSet::solid(4, 2, [0, 0, 0, 255], 128, 255).unwrap();
        let mut config = small_config();
        config.proxy.radius = -1.0;
        assert!(RgbdPlayer::new(config, media, streams()).is_err());
    }

    #[test]
    fn test_update_outside_scene_is_empty() {
        let mut player = player();
        let mut scene = Scene::new();
        assert!(player.update(&mut scene, &stereo(Vec3::ZERO)).is_empty());
    }

    #[test]
    fn test_stereo_update_draws_three_layers_per_eye() {
        let mut player = player();
        let mut scene = Scene::new();
        player.add_to_scene(&mut scene);

        let plan = player.update(&mut scene, &stereo(Vec3::new(0.0, 1.6, 0.0)));
        assert_eq!(plan.len(), 6);
        assert_eq!(plan.for_eye(Eye::Left).count(), 3);
        assert_eq!(plan.for_eye(Eye::Right).count(), 3);
    }

    #[test]
    fn test_first_update_recenters_on_head() {
        let mut player = player();
        let mut scene = Scene::new();
        let id = player.add_to_scene(&mut scene);
        assert_eq!(scene.get(id).unwrap().position, Vec3::new(0.0, 1.7, 0.0));

        let head = Vec3::new(0.3, 1.5, -0.2);
        let plan = player.update(&mut scene, &stereo(head));
        assert_eq!(scene.get(id).unwrap().position, head);
        let fg = plan.for_eye(Eye::Left).last().unwrap();
        assert_eq!(fg.role, LayerRole::Foreground);
        assert!((fg.params.sphere_center - head).length() < 1e-6);

        // later head motion produces parallax instead of moving the proxy
        player.update(&mut scene, &stereo(head + Vec3::new(0.1, 0.0, 0.0)));
        assert_eq!(scene.get(id).unwrap().position, head);

        player.reset_initial_position();
        let moved = Vec3::new(1.0, 1.0, 1.0);
        player.update(&mut scene, &stereo(moved));
        assert_eq!(scene.get(id).unwrap().position, moved);
    }

    #[test]
    fn test_recentering_can_be_disabled() {
        let media = MediaSet::solid(4, 2, [0, 0, 0, 255], 128, 255).unwrap();
        let mut config = small_config();
        config.group.recenter_on_first_frame = false;
        let mut player = RgbdPlayer::new(config, media, streams()).unwrap();
        let mut scene = Scene::new();
        let id = player.add_to_scene(&mut scene);
        player.update(&mut scene, &stereo(Vec3::new(2.0, 0.0, 0.0)));
        assert_eq!(scene.get(id).unwrap().position, Vec3::new(0.0, 1.7, 0.0));
    }

    #[test]
    fn test_sphere_center_does_not_accumulate() {
        let mut player = player();
        let mut scene = Scene::new();
        player.add_to_scene(&mut scene);
        let head = Vec3::new(0.0, 1.6, 0.0);
        let first = player.update(&mut scene, &stereo(head));
        let second = player.update(&mut scene, &stereo(head));
        assert_eq!(
            first.draws[2].params.sphere_center,
            second.draws[2].params.sphere_center
        );
    }

    #[test]
    fn test_mono_head_equals_eye() {
        let mut player = player();
        let mut scene = Scene::new();
        player.add_to_scene(&mut scene);
        let eye = EyeView::looking_at(
            Vec3::new(0.0, 1.7, 0.0),
            Vec3::new(0.0, 1.7, -1.0),
            projection(),
            Viewport::FULL,
        );
        let plan = player.update(&mut scene, &FrameContext::Mono(eye));
        assert_eq!(plan.len(), 3);
        let fg = plan.draws.last().unwrap();
        assert_eq!(fg.params.head_position, fg.params.eye_position);
    }

    #[test]
    fn test_play_pause_play_round_trip() {
        let mut player = player();
        let mut scene = Scene::new();
        player.add_to_scene(&mut scene);
        player.set_layer_count(2);
        let context = stereo(Vec3::new(0.0, 1.6, 0.0));
        let before = player.update(&mut scene, &context);

        player.toggle_playback();
        player.streams_mut().color.advance(0.5);
        player.toggle_playback();
        let state = player.toggle_playback();
        assert!(state.playing);
        assert_eq!(state.depth_time, state.color_time);
        assert_eq!(state.alpha_time, state.color_time);

        let after = player.update(&mut scene, &context);
        assert_eq!(player.layers().layer_count(), 2);
        let roles = |plan: &FramePlan| plan.draws.iter().map(|d| (d.eye, d.role)).collect::<Vec<_>>();
        assert_eq!(roles(&before), roles(&after));
    }

    #[test]
    fn test_visual_effects_persist_across_updates() {
        let mut player = player();
        let mut scene = Scene::new();
        player.add_to_scene(&mut scene);
        let applied = player.set_visual_effects(1.0, true);
        let context = stereo(Vec3::ZERO);
        player.update(&mut scene, &context);
        let plan = player.update(&mut scene, &context);
        assert!(plan.draws.iter().all(|d| d.params.effects == applied));
    }

    #[test]
    fn test_other_scenes_are_never_touched() {
        let mut player = player();
        let mut first = Scene::new();
        let mut second = Scene::new();
        let bystander_position = Vec3::new(4.0, 0.0, 4.0);
        let bystander = second.add(Group::new("bystander", bystander_position));

        player.add_to_scene(&mut first);
        assert!(player
            .update(&mut second, &stereo(Vec3::new(0.0, 1.6, 0.0)))
            .is_empty());
        assert_eq!(second.get(bystander).unwrap().position, bystander_position);

        let id = player.add_to_scene(&mut second);
        assert!(second.contains(bystander));
        assert!(second.contains(id));
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_remove_from_scene() {
        let mut player = player();
        let mut scene = Scene::new();
        player.add_to_scene(&mut scene);
        assert!(player.remove_from_scene(&mut scene));
        assert!(scene.is_empty());
        assert!(!player.remove_from_scene(&mut scene));
    }
}
