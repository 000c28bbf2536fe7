//! Synchronized playback of the three video streams
//!
//! The color stream is the sync master. Starting playback snaps the depth
//! and alpha streams to the master's time once; nothing corrects drift while
//! the streams keep playing.

use crate::media::{DecodedImage, TextureSlot};
use serde::Serialize;

/// Decoded video source driven by the synchronizer
pub trait VideoStream {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    /// Playback position in seconds
    fn current_time(&self) -> f64;
    fn seek(&mut self, time: f64);
    /// Total length in seconds
    fn duration(&self) -> f64;
    /// Most recently decoded frame, if any
    fn current_frame(&self) -> Option<VideoFrame>;
}

/// A decoded frame and its presentation time
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    pub timestamp: f64,
    pub image: DecodedImage,
}

/// Color, depth and alpha streams of one video
pub struct StreamSet<S> {
    pub color: S,
    pub depth: S,
    pub alpha: S,
}

impl<S: VideoStream> StreamSet<S> {
    pub fn new(color: S, depth: S, alpha: S) -> Self {
        Self {
            color,
            depth,
            alpha,
        }
    }

    fn each_mut(&mut self) -> [&mut S; 3] {
        [&mut self.color, &mut self.depth, &mut self.alpha]
    }
}

/// Snapshot of the play state and the three stream clocks
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlaybackState {
    pub playing: bool,
    pub color_time: f64,
    pub depth_time: f64,
    pub alpha_time: f64,
}

/// Frame handle read by the renderer
///
/// `generation` increases whenever the handle receives a new frame, so
/// consumers upload only when it changed.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameHandle {
    pub frame: VideoFrame,
    pub generation: u64,
}

/// Current decoded frame of every video slot
#[derive(Clone, Debug, Default)]
pub struct CurrentFrames {
    color: Option<FrameHandle>,
    depth: Option<FrameHandle>,
    alpha: Option<FrameHandle>,
}

impl CurrentFrames {
    pub fn get(&self, slot: TextureSlot) -> Option<&FrameHandle> {
        match slot {
            TextureSlot::VideoColor => self.color.as_ref(),
            TextureSlot::VideoDepth => self.depth.as_ref(),
            TextureSlot::VideoAlpha => self.alpha.as_ref(),
            _ => None,
        }
    }

    /// True once every stream has produced a frame
    pub fn is_complete(&self) -> bool {
        self.color.is_some() && self.depth.is_some() && self.alpha.is_some()
    }

    fn store(handle: &mut Option<FrameHandle>, frame: Option<VideoFrame>) -> bool {
        let Some(frame) = frame else {
            return false;
        };
        match handle {
            Some(current) if current.frame.timestamp == frame.timestamp => false,
            Some(current) => {
                current.frame = frame;
                current.generation += 1;
                true
            }
            None => {
                *handle = Some(FrameHandle {
                    frame,
                    generation: 0,
                });
                true
            }
        }
    }
}

/// Owns the streams and their play state
pub struct PlaybackSynchronizer<S> {
    streams: StreamSet<S>,
    frames: CurrentFrames,
}

impl<S: VideoStream> PlaybackSynchronizer<S> {
    pub fn new(streams: StreamSet<S>) -> Self {
        Self {
            streams,
            frames: CurrentFrames::default(),
        }
    }

    /// Flip between playing and paused
    ///
    /// Paused to playing starts all three streams, then sets the depth and
    /// alpha clocks to the color clock. Playing to paused only pauses.
    pub fn toggle(&mut self) -> PlaybackState {
        if self.streams.color.is_paused() {
            for stream in self.streams.each_mut() {
                stream.play();
            }
            let master = self.streams.color.current_time();
            self.streams.depth.seek(master);
            self.streams.alpha.seek(master);
            tracing::info!("playback started at {:.3}s", master);
        } else {
            for stream in self.streams.each_mut() {
                stream.pause();
            }
            tracing::info!(
                "playback paused at {:.3}s",
                self.streams.color.current_time()
            );
        }
        self.state()
    }

    pub fn is_playing(&self) -> bool {
        !self.streams.color.is_paused()
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            playing: self.is_playing(),
            color_time: self.streams.color.current_time(),
            depth_time: self.streams.depth.current_time(),
            alpha_time: self.streams.alpha.current_time(),
        }
    }

    /// Pull the latest decoded frames; called once per render frame
    ///
    /// Returns the number of slots that received a new frame.
    pub fn refresh(&mut self) -> usize {
        let updated = [
            CurrentFrames::store(&mut self.frames.color, self.streams.color.current_frame()),
            CurrentFrames::store(&mut self.frames.depth, self.streams.depth.current_frame()),
            CurrentFrames::store(&mut self.frames.alpha, self.streams.alpha.current_frame()),
        ]
        .into_iter()
        .filter(|&changed| changed)
        .count();
        if updated > 0 {
            tracing::trace!("{} video frames refreshed", updated);
        }
        updated
    }

    pub fn frames(&self) -> &CurrentFrames {
        &self.frames
    }

    pub fn streams(&self) -> &StreamSet<S> {
        &self.streams
    }

    pub fn streams_mut(&mut self) -> &mut StreamSet<S> {
        &mut self.streams
    }
}

/// In-memory stream over pre-decoded frames at a fixed rate
///
/// The clock only moves through [`FrameSequence::advance`] while playing, and
/// loops at the end.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    frames: Vec<DecodedImage>,
    fps: f64,
    time: f64,
    paused: bool,
}

impl FrameSequence {
    pub fn new(frames: Vec<DecodedImage>, fps: f64) -> Self {
        Self {
            frames,
            fps: fps.max(f64::EPSILON),
            time: 0.0,
            paused: true,
        }
    }

    /// A single still frame
    pub fn still(image: DecodedImage) -> Self {
        Self::new(vec![image], 1.0)
    }

    /// A single still frame shown for `duration` seconds
    pub fn hold(image: DecodedImage, duration: f64) -> Self {
        Self::new(vec![image], 1.0 / duration.max(f64::EPSILON))
    }

    /// Move the clock forward by `dt` seconds when playing
    pub fn advance(&mut self, dt: f64) {
        if self.paused || self.frames.is_empty() {
            return;
        }
        self.time = (self.time + dt) % self.duration();
    }

    fn frame_index(&self) -> usize {
        ((self.time * self.fps).floor() as usize).min(self.frames.len().saturating_sub(1))
    }
}

impl VideoStream for FrameSequence {
    fn play(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn seek(&mut self, time: f64) {
        self.time = time.clamp(0.0, self.duration());
    }

    fn duration(&self) -> f64 {
        self.frames.len() as f64 / self.fps
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        let index = self.frame_index();
        self.frames.get(index).map(|image| VideoFrame {
            timestamp: index as f64 / self.fps,
            image: image.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(len: usize) -> FrameSequence {
        let frames = (0..len)
            .map(|i| DecodedImage::solid(2, 2, [i as u8, 0, 0, 255]).unwrap())
            .collect();
        FrameSequence::new(frames, 10.0)
    }

    fn synchronizer() -> PlaybackSynchronizer<FrameSequence> {
        PlaybackSynchronizer::new(StreamSet::new(sequence(20), sequence(20), sequence(20)))
    }

    #[test]
    fn test_starts_paused() {
        let sync = synchronizer();
        assert!(!sync.is_playing());
    }

    #[test]
    fn test_play_snaps_depth_and_alpha_to_color() {
        let mut sync = synchronizer();
        sync.streams_mut().color.seek(1.25);
        sync.streams_mut().depth.seek(0.4);
        sync.streams_mut().alpha.seek(1.9);

        let state = sync.toggle();
        assert!(state.playing);
        assert_eq!(state.depth_time, state.color_time);
        assert_eq!(state.alpha_time, state.color_time);
        assert_eq!(state.color_time, 1.25);
    }

    #[test]
    fn test_pause_keeps_timestamps() {
        let mut sync = synchronizer();
        sync.toggle();
        sync.streams_mut().color.advance(0.5);
        sync.streams_mut().depth.advance(0.3);

        let state = sync.toggle();
        assert!(!state.playing);
        assert_eq!(state.color_time, 0.5);
        assert_eq!(state.depth_time, 0.3);
        assert!(sync.streams().alpha.is_paused());
    }

    #[test]
    fn test_no_resync_while_playing() {
        let mut sync = synchronizer();
        sync.toggle();
        sync.streams_mut().color.advance(0.7);
        let state = sync.state();
        assert_eq!(state.color_time, 0.7);
        assert_eq!(state.depth_time, 0.0);
    }

    #[test]
    fn test_refresh_bumps_generation_on_new_frames() {
        let mut sync = synchronizer();
        assert_eq!(sync.refresh(), 3);
        assert!(sync.frames().is_complete());
        let first = sync.frames().get(TextureSlot::VideoColor).unwrap().generation;

        // same frame again: nothing to upload
        assert_eq!(sync.refresh(), 0);

        sync.toggle();
        sync.streams_mut().color.advance(0.25);
        assert_eq!(sync.refresh(), 1);
        let handle = sync.frames().get(TextureSlot::VideoColor).unwrap();
        assert_eq!(handle.generation, first + 1);
        assert_eq!(handle.frame.image.pixels()[0], 2);
        assert_eq!(sync.frames().get(TextureSlot::VideoDepth).unwrap().generation, 0);
    }

    #[test]
    fn test_sequence_loops() {
        let mut stream = sequence(4);
        stream.play();
        stream.advance(0.45);
        assert!((stream.current_time() - 0.05).abs() < 1e-9);
        assert_eq!(stream.current_frame().unwrap().timestamp, 0.0);
    }

    #[test]
    fn test_hold_spans_requested_duration() {
        let mut stream = FrameSequence::hold(DecodedImage::solid(2, 2, [9, 0, 0, 255]).unwrap(), 3.0);
        assert!((stream.duration() - 3.0).abs() < 1e-9);
        stream.seek(2.5);
        assert_eq!(stream.current_time(), 2.5);
        assert_eq!(stream.current_frame().unwrap().image.pixels()[0], 9);
    }

    #[test]
    fn test_static_slots_have_no_frames() {
        let mut sync = synchronizer();
        sync.refresh();
        assert!(sync.frames().get(TextureSlot::InpaintedColor).is_none());
    }
}
