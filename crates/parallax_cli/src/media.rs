//! Media loading for the command-line tools
//!
//! A media directory holds one PNG per static slot, named after the slot
//! (`inpainted_color.png`, `extrapolated_depth.png`, ...). Each video slot is
//! either a single PNG (`video_color.png`) or a directory of frames
//! (`video_color/0001.png`, ...) played in name order.

use anyhow::{Context, Result};
use parallax_core::{DecodedImage, FrameSequence, MediaSet, StreamSet, TextureSlot, VideoStream};
use std::fs;
use std::path::Path;
use tracing::debug;

pub struct LoadedMedia {
    pub media: MediaSet,
    pub streams: StreamSet<FrameSequence>,
}

fn load_image(path: &Path) -> Result<DecodedImage> {
    let image = image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
    DecodedImage::try_from(image).with_context(|| format!("unusable image {}", path.display()))
}

fn load_static(dir: &Path, slot: TextureSlot) -> Result<DecodedImage> {
    load_image(&dir.join(format!("{}.png", slot.name())))
}

/// A video slot as found on disk
enum StreamSource {
    Frames(FrameSequence),
    Still(DecodedImage),
}

fn load_stream(dir: &Path, slot: TextureSlot, fps: f64) -> Result<StreamSource> {
    let frames_dir = dir.join(slot.name());
    if frames_dir.is_dir() {
        let mut paths: Vec<_> = fs::read_dir(&frames_dir)
            .with_context(|| format!("failed to list {}", frames_dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        paths.sort();
        if paths.is_empty() {
            anyhow::bail!("{} contains no PNG frames", frames_dir.display());
        }
        let frames = paths
            .iter()
            .map(|p| load_image(p))
            .collect::<Result<Vec<_>>>()?;
        debug!("{}: {} frames", slot.name(), frames.len());
        Ok(StreamSource::Frames(FrameSequence::new(frames, fps)))
    } else {
        Ok(StreamSource::Still(load_static(dir, slot)?))
    }
}

/// Turn the three video slots into streams of one length
///
/// Stills are held for the longest frame sequence, so a single depth or
/// alpha image can accompany a color video.
fn resolve_streams(sources: [StreamSource; 3]) -> StreamSet<FrameSequence> {
    let longest = sources
        .iter()
        .filter_map(|source| match source {
            StreamSource::Frames(sequence) => Some(sequence.duration()),
            StreamSource::Still(_) => None,
        })
        .reduce(f64::max);

    let [color, depth, alpha] = sources.map(|source| match (source, longest) {
        (StreamSource::Frames(sequence), _) => sequence,
        (StreamSource::Still(image), Some(duration)) => FrameSequence::hold(image, duration),
        (StreamSource::Still(image), None) => FrameSequence::still(image),
    });
    StreamSet::new(color, depth, alpha)
}

/// Load a media directory
pub fn load_dir(dir: &Path, fps: f64) -> Result<LoadedMedia> {
    let media = MediaSet {
        extrapolated_color: load_static(dir, TextureSlot::ExtrapolatedColor)?,
        extrapolated_depth: load_static(dir, TextureSlot::ExtrapolatedDepth)?,
        extrapolated_alpha: load_static(dir, TextureSlot::ExtrapolatedAlpha)?,
        inpainted_color: load_static(dir, TextureSlot::InpaintedColor)?,
        inpainted_depth: load_static(dir, TextureSlot::InpaintedDepth)?,
    };
    let streams = resolve_streams([
        load_stream(dir, TextureSlot::VideoColor, fps)?,
        load_stream(dir, TextureSlot::VideoDepth, fps)?,
        load_stream(dir, TextureSlot::VideoAlpha, fps)?,
    ]);
    Ok(LoadedMedia { media, streams })
}

/// Procedural panorama for trying the pipeline without assets
///
/// Depth falls off toward the poles and the foreground mask is a horizontal
/// band, so every layer contributes somewhere.
pub fn synthetic(width: u32, height: u32) -> Result<LoadedMedia> {
    let gradient = |r: u8, g: u8, b: u8| -> Result<DecodedImage> {
        image::RgbaImage::from_fn(width, height, |x, _| {
            let t = x as f32 / width.max(1) as f32;
            image::Rgba([
                (r as f32 * (0.5 + 0.5 * t)) as u8,
                (g as f32 * (1.0 - 0.5 * t)) as u8,
                b,
                255,
            ])
        })
        .try_into()
        .map_err(Into::into)
    };
    let depth = |level: f32| -> Result<DecodedImage> {
        image::RgbaImage::from_fn(width, height, |_, y| {
            let v = y as f32 / height.max(1) as f32;
            let d = (level * (1.0 - (2.0 * v - 1.0).abs() * 0.5) * 255.0) as u8;
            image::Rgba([d, d, d, 255])
        })
        .try_into()
        .map_err(Into::into)
    };
    let band = |lo: f32, hi: f32| -> Result<DecodedImage> {
        image::RgbaImage::from_fn(width, height, |_, y| {
            let v = y as f32 / height.max(1) as f32;
            let a = if (lo..hi).contains(&v) { 255 } else { 0 };
            image::Rgba([a, a, a, 255])
        })
        .try_into()
        .map_err(Into::into)
    };

    Ok(LoadedMedia {
        media: MediaSet {
            extrapolated_color: gradient(60, 200, 120)?,
            extrapolated_depth: depth(0.6)?,
            extrapolated_alpha: band(0.3, 0.8)?,
            inpainted_color: gradient(90, 60, 200)?,
            inpainted_depth: depth(0.9)?,
        },
        streams: StreamSet::new(
            FrameSequence::still(gradient(230, 200, 40)?),
            FrameSequence::still(depth(0.4)?),
            FrameSequence::still(band(0.45, 0.65)?),
        ),
    })
}
