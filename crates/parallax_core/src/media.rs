//! Decoded media handed to the player
//!
//! Decoding happens outside this crate. The player receives RGBA8 surfaces for
//! the five static images up front and pulls video frames from
//! [`crate::playback::VideoStream`]s.

use crate::error::{ParallaxError, Result};
use serde::Serialize;
use std::sync::Arc;

/// Every texture a layer may sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TextureSlot {
    VideoColor,
    VideoDepth,
    VideoAlpha,
    ExtrapolatedColor,
    ExtrapolatedDepth,
    ExtrapolatedAlpha,
    InpaintedColor,
    InpaintedDepth,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 8] = [
        TextureSlot::VideoColor,
        TextureSlot::VideoDepth,
        TextureSlot::VideoAlpha,
        TextureSlot::ExtrapolatedColor,
        TextureSlot::ExtrapolatedDepth,
        TextureSlot::ExtrapolatedAlpha,
        TextureSlot::InpaintedColor,
        TextureSlot::InpaintedDepth,
    ];

    /// Slots fed by the video streams
    pub const STREAMED: [TextureSlot; 3] = [
        TextureSlot::VideoColor,
        TextureSlot::VideoDepth,
        TextureSlot::VideoAlpha,
    ];

    pub fn is_streamed(self) -> bool {
        Self::STREAMED.contains(&self)
    }

    /// Slots holding sRGB-encoded color; the others hold linear depth or
    /// alpha data
    pub fn is_color(self) -> bool {
        matches!(
            self,
            TextureSlot::VideoColor | TextureSlot::ExtrapolatedColor | TextureSlot::InpaintedColor
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            TextureSlot::VideoColor => "video_color",
            TextureSlot::VideoDepth => "video_depth",
            TextureSlot::VideoAlpha => "video_alpha",
            TextureSlot::ExtrapolatedColor => "extrapolated_color",
            TextureSlot::ExtrapolatedDepth => "extrapolated_depth",
            TextureSlot::ExtrapolatedAlpha => "extrapolated_alpha",
            TextureSlot::InpaintedColor => "inpainted_color",
            TextureSlot::InpaintedDepth => "inpainted_depth",
        }
    }
}

/// A decoded RGBA8 surface
///
/// Depth and alpha maps are read from the red channel.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl DecodedImage {
    /// Wrap tightly packed RGBA8 pixels
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ParallaxError::InvalidMedia {
                slot: "image".to_string(),
                reason: format!("empty surface {}x{}", width, height),
            });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ParallaxError::InvalidMedia {
                slot: "image".to_string(),
                reason: format!(
                    "expected {} bytes for {}x{} RGBA8, got {}",
                    expected,
                    width,
                    height,
                    pixels.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// Single-color surface
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let count = width as usize * height as usize;
        Self::new(width, height, rgba.repeat(count))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Nearest-texel RGBA at a texture coordinate, normalized to `[0, 1]`
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        let x = ((u.clamp(0.0, 1.0) * self.width as f32) as u32).min(self.width - 1);
        let y = ((v.clamp(0.0, 1.0) * self.height as f32) as u32).min(self.height - 1);
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[i..i + 4];
        [
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
            px[3] as f32 / 255.0,
        ]
    }
}

#[cfg(feature = "image")]
impl TryFrom<image::RgbaImage> for DecodedImage {
    type Error = ParallaxError;

    fn try_from(image: image::RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }
}

#[cfg(feature = "image")]
impl TryFrom<image::DynamicImage> for DecodedImage {
    type Error = ParallaxError;

    fn try_from(image: image::DynamicImage) -> Result<Self> {
        image.to_rgba8().try_into()
    }
}

/// The static images of one panorama
#[derive(Clone, Debug)]
pub struct MediaSet {
    pub extrapolated_color: DecodedImage,
    pub extrapolated_depth: DecodedImage,
    pub extrapolated_alpha: DecodedImage,
    pub inpainted_color: DecodedImage,
    pub inpainted_depth: DecodedImage,
}

impl MediaSet {
    /// Static image bound to `slot`, `None` for streamed slots
    pub fn get(&self, slot: TextureSlot) -> Option<&DecodedImage> {
        match slot {
            TextureSlot::ExtrapolatedColor => Some(&self.extrapolated_color),
            TextureSlot::ExtrapolatedDepth => Some(&self.extrapolated_depth),
            TextureSlot::ExtrapolatedAlpha => Some(&self.extrapolated_alpha),
            TextureSlot::InpaintedColor => Some(&self.inpainted_color),
            TextureSlot::InpaintedDepth => Some(&self.inpainted_depth),
            TextureSlot::VideoColor | TextureSlot::VideoDepth | TextureSlot::VideoAlpha => None,
        }
    }

    /// Static slots with their images
    pub fn iter(&self) -> impl Iterator<Item = (TextureSlot, &DecodedImage)> {
        TextureSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|image| (slot, image)))
    }

    /// Uniform media for previews and tests
    pub fn solid(width: u32, height: u32, color: [u8; 4], depth: u8, alpha: u8) -> Result<Self> {
        let depth = DecodedImage::solid(width, height, [depth, depth, depth, 255])?;
        let alpha = DecodedImage::solid(width, height, [alpha, alpha, alpha, 255])?;
        let color = DecodedImage::solid(width, height, color)?;
        Ok(Self {
            extrapolated_color: color.clone(),
            extrapolated_depth: depth.clone(),
            extrapolated_alpha: alpha,
            inpainted_color: color,
            inpainted_depth: depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        let err = DecodedImage::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, ParallaxError::InvalidMedia { .. }));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(DecodedImage::new(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn test_sample_nearest() {
        let mut pixels = vec![0u8; 2 * 1 * 4];
        pixels[4..8].copy_from_slice(&[255, 0, 0, 255]);
        let image = DecodedImage::new(2, 1, pixels).unwrap();
        assert_eq!(image.sample(0.0, 0.0), [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(image.sample(0.9, 0.5), [1.0, 0.0, 0.0, 1.0]);
        // edge clamps into the last texel
        assert_eq!(image.sample(1.0, 1.0), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_media_set_covers_static_slots() {
        let media = MediaSet::solid(4, 2, [10, 20, 30, 255], 128, 255).unwrap();
        let slots: Vec<TextureSlot> = media.iter().map(|(slot, _)| slot).collect();
        assert_eq!(slots.len(), 5);
        assert!(slots.iter().all(|slot| !slot.is_streamed()));
        assert!(media.get(TextureSlot::VideoColor).is_none());
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_from_rgba_image() {
        let image = image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]));
        let decoded = DecodedImage::try_from(image).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        assert_eq!(&decoded.pixels()[..4], &[1, 2, 3, 4]);
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_empty_rgba_image_is_rejected() {
        let image = image::RgbaImage::new(0, 0);
        let err = DecodedImage::try_from(image).unwrap_err();
        assert!(matches!(err, ParallaxError::InvalidMedia { .. }));

        let dynamic = image::DynamicImage::new_rgb8(4, 0);
        assert!(DecodedImage::try_from(dynamic).is_err());
    }

    #[test]
    fn test_color_slots() {
        let color: Vec<TextureSlot> = TextureSlot::ALL.into_iter().filter(|s| s.is_color()).collect();
        assert_eq!(
            color,
            vec![
                TextureSlot::VideoColor,
                TextureSlot::ExtrapolatedColor,
                TextureSlot::InpaintedColor
            ]
        );
    }
}
