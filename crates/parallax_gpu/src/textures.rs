//! Layer textures on the GPU
//!
//! Static images are uploaded once. Video slots are rewritten whenever the
//! playback frame handle reports a new generation; a texture is recreated only
//! when the frame size changes.
//!
//! Color slots are sRGB so sampling yields linear values; depth and alpha
//! maps are stored as plain unorm data.

use crate::error::{RendererError, Result};
use parallax_core::{CurrentFrames, DecodedImage, MediaSet, TextureSlot};
use rustc_hash::FxHashMap;

/// An uploaded RGBA8 texture
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    /// Frame generation last uploaded (video slots only)
    generation: Option<u64>,
}

/// Texture format backing `slot`
pub fn slot_format(slot: TextureSlot) -> wgpu::TextureFormat {
    if slot.is_color() {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

impl GpuTexture {
    fn create(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
            generation: None,
        }
    }

    fn write(&self, queue: &wgpu::Queue, pixels: &[u8]) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn from_image(device: &wgpu::Device, queue: &wgpu::Queue, slot: TextureSlot, image: &DecodedImage) -> Self {
        let texture = Self::create(
            device,
            slot.name(),
            slot_format(slot),
            image.width(),
            image.height(),
        );
        texture.write(queue, image.pixels());
        texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Every texture slot, a white placeholder and the shared sampler
pub struct TextureStore {
    textures: FxHashMap<TextureSlot, GpuTexture>,
    placeholder: GpuTexture,
    sampler: wgpu::Sampler,
}

impl TextureStore {
    /// Upload the static media and the first video frames
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        media: &MediaSet,
        frames: &CurrentFrames,
    ) -> Result<Self> {
        // White so an unused depth slot never wins a min()
        let placeholder = GpuTexture::create(
            device,
            "Placeholder Layer Texture",
            wgpu::TextureFormat::Rgba8Unorm,
            1,
            1,
        );
        placeholder.write(queue, &[255u8, 255, 255, 255]);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Layer Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let mut textures = FxHashMap::default();
        for (slot, image) in media.iter() {
            textures.insert(slot, GpuTexture::from_image(device, queue, slot, image));
        }

        let mut store = Self {
            textures,
            placeholder,
            sampler,
        };
        store.upload_frames(device, queue, frames);

        for slot in TextureSlot::ALL {
            if !store.textures.contains_key(&slot) {
                return Err(RendererError::MissingTexture(slot.name()));
            }
        }

        tracing::debug!("uploaded {} layer textures", store.textures.len());
        Ok(store)
    }

    /// Upload video frames whose generation changed
    ///
    /// Returns true when a texture was recreated and bind groups referencing
    /// it must be rebuilt.
    pub fn upload_frames(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frames: &CurrentFrames) -> bool {
        let mut recreated = false;

        for slot in TextureSlot::STREAMED {
            let Some(handle) = frames.get(slot) else {
                continue;
            };
            let image = &handle.frame.image;

            let needs_new = self
                .textures
                .get(&slot)
                .map_or(true, |t| t.size() != (image.width(), image.height()));
            if needs_new {
                tracing::debug!(
                    "allocating {} texture {}x{}",
                    slot.name(),
                    image.width(),
                    image.height()
                );
                self.textures.insert(
                    slot,
                    GpuTexture::create(
                        device,
                        slot.name(),
                        slot_format(slot),
                        image.width(),
                        image.height(),
                    ),
                );
                recreated = true;
            }

            if let Some(texture) = self.textures.get_mut(&slot) {
                if texture.generation != Some(handle.generation) {
                    texture.write(queue, image.pixels());
                    texture.generation = Some(handle.generation);
                }
            }
        }

        recreated
    }

    pub fn get(&self, slot: TextureSlot) -> Option<&GpuTexture> {
        self.textures.get(&slot)
    }

    /// View bound for `slot`, the placeholder when the layer has none there
    pub fn view_or_placeholder(&self, slot: Option<TextureSlot>) -> &wgpu::TextureView {
        slot.and_then(|slot| self.textures.get(&slot))
            .unwrap_or(&self.placeholder)
            .view()
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_slots_are_srgb() {
        for slot in [
            TextureSlot::VideoColor,
            TextureSlot::ExtrapolatedColor,
            TextureSlot::InpaintedColor,
        ] {
            assert_eq!(slot_format(slot), wgpu::TextureFormat::Rgba8UnormSrgb);
        }
    }

    #[test]
    fn test_depth_and_alpha_stay_linear() {
        for slot in TextureSlot::ALL.into_iter().filter(|s| !s.is_color()) {
            assert_eq!(slot_format(slot), wgpu::TextureFormat::Rgba8Unorm, "{}", slot.name());
        }
    }
}
