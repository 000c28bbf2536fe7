//! Executes frame plans with wgpu
//!
//! One render pass per frame: clear color and depth once, then replay the
//! plan's draws, switching viewport per eye. Each (layer, eye) pair owns its
//! uniform buffer, so both eyes of a stereo frame survive until submit.

use crate::error::{RendererError, Result};
use crate::pipelines::{LayerPipelines, DEPTH_FORMAT};
use crate::textures::TextureStore;
use crate::uniforms::LayerUniforms;
use parallax_core::{CurrentFrames, Eye, FramePlan, Geometry, LayerRole, MediaSet};
use wgpu::util::DeviceExt;

/// Configuration for creating a renderer
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Format of the color targets passed to `render`
    pub color_format: wgpu::TextureFormat,
    /// Clear color of every frame
    pub clear_color: wgpu::Color,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            color_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            clear_color: wgpu::Color::BLACK,
        }
    }
}

/// Request a device without a surface (headless rendering)
pub async fn request_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(RendererError::AdapterNotFound)?;

    tracing::info!("using adapter {}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Parallax GPU Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
            },
            None,
        )
        .await?;

    Ok((device, queue))
}

fn eye_index(eye: Eye) -> usize {
    match eye {
        Eye::Mono | Eye::Left => 0,
        Eye::Right => 1,
    }
}

fn slot_index(role: LayerRole, eye: Eye) -> usize {
    role.draw_order() as usize * 2 + eye_index(eye)
}

struct DepthTarget {
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// Draws the three layers of a [`FramePlan`]
pub struct LayerRenderer {
    config: RendererConfig,
    pipelines: LayerPipelines,
    textures: TextureStore,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// Indexed by `slot_index`
    uniform_buffers: Vec<wgpu::Buffer>,
    bind_groups: Vec<wgpu::BindGroup>,
    depth: Option<DepthTarget>,
}

impl LayerRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: RendererConfig,
        proxy: &Geometry,
        media: &MediaSet,
        frames: &CurrentFrames,
    ) -> Result<Self> {
        let pipelines = LayerPipelines::new(device, config.color_format);
        let textures = TextureStore::new(device, queue, media, frames)?;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Proxy Vertex Buffer"),
            contents: proxy.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Proxy Index Buffer"),
            contents: proxy.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform_buffers = (0..LayerRole::ALL.len() * 2)
            .map(|i| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("Layer Uniforms {}", i)),
                    size: LayerUniforms::SIZE,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let mut renderer = Self {
            config,
            pipelines,
            textures,
            vertex_buffer,
            index_buffer,
            index_count: proxy.index_count() as u32,
            uniform_buffers,
            bind_groups: Vec::new(),
            depth: None,
        };
        renderer.rebuild_bind_groups(device);

        tracing::info!(
            "layer renderer ready: {} indices, format {:?}",
            renderer.index_count,
            renderer.config.color_format
        );
        Ok(renderer)
    }

    fn rebuild_bind_groups(&mut self, device: &wgpu::Device) {
        let mut bind_groups = Vec::with_capacity(self.uniform_buffers.len());

        for role in LayerRole::ALL {
            let slots = role.textures();
            let depth = |i: usize| self.textures.view_or_placeholder(slots.depth.get(i).copied());

            for eye in [Eye::Left, Eye::Right] {
                let uniforms = &self.uniform_buffers[slot_index(role, eye)];
                bind_groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} bind group", role.name())),
                    layout: &self.pipelines.bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: uniforms.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(self.textures.sampler()),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::TextureView(
                                self.textures.view_or_placeholder(Some(slots.color)),
                            ),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: wgpu::BindingResource::TextureView(depth(0)),
                        },
                        wgpu::BindGroupEntry {
                            binding: 4,
                            resource: wgpu::BindingResource::TextureView(depth(1)),
                        },
                        wgpu::BindGroupEntry {
                            binding: 5,
                            resource: wgpu::BindingResource::TextureView(depth(2)),
                        },
                        wgpu::BindGroupEntry {
                            binding: 6,
                            resource: wgpu::BindingResource::TextureView(
                                self.textures.view_or_placeholder(slots.alpha),
                            ),
                        },
                    ],
                }));
            }
        }

        self.bind_groups = bind_groups;
    }

    fn ensure_depth_target(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        if self.depth.as_ref().is_some_and(|d| d.size == size) {
            return;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Layer Depth Buffer"),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some(DepthTarget { view, size });
    }

    /// Record one frame into `encoder`
    ///
    /// `target_size` is the pixel size of `target`; plan viewports are
    /// fractions of it.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        target_size: (u32, u32),
        plan: &FramePlan,
        frames: &CurrentFrames,
    ) {
        if self.textures.upload_frames(device, queue, frames) {
            self.rebuild_bind_groups(device);
        }
        self.ensure_depth_target(device, target_size);

        for draw in &plan.draws {
            let uniforms = LayerUniforms::new(draw.role, &draw.params);
            queue.write_buffer(
                &self.uniform_buffers[slot_index(draw.role, draw.eye)],
                0,
                bytemuck::bytes_of(&uniforms),
            );
        }

        let Some(depth) = self.depth.as_ref() else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Layer Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.config.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        for draw in &plan.draws {
            let Some(pipeline) = self.pipelines.get(draw.role) else {
                continue;
            };
            let [x, y, w, h] = draw.viewport.to_pixels(target_size.0, target_size.1);
            pass.set_viewport(x, y, w, h, 0.0, 1.0);
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.bind_groups[slot_index(draw.role, draw.eye)], &[]);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }

        tracing::trace!("recorded {} layer draws", plan.draws.len());
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }
}
