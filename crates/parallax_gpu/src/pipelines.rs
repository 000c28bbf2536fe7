//! Render pipelines of the three layers

use crate::shaders;
use parallax_core::{BlendMode, LayerRole};
use rustc_hash::FxHashMap;

/// Depth buffer format shared by every layer pipeline
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertex buffer layout of `parallax_core::Vertex`: position + normal + uv
pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 32,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 24,
                shader_location: 2,
            },
        ],
    }
}

/// Blend state for a layer's blend mode
pub fn blend_state(blend: BlendMode) -> Option<wgpu::BlendState> {
    match blend {
        BlendMode::Opaque => None,
        BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
    }
}

fn texture_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Bind group layout shared by all layer programs
pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let both = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Layer Bind Group Layout"),
        entries: &[
            // Uniforms
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: both,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // Sampler
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: both,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            // Color
            texture_entry(2, wgpu::ShaderStages::FRAGMENT),
            // Depth: own, next, last
            texture_entry(3, wgpu::ShaderStages::VERTEX),
            texture_entry(4, wgpu::ShaderStages::VERTEX),
            texture_entry(5, wgpu::ShaderStages::VERTEX),
            // Alpha mask
            texture_entry(6, wgpu::ShaderStages::FRAGMENT),
        ],
    })
}

/// One pipeline per layer role
pub struct LayerPipelines {
    pub bind_group_layout: wgpu::BindGroupLayout,
    pipelines: FxHashMap<LayerRole, wgpu::RenderPipeline>,
}

impl LayerPipelines {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let bind_group_layout = create_bind_group_layout(device);
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("layer_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = LayerRole::ALL
            .into_iter()
            .map(|role| {
                let pipeline = Self::create_layer_pipeline(device, &layout, role, color_format);
                (role, pipeline)
            })
            .collect();

        Self {
            bind_group_layout,
            pipelines,
        }
    }

    /// Create the pipeline of one layer
    ///
    /// The proxy's triangles wind counter-clockwise seen from inside, so back
    /// faces are culled like any closed mesh.
    fn create_layer_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        role: LayerRole,
        color_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let label = format!("{}_layer", role.name());
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(shaders::source(role).into()),
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_buffer_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: blend_state(role.blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    pub fn get(&self, role: LayerRole) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_matches_vertex_struct() {
        let layout = vertex_buffer_layout();
        assert_eq!(
            layout.array_stride as usize,
            std::mem::size_of::<parallax_core::Vertex>()
        );
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[2].offset, 24);
    }

    #[test]
    fn test_blend_per_role() {
        assert!(blend_state(LayerRole::Background.blend()).is_none());
        assert_eq!(
            blend_state(LayerRole::Foreground.blend()),
            Some(wgpu::BlendState::ALPHA_BLENDING)
        );
    }
}
