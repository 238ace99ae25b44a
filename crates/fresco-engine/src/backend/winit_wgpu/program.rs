use crate::shader::LinkedProgram;

use super::gpu::SharedGpu;

/// Storage buffer holding a colormap table (`array<vec4<f32>>`).
pub struct ColormapBuffer {
    buffer: wgpu::Buffer,
}

impl ColormapBuffer {
    pub(crate) fn new(device: &wgpu::Device, size: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fresco colormap buffer"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// Pipeline for the window's colormap program.
///
/// Bind groups:
/// - 0: colormap table, see [`ColormapProgram::bind_colormap`]
/// - 1: scalar field texture, see [`ColormapProgram::bind_field`]
pub struct ColormapProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    colormap_layout: wgpu::BindGroupLayout,
    field_layout: wgpu::BindGroupLayout,
}

impl ColormapProgram {
    pub(crate) fn new(device: &wgpu::Device, format: wgpu::TextureFormat, linked: &LinkedProgram) -> Self {
        let colormap_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fresco colormap bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let field_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fresco field bgl"),
            entries: &[texture_entry(0)],
        });

        let pipeline = build_pipeline(
            device,
            format,
            linked,
            &[&colormap_layout, &field_layout],
            Some(wgpu::BlendState::REPLACE),
        );

        Self {
            label: linked.label().to_string(),
            pipeline,
            colormap_layout,
            field_layout,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bind group 0. Rebuild it after the window's colormap changes size.
    pub fn bind_colormap(&self, gpu: &SharedGpu, colormap: &ColormapBuffer) -> wgpu::BindGroup {
        gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fresco colormap bind group"),
            layout: &self.colormap_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: colormap.buffer().as_entire_binding(),
            }],
        })
    }

    /// Bind group 1 for a scalar field (see [`ScalarField`]).
    pub fn bind_field(&self, gpu: &SharedGpu, field: &ScalarField) -> wgpu::BindGroup {
        gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fresco field bind group"),
            layout: &self.field_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(field.view()),
            }],
        })
    }

    /// Draws the viewport quad with both bind groups set.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, colormap: &wgpu::BindGroup, field: &wgpu::BindGroup) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, colormap, &[]);
        pass.set_bind_group(1, field, &[]);
        pass.draw(0..6, 0..1);
    }
}

/// A 2D grid of values in `[0, 1]` uploaded as an `R32Float` texture.
pub struct ScalarField {
    width: u32,
    height: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ScalarField {
    /// `values` is row-major, `width * height` long.
    pub fn new(gpu: &SharedGpu, width: u32, height: u32, values: &[f32]) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("fresco scalar field"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let field = Self {
            width: size.width,
            height: size.height,
            texture,
            view,
        };
        field.write(gpu, values);
        field
    }

    /// Replaces the values. Extra values are ignored; missing ones are zero.
    pub fn write(&self, gpu: &SharedGpu, values: &[f32]) {
        let len = (self.width * self.height) as usize;
        let mut data = values[..values.len().min(len)].to_vec();
        data.resize(len, 0.0);

        gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&data),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

// ── pipeline helpers ──────────────────────────────────────────────────────

pub(crate) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Unfilterable 2D float texture read with `textureLoad`.
pub(crate) fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Creates a vertex-buffer-free pipeline drawing 6 vertices per quad.
pub(crate) fn build_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    linked: &LinkedProgram,
    layouts: &[&wgpu::BindGroupLayout],
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let source = linked.source();
    let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("fresco {} vertex", source.label)),
        source: wgpu::ShaderSource::Wgsl(source.vertex.as_str().into()),
    });
    let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("fresco {} fragment", source.label)),
        source: wgpu::ShaderSource::Wgsl(source.fragment.as_str().into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("fresco {} pipeline layout", source.label)),
        bind_group_layouts: layouts,
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("fresco {} pipeline", source.label)),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &vertex,
            entry_point: Some(source.vertex_entry.as_str()),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &fragment,
            entry_point: Some(source.fragment_entry.as_str()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
