use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::{ColorRgba, Rect};
use crate::shader;
use crate::text::LineBitmap;

use super::gpu::{GpuFrame, SharedGpu};
use super::program::{build_pipeline, premul_alpha_blend, texture_entry};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct LabelStyle {
    color: [f32; 4],
}

/// Draws rasterized cell titles onto one surface.
///
/// The pipeline is built on first use and rebuilt when the surface format
/// changes. Each label gets its own small coverage texture; titles are short
/// and drawn a few times per frame at most.
#[derive(Default)]
pub(crate) struct LabelRenderer {
    format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    layout: Option<wgpu::BindGroupLayout>,
    disabled: bool,
}

impl LabelRenderer {
    pub(crate) fn draw(
        &mut self,
        gpu: &SharedGpu,
        format: wgpu::TextureFormat,
        frame: &mut GpuFrame,
        bitmap: &LineBitmap,
        rect: Rect,
        color: ColorRgba,
    ) {
        if bitmap.is_empty() || rect.is_empty() {
            return;
        }
        self.ensure_pipeline(gpu.device(), format);
        let (Some(pipeline), Some(layout)) = (self.pipeline.as_ref(), self.layout.as_ref()) else {
            return;
        };

        let device = gpu.device();
        let extent = wgpu::Extent3d {
            width: bitmap.width,
            height: bitmap.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fresco label coverage"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bitmap.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bitmap.width),
                rows_per_image: Some(bitmap.height),
            },
            extent,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let style = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fresco label style"),
            contents: bytemuck::bytes_of(&LabelStyle {
                color: color.to_array(),
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fresco label bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: style.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
            ],
        });

        let mut pass = frame.viewport_pass("fresco label pass", rect);
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..6, 0..1);
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.disabled || (self.format == Some(format) && self.pipeline.is_some()) {
            return;
        }

        let linked = match shader::link_program(&shader::label_program()) {
            Ok(linked) => linked,
            Err(e) => {
                log::error!("labels disabled: {e}");
                self.disabled = true;
                return;
            }
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fresco label bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<LabelStyle>() as u64),
                    },
                    count: None,
                },
                texture_entry(1),
            ],
        });
        let pipeline = build_pipeline(device, format, &linked, &[&layout], Some(premul_alpha_blend()));

        self.format = Some(format);
        self.pipeline = Some(pipeline);
        self.layout = Some(layout);
    }
}
