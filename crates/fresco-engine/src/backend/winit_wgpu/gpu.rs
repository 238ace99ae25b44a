use anyhow::{Context, Result};

use crate::coords::Rect;

use super::GpuInit;

/// A wgpu adapter + device + queue: the back-end's notion of a context.
///
/// Every surface attached to the same `SharedGpu` renders with the same
/// device, so buffers and pipelines created on it are usable from all of
/// them.
pub struct SharedGpu {
    id: u64,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl SharedGpu {
    /// Picks an adapter able to present to `compatible` and opens a device.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub(crate) async fn new(
        id: u64,
        instance: &wgpu::Instance,
        compatible: &wgpu::Surface<'_>,
        init: &GpuInit,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(compatible),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::debug!("context {id}: adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("fresco device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            id,
            adapter,
            device,
            queue,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

/// Represents a single acquired frame.
///
/// Short-lived: holding the surface texture prevents acquisition of the next
/// frame on that surface.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    /// Starts a pass that keeps the frame contents and is restricted to
    /// `viewport` (viewport transform and scissor).
    pub fn viewport_pass(&mut self, label: &str, viewport: Rect) -> wgpu::RenderPass<'_> {
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width as f32,
            viewport.height as f32,
            0.0,
            1.0,
        );
        pass.set_scissor_rect(viewport.x, viewport.y, viewport.width, viewport.height);
        pass
    }

    fn clear(&mut self, color: wgpu::Color) {
        let _ = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("fresco clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    pub(crate) fn begin(
        surface: &wgpu::Surface<'_>,
        device: &wgpu::Device,
        clear: wgpu::Color,
    ) -> std::result::Result<Self, wgpu::SurfaceError> {
        let surface_texture = surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("fresco frame encoder"),
        });

        let mut frame = Self {
            surface_texture,
            view,
            encoder,
        };
        frame.clear(clear);
        Ok(frame)
    }

    pub(crate) fn submit(self, queue: &wgpu::Queue) -> wgpu::SurfaceTexture {
        queue.submit(std::iter::once(self.encoder.finish()));
        self.surface_texture
    }
}
