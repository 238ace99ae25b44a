use anyhow::Context;
use ouroboros::self_referencing;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::{ColorRgba, Rect};
use crate::error::{Error, Result};
use crate::text::LineBitmap;

use super::gpu::{GpuFrame, SharedGpu};
use super::label::LabelRenderer;
use super::GpuInit;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Unrecoverable (commonly OOM).
    Fatal,
}

/// A winit window together with the wgpu surface presenting into it.
///
/// The surface borrows the window, so both live in one self-referencing
/// struct; dropping it releases the surface before the window.
#[self_referencing]
pub struct NativeSurface {
    id: u64,
    /// Set once the surface is attached to a context.
    config: Option<wgpu::SurfaceConfiguration>,
    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,
    labels: LabelRenderer,

    window: Window,

    #[borrows(window)]
    #[covariant]
    surface: wgpu::Surface<'this>,
}

impl NativeSurface {
    pub(crate) fn create(
        id: u64,
        window: Window,
        instance: &wgpu::Instance,
    ) -> std::result::Result<Self, wgpu::CreateSurfaceError> {
        let size = window.inner_size();
        NativeSurfaceTryBuilder {
            id,
            config: None,
            size,
            labels: LabelRenderer::default(),
            window,
            surface_builder: |w| instance.create_surface(w),
        }
        .try_build()
    }

    pub fn id(&self) -> u64 {
        *self.borrow_id()
    }

    /// Surface format, once attached.
    pub fn format(&self) -> Option<wgpu::TextureFormat> {
        self.borrow_config().as_ref().map(|c| c.format)
    }

    pub fn window(&self) -> &Window {
        self.borrow_window()
    }

    pub(crate) fn wgpu_surface(&self) -> &wgpu::Surface<'_> {
        self.borrow_surface()
    }

    /// Configures the surface for presentation with `gpu`'s device.
    pub(crate) fn attach(&mut self, gpu: &SharedGpu, init: &GpuInit) -> anyhow::Result<()> {
        self.with_mut(|f| {
            let config = surface_config(f.surface, gpu.adapter(), *f.size, init)
                .context("the context's adapter cannot present to this window")?;
            f.surface.configure(gpu.device(), &config);
            *f.config = Some(config);
            Ok(())
        })
    }

    pub(crate) fn resize(&mut self, gpu: &SharedGpu, new_size: PhysicalSize<u32>) {
        self.with_mut(|f| match f.config.as_mut() {
            Some(config) => apply_resize(f.surface, gpu.device(), config, f.size, new_size),
            None => *f.size = new_size,
        });
    }

    /// Acquires and clears the next frame.
    ///
    /// Lost/outdated surfaces are reconfigured and the frame is skipped, as
    /// are timeouts; out-of-memory is an error.
    pub(crate) fn begin_frame(&mut self, gpu: &SharedGpu, clear: ColorRgba) -> Result<Option<GpuFrame>> {
        self.with_mut(|f| {
            let Some(config) = f.config.as_ref() else {
                return Ok(None);
            };
            if f.size.width == 0 || f.size.height == 0 {
                return Ok(None);
            }

            match GpuFrame::begin(f.surface, gpu.device(), clear.into()) {
                Ok(frame) => Ok(Some(frame)),
                Err(err) => {
                    let msg = err.to_string();
                    match map_surface_error(f.surface, gpu.device(), config, *f.size, err) {
                        SurfaceErrorAction::Fatal => Err(Error::Surface(msg)),
                        action => {
                            log::debug!("surface {}: {msg} ({action:?})", f.id);
                            Ok(None)
                        }
                    }
                }
            }
        })
    }

    pub(crate) fn draw_label(
        &mut self,
        gpu: &SharedGpu,
        frame: &mut GpuFrame,
        bitmap: &LineBitmap,
        rect: Rect,
        color: ColorRgba,
    ) {
        self.with_mut(|f| {
            if let Some(format) = f.config.as_ref().map(|c| c.format) {
                f.labels.draw(gpu, format, frame, bitmap, rect, color);
            }
        });
    }

    /// Submits the frame's commands and presents it.
    pub(crate) fn present(&self, gpu: &SharedGpu, frame: GpuFrame) {
        let texture = frame.submit(gpu.queue());
        self.borrow_window().pre_present_notify();
        texture.present();
    }
}

impl std::fmt::Debug for NativeSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeSurface")
            .field("id", self.borrow_id())
            .field("size", self.borrow_size())
            .field("format", &self.format())
            .finish_non_exhaustive()
    }
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Builds the configuration for presenting `surface` with `adapter`.
///
/// Returns `None` when the adapter cannot present to the surface at all.
pub(crate) fn surface_config(
    surface: &wgpu::Surface<'_>,
    adapter: &wgpu::Adapter,
    size: PhysicalSize<u32>,
    init: &GpuInit,
) -> Option<wgpu::SurfaceConfiguration> {
    let caps = surface.get_capabilities(adapter);
    let format = choose_surface_format(&caps, init.prefer_srgb)?;
    let present_mode = if caps.present_modes.contains(&init.present_mode) {
        init.present_mode
    } else {
        wgpu::PresentMode::Fifo
    };

    Some(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode,
        alpha_mode: choose_alpha_mode(&caps, init.alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    })
}

/// Records the new size and reconfigures; a zero size only updates the record
/// (wgpu cannot configure a 0x0 surface).
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}
