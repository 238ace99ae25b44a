//! winit + wgpu back-end.
//!
//! - a context is a [`SharedGpu`] (adapter, device, queue)
//! - a surface is a winit window plus its wgpu surface ([`NativeSurface`])
//! - sharing a context means configuring another surface against the same
//!   device
//!
//! winit windows can only be created from inside the event loop, so the
//! back-end owns an `EventLoop` and drives it with `pump_app_events`: window
//! creation and [`Backend::pump_events`] both pump without blocking.
//!
//! wgpu has no thread-current context; `make_current` only traces. The
//! window layer still tracks the current window for both back-ends.

mod events;
mod gpu;
mod init;
mod label;
mod program;
mod surface;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::Window;

use crate::backend::{Backend, NativeEvent, SurfaceDesc, SurfaceId};
use crate::coords::{ColorRgba, Rect};
use crate::error::{Error, Result};
use crate::shader::LinkedProgram;
use crate::text::LineBitmap;
use crate::window::Platform;

pub use gpu::{GpuFrame, SharedGpu};
pub use init::GpuInit;
pub use program::{ColormapBuffer, ColormapProgram, ScalarField};
pub use surface::{NativeSurface, SurfaceErrorAction};

use events::PumpHandler;

/// Pump rounds to wait for a requested window before giving up.
const WINDOW_CREATE_ATTEMPTS: usize = 64;

static NEXT_DISPLAY: AtomicU64 = AtomicU64::new(1);

/// Back-end presenting through wgpu into winit windows.
///
/// winit allows one event loop per process, so at most one `WgpuBackend` can
/// exist, and it must be created on the main thread on platforms that
/// require it.
pub struct WgpuBackend {
    display: u64,
    init: GpuInit,
    instance: wgpu::Instance,
    event_loop: EventLoop<()>,
    handler: PumpHandler,
    surfaces: HashMap<winit::window::WindowId, SurfaceId>,
    next_id: u64,
    exited: bool,
}

impl WgpuBackend {
    pub fn new(init: GpuInit) -> Result<Self> {
        let event_loop = EventLoop::new()
            .map_err(|e| Error::context_creation(format!("failed to create winit EventLoop: {e}")))?;
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        Ok(Self {
            display: NEXT_DISPLAY.fetch_add(1, Ordering::Relaxed),
            init,
            instance,
            event_loop,
            handler: PumpHandler::default(),
            surfaces: HashMap::new(),
            next_id: 1,
            exited: false,
        })
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn pump(&mut self) {
        if self.exited {
            return;
        }
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler)
        {
            log::warn!("winit event loop exited (code {code})");
            self.exited = true;
        }
    }
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("display", &self.display)
            .field("surfaces", &self.surfaces.len())
            .finish_non_exhaustive()
    }
}

impl Platform<WgpuBackend> {
    /// Platform backed by winit + wgpu.
    pub fn with_gpu(init: GpuInit) -> Result<Self> {
        Ok(Platform::new(WgpuBackend::new(init)?))
    }
}

impl Backend for WgpuBackend {
    type Surface = NativeSurface;
    type Context = SharedGpu;
    type Buffer = ColormapBuffer;
    type Program = ColormapProgram;
    type Frame = GpuFrame;

    fn display_id(&self) -> u64 {
        self.display
    }

    fn surface_id(surface: &NativeSurface) -> SurfaceId {
        surface.id()
    }

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<NativeSurface> {
        let id = self.next_id();
        let attrs = Window::default_attributes()
            .with_title(desc.title.clone())
            .with_inner_size(PhysicalSize::new(desc.width, desc.height))
            .with_visible(desc.visible);
        self.handler.request_window(id, attrs);

        for _ in 0..WINDOW_CREATE_ATTEMPTS {
            self.pump();
            if let Some(result) = self.handler.take_created(id) {
                let window = result
                    .map_err(|e| Error::context_creation(format!("failed to create window: {e}")))?;
                let winit_id = window.id();
                let surface = NativeSurface::create(id, window, &self.instance).map_err(|e| {
                    Error::context_creation(format!("failed to create wgpu surface: {e}"))
                })?;
                self.surfaces.insert(winit_id, id);
                log::debug!("surface {id}: {}x{} \"{}\"", desc.width, desc.height, desc.title);
                return Ok(surface);
            }
            if self.exited {
                break;
            }
        }

        self.handler.cancel_request(id);
        Err(Error::context_creation("the event loop did not create the window"))
    }

    fn create_context(&mut self, surface: &NativeSurface) -> Result<(u64, SharedGpu)> {
        let id = self.next_id();
        let gpu = pollster::block_on(SharedGpu::new(
            id,
            &self.instance,
            surface.wgpu_surface(),
            &self.init,
        ))
        .map_err(|e| Error::context_creation(format!("{e:#}")))?;
        Ok((id, gpu))
    }

    fn attach_surface(&mut self, context: &SharedGpu, surface: &mut NativeSurface) -> Result<()> {
        surface
            .attach(context, &self.init)
            .map_err(|e| Error::context_creation(format!("{e:#}")))?;
        log::trace!("surface {} attached to context {}", surface.id(), context.id());
        Ok(())
    }

    fn make_current(&mut self, context: &SharedGpu, surface: &NativeSurface) {
        log::trace!("context {} current for surface {}", context.id(), surface.id());
    }

    fn resize_surface(&mut self, context: &SharedGpu, surface: &mut NativeSurface, width: u32, height: u32) {
        surface.resize(context, PhysicalSize::new(width, height));
    }

    fn set_title(&mut self, surface: &mut NativeSurface, title: &str) {
        surface.window().set_title(title);
    }

    fn set_position(&mut self, surface: &mut NativeSurface, x: i32, y: i32) {
        surface.window().set_outer_position(PhysicalPosition::new(x, y));
    }

    fn set_visible(&mut self, surface: &mut NativeSurface, visible: bool) {
        surface.window().set_visible(visible);
    }

    fn create_buffer(&mut self, context: &SharedGpu, size: u64) -> Result<ColormapBuffer> {
        if size == 0 {
            return Err(Error::invalid_argument("colormap buffer cannot be empty"));
        }
        Ok(ColormapBuffer::new(context.device(), size))
    }

    fn write_buffer(&mut self, context: &SharedGpu, buffer: &ColormapBuffer, bytes: &[u8]) {
        context.queue().write_buffer(buffer.buffer(), 0, bytes);
    }

    fn create_colormap_program(
        &mut self,
        context: &SharedGpu,
        surface: &NativeSurface,
        program: &LinkedProgram,
    ) -> Result<ColormapProgram> {
        let format = surface
            .format()
            .ok_or_else(|| Error::context_creation("surface is not attached to a context"))?;
        Ok(ColormapProgram::new(context.device(), format, program))
    }

    fn begin_frame(
        &mut self,
        context: &SharedGpu,
        surface: &mut NativeSurface,
        clear: ColorRgba,
    ) -> Result<Option<GpuFrame>> {
        surface.begin_frame(context, clear)
    }

    fn draw_label(
        &mut self,
        context: &SharedGpu,
        surface: &mut NativeSurface,
        frame: &mut GpuFrame,
        bitmap: &LineBitmap,
        rect: Rect,
        color: ColorRgba,
    ) {
        surface.draw_label(context, frame, bitmap, rect, color);
    }

    fn present(&mut self, context: &SharedGpu, surface: &mut NativeSurface, frame: GpuFrame) {
        surface.present(context, frame);
    }

    fn pump_events(&mut self) -> Vec<(SurfaceId, NativeEvent)> {
        self.pump();
        self.handler
            .drain_events()
            .into_iter()
            .filter_map(|(winit_id, event)| self.surfaces.get(&winit_id).map(|id| (*id, event)))
            .collect()
    }

    fn release_buffer(&mut self, _context: &SharedGpu, buffer: ColormapBuffer) {
        // Dropped rather than destroyed: command buffers already submitted may
        // still read it.
        drop(buffer);
    }

    fn release_program(&mut self, _context: &SharedGpu, program: ColormapProgram) {
        log::trace!("releasing program {}", program.label());
    }

    fn release_context(&mut self, context: SharedGpu) {
        log::debug!("releasing context {}", context.id());
    }

    fn release_surface(&mut self, surface: NativeSurface) {
        let id = surface.id();
        self.surfaces.retain(|_, sid| *sid != id);
        log::trace!("releasing surface {id}");
    }
}
