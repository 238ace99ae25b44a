//! Back-end contract: the native window system plus the GPU operations the
//! window layer needs.
//!
//! The window layer never talks to winit or wgpu directly. It drives a
//! [`Backend`] through explicit create / attach / make-current / release
//! calls, which keeps context lifetime and teardown order in one place
//! (`window::window_impl`) regardless of the GPU API underneath.
//!
//! Implementations:
//! - [`winit_wgpu::WgpuBackend`]: winit windows presented through wgpu
//! - [`headless::HeadlessBackend`]: CPU-only, records every call

pub mod headless;
pub mod winit_wgpu;

use crate::coords::{ColorRgba, Rect};
use crate::error::Result;
use crate::input::{Key, KeyAction, Modifiers};
use crate::shader::LinkedProgram;
use crate::text::LineBitmap;

/// Identifier of a native surface, unique within one back-end.
pub type SurfaceId = u64;

/// Parameters for a new native window + surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
}

/// Window-system events, already translated out of the platform's types.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    Key {
        key: Key,
        scancode: u32,
        action: KeyAction,
        mods: Modifiers,
    },
    CloseRequested,
    Resized {
        width: u32,
        height: u32,
    },
    Focused(bool),
}

/// Native window system + GPU API used by the window layer.
///
/// Contexts are created against a first surface and may then be attached to
/// further surfaces (context sharing). The window layer guarantees that:
/// - `make_current` precedes every call that touches GPU state
/// - window-owned objects (buffers, programs) are released before the
///   context they were created on
/// - a context is released only after its last surface detached
pub trait Backend: 'static {
    /// Native window plus its presentable surface.
    type Surface;
    /// GPU context; may be shared by several surfaces.
    type Context;
    /// Colormap buffer.
    type Buffer;
    /// The per-window colormap program.
    type Program;
    /// A frame being recorded; presented by [`Backend::present`].
    type Frame;

    /// Display identifier; identical for every context of this back-end.
    fn display_id(&self) -> u64;

    fn surface_id(surface: &Self::Surface) -> SurfaceId;

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<Self::Surface>;

    /// Creates a fresh context able to present to `surface`.
    ///
    /// Returns the context identifier together with the context.
    fn create_context(&mut self, surface: &Self::Surface) -> Result<(u64, Self::Context)>;

    /// Prepares `surface` for presentation with `context`.
    fn attach_surface(&mut self, context: &Self::Context, surface: &mut Self::Surface) -> Result<()>;

    /// Makes `context` current for `surface` on the calling thread.
    fn make_current(&mut self, context: &Self::Context, surface: &Self::Surface);

    fn resize_surface(
        &mut self,
        context: &Self::Context,
        surface: &mut Self::Surface,
        width: u32,
        height: u32,
    );

    fn set_title(&mut self, surface: &mut Self::Surface, title: &str);
    fn set_position(&mut self, surface: &mut Self::Surface, x: i32, y: i32);
    fn set_visible(&mut self, surface: &mut Self::Surface, visible: bool);

    fn create_buffer(&mut self, context: &Self::Context, size: u64) -> Result<Self::Buffer>;
    fn write_buffer(&mut self, context: &Self::Context, buffer: &Self::Buffer, bytes: &[u8]);

    fn create_colormap_program(
        &mut self,
        context: &Self::Context,
        surface: &Self::Surface,
        program: &LinkedProgram,
    ) -> Result<Self::Program>;

    /// Acquires the next frame and clears it.
    ///
    /// `Ok(None)` means the frame should be skipped (surface lost, outdated,
    /// minimized); the caller may retry on the next draw.
    fn begin_frame(
        &mut self,
        context: &Self::Context,
        surface: &mut Self::Surface,
        clear: ColorRgba,
    ) -> Result<Option<Self::Frame>>;

    /// Blits a rasterized label into `rect` of the frame.
    fn draw_label(
        &mut self,
        context: &Self::Context,
        surface: &mut Self::Surface,
        frame: &mut Self::Frame,
        bitmap: &LineBitmap,
        rect: Rect,
        color: ColorRgba,
    );

    fn present(&mut self, context: &Self::Context, surface: &mut Self::Surface, frame: Self::Frame);

    /// Processes pending window-system events without blocking.
    fn pump_events(&mut self) -> Vec<(SurfaceId, NativeEvent)>;

    fn release_buffer(&mut self, context: &Self::Context, buffer: Self::Buffer);
    fn release_program(&mut self, context: &Self::Context, program: Self::Program);
    fn release_context(&mut self, context: Self::Context);
    fn release_surface(&mut self, surface: Self::Surface);
}
