use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use std::sync::Arc;

use crate::backend::winit_wgpu::WgpuBackend;
use crate::backend::Backend;
use crate::colormap::ColorMap;
use crate::coords::Rect;
use crate::error::{Error, Result};
use crate::input::{Key, KeyAction, Modifiers};
use crate::render::Drawable;
use crate::text::Font;
use crate::window::{ContextKey, Platform, WindowConfig, WindowId, WindowImpl, WindowStatus};

/// Shared handle to a window.
///
/// Clones refer to the same window; it is destroyed when the last clone is
/// dropped. Not `Send`: a window stays on the thread that created it.
///
/// A handle stays usable from inside the window's own drawables and
/// `with_context` callbacks: queries report the state at the start of the
/// call, operations returning `Result` fail with
/// [`Error::InvalidArgument`], and the others are ignored with a warning.
pub struct Window<B: Backend = WgpuBackend> {
    id: WindowId,
    key: ContextKey,
    inner: Rc<RefCell<WindowImpl<B>>>,
    published: Rc<RefCell<WindowStatus>>,
}

impl<B: Backend> Window<B> {
    /// Opens a window.
    ///
    /// With `shared`, the new window uses the same GPU context as `shared`
    /// instead of creating its own.
    pub fn new(platform: &Platform<B>, config: WindowConfig, shared: Option<&Window<B>>) -> Result<Self> {
        let shared = shared.map(Self::try_inner).transpose()?;
        let window = WindowImpl::new(platform, config, shared.as_deref())?;
        Ok(Self {
            id: window.id(),
            key: window.context_key(),
            published: window.published_status(),
            inner: Rc::new(RefCell::new(window)),
        })
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Display the window's context belongs to.
    pub fn display(&self) -> u64 {
        self.key.display
    }

    /// Context identifier; equal for windows sharing a context.
    pub fn context(&self) -> u64 {
        self.key.context
    }

    pub fn context_key(&self) -> ContextKey {
        self.key
    }

    /// Current state, or the state published before caller code took over
    /// while the window is busy.
    pub fn status(&self) -> WindowStatus {
        match self.inner.try_borrow() {
            Ok(inner) => inner.status(),
            Err(_) => self.published.borrow().clone(),
        }
    }

    pub fn width(&self) -> u32 {
        self.status().layout.width()
    }

    pub fn height(&self) -> u32 {
        self.status().layout.height()
    }

    /// Nominal cell size for the current grid.
    pub fn cell_size(&self) -> (u32, u32) {
        self.status().layout.cell_size()
    }

    pub fn cell_viewport(&self, col: u32, row: u32) -> Result<Rect> {
        self.status().layout.cell(col, row)
    }

    pub fn is_visible(&self) -> bool {
        self.status().visible
    }

    pub fn font(&self) -> Option<Arc<Font>> {
        self.status().font
    }

    pub fn colormap(&self) -> ColorMap {
        self.status().colormap
    }

    pub fn colormap_buffer_size(&self) -> u64 {
        self.status().colormap_buffer_size
    }

    pub fn has_pending_frame(&self) -> bool {
        self.status().pending_frame
    }

    pub fn make_current(&self) -> Result<()> {
        self.inner_mut()?.activate()
    }

    /// Runs `f` with the window's context current.
    pub fn with_context<R>(&self, f: impl FnOnce(&B::Context) -> R) -> Result<R> {
        self.inner_mut()?.with_context(f)
    }

    pub fn set_font(&self, font: Arc<Font>) {
        self.update("set_font", |w| w.set_font(font));
    }

    pub fn set_title(&self, title: &str) {
        self.update("set_title", |w| w.set_title(title));
    }

    pub fn set_pos(&self, x: i32, y: i32) {
        self.update("set_pos", |w| w.set_pos(x, y));
    }

    pub fn set_colormap(&self, cmap: ColorMap) -> Result<()> {
        self.inner_mut()?.set_colormap(cmap)
    }

    pub fn grid(&self, rows: u32, cols: u32) -> Result<()> {
        self.inner_mut()?.grid(rows, cols)
    }

    pub fn draw(&self, drawable: &dyn Drawable<B>) -> Result<()> {
        self.inner_mut()?.draw(drawable)
    }

    pub fn draw_cell(&self, col: u32, row: u32, drawable: &dyn Drawable<B>, title: Option<&str>) -> Result<()> {
        self.inner_mut()?.draw_cell(col, row, drawable, title)
    }

    /// Presents everything drawn with [`Window::draw_cell`] since the last
    /// present.
    pub fn present(&self) -> Result<()> {
        self.inner_mut()?.present()
    }

    pub fn hide(&self) {
        self.update("hide", WindowImpl::hide);
    }

    pub fn show(&self) {
        self.update("show", WindowImpl::show);
    }

    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.inner_mut()?.resize(width, height)
    }

    /// Pumps window-system events and returns whether the window should
    /// close.
    pub fn close(&self) -> bool {
        match self.inner.try_borrow_mut() {
            Ok(mut inner) => inner.close(),
            Err(_) => self.published.borrow().close_requested,
        }
    }

    pub fn keyboard_handler(&self, key: Key, scancode: u32, action: KeyAction, mods: Modifiers) {
        self.update("keyboard_handler", |w| {
            w.keyboard_handler(key, scancode, action, mods)
        });
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn try_inner(&self) -> Result<Ref<'_, WindowImpl<B>>> {
        self.inner.try_borrow().map_err(|_| self.busy())
    }

    fn inner_mut(&self) -> Result<RefMut<'_, WindowImpl<B>>> {
        self.inner.try_borrow_mut().map_err(|_| self.busy())
    }

    fn update(&self, what: &str, f: impl FnOnce(&mut WindowImpl<B>)) {
        match self.inner_mut() {
            Ok(mut inner) => f(&mut inner),
            Err(e) => log::warn!("{what} ignored: {e}"),
        }
    }

    fn busy(&self) -> Error {
        Error::invalid_argument(format!(
            "window {} is running caller code and cannot be re-entered",
            self.id
        ))
    }
}

impl<B: Backend> Clone for Window<B> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            key: self.key,
            inner: Rc::clone(&self.inner),
            published: Rc::clone(&self.published),
        }
    }
}

impl<B: Backend> std::fmt::Debug for Window<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => inner.fmt(f),
            Err(_) => f.write_str("Window { <in use> }"),
        }
    }
}
