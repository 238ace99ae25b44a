use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::backend::{Backend, NativeEvent, SurfaceDesc, SurfaceId};
use crate::colormap::ColorMap;
use crate::coords::Rect;
use crate::error::{Error, Result};
use crate::input::{Key, KeyAction, Modifiers};
use crate::render::{Drawable, RenderCtx, WindowResources};
use crate::shader;
use crate::text::{self, LineBitmap};
use crate::window::grid::GridLayout;
use crate::window::platform::{Platform, PlatformState};
use crate::window::registry::ContextKey;
use crate::window::{WindowConfig, WindowId, WindowStatus};

/// Gap between a cell's top edge and its title.
const LABEL_MARGIN: u32 = 4;

/// One native window with its GPU resources.
///
/// Callers normally go through [`crate::window::Window`]; this type holds the
/// state and enforces the lifecycle rules:
/// - every GPU operation is preceded by [`WindowImpl::activate`]
/// - teardown releases window objects before the context, and the context
///   only when no other window shares it
pub struct WindowImpl<B: Backend> {
    id: WindowId,
    platform: Platform<B>,
    key: ContextKey,
    surface_id: SurfaceId,
    surface: Option<B::Surface>,
    config: WindowConfig,
    layout: GridLayout,
    visible: bool,
    close_requested: bool,

    font: Option<Arc<text::Font>>,
    colormap: ColorMap,
    colormap_buffer: Option<B::Buffer>,
    colormap_size: u64,
    program: Option<B::Program>,

    /// Frame with cell draws that has not been presented yet.
    frame: Option<B::Frame>,

    /// Published for handles to read while caller code runs.
    status: Rc<RefCell<WindowStatus>>,
}

impl<B: Backend> WindowImpl<B> {
    /// Creates the native window, its context (fresh or shared), the colormap
    /// buffer and the colormap program.
    ///
    /// On failure everything created so far is released again.
    pub fn new(platform: &Platform<B>, config: WindowConfig, shared: Option<&WindowImpl<B>>) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(Error::invalid_argument(format!(
                "window size must be positive, got {}x{}",
                config.width, config.height
            )));
        }
        if let Some(other) = shared {
            if !other.platform.ptr_eq(platform) {
                return Err(Error::invalid_argument(
                    "cannot share a context across platforms",
                ));
            }
        }

        let id = WindowId::next();
        let (surface, key) = {
            let mut guard = platform.state()?;
            let st = &mut *guard;
            let desc = SurfaceDesc {
                title: config.title.clone(),
                width: config.width,
                height: config.height,
                visible: !config.invisible,
            };
            let surface = st.backend.create_surface(&desc)?;
            match shared {
                Some(other) => attach_shared(st, id, other.key, surface)?,
                None => create_primary(st, id, surface)?,
            }
        };

        let layout = GridLayout::new(config.width, config.height);
        let visible = !config.invisible;
        let mut window = Self {
            id,
            platform: platform.clone(),
            key,
            surface_id: B::surface_id(&surface),
            surface: Some(surface),
            layout,
            visible,
            config,
            close_requested: false,
            font: None,
            colormap: ColorMap::default(),
            colormap_buffer: None,
            colormap_size: 0,
            program: None,
            frame: None,
            status: Rc::new(RefCell::new(WindowStatus {
                layout,
                visible,
                font: None,
                colormap: ColorMap::default(),
                colormap_buffer_size: 0,
                pending_frame: false,
                close_requested: false,
            })),
        };

        // From here on, `Drop` unwinds whatever exists.
        window.init_resources()?;
        *window.status.borrow_mut() = window.status();

        log::info!(
            "window {} created ({}x{}, context {}:{}{})",
            window.id,
            window.layout.width(),
            window.layout.height(),
            key.display,
            key.context,
            if shared.is_some() { ", shared" } else { "" }
        );
        Ok(window)
    }

    fn init_resources(&mut self) -> Result<()> {
        let source = self
            .config
            .colormap_program
            .clone()
            .unwrap_or_else(shader::colormap_program);
        let linked = shader::link_program(&source)?;

        let mut guard = self.platform.state()?;
        let st = &mut *guard;
        let surface = self.surface.as_ref().ok_or_else(|| surface_gone(self.id))?;
        activate_in(st, self.id, self.key, surface)?;
        let ctx = st.registry.context(self.key).ok_or_else(|| context_gone(self.key))?;

        let bytes = self.colormap.as_bytes();
        let buffer = st.backend.create_buffer(ctx, bytes.len() as u64)?;
        st.backend.write_buffer(ctx, &buffer, bytes);
        self.colormap_size = bytes.len() as u64;
        self.colormap_buffer = Some(buffer);

        self.program = Some(st.backend.create_colormap_program(ctx, surface, &linked)?);
        Ok(())
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn context_key(&self) -> ContextKey {
        self.key
    }

    /// Current layout, visibility, font, colormap and frame state.
    pub fn status(&self) -> WindowStatus {
        WindowStatus {
            layout: self.layout,
            visible: self.visible,
            font: self.font.clone(),
            colormap: self.colormap,
            colormap_buffer_size: self.colormap_size,
            pending_frame: self.frame.is_some(),
            close_requested: self.close_requested,
        }
    }

    pub(crate) fn published_status(&self) -> Rc<RefCell<WindowStatus>> {
        Rc::clone(&self.status)
    }

    /// Snapshots window and platform state before caller code runs with both
    /// borrowed.
    fn publish(&self, st: &PlatformState<B>) {
        *self.status.borrow_mut() = self.status();
        self.platform.publish(st);
    }

    /// Applies events the platform queued for this window.
    fn dispatch_queued(&mut self) {
        for event in self.platform.take_events(self.surface_id) {
            self.handle_event(event);
        }
    }

    /// Makes this window's context current. No-op if it already is.
    pub fn activate(&mut self) -> Result<()> {
        let mut guard = self.platform.state()?;
        let surface = self.surface.as_ref().ok_or_else(|| surface_gone(self.id))?;
        activate_in(&mut guard, self.id, self.key, surface)
    }

    /// Runs `f` with this window's context made current, e.g. to create
    /// drawable resources on the right device.
    pub fn with_context<R>(&mut self, f: impl FnOnce(&B::Context) -> R) -> Result<R> {
        let mut guard = self.platform.state()?;
        let st = &mut *guard;
        let surface = self.surface.as_ref().ok_or_else(|| surface_gone(self.id))?;
        activate_in(st, self.id, self.key, surface)?;
        self.publish(st);
        let ctx = st.registry.context(self.key).ok_or_else(|| context_gone(self.key))?;
        Ok(f(ctx))
    }

    pub fn set_font(&mut self, font: Arc<text::Font>) {
        log::debug!("window {}: font {}", self.id, font.name());
        self.font = Some(font);
    }

    pub fn set_title(&mut self, title: &str) {
        self.config.title = title.to_string();
        if let Some(surface) = self.surface.as_mut() {
            match self.platform.state() {
                Ok(mut st) => st.backend.set_title(surface, title),
                Err(e) => log::warn!("window {}: set_title ignored: {e}", self.id),
            }
        }
    }

    pub fn set_pos(&mut self, x: i32, y: i32) {
        if let Some(surface) = self.surface.as_mut() {
            match self.platform.state() {
                Ok(mut st) => st.backend.set_position(surface, x, y),
                Err(e) => log::warn!("window {}: set_pos ignored: {e}", self.id),
            }
        }
    }

    /// Uploads `cmap`'s table, recreating the buffer when the size changes.
    ///
    /// On failure the previous colormap stays in place.
    pub fn set_colormap(&mut self, cmap: ColorMap) -> Result<()> {
        let mut guard = self.platform.state()?;
        let st = &mut *guard;
        let surface = self.surface.as_ref().ok_or_else(|| surface_gone(self.id))?;
        activate_in(st, self.id, self.key, surface)?;
        let ctx = st.registry.context(self.key).ok_or_else(|| context_gone(self.key))?;

        let bytes = cmap.as_bytes();
        let size = bytes.len() as u64;
        if size != self.colormap_size || self.colormap_buffer.is_none() {
            let buffer = st.backend.create_buffer(ctx, size)?;
            if let Some(old) = self.colormap_buffer.replace(buffer) {
                st.backend.release_buffer(ctx, old);
            }
            log::debug!(
                "window {}: colormap buffer {} -> {} bytes",
                self.id,
                self.colormap_size,
                size
            );
            self.colormap_size = size;
        }
        if let Some(buffer) = self.colormap_buffer.as_ref() {
            st.backend.write_buffer(ctx, buffer, bytes);
        }
        self.colormap = cmap;
        Ok(())
    }

    pub fn grid(&mut self, rows: u32, cols: u32) -> Result<()> {
        self.layout.set_grid(rows, cols)?;
        log::debug!("window {}: grid {rows}x{cols}", self.id);
        Ok(())
    }

    /// Renders `drawable` over the whole window and presents.
    ///
    /// Any pending cell draws go out in the same frame.
    pub fn draw(&mut self, drawable: &dyn Drawable<B>) -> Result<()> {
        self.dispatch_queued();
        let viewport = self.layout.full();
        self.render_into(viewport, drawable, None)?;
        self.present()
    }

    /// Renders `drawable` into one grid cell without presenting.
    ///
    /// `title`, when given, is drawn centered at the top of the cell with the
    /// window font (or the default font).
    pub fn draw_cell(
        &mut self,
        col: u32,
        row: u32,
        drawable: &dyn Drawable<B>,
        title: Option<&str>,
    ) -> Result<()> {
        self.dispatch_queued();
        let viewport = self.layout.cell(col, row)?;
        let label = match title {
            Some(title) => self.title_label(title, viewport)?,
            None => None,
        };
        self.render_into(viewport, drawable, label)
    }

    /// Presents the pending frame. No-op when nothing was drawn.
    pub fn present(&mut self) -> Result<()> {
        self.dispatch_queued();
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };

        let mut guard = self.platform.state()?;
        let st = &mut *guard;
        let surface = self.surface.as_mut().ok_or_else(|| surface_gone(self.id))?;
        activate_in(st, self.id, self.key, surface)?;
        let ctx = st.registry.context(self.key).ok_or_else(|| context_gone(self.key))?;
        st.backend.present(ctx, surface, frame);
        Ok(())
    }

    pub fn hide(&mut self) {
        self.set_visible(false);
    }

    pub fn show(&mut self) {
        self.set_visible(true);
    }

    fn set_visible(&mut self, visible: bool) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        match self.platform.state() {
            Ok(mut st) => {
                st.backend.set_visible(surface, visible);
                self.visible = visible;
            }
            Err(e) => log::warn!("window {}: visibility change ignored: {e}", self.id),
        }
    }

    /// Reconfigures the surface for a new client size and recomputes cells.
    ///
    /// A zero dimension (minimized window) is ignored. A pending frame is
    /// discarded since it was acquired at the old size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            log::debug!("window {}: ignoring resize to {width}x{height}", self.id);
            return Ok(());
        }
        if width == self.layout.width() && height == self.layout.height() {
            return Ok(());
        }
        if self.frame.take().is_some() {
            log::debug!("window {}: dropping pending frame on resize", self.id);
        }

        let mut guard = self.platform.state()?;
        let st = &mut *guard;
        let surface = self.surface.as_mut().ok_or_else(|| surface_gone(self.id))?;
        activate_in(st, self.id, self.key, surface)?;
        let ctx = st.registry.context(self.key).ok_or_else(|| context_gone(self.key))?;
        st.backend.resize_surface(ctx, surface, width, height);

        self.layout.resize(width, height);
        Ok(())
    }

    /// Processes queued window-system events and reports whether the window
    /// should close.
    pub fn close(&mut self) -> bool {
        self.platform.pump_events();
        self.dispatch_queued();
        self.close_requested
    }

    /// Asks the window to close; [`WindowImpl::close`] reports `true` from
    /// now on.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Default key bindings: Escape, Ctrl+Q and Cmd+Q request close.
    pub fn keyboard_handler(&mut self, key: Key, scancode: u32, action: KeyAction, mods: Modifiers) {
        if !action.is_press() {
            return;
        }
        match key {
            Key::Escape => self.request_close(),
            Key::Q if mods.command() => self.request_close(),
            _ => log::trace!(
                "window {}: unhandled key {key:?} (scancode {scancode}, {mods:?})",
                self.id
            ),
        }
    }

    fn handle_event(&mut self, event: NativeEvent) {
        match event {
            NativeEvent::Key {
                key,
                scancode,
                action,
                mods,
            } => self.keyboard_handler(key, scancode, action, mods),
            NativeEvent::CloseRequested => self.request_close(),
            NativeEvent::Resized { width, height } => {
                if let Err(e) = self.resize(width, height) {
                    log::warn!("window {}: resize failed: {e}", self.id);
                }
            }
            NativeEvent::Focused(focused) => {
                log::trace!("window {}: focused={focused}", self.id);
            }
        }
    }

    /// Resolves the font and rasterizes `title` placed at the top of `cell`.
    fn title_label(&self, title: &str, cell: Rect) -> Result<Option<(LineBitmap, Rect)>> {
        let font = match &self.font {
            Some(font) => Arc::clone(font),
            None => text::default_font()?,
        };
        let Some(bitmap) = font.rasterize_line(title, self.config.label_size) else {
            return Ok(None);
        };

        let bitmap = bitmap.crop(cell.width, cell.height);
        if bitmap.is_empty() {
            return Ok(None);
        }
        let x = cell.x + (cell.width - bitmap.width) / 2;
        let y = cell.y + LABEL_MARGIN.min(cell.height - bitmap.height);
        let rect = Rect::new(x, y, bitmap.width, bitmap.height);
        Ok(Some((bitmap, rect)))
    }

    fn render_into(
        &mut self,
        viewport: Rect,
        drawable: &dyn Drawable<B>,
        label: Option<(LineBitmap, Rect)>,
    ) -> Result<()> {
        let mut guard = self.platform.state()?;
        let st = &mut *guard;
        {
            let surface = self.surface.as_mut().ok_or_else(|| surface_gone(self.id))?;
            activate_in(st, self.id, self.key, surface)?;
            if self.frame.is_none() {
                let ctx = st.registry.context(self.key).ok_or_else(|| context_gone(self.key))?;
                match st.backend.begin_frame(ctx, surface, self.config.clear_color)? {
                    Some(frame) => self.frame = Some(frame),
                    None => {
                        log::debug!("window {}: frame skipped", self.id);
                        return Ok(());
                    }
                }
            }
        }
        self.publish(st);

        let surface = self.surface.as_mut().ok_or_else(|| surface_gone(self.id))?;
        let ctx = st.registry.context(self.key).ok_or_else(|| context_gone(self.key))?;
        let (Some(frame), Some(buffer), Some(program)) = (
            self.frame.as_mut(),
            self.colormap_buffer.as_ref(),
            self.program.as_ref(),
        ) else {
            return Err(Error::context_creation(format!(
                "window {} has no colormap resources",
                self.id
            )));
        };

        let rctx = RenderCtx {
            context: ctx,
            viewport,
            window: self.layout.full(),
            resources: WindowResources {
                font: self.font.as_deref(),
                colormap: self.colormap,
                colormap_buffer: buffer,
                program,
            },
        };
        drawable.render(frame, &rctx);

        if let Some((bitmap, rect)) = label {
            st.backend
                .draw_label(ctx, surface, frame, &bitmap, rect, self.config.label_color);
        }
        Ok(())
    }
}

impl<B: Backend> Drop for WindowImpl<B> {
    fn drop(&mut self) {
        let Some(surface) = self.surface.take() else {
            return;
        };
        let Ok(mut guard) = self.platform.state() else {
            log::error!(
                "window {} dropped while its platform is in use; GPU objects leak",
                self.id
            );
            return;
        };
        let st = &mut *guard;

        // An unpresented frame is discarded, never presented on teardown.
        self.frame = None;

        if activate_in(st, self.id, self.key, &surface).is_err() {
            log::warn!("window {}: context already gone during teardown", self.id);
        }
        if let Some(ctx) = st.registry.context(self.key) {
            if let Some(buffer) = self.colormap_buffer.take() {
                st.backend.release_buffer(ctx, buffer);
            }
            if let Some(program) = self.program.take() {
                st.backend.release_program(ctx, program);
            }
        }

        st.registry.clear_current(self.id);
        if let Some(ctx) = st.registry.deregister(self.key, self.id) {
            log::debug!(
                "window {}: releasing context {}:{}",
                self.id,
                self.key.display,
                self.key.context
            );
            st.backend.release_context(ctx);
        }
        st.backend.release_surface(surface);
        drop(guard);

        self.platform.forget_events(self.surface_id);
        log::info!("window {} destroyed", self.id);
    }
}

impl<B: Backend> std::fmt::Debug for WindowImpl<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowImpl")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("size", &(self.layout.width(), self.layout.height()))
            .field("grid", &(self.layout.rows(), self.layout.cols()))
            .field("colormap", &self.colormap)
            .finish_non_exhaustive()
    }
}

/// Makes `key`'s context current for `surface` unless `id` already is.
fn activate_in<B: Backend>(
    st: &mut PlatformState<B>,
    id: WindowId,
    key: ContextKey,
    surface: &B::Surface,
) -> Result<()> {
    if st.registry.current() == Some(id) {
        return Ok(());
    }
    let ctx = st.registry.context(key).ok_or_else(|| context_gone(key))?;
    st.backend.make_current(ctx, surface);
    st.registry.set_current(id);
    log::trace!("window {id}: context {}:{} current", key.display, key.context);
    Ok(())
}

fn create_primary<B: Backend>(
    st: &mut PlatformState<B>,
    id: WindowId,
    mut surface: B::Surface,
) -> Result<(B::Surface, ContextKey)> {
    let (context_id, context) = match st.backend.create_context(&surface) {
        Ok(created) => created,
        Err(e) => {
            st.backend.release_surface(surface);
            return Err(e);
        }
    };
    if let Err(e) = st.backend.attach_surface(&context, &mut surface) {
        st.backend.release_context(context);
        st.backend.release_surface(surface);
        return Err(e);
    }

    let key = ContextKey {
        display: st.backend.display_id(),
        context: context_id,
    };
    if let Err(e) = st.registry.register_primary(key, context, id) {
        st.backend.release_surface(surface);
        return Err(e);
    }
    log::debug!("window {id}: new context {}:{}", key.display, key.context);
    Ok((surface, key))
}

fn attach_shared<B: Backend>(
    st: &mut PlatformState<B>,
    id: WindowId,
    key: ContextKey,
    mut surface: B::Surface,
) -> Result<(B::Surface, ContextKey)> {
    let Some(context) = st.registry.context(key) else {
        st.backend.release_surface(surface);
        return Err(context_gone(key));
    };
    if let Err(e) = st.backend.attach_surface(context, &mut surface) {
        st.backend.release_surface(surface);
        return Err(e);
    }
    if let Err(e) = st.registry.register_secondary(key, id) {
        st.backend.release_surface(surface);
        return Err(e);
    }
    log::debug!("window {id}: sharing context {}:{}", key.display, key.context);
    Ok((surface, key))
}

fn surface_gone(id: WindowId) -> Error {
    Error::context_creation(format!("window {id} has no native surface"))
}

fn context_gone(key: ContextKey) -> Error {
    Error::context_creation(format!(
        "context {}:{} no longer exists",
        key.display, key.context
    ))
}
