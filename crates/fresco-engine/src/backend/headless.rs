//! CPU-only back-end.
//!
//! Creates no native windows and touches no GPU. Every call is appended to a
//! shared [`Journal`], so callers (mostly tests) can assert on the exact order
//! in which the window layer creates, activates and releases things.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::{Backend, NativeEvent, SurfaceDesc, SurfaceId};
use crate::coords::{ColorRgba, Rect};
use crate::error::{Error, Result};
use crate::shader::LinkedProgram;
use crate::text::LineBitmap;

static NEXT_DISPLAY: AtomicU64 = AtomicU64::new(1);

/// One recorded back-end call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateSurface { surface: SurfaceId, width: u32, height: u32, visible: bool },
    CreateContext { context: u64 },
    AttachSurface { surface: SurfaceId, context: u64 },
    MakeCurrent { surface: SurfaceId, context: u64 },
    ResizeSurface { surface: SurfaceId, width: u32, height: u32 },
    SetTitle { surface: SurfaceId, title: String },
    SetPosition { surface: SurfaceId, x: i32, y: i32 },
    SetVisible { surface: SurfaceId, visible: bool },
    CreateBuffer { buffer: u64, size: u64 },
    WriteBuffer { buffer: u64, len: usize },
    CreateProgram { program: u64, label: String },
    BeginFrame { surface: SurfaceId },
    DrawLabel { surface: SurfaceId, rect: Rect },
    Present { surface: SurfaceId, draws: Vec<Rect> },
    ReleaseBuffer { buffer: u64 },
    ReleaseProgram { program: u64 },
    ReleaseContext { context: u64 },
    ReleaseSurface { surface: SurfaceId },
}

/// Failure injection switches; each one trips once and then resets.
#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    surface: bool,
    context: bool,
    attach: bool,
    buffer: bool,
    program: bool,
    frame_skip: bool,
    frame_lost: bool,
}

#[derive(Debug, Default)]
struct JournalState {
    calls: Vec<Call>,
    events: VecDeque<(SurfaceId, NativeEvent)>,
    faults: Faults,
}

/// Shared view into a [`HeadlessBackend`]'s call log.
///
/// Cloning is cheap; all clones observe the same log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    state: Rc<RefCell<JournalState>>,
}

impl Journal {
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Queues an event delivered by the next `pump_events`.
    pub fn push_event(&self, surface: SurfaceId, event: NativeEvent) {
        self.state.borrow_mut().events.push_back((surface, event));
    }

    pub fn fail_next_surface(&self) {
        self.state.borrow_mut().faults.surface = true;
    }

    pub fn fail_next_context(&self) {
        self.state.borrow_mut().faults.context = true;
    }

    pub fn fail_next_attach(&self) {
        self.state.borrow_mut().faults.attach = true;
    }

    pub fn fail_next_buffer(&self) {
        self.state.borrow_mut().faults.buffer = true;
    }

    pub fn fail_next_program(&self) {
        self.state.borrow_mut().faults.program = true;
    }

    /// Next `begin_frame` reports a recoverable condition (frame skipped).
    pub fn skip_next_frame(&self) {
        self.state.borrow_mut().faults.frame_skip = true;
    }

    /// Next `begin_frame` reports an unrecoverable surface failure.
    pub fn lose_next_frame(&self) {
        self.state.borrow_mut().faults.frame_lost = true;
    }

    /// Contexts created and not yet released.
    pub fn live_contexts(&self) -> Vec<u64> {
        let mut live = Vec::new();
        for call in &self.state.borrow().calls {
            match call {
                Call::CreateContext { context } => live.push(*context),
                Call::ReleaseContext { context } => live.retain(|c| c != context),
                _ => {}
            }
        }
        live
    }

    /// Surfaces created and not yet released.
    pub fn live_surfaces(&self) -> Vec<SurfaceId> {
        let mut live = Vec::new();
        for call in &self.state.borrow().calls {
            match call {
                Call::CreateSurface { surface, .. } => live.push(*surface),
                Call::ReleaseSurface { surface } => live.retain(|s| s != surface),
                _ => {}
            }
        }
        live
    }

    fn record(&self, call: Call) {
        log::trace!("headless: {call:?}");
        self.state.borrow_mut().calls.push(call);
    }

    fn trip(&self, pick: impl FnOnce(&mut Faults) -> &mut bool) -> bool {
        let mut state = self.state.borrow_mut();
        std::mem::take(pick(&mut state.faults))
    }
}

#[derive(Debug)]
pub struct HeadlessSurface {
    pub id: SurfaceId,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub position: (i32, i32),
    pub visible: bool,
    pub context: Option<u64>,
}

#[derive(Debug)]
pub struct HeadlessContext {
    pub id: u64,
}

#[derive(Debug)]
pub struct HeadlessBuffer {
    pub id: u64,
    pub size: u64,
    /// Last bytes written.
    pub contents: RefCell<Vec<u8>>,
}

#[derive(Debug)]
pub struct HeadlessProgram {
    pub id: u64,
    pub label: String,
}

/// A frame under construction. Drawables append the viewports they render
/// into; labels are tracked separately.
#[derive(Debug, Default)]
pub struct HeadlessFrame {
    pub surface: SurfaceId,
    pub draws: Vec<Rect>,
    pub labels: Vec<Rect>,
}

/// Back-end that records instead of rendering.
#[derive(Debug)]
pub struct HeadlessBackend {
    display: u64,
    journal: Journal,
    next_id: u64,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            display: NEXT_DISPLAY.fetch_add(1, Ordering::Relaxed),
            journal: Journal::default(),
            next_id: 1,
        }
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for HeadlessBackend {
    type Surface = HeadlessSurface;
    type Context = HeadlessContext;
    type Buffer = HeadlessBuffer;
    type Program = HeadlessProgram;
    type Frame = HeadlessFrame;

    fn display_id(&self) -> u64 {
        self.display
    }

    fn surface_id(surface: &HeadlessSurface) -> SurfaceId {
        surface.id
    }

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<HeadlessSurface> {
        if self.journal.trip(|f| &mut f.surface) {
            return Err(Error::context_creation("headless: injected surface failure"));
        }
        let id = self.next_id();
        self.journal.record(Call::CreateSurface {
            surface: id,
            width: desc.width,
            height: desc.height,
            visible: desc.visible,
        });
        Ok(HeadlessSurface {
            id,
            width: desc.width,
            height: desc.height,
            title: desc.title.clone(),
            position: (0, 0),
            visible: desc.visible,
            context: None,
        })
    }

    fn create_context(&mut self, _surface: &HeadlessSurface) -> Result<(u64, HeadlessContext)> {
        if self.journal.trip(|f| &mut f.context) {
            return Err(Error::context_creation("headless: injected context failure"));
        }
        let id = self.next_id();
        self.journal.record(Call::CreateContext { context: id });
        Ok((id, HeadlessContext { id }))
    }

    fn attach_surface(&mut self, context: &HeadlessContext, surface: &mut HeadlessSurface) -> Result<()> {
        if self.journal.trip(|f| &mut f.attach) {
            return Err(Error::context_creation("headless: injected attach failure"));
        }
        surface.context = Some(context.id);
        self.journal.record(Call::AttachSurface {
            surface: surface.id,
            context: context.id,
        });
        Ok(())
    }

    fn make_current(&mut self, context: &HeadlessContext, surface: &HeadlessSurface) {
        self.journal.record(Call::MakeCurrent {
            surface: surface.id,
            context: context.id,
        });
    }

    fn resize_surface(
        &mut self,
        _context: &HeadlessContext,
        surface: &mut HeadlessSurface,
        width: u32,
        height: u32,
    ) {
        surface.width = width;
        surface.height = height;
        self.journal.record(Call::ResizeSurface {
            surface: surface.id,
            width,
            height,
        });
    }

    fn set_title(&mut self, surface: &mut HeadlessSurface, title: &str) {
        surface.title = title.to_string();
        self.journal.record(Call::SetTitle {
            surface: surface.id,
            title: title.to_string(),
        });
    }

    fn set_position(&mut self, surface: &mut HeadlessSurface, x: i32, y: i32) {
        surface.position = (x, y);
        self.journal.record(Call::SetPosition { surface: surface.id, x, y });
    }

    fn set_visible(&mut self, surface: &mut HeadlessSurface, visible: bool) {
        surface.visible = visible;
        self.journal.record(Call::SetVisible {
            surface: surface.id,
            visible,
        });
    }

    fn create_buffer(&mut self, _context: &HeadlessContext, size: u64) -> Result<HeadlessBuffer> {
        if self.journal.trip(|f| &mut f.buffer) {
            return Err(Error::context_creation("headless: injected buffer failure"));
        }
        let id = self.next_id();
        self.journal.record(Call::CreateBuffer { buffer: id, size });
        Ok(HeadlessBuffer {
            id,
            size,
            contents: RefCell::new(Vec::new()),
        })
    }

    fn write_buffer(&mut self, _context: &HeadlessContext, buffer: &HeadlessBuffer, bytes: &[u8]) {
        debug_assert!(bytes.len() as u64 <= buffer.size);
        *buffer.contents.borrow_mut() = bytes.to_vec();
        self.journal.record(Call::WriteBuffer {
            buffer: buffer.id,
            len: bytes.len(),
        });
    }

    fn create_colormap_program(
        &mut self,
        _context: &HeadlessContext,
        _surface: &HeadlessSurface,
        program: &LinkedProgram,
    ) -> Result<HeadlessProgram> {
        if self.journal.trip(|f| &mut f.program) {
            return Err(Error::ShaderLink(format!(
                "{}: headless: injected program failure",
                program.label()
            )));
        }
        let id = self.next_id();
        self.journal.record(Call::CreateProgram {
            program: id,
            label: program.label().to_string(),
        });
        Ok(HeadlessProgram {
            id,
            label: program.label().to_string(),
        })
    }

    fn begin_frame(
        &mut self,
        _context: &HeadlessContext,
        surface: &mut HeadlessSurface,
        _clear: ColorRgba,
    ) -> Result<Option<HeadlessFrame>> {
        if self.journal.trip(|f| &mut f.frame_lost) {
            return Err(Error::Surface("headless: injected surface loss".to_string()));
        }
        if self.journal.trip(|f| &mut f.frame_skip) {
            return Ok(None);
        }
        self.journal.record(Call::BeginFrame { surface: surface.id });
        Ok(Some(HeadlessFrame {
            surface: surface.id,
            ..HeadlessFrame::default()
        }))
    }

    fn draw_label(
        &mut self,
        _context: &HeadlessContext,
        surface: &mut HeadlessSurface,
        frame: &mut HeadlessFrame,
        _bitmap: &LineBitmap,
        rect: Rect,
        _color: ColorRgba,
    ) {
        frame.labels.push(rect);
        self.journal.record(Call::DrawLabel {
            surface: surface.id,
            rect,
        });
    }

    fn present(&mut self, _context: &HeadlessContext, surface: &mut HeadlessSurface, frame: HeadlessFrame) {
        self.journal.record(Call::Present {
            surface: surface.id,
            draws: frame.draws,
        });
    }

    fn pump_events(&mut self) -> Vec<(SurfaceId, NativeEvent)> {
        self.journal.state.borrow_mut().events.drain(..).collect()
    }

    fn release_buffer(&mut self, _context: &HeadlessContext, buffer: HeadlessBuffer) {
        self.journal.record(Call::ReleaseBuffer { buffer: buffer.id });
    }

    fn release_program(&mut self, _context: &HeadlessContext, program: HeadlessProgram) {
        self.journal.record(Call::ReleaseProgram { program: program.id });
    }

    fn release_context(&mut self, context: HeadlessContext) {
        self.journal.record(Call::ReleaseContext { context: context.id });
    }

    fn release_surface(&mut self, surface: HeadlessSurface) {
        self.journal.record(Call::ReleaseSurface { surface: surface.id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> SurfaceDesc {
        SurfaceDesc {
            title: "t".into(),
            width: 64,
            height: 32,
            visible: false,
        }
    }

    #[test]
    fn injected_faults_trip_once() {
        let mut backend = HeadlessBackend::new();
        let journal = backend.journal();

        journal.fail_next_surface();
        assert!(backend.create_surface(&desc()).is_err());
        assert!(backend.create_surface(&desc()).is_ok());
    }

    #[test]
    fn live_tracking_follows_release() {
        let mut backend = HeadlessBackend::new();
        let journal = backend.journal();

        let surface = backend.create_surface(&desc()).unwrap();
        let (id, ctx) = backend.create_context(&surface).unwrap();
        assert_eq!(journal.live_contexts(), vec![id]);

        backend.release_context(ctx);
        backend.release_surface(surface);
        assert!(journal.live_contexts().is_empty());
        assert!(journal.live_surfaces().is_empty());
    }

    #[test]
    fn each_backend_is_its_own_display() {
        assert_ne!(HeadlessBackend::new().display_id(), HeadlessBackend::new().display_id());
    }
}
