use fresco_engine::backend::headless::{Call, HeadlessBackend, HeadlessFrame, Journal};
use std::cell::{Cell, RefCell};

use fresco_engine::backend::NativeEvent;
use fresco_engine::input::{Key, KeyAction, Modifiers};
use fresco_engine::shader::{self, ProgramSource, ShaderStage, COLORMAP_FRAGMENT};
use fresco_engine::window::MAX_QUEUED_EVENTS;
use fresco_engine::{ColorMap, Error, Platform, Rect, RenderCtx, Window, WindowConfig};

type Headless = HeadlessBackend;

fn platform() -> (Platform<Headless>, Journal) {
    let backend = HeadlessBackend::new();
    let journal = backend.journal();
    (Platform::new(backend), journal)
}

fn open(platform: &Platform<Headless>, w: u32, h: u32, shared: Option<&Window<Headless>>) -> Window<Headless> {
    Window::new(platform, WindowConfig::new(w, h, "test").invisible(true), shared).unwrap()
}

/// Records the viewport it was asked to render into.
fn recorder(frame: &mut HeadlessFrame, ctx: &RenderCtx<'_, Headless>) {
    frame.draws.push(ctx.viewport);
}

fn presented(journal: &Journal) -> Vec<Vec<Rect>> {
    journal
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Present { draws, .. } => Some(draws),
            _ => None,
        })
        .collect()
}

fn surface_of(journal: &Journal, nth: usize) -> u64 {
    journal
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::CreateSurface { surface, .. } => Some(surface),
            _ => None,
        })
        .nth(nth)
        .unwrap()
}

// ── construction ──────────────────────────────────────────────────────────

#[test]
fn new_window_creates_context_buffer_and_program() {
    let (platform, journal) = platform();
    let win = open(&platform, 800, 600, None);

    let calls = journal.calls();
    assert!(matches!(calls[0], Call::CreateSurface { width: 800, height: 600, visible: false, .. }));
    assert!(matches!(calls[1], Call::CreateContext { .. }));
    assert!(matches!(calls[2], Call::AttachSurface { .. }));
    assert!(matches!(calls[3], Call::MakeCurrent { .. }));
    assert!(calls
        .iter()
        .any(|c| matches!(c, Call::CreateProgram { label, .. } if label == "colormap")));

    assert_eq!(win.colormap(), ColorMap::Default);
    assert_eq!(win.colormap_buffer_size(), ColorMap::Default.byte_size());
    assert_eq!(platform.live_contexts(), 1);
    assert!(!win.is_visible());
}

#[test]
fn zero_size_is_invalid() {
    let (platform, journal) = platform();
    let err = Window::new(&platform, WindowConfig::new(0, 600, "x"), None).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(journal.calls().is_empty());
}

#[test]
fn context_failure_leaves_nothing_behind() {
    let (platform, journal) = platform();
    journal.fail_next_context();

    let err = Window::new(&platform, WindowConfig::new(100, 100, "x"), None).unwrap_err();
    assert!(matches!(err, Error::ContextCreation(_)));
    assert_eq!(platform.live_contexts(), 0);
    assert!(journal.live_surfaces().is_empty());
    assert!(journal.live_contexts().is_empty());
}

#[test]
fn program_failure_unwinds_in_reverse_order() {
    let (platform, journal) = platform();
    journal.fail_next_program();

    let err = Window::new(&platform, WindowConfig::new(100, 100, "x"), None).unwrap_err();
    assert!(matches!(err, Error::ShaderLink(_)));
    assert_eq!(platform.live_contexts(), 0);
    assert_eq!(platform.current_window(), None);

    let tail: Vec<_> = journal
        .calls()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                Call::ReleaseBuffer { .. } | Call::ReleaseContext { .. } | Call::ReleaseSurface { .. }
            )
        })
        .collect();
    assert!(matches!(
        tail.as_slice(),
        [Call::ReleaseBuffer { .. }, Call::ReleaseContext { .. }, Call::ReleaseSurface { .. }]
    ));
}

fn assert_nothing_alive(platform: &Platform<Headless>, journal: &Journal) {
    assert_eq!(platform.live_contexts(), 0);
    assert_eq!(platform.current_window(), None);
    assert!(journal.live_surfaces().is_empty());
    assert!(journal.live_contexts().is_empty());
}

#[test]
fn broken_colormap_shader_leaves_nothing_behind() {
    let (platform, journal) = platform();
    let config = WindowConfig::new(100, 100, "x")
        .colormap_program(ProgramSource::new("fn vs_main( {", COLORMAP_FRAGMENT));

    let err = Window::new(&platform, config, None).unwrap_err();
    assert!(matches!(err, Error::ShaderCompile { stage: ShaderStage::Vertex, .. }));
    assert_nothing_alive(&platform, &journal);
}

#[test]
fn missing_entry_point_leaves_nothing_behind() {
    let (platform, journal) = platform();
    let config = WindowConfig::new(100, 100, "x")
        .colormap_program(shader::colormap_program().with_entries("nope", "fs_main"));

    let err = Window::new(&platform, config, None).unwrap_err();
    assert!(matches!(err, Error::ShaderLink(_)));
    assert_nothing_alive(&platform, &journal);
    assert!(!journal.calls().iter().any(|c| matches!(c, Call::CreateBuffer { .. })));
}

#[test]
fn attach_failure_releases_context_and_surface() {
    let (platform, journal) = platform();
    journal.fail_next_attach();

    let err = Window::new(&platform, WindowConfig::new(100, 100, "x"), None).unwrap_err();
    assert!(matches!(err, Error::ContextCreation(_)));
    assert_nothing_alive(&platform, &journal);
}

#[test]
fn shared_attach_failure_keeps_the_sibling() {
    let (platform, journal) = platform();
    let first = open(&platform, 100, 100, None);
    journal.fail_next_attach();

    assert!(Window::new(&platform, WindowConfig::new(100, 100, "x"), Some(&first)).is_err());
    assert_eq!(platform.live_contexts(), 1);
    assert_eq!(journal.live_surfaces().len(), 1);
    first.draw(&recorder).unwrap();
}

#[test]
fn windows_on_other_platforms_cannot_share() {
    let (a, _) = platform();
    let (b, _) = platform();
    let first = open(&a, 100, 100, None);
    let err = Window::new(&b, WindowConfig::new(100, 100, "x"), Some(&first)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

// ── context sharing ───────────────────────────────────────────────────────

#[test]
fn shared_windows_report_the_same_context() {
    let (platform, journal) = platform();
    let a = open(&platform, 800, 600, None);
    let b = open(&platform, 400, 300, Some(&a));
    let c = open(&platform, 400, 300, None);

    assert_eq!((a.display(), a.context()), (b.display(), b.context()));
    assert_eq!(a.display(), c.display());
    assert_ne!(a.context(), c.context());
    assert_eq!(platform.live_contexts(), 2);

    let created = journal
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::CreateContext { .. }))
        .count();
    assert_eq!(created, 2);
}

#[test]
fn context_outlives_its_creator_while_shared() {
    let (platform, journal) = platform();
    let a = open(&platform, 800, 600, None);
    let b = open(&platform, 400, 300, Some(&a));
    let context = a.context();

    drop(a);
    assert_eq!(platform.live_contexts(), 1);
    assert_eq!(journal.live_contexts(), vec![context]);

    b.draw(&recorder).unwrap();
    assert_eq!(presented(&journal).last().unwrap(), &vec![Rect::from_size(400, 300)]);

    journal.clear();
    drop(b);
    assert_eq!(platform.live_contexts(), 0);

    let calls = journal.calls();
    let order: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            Call::ReleaseBuffer { .. } => Some("buffer"),
            Call::ReleaseProgram { .. } => Some("program"),
            Call::ReleaseContext { .. } => Some("context"),
            Call::ReleaseSurface { .. } => Some("surface"),
            _ => None,
        })
        .collect();
    assert_eq!(order, ["buffer", "program", "context", "surface"]);
    assert!(calls.contains(&Call::ReleaseContext { context }));
}

#[test]
fn clones_keep_the_window_alive() {
    let (platform, journal) = platform();
    let a = open(&platform, 100, 100, None);
    let alias = a.clone();
    assert!(alias.ptr_eq(&a));

    drop(a);
    assert_eq!(journal.live_surfaces().len(), 1);
    drop(alias);
    assert!(journal.live_surfaces().is_empty());
}

// ── activation ────────────────────────────────────────────────────────────

#[test]
fn activation_switches_once_per_change() {
    let (platform, journal) = platform();
    let a = open(&platform, 100, 100, None);
    let b = open(&platform, 100, 100, Some(&a));
    journal.clear();

    a.make_current().unwrap();
    a.make_current().unwrap();
    b.make_current().unwrap();
    b.make_current().unwrap();
    a.make_current().unwrap();

    let switches = journal
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::MakeCurrent { .. }))
        .count();
    assert_eq!(switches, 3);
    assert_eq!(platform.current_window(), Some(a.id()));
}

#[test]
fn destroying_the_current_window_clears_the_marker() {
    let (platform, _) = platform();
    let a = open(&platform, 100, 100, None);
    a.make_current().unwrap();
    let id = a.id();
    drop(a);
    assert_ne!(platform.current_window(), Some(id));
    assert_eq!(platform.current_window(), None);
}

// ── grid & draw ───────────────────────────────────────────────────────────

#[test]
fn two_by_two_cells_render_into_quadrants() {
    let (platform, journal) = platform();
    let win = open(&platform, 800, 600, None);
    win.grid(2, 2).unwrap();
    assert_eq!(win.cell_size(), (400, 300));

    for row in 0..2 {
        for col in 0..2 {
            win.draw_cell(col, row, &recorder, None).unwrap();
        }
    }
    assert!(win.has_pending_frame());
    assert!(presented(&journal).is_empty());

    win.present().unwrap();
    assert!(!win.has_pending_frame());
    assert_eq!(
        presented(&journal),
        vec![vec![
            Rect::new(0, 0, 400, 300),
            Rect::new(400, 0, 400, 300),
            Rect::new(0, 300, 400, 300),
            Rect::new(400, 300, 400, 300),
        ]]
    );
}

#[test]
fn remainder_goes_to_the_last_column() {
    let (platform, _) = platform();
    let win = open(&platform, 801, 600, None);
    win.grid(1, 2).unwrap();
    assert_eq!(win.cell_viewport(0, 0).unwrap().width, 400);
    assert_eq!(win.cell_viewport(1, 0).unwrap(), Rect::new(400, 0, 401, 600));
}

#[test]
fn out_of_range_cell_touches_nothing() {
    let (platform, journal) = platform();
    let win = open(&platform, 800, 600, None);
    win.grid(2, 3).unwrap();
    journal.clear();

    let err = win.draw_cell(3, 0, &recorder, Some("title")).unwrap_err();
    assert_eq!(err, Error::OutOfRange { col: 3, row: 0, cols: 3, rows: 2 });
    assert!(win.draw_cell(0, 2, &recorder, None).is_err());
    assert!(journal.calls().is_empty());
    assert!(!win.has_pending_frame());
}

#[test]
fn invalid_grid_is_rejected() {
    let (platform, _) = platform();
    let win = open(&platform, 800, 600, None);
    assert!(matches!(win.grid(0, 2), Err(Error::InvalidArgument(_))));
    assert!(matches!(win.grid(2, 0), Err(Error::InvalidArgument(_))));
    assert_eq!(win.cell_size(), (800, 600));
}

#[test]
fn full_draw_ignores_the_grid_and_presents() {
    let (platform, journal) = platform();
    let win = open(&platform, 800, 600, None);
    win.grid(3, 3).unwrap();

    win.draw(&recorder).unwrap();
    assert_eq!(presented(&journal), vec![vec![Rect::from_size(800, 600)]]);
    assert!(!win.has_pending_frame());
}

#[test]
fn present_without_draws_is_a_no_op() {
    let (platform, journal) = platform();
    let win = open(&platform, 100, 100, None);
    journal.clear();
    win.present().unwrap();
    assert!(journal.calls().is_empty());
}

#[test]
fn skipped_frames_are_not_errors() {
    let (platform, journal) = platform();
    let win = open(&platform, 100, 100, None);
    journal.skip_next_frame();
    win.draw_cell(0, 0, &recorder, None).unwrap();
    assert!(!win.has_pending_frame());

    journal.lose_next_frame();
    assert!(matches!(win.draw(&recorder), Err(Error::Surface(_))));
}

#[test]
fn drawables_see_window_resources() {
    let (platform, _) = platform();
    let win = open(&platform, 100, 100, None);
    win.set_colormap(ColorMap::Colors).unwrap();

    let check = |frame: &mut HeadlessFrame, ctx: &RenderCtx<'_, Headless>| {
        assert_eq!(ctx.resources.colormap, ColorMap::Colors);
        assert_eq!(ctx.resources.colormap_len(), 8);
        assert_eq!(ctx.resources.colormap_buffer.size, ColorMap::Colors.byte_size());
        assert_eq!(ctx.resources.program.label, "colormap");
        assert!(ctx.resources.font.is_none());
        assert_eq!(ctx.window, Rect::from_size(100, 100));
        frame.draws.push(ctx.viewport);
    };
    win.draw(&check).unwrap();
}

#[test]
fn titles_need_a_font() {
    let (platform, journal) = platform();
    let win = open(&platform, 800, 600, None);
    win.grid(1, 2).unwrap();
    journal.clear();

    match fresco_engine::text::default_font() {
        Ok(_) => {
            win.draw_cell(1, 0, &recorder, Some("pressure")).unwrap();
            let cell = win.cell_viewport(1, 0).unwrap();
            let labels: Vec<_> = journal
                .calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::DrawLabel { rect, .. } => Some(rect),
                    _ => None,
                })
                .collect();
            assert_eq!(labels.len(), 1);
            assert!(labels[0].x >= cell.x && labels[0].right() <= cell.right());
            assert!(labels[0].bottom() <= cell.bottom());
        }
        Err(_) => {
            let err = win.draw_cell(1, 0, &recorder, Some("pressure")).unwrap_err();
            assert!(matches!(err, Error::FileNotFound { .. }));
            assert!(journal.calls().is_empty());
        }
    }
}

// ── resources ─────────────────────────────────────────────────────────────

#[test]
fn colormap_buffer_tracks_table_size() {
    let (platform, journal) = platform();
    let win = open(&platform, 100, 100, None);
    journal.clear();

    win.set_colormap(ColorMap::Spectrum).unwrap();
    assert_eq!(win.colormap_buffer_size(), 259 * 16);
    win.set_colormap(ColorMap::Colors).unwrap();
    assert_eq!(win.colormap_buffer_size(), 8 * 16);

    let sizes: Vec<_> = journal
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::CreateBuffer { size, .. } => Some(size),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![259 * 16, 8 * 16]);

    // Same size: upload only.
    journal.clear();
    win.set_colormap(ColorMap::Heat).unwrap();
    win.set_colormap(ColorMap::Heat).unwrap();
    win.set_colormap(ColorMap::Blue).unwrap();
    assert_eq!(win.colormap_buffer_size(), 256 * 16);
    let created = journal
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::CreateBuffer { .. }))
        .count();
    assert_eq!(created, 1);
}

#[test]
fn failed_colormap_upload_keeps_the_old_table() {
    let (platform, journal) = platform();
    let win = open(&platform, 100, 100, None);
    journal.fail_next_buffer();

    assert!(win.set_colormap(ColorMap::Colors).is_err());
    assert_eq!(win.colormap(), ColorMap::Default);
    assert_eq!(win.colormap_buffer_size(), ColorMap::Default.byte_size());
}

#[test]
fn with_context_activates_the_window_first() {
    let (platform, journal) = platform();
    let a = open(&platform, 100, 100, None);
    let b = open(&platform, 100, 100, None);
    assert_eq!(platform.current_window(), Some(b.id()));

    let seen = a.with_context(|ctx| ctx.id).unwrap();
    assert_eq!(seen, a.context());
    assert_eq!(platform.current_window(), Some(a.id()));
    assert!(matches!(journal.calls().last(), Some(Call::MakeCurrent { .. })));
}

#[test]
fn title_position_and_visibility_reach_the_surface() {
    let (platform, journal) = platform();
    let win = open(&platform, 100, 100, None);
    let surface = surface_of(&journal, 0);
    journal.clear();

    win.set_title("plots");
    win.set_pos(20, 40);
    win.show();
    assert!(win.is_visible());
    win.hide();
    assert!(!win.is_visible());

    assert_eq!(
        journal.calls(),
        vec![
            Call::SetTitle { surface, title: "plots".into() },
            Call::SetPosition { surface, x: 20, y: 40 },
            Call::SetVisible { surface, visible: true },
            Call::SetVisible { surface, visible: false },
        ]
    );
}

// ── input & resize ────────────────────────────────────────────────────────

#[test]
fn escape_requests_close() {
    let (platform, journal) = platform();
    let win = open(&platform, 100, 100, None);
    let other = open(&platform, 100, 100, None);
    assert!(!win.close());

    journal.push_event(
        surface_of(&journal, 0),
        NativeEvent::Key {
            key: Key::Escape,
            scancode: 1,
            action: KeyAction::Press,
            mods: Modifiers::NONE,
        },
    );
    assert!(!other.close());
    assert!(win.close());
}

#[test]
fn close_event_and_command_q_request_close() {
    let (platform, journal) = platform();
    let a = open(&platform, 100, 100, None);
    let b = open(&platform, 100, 100, None);

    journal.push_event(surface_of(&journal, 0), NativeEvent::CloseRequested);
    assert!(a.close());

    b.keyboard_handler(Key::Q, 16, KeyAction::Release, Modifiers::CTRL);
    b.keyboard_handler(Key::Q, 16, KeyAction::Press, Modifiers::NONE);
    assert!(!b.close());
    b.keyboard_handler(Key::Q, 16, KeyAction::Press, Modifiers::META);
    assert!(b.close());
}

#[test]
fn resize_events_recompute_cells() {
    let (platform, journal) = platform();
    let win = open(&platform, 800, 600, None);
    win.grid(2, 2).unwrap();

    journal.push_event(surface_of(&journal, 0), NativeEvent::Resized { width: 1000, height: 500 });
    assert!(!win.close());
    assert_eq!((win.width(), win.height()), (1000, 500));
    assert_eq!(win.cell_viewport(1, 1).unwrap(), Rect::new(500, 250, 500, 250));

    // Minimized: ignored.
    win.resize(0, 0).unwrap();
    assert_eq!(win.cell_size(), (500, 250));
}

#[test]
fn resize_discards_a_pending_frame() {
    let (platform, journal) = platform();
    let win = open(&platform, 800, 600, None);
    win.draw_cell(0, 0, &recorder, None).unwrap();

    win.resize(640, 480).unwrap();
    assert!(!win.has_pending_frame());
    win.present().unwrap();
    assert!(presented(&journal).is_empty());
}

#[test]
fn drawing_applies_events_queued_while_another_window_polls() {
    let (platform, journal) = platform();
    let a = open(&platform, 800, 600, None);
    let b = open(&platform, 800, 600, Some(&a));
    b.grid(2, 2).unwrap();
    let b_surface = surface_of(&journal, 1);

    for _ in 0..1000 {
        journal.push_event(b_surface, NativeEvent::Focused(true));
    }
    journal.push_event(b_surface, NativeEvent::Resized { width: 1000, height: 500 });
    assert!(!a.close());
    assert_eq!(platform.queued_events(b_surface), MAX_QUEUED_EVENTS);

    journal.clear();
    b.draw_cell(1, 1, &recorder, None).unwrap();
    b.present().unwrap();
    assert_eq!(platform.queued_events(b_surface), 0);
    assert_eq!((b.width(), b.height()), (1000, 500));
    assert_eq!(presented(&journal), vec![vec![Rect::new(500, 250, 500, 250)]]);
}

#[test]
fn full_queues_drop_the_oldest_events() {
    let (platform, journal) = platform();
    let a = open(&platform, 100, 100, None);
    let b = open(&platform, 100, 100, None);
    let b_surface = surface_of(&journal, 1);

    journal.push_event(b_surface, NativeEvent::CloseRequested);
    for _ in 0..MAX_QUEUED_EVENTS {
        journal.push_event(b_surface, NativeEvent::Focused(false));
    }
    a.close();
    assert_eq!(platform.queued_events(b_surface), MAX_QUEUED_EVENTS);
    assert!(!b.close());
}

// ── re-entrancy ───────────────────────────────────────────────────────────

#[test]
fn drawables_can_query_their_own_window() {
    let (platform, _) = platform();
    let win = open(&platform, 800, 600, None);
    win.grid(2, 2).unwrap();
    win.show();

    let seen = RefCell::new(Vec::new());
    let nested = Cell::new(None);
    let inner = win.clone();
    let plat = platform.clone();
    let check = |frame: &mut HeadlessFrame, ctx: &RenderCtx<'_, Headless>| {
        seen.borrow_mut().push((
            inner.width(),
            inner.cell_size(),
            inner.has_pending_frame(),
            plat.live_contexts(),
            plat.current_window(),
        ));
        nested.set(Some(inner.draw_cell(0, 0, &recorder, None)));
        inner.set_title("ignored");
        inner.hide();
        assert!(!inner.close());
        plat.pump_events();
        frame.draws.push(ctx.viewport);
    };
    win.draw_cell(1, 1, &check, None).unwrap();

    assert_eq!(
        seen.into_inner(),
        vec![(800, (400, 300), true, 1, Some(win.id()))]
    );
    assert!(matches!(nested.take(), Some(Err(Error::InvalidArgument(_)))));
    assert!(win.is_visible());
    win.present().unwrap();
}

#[test]
fn with_context_callbacks_can_query_their_window() {
    let (platform, _) = platform();
    let win = open(&platform, 320, 200, None);
    let inner = win.clone();

    let (size, colormap, grid) = win
        .with_context(|_| (inner.width(), inner.colormap(), inner.grid(2, 2)))
        .unwrap();
    assert_eq!(size, 320);
    assert_eq!(colormap, ColorMap::Default);
    assert!(matches!(grid, Err(Error::InvalidArgument(_))));
    assert_eq!(win.cell_size(), (320, 200));
}
