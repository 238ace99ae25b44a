use std::cell::{Cell, RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::backend::{Backend, NativeEvent, SurfaceId};
use crate::error::{Error, Result};
use crate::window::registry::ContextRegistry;
use crate::window::WindowId;

/// Undelivered events kept per window; older ones are dropped first.
pub const MAX_QUEUED_EVENTS: usize = 256;

/// Owner of the back-end, the context registry, and undelivered input.
///
/// One per thread. Windows keep a clone; the back-end lives as long as the
/// longest of them. `Platform` is `Rc`-based and therefore neither `Send`
/// nor `Sync`, which pins every window to the thread that created it.
///
/// While a window runs caller code the platform is busy: queries answer from
/// the state published before the hand-off, and operations that need the
/// back-end fail or are skipped.
pub struct Platform<B: Backend> {
    state: Rc<RefCell<PlatformState<B>>>,
    published: Rc<Cell<Published>>,
}

pub(crate) struct PlatformState<B: Backend> {
    pub(crate) backend: B,
    pub(crate) registry: ContextRegistry<B::Context>,
    events: HashMap<SurfaceId, VecDeque<NativeEvent>>,
}

#[derive(Debug, Copy, Clone, Default)]
struct Published {
    live_contexts: usize,
    current: Option<WindowId>,
}

impl<B: Backend> Platform<B> {
    pub fn new(backend: B) -> Self {
        Self {
            state: Rc::new(RefCell::new(PlatformState {
                backend,
                registry: ContextRegistry::new(),
                events: HashMap::new(),
            })),
            published: Rc::new(Cell::new(Published::default())),
        }
    }

    /// Pulls pending events from the back-end into per-window queues.
    ///
    /// Each window drains its queue when it is polled with `close()` and
    /// before it draws or presents.
    pub fn pump_events(&self) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            log::warn!("event pump skipped: the platform is busy drawing");
            return;
        };
        let events = state.backend.pump_events();
        for (surface, event) in events {
            let queue = state.events.entry(surface).or_default();
            if queue.len() >= MAX_QUEUED_EVENTS {
                queue.pop_front();
                log::debug!("surface {surface}: event queue full, dropping oldest");
            }
            queue.push_back(event);
        }
    }

    /// Number of GPU contexts currently alive.
    pub fn live_contexts(&self) -> usize {
        match self.state.try_borrow() {
            Ok(state) => state.registry.len(),
            Err(_) => self.published.get().live_contexts,
        }
    }

    /// The window whose context is current, if any.
    pub fn current_window(&self) -> Option<WindowId> {
        match self.state.try_borrow() {
            Ok(state) => state.registry.current(),
            Err(_) => self.published.get().current,
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn state(&self) -> Result<RefMut<'_, PlatformState<B>>> {
        self.state
            .try_borrow_mut()
            .map_err(|_| Error::invalid_argument("the platform is busy: a window is running caller code"))
    }

    /// Records what queries report while `state` is held across caller code.
    pub(crate) fn publish(&self, state: &PlatformState<B>) {
        self.published.set(Published {
            live_contexts: state.registry.len(),
            current: state.registry.current(),
        });
    }

    pub(crate) fn take_events(&self, surface: SurfaceId) -> Vec<NativeEvent> {
        match self.state.try_borrow_mut() {
            Ok(mut state) => state
                .events
                .remove(&surface)
                .map(Vec::from)
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// Events waiting for the window presenting to `surface`.
    pub fn queued_events(&self, surface: SurfaceId) -> usize {
        self.state
            .try_borrow()
            .map(|state| state.events.get(&surface).map_or(0, VecDeque::len))
            .unwrap_or(0)
    }

    pub(crate) fn forget_events(&self, surface: SurfaceId) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.events.remove(&surface);
        }
    }
}

impl<B: Backend> Clone for Platform<B> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            published: Rc::clone(&self.published),
        }
    }
}

impl<B: Backend> std::fmt::Debug for Platform<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Platform")
                .field("display", &state.backend.display_id())
                .field("contexts", &state.registry.len())
                .field("current", &state.registry.current())
                .finish(),
            Err(_) => f.write_str("Platform { <in use> }"),
        }
    }
}
