//! Windows, grid layout and context sharing.
//!
//! A [`Platform`] owns the back-end and the [`ContextRegistry`]. Each
//! [`Window`] is a cloneable handle to a [`WindowImpl`], which owns one
//! native surface and the GPU objects drawn with it. Windows created with a
//! `shared` sibling reuse that sibling's context; the context is released
//! when the last window using it is dropped.

mod config;
mod grid;
mod handle;
mod platform;
mod registry;
mod status;
mod window_impl;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use config::WindowConfig;
pub use grid::GridLayout;
pub use handle::Window;
pub use platform::{Platform, MAX_QUEUED_EVENTS};
pub use registry::{ContextKey, ContextRegistry};
pub use status::WindowStatus;
pub use window_impl::WindowImpl;

/// Process-unique window identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct WindowId(u64);

impl WindowId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
