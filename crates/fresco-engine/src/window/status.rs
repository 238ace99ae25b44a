use std::sync::Arc;

use crate::colormap::ColorMap;
use crate::text::Font;
use crate::window::GridLayout;

/// Snapshot of what a window reports through its read-only accessors.
///
/// While a window runs caller code (a drawable, a `with_context` callback)
/// its handle answers from the snapshot taken just before the hand-off.
#[derive(Debug, Clone)]
pub struct WindowStatus {
    pub layout: GridLayout,
    pub visible: bool,
    pub font: Option<Arc<Font>>,
    pub colormap: ColorMap,
    /// Size in bytes of the GPU colormap buffer.
    pub colormap_buffer_size: u64,
    pub pending_frame: bool,
    pub close_requested: bool,
}
