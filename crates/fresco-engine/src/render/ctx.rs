use crate::backend::Backend;
use crate::colormap::ColorMap;
use crate::coords::Rect;
use crate::text::Font;

/// Per-window resources a drawable may use.
pub struct WindowResources<'a, B: Backend> {
    /// Window font, if one was set.
    pub font: Option<&'a Font>,
    pub colormap: ColorMap,
    /// GPU copy of `colormap`'s table.
    pub colormap_buffer: &'a B::Buffer,
    /// The window's colormap program.
    pub program: &'a B::Program,
}

impl<'a, B: Backend> WindowResources<'a, B> {
    /// Number of entries in `colormap_buffer`.
    #[inline]
    pub fn colormap_len(&self) -> usize {
        self.colormap.len()
    }
}

/// Drawable-facing context for one render call.
pub struct RenderCtx<'a, B: Backend> {
    pub context: &'a B::Context,
    /// Target rectangle in physical pixels (top-left origin, +Y down).
    pub viewport: Rect,
    /// Full window size, for drawables that need to know the surface extent.
    pub window: Rect,
    pub resources: WindowResources<'a, B>,
}
