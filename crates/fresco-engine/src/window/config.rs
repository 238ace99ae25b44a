use crate::coords::ColorRgba;
use crate::shader::ProgramSource;

/// Creation parameters for a window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    /// Client-area width in physical pixels. Must be > 0.
    pub width: u32,
    /// Client-area height in physical pixels. Must be > 0.
    pub height: u32,
    pub title: String,
    /// Create the window hidden (e.g. for offscreen rendering).
    pub invisible: bool,
    /// Color every frame starts from.
    pub clear_color: ColorRgba,
    /// Cell title size in pixels.
    pub label_size: f32,
    pub label_color: ColorRgba,
    /// Replacement for the built-in colormap program. It must keep the same
    /// bindings (colormap table at group 0, scalar field at group 1).
    pub colormap_program: Option<ProgramSource>,
}

impl WindowConfig {
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn invisible(mut self, invisible: bool) -> Self {
        self.invisible = invisible;
        self
    }

    pub fn clear_color(mut self, color: ColorRgba) -> Self {
        self.clear_color = color;
        self
    }

    pub fn label_size(mut self, px: f32) -> Self {
        self.label_size = px;
        self
    }

    pub fn label_color(mut self, color: ColorRgba) -> Self {
        self.label_color = color;
        self
    }

    pub fn colormap_program(mut self, source: ProgramSource) -> Self {
        self.colormap_program = Some(source);
        self
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "fresco".to_string(),
            invisible: false,
            clear_color: ColorRgba::rgb(0.1, 0.1, 0.1),
            label_size: 16.0,
            label_color: ColorRgba::white(),
            colormap_program: None,
        }
    }
}
