use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use state::InitCell;

use crate::asset;
use crate::error::{Error, Result};

/// Environment variable that overrides the default font search.
pub const FONT_ENV_VAR: &str = "FRESCO_FONT";

static DEFAULT_FONT: InitCell<Arc<Font>> = InitCell::new();

/// A parsed TrueType/OpenType font.
///
/// Fonts are immutable after loading and are shared between windows as
/// `Arc<Font>`. A window never copies glyph data; it only keeps a reference.
pub struct Font {
    inner: fontdue::Font,
    name: String,
}

/// A single line of text rasterized into an 8-bit coverage bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBitmap {
    pub width: u32,
    pub height: u32,
    /// Row-major coverage, `width * height` bytes.
    pub pixels: Vec<u8>,
}

impl LineBitmap {
    /// Keeps the top-left `max_width` x `max_height` pixels.
    pub fn crop(&self, max_width: u32, max_height: u32) -> LineBitmap {
        let width = self.width.min(max_width);
        let height = self.height.min(max_height);
        if width == self.width && height == self.height {
            return self.clone();
        }

        let mut pixels = Vec::with_capacity((width * height) as usize);
        for row in 0..height as usize {
            let start = row * self.width as usize;
            pixels.extend_from_slice(&self.pixels[start..start + width as usize]);
        }
        LineBitmap { width, height, pixels }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Font {
    /// Parses a font from raw bytes. `name` is used in diagnostics only.
    pub fn from_bytes(bytes: &[u8], name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let inner = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| Error::invalid_argument(format!("font {name}: {e}")))?;
        Ok(Self { inner, name })
    }

    /// Loads and parses a font file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = asset::load_file(path)?;
        Self::from_bytes(&bytes, path.display().to_string())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rasterizes one line of text into a single coverage bitmap.
    ///
    /// Returns `None` when nothing visible would be drawn (empty or
    /// whitespace-only text).
    pub fn rasterize_line(&self, text: &str, px: f32) -> Option<LineBitmap> {
        let layout = self.layout(text, px);
        let glyphs: Vec<_> = layout
            .glyphs()
            .iter()
            .filter(|g| g.char_data.rasterize() && g.width > 0 && g.height > 0)
            .copied()
            .collect();
        if glyphs.is_empty() {
            return None;
        }

        let right = glyphs
            .iter()
            .map(|g| g.x + g.width as f32)
            .fold(0.0f32, f32::max);
        let bottom = glyphs
            .iter()
            .map(|g| g.y + g.height as f32)
            .fold(layout.height(), f32::max);
        let width = right.ceil().max(1.0) as u32;
        let height = bottom.ceil().max(1.0) as u32;

        let mut pixels = vec![0u8; (width * height) as usize];
        for g in glyphs {
            let (metrics, bitmap) = self.inner.rasterize_config(g.key);
            let ox = g.x.round() as i64;
            let oy = g.y.round() as i64;
            for row in 0..metrics.height {
                let dy = oy + row as i64;
                if dy < 0 || dy >= height as i64 {
                    continue;
                }
                for col in 0..metrics.width {
                    let dx = ox + col as i64;
                    if dx < 0 || dx >= width as i64 {
                        continue;
                    }
                    let dst = &mut pixels[dy as usize * width as usize + dx as usize];
                    *dst = (*dst).max(bitmap[row * metrics.width + col]);
                }
            }
        }

        Some(LineBitmap { width, height, pixels })
    }

    fn layout(&self, text: &str, px: f32) -> Layout<()> {
        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[&self.inner], &TextStyle::new(text, px.max(1.0), 0));
        layout
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font").field("name", &self.name).finish()
    }
}

/// Returns the process-wide default font, loading it on first use.
///
/// The search order is `$FRESCO_FONT`, then a short list of well-known system
/// font files. A failed search is not cached; the next call searches again.
pub fn default_font() -> Result<Arc<Font>> {
    if let Some(font) = DEFAULT_FONT.try_get() {
        return Ok(font.clone());
    }

    let font = Arc::new(load_default()?);
    // Another thread may have won the race; either value is fine.
    let _ = DEFAULT_FONT.set(font);
    Ok(DEFAULT_FONT.get().clone())
}

fn load_default() -> Result<Font> {
    let candidates = default_font_candidates();
    for path in &candidates {
        if !path.is_file() {
            continue;
        }
        match Font::from_file(path) {
            Ok(font) => {
                log::debug!("default font: {}", path.display());
                return Ok(font);
            }
            Err(e) => log::warn!("skipping default font candidate: {e}"),
        }
    }

    Err(Error::FileNotFound {
        path: candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| PathBuf::from("<system fonts>")),
        reason: format!("no usable default font found; set {FONT_ENV_VAR}"),
    })
}

/// Paths searched by [`default_font`], in order.
pub fn default_font_candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(p) = std::env::var_os(FONT_ENV_VAR) {
        out.push(PathBuf::from(p));
    }

    #[cfg(target_os = "windows")]
    {
        let root = std::env::var_os("WINDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("C:\\Windows"));
        for name in ["arial.ttf", "segoeui.ttf", "tahoma.ttf"] {
            out.push(root.join("Fonts").join(name));
        }
    }

    #[cfg(target_os = "macos")]
    {
        for p in [
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
            "/System/Library/Fonts/Geneva.ttf",
        ] {
            out.push(PathBuf::from(p));
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        for p in [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
            "/usr/share/fonts/truetype/ttf-bitstream-vera/Vera.ttf",
        ] {
            out.push(PathBuf::from(p));
        }
    }

    out
}
