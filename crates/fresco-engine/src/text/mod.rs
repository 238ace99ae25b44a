//! Fonts used for cell titles and drawable labels.
//!
//! Glyph rasterization itself is delegated to `fontdue`; this module only
//! loads fonts, shares them, and lays out single-line labels.

mod font;

pub use font::{default_font, default_font_candidates, Font, LineBitmap, FONT_ENV_VAR};
