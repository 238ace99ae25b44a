//! Pixel-space geometry and color types shared by the window layer and
//! drawables.
//!
//! Canonical space:
//! - Physical pixels
//! - Origin top-left
//! - +X right, +Y down

mod color;
mod rect;

pub use color::ColorRgba;
pub use rect::Rect;
