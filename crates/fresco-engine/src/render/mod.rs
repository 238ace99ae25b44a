//! Drawable contract.
//!
//! A window hands each drawable the current frame plus a [`RenderCtx`]
//! describing where to draw and which window resources are available.
//!
//! Convention: viewports are physical pixels, top-left origin, +Y down.

mod ctx;
mod drawable;

pub use ctx::{RenderCtx, WindowResources};
pub use drawable::Drawable;
