//! Fresco engine crate.
//!
//! Windows that share GPU contexts, split themselves into grid cells, and
//! draw caller-supplied [`Drawable`]s into those cells with a per-window
//! colormap and font.
//!
//! ```no_run
//! use fresco_engine::{Platform, Window, WindowConfig};
//! use fresco_engine::backend::winit_wgpu::GpuInit;
//!
//! # fn main() -> fresco_engine::Result<()> {
//! let platform = Platform::with_gpu(GpuInit::default())?;
//! let main = Window::new(&platform, WindowConfig::new(800, 600, "main"), None)?;
//! let side = Window::new(&platform, WindowConfig::new(400, 300, "side"), Some(&main))?;
//! assert_eq!(main.context(), side.context());
//! main.grid(2, 2)?;
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod backend;
pub mod colormap;
pub mod coords;
pub mod error;
pub mod input;
pub mod logging;
pub mod render;
pub mod shader;
pub mod text;
pub mod window;

pub use colormap::ColorMap;
pub use coords::{ColorRgba, Rect};
pub use error::{Error, Result};
pub use render::{Drawable, RenderCtx, WindowResources};
pub use text::Font;
pub use window::{Platform, Window, WindowConfig, WindowId};
