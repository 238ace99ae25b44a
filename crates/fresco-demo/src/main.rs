use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fresco_engine::backend::winit_wgpu::{GpuFrame, GpuInit, ScalarField, WgpuBackend};
use fresco_engine::logging::{init_logging, LoggingConfig};
use fresco_engine::{ColorMap, Drawable, Platform, RenderCtx, Window, WindowConfig};

/// Field resolution for every panel.
const FIELD_SIZE: u32 = 64;

/// A scalar field mapped through the window's colormap.
struct Heatmap {
    field: ScalarField,
}

impl Heatmap {
    fn new(window: &Window) -> Result<Self> {
        let field = window.with_context(|gpu| {
            ScalarField::new(gpu, FIELD_SIZE, FIELD_SIZE, &wave(FIELD_SIZE, 0.0))
        })?;
        Ok(Self { field })
    }

    fn update(&self, window: &Window, phase: f32) -> Result<()> {
        window.with_context(|gpu| self.field.write(gpu, &wave(FIELD_SIZE, phase)))?;
        Ok(())
    }
}

impl Drawable<WgpuBackend> for Heatmap {
    fn render(&self, frame: &mut GpuFrame, ctx: &RenderCtx<'_, WgpuBackend>) {
        let program = ctx.resources.program;
        let colormap = program.bind_colormap(ctx.context, ctx.resources.colormap_buffer);
        let field = program.bind_field(ctx.context, &self.field);

        let mut pass = frame.viewport_pass("heatmap", ctx.viewport);
        program.draw(&mut pass, &colormap, &field);
    }
}

fn wave(size: u32, phase: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let fx = x as f32 / size as f32 * std::f32::consts::TAU;
            let fy = y as f32 / size as f32 * std::f32::consts::TAU;
            out.push(0.5 + 0.25 * (fx + phase).sin() + 0.25 * (fy * 0.5 - phase).cos());
        }
    }
    out
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let platform = Platform::with_gpu(GpuInit::default()).context("GPU initialization failed")?;

    let primary = Window::new(&platform, WindowConfig::new(960, 720, "fresco: panels"), None)
        .context("failed to open the main window")?;
    primary.grid(2, 2)?;
    primary.set_colormap(ColorMap::Heat)?;

    let side = Window::new(&platform, WindowConfig::new(480, 360, "fresco: overview"), Some(&primary))
        .context("failed to open the overview window")?;
    side.set_pos(1000, 80);
    side.set_colormap(ColorMap::Spectrum)?;
    log::info!(
        "main and overview share context {}:{}",
        primary.display(),
        primary.context()
    );

    let titles = ["north", "east", "south", "west"];
    let panels = titles
        .iter()
        .map(|_| Heatmap::new(&primary))
        .collect::<Result<Vec<_>>>()?;
    let overview = Heatmap::new(&side)?;
    let start = Instant::now();

    while !primary.close() && !side.close() {
        let t = start.elapsed().as_secs_f32();

        for (i, (panel, title)) in panels.iter().zip(titles).enumerate() {
            panel.update(&primary, t + i as f32 * 0.8)?;
            primary.draw_cell(i as u32 % 2, i as u32 / 2, panel, Some(title))?;
        }
        primary.present()?;

        overview.update(&side, t * 0.5)?;
        side.draw(&overview)?;

        std::thread::sleep(Duration::from_millis(16));
    }

    Ok(())
}
