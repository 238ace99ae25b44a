//! Named colormap tables.
//!
//! A window owns one GPU-resident copy of the currently selected table (see
//! [`crate::window::Window::set_colormap`]). Tables are generated on first use
//! and cached for the process lifetime.

mod tables;

use state::InitCell;

use crate::coords::ColorRgba;

/// Bytes per table entry (`vec4<f32>` on the GPU).
pub const ENTRY_SIZE: u64 = std::mem::size_of::<[f32; 4]>() as u64;

/// Selects one of the built-in colormap tables.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ColorMap {
    #[default]
    Default,
    Spectrum,
    Colors,
    Red,
    Mood,
    Heat,
    Blue,
}

static CACHE: [InitCell<Vec<[f32; 4]>>; 7] = [
    InitCell::new(),
    InitCell::new(),
    InitCell::new(),
    InitCell::new(),
    InitCell::new(),
    InitCell::new(),
    InitCell::new(),
];

impl ColorMap {
    pub const ALL: [ColorMap; 7] = [
        ColorMap::Default,
        ColorMap::Spectrum,
        ColorMap::Colors,
        ColorMap::Red,
        ColorMap::Mood,
        ColorMap::Heat,
        ColorMap::Blue,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Number of entries in the table.
    pub fn len(self) -> usize {
        tables::length(self)
    }

    /// Table size in bytes as uploaded to the GPU.
    pub fn byte_size(self) -> u64 {
        self.len() as u64 * ENTRY_SIZE
    }

    /// Table entries as raw `[r, g, b, a]` arrays.
    pub fn entries(self) -> &'static [[f32; 4]] {
        CACHE[self.index()].get_or_init(|| tables::build(self))
    }

    /// Table contents ready for a buffer upload.
    pub fn as_bytes(self) -> &'static [u8] {
        bytemuck::cast_slice(self.entries())
    }

    /// Looks up the color for a normalized value in `[0, 1]`.
    ///
    /// Out-of-range and NaN values are clamped to the table ends.
    pub fn sample(self, value: f32) -> ColorRgba {
        let entries = self.entries();
        let last = entries.len() - 1;
        let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let idx = ((v * last as f32) + 0.5) as usize;
        let [r, g, b, a] = entries[idx.min(last)];
        ColorRgba::new(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lengths() {
        assert_eq!(ColorMap::Default.len(), 256);
        assert_eq!(ColorMap::Spectrum.len(), 259);
        assert_eq!(ColorMap::Colors.len(), 8);
        for cmap in ColorMap::ALL {
            assert_eq!(cmap.entries().len(), cmap.len(), "{cmap:?}");
        }
    }

    #[test]
    fn byte_size_matches_upload() {
        for cmap in ColorMap::ALL {
            assert_eq!(cmap.as_bytes().len() as u64, cmap.byte_size(), "{cmap:?}");
        }
        assert_eq!(ColorMap::Spectrum.byte_size(), 259 * 16);
    }

    #[test]
    fn entries_are_opaque_and_normalized() {
        for cmap in ColorMap::ALL {
            for e in cmap.entries() {
                assert!(e.iter().all(|c| (0.0..=1.0).contains(c)), "{cmap:?}: {e:?}");
                assert_eq!(e[3], 1.0);
            }
        }
    }

    #[test]
    fn sample_clamps_to_ends() {
        let heat = ColorMap::Heat;
        assert_eq!(heat.sample(-3.0).to_array(), heat.entries()[0]);
        assert_eq!(heat.sample(f32::NAN).to_array(), heat.entries()[0]);
        assert_eq!(heat.sample(7.0).to_array(), heat.entries()[255]);
    }

    #[test]
    fn default_runs_dark_to_light() {
        let e = ColorMap::Default.entries();
        let luma = |c: [f32; 4]| 0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2];
        assert!(luma(e[0]) < luma(e[255]));
    }
}
