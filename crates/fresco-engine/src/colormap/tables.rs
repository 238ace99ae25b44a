use super::ColorMap;

/// Control points: (position in [0, 1], linear rgb).
type Stops = &'static [(f32, [f32; 3])];

const DEFAULT: Stops = &[
    (0.00, [0.00, 0.00, 0.00]),
    (0.35, [0.19, 0.05, 0.45]),
    (0.65, [0.80, 0.28, 0.30]),
    (1.00, [0.99, 0.95, 0.75]),
];

const SPECTRUM: Stops = &[
    (0.00, [0.50, 0.00, 1.00]),
    (0.20, [0.00, 0.00, 1.00]),
    (0.40, [0.00, 1.00, 1.00]),
    (0.60, [0.00, 1.00, 0.00]),
    (0.80, [1.00, 1.00, 0.00]),
    (1.00, [1.00, 0.00, 0.00]),
];

const COLORS: &[[f32; 3]] = &[
    [0.12, 0.47, 0.71],
    [1.00, 0.50, 0.05],
    [0.17, 0.63, 0.17],
    [0.84, 0.15, 0.16],
    [0.58, 0.40, 0.74],
    [0.55, 0.34, 0.29],
    [0.89, 0.47, 0.76],
    [0.50, 0.50, 0.50],
];

const RED: Stops = &[
    (0.00, [0.00, 0.00, 0.00]),
    (0.60, [0.85, 0.05, 0.05]),
    (1.00, [1.00, 0.85, 0.85]),
];

const MOOD: Stops = &[
    (0.00, [0.00, 0.35, 0.40]),
    (0.50, [0.45, 0.45, 0.70]),
    (1.00, [0.75, 0.20, 0.65]),
];

const HEAT: Stops = &[
    (0.00, [0.00, 0.00, 0.00]),
    (0.35, [0.80, 0.00, 0.00]),
    (0.65, [1.00, 0.55, 0.00]),
    (0.85, [1.00, 1.00, 0.00]),
    (1.00, [1.00, 1.00, 1.00]),
];

const BLUE: Stops = &[
    (0.00, [0.00, 0.00, 0.00]),
    (0.60, [0.05, 0.20, 0.90]),
    (1.00, [0.75, 0.90, 1.00]),
];

pub(super) fn length(cmap: ColorMap) -> usize {
    match cmap {
        ColorMap::Spectrum => 259,
        ColorMap::Colors => COLORS.len(),
        _ => 256,
    }
}

pub(super) fn build(cmap: ColorMap) -> Vec<[f32; 4]> {
    let len = length(cmap);
    match cmap {
        ColorMap::Colors => COLORS.iter().map(|&[r, g, b]| [r, g, b, 1.0]).collect(),
        ColorMap::Default => ramp(DEFAULT, len),
        ColorMap::Spectrum => ramp(SPECTRUM, len),
        ColorMap::Red => ramp(RED, len),
        ColorMap::Mood => ramp(MOOD, len),
        ColorMap::Heat => ramp(HEAT, len),
        ColorMap::Blue => ramp(BLUE, len),
    }
}

/// Samples a piecewise-linear gradient at `len` evenly spaced points.
fn ramp(stops: Stops, len: usize) -> Vec<[f32; 4]> {
    let denom = (len.max(2) - 1) as f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / denom;
            let [r, g, b] = eval(stops, t);
            [r, g, b, 1.0]
        })
        .collect()
}

fn eval(stops: Stops, t: f32) -> [f32; 3] {
    let (first_t, first) = stops[0];
    if t <= first_t {
        return first;
    }
    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let k = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            return [
                c0[0] + (c1[0] - c0[0]) * k,
                c0[1] + (c1[1] - c0[1]) * k,
                c0[2] + (c1[2] - c0[2]) * k,
            ];
        }
    }
    stops[stops.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_hits_end_stops_exactly() {
        let t = ramp(HEAT, 256);
        assert_eq!(t[0], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(t[255], [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn eval_interpolates_between_stops() {
        let mid = eval(RED, 0.3);
        assert!((mid[0] - 0.425).abs() < 1e-5);
        assert!((mid[2] - 0.025).abs() < 1e-6);
    }
}
