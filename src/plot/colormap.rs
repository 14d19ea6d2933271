//! Piecewise-linear RGB colormaps.

/// A colormap defined by sorted `(position, color)` stops on `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Colormap {
    stops: Vec<(f64, [u8; 3])>,
}

impl Colormap {
    /// Creates a colormap from stops. Stops are sorted by position.
    pub fn new(mut stops: Vec<(f64, [u8; 3])>) -> Self {
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { stops }
    }

    /// White through blue and green to yellow, in the spirit of the
    /// SciVisColor "3Wbgy5" map used for cell-width plots.
    pub fn white_blue_green_yellow() -> Self {
        Self::new(vec![
            (0.0, [255, 255, 255]),
            (0.2, [166, 206, 227]),
            (0.4, [31, 120, 180]),
            (0.6, [51, 160, 44]),
            (0.8, [178, 223, 138]),
            (1.0, [255, 237, 111]),
        ])
    }

    /// Color at `t`, clamped to `[0, 1]`.
    pub fn sample(&self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let Some(&(first_pos, first)) = self.stops.first() else {
            return [0, 0, 0];
        };
        if t <= first_pos {
            return first;
        }

        for pair in self.stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if t <= p1 {
                let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 1.0 };
                return lerp_rgb(c0, c1, f);
            }
        }

        self.stops[self.stops.len() - 1].1
    }
}

/// Linear blend between two colors, `f = 0` giving `a`.
pub fn lerp_rgb(a: [u8; 3], b: [u8; 3], f: f64) -> [u8; 3] {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round().clamp(0.0, 255.0) as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_clamping() {
        let cmap = Colormap::white_blue_green_yellow();
        assert_eq!(cmap.sample(0.0), [255, 255, 255]);
        assert_eq!(cmap.sample(1.0), [255, 237, 111]);
        assert_eq!(cmap.sample(-3.0), [255, 255, 255]);
        assert_eq!(cmap.sample(7.0), [255, 237, 111]);
    }

    #[test]
    fn interpolates_between_stops() {
        let cmap = Colormap::new(vec![(1.0, [200, 0, 0]), (0.0, [0, 0, 100])]);
        assert_eq!(cmap.sample(0.5), [100, 0, 50]);
    }
}
