use serde::{Deserialize, Serialize};

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

/// Linear map from a data domain onto a pixel range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Vertical value scale with y = 0 at the bottom of a plot of `height`
    /// pixels. The domain never shrinks below `[0, floor]`.
    pub fn value_axis(observed_max: Option<f64>, floor: f64, height: f64) -> Self {
        let max = observed_max
            .filter(|v| v.is_finite())
            .map(|v| v.max(floor))
            .unwrap_or(floor);
        Self::new((0.0, max), (height, 0.0))
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        let t = if span == 0.0 || !span.is_finite() {
            0.5
        } else {
            (value - d0) / span
        };
        r0 + t * (r1 - r0)
    }

    /// Tick step for roughly `count` ticks, always 1, 2 or 5 times a power
    /// of ten.
    pub fn tick_step(&self, count: usize) -> f64 {
        let (lo, hi) = self.ordered_domain();
        let raw = (hi - lo) / count.max(1) as f64;
        if raw <= 0.0 || !raw.is_finite() {
            return 0.0;
        }
        let power = raw.log10().floor();
        let error = raw / 10f64.powi(power as i32);
        let factor = if error >= E10 {
            10.0
        } else if error >= E5 {
            5.0
        } else if error >= E2 {
            2.0
        } else {
            1.0
        };
        factor * 10f64.powi(power as i32)
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = self.ordered_domain();
        if lo == hi {
            return vec![lo];
        }
        let step = self.tick_step(count);
        if step <= 0.0 {
            return vec![];
        }
        let ticks = if step >= 1.0 {
            let i0 = (lo / step).ceil() as i64;
            let i1 = (hi / step).floor() as i64;
            (i0..=i1).map(|i| i as f64 * step).collect::<Vec<_>>()
        } else {
            let inverse = (1.0 / step).round();
            let i0 = (lo * inverse).ceil() as i64;
            let i1 = (hi * inverse).floor() as i64;
            (i0..=i1).map(|i| i as f64 / inverse).collect::<Vec<_>>()
        };
        if self.domain.0 > self.domain.1 {
            ticks.into_iter().rev().collect()
        } else {
            ticks
        }
    }

    fn ordered_domain(&self) -> (f64, f64) {
        let (d0, d1) = self.domain;
        if d0 <= d1 {
            (d0, d1)
        } else {
            (d1, d0)
        }
    }
}

/// Formats a tick value with thousands separators and as many decimals as
/// the tick step needs.
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10().floor()) as usize
    } else {
        0
    };
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let negative = value < 0.0 && text_is_nonzero(&grouped, frac_part.as_deref());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

fn text_is_nonzero(int_part: &str, frac_part: Option<&str>) -> bool {
    int_part.chars().chain(frac_part.unwrap_or("").chars()).any(|c| c.is_ascii_digit() && c != '0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_genomic_window() {
        let x = LinearScale::new((1000.0, 2000.0), (0.0, 500.0));
        assert_eq!(x.map(1000.0), 0.0);
        assert_eq!(x.map(1500.0), 250.0);
        assert_eq!(x.map(2000.0), 500.0);
    }

    #[test]
    fn test_value_axis_is_inverted_with_floor() {
        let y = LinearScale::value_axis(Some(3.0), 10.0, 400.0);
        assert_eq!(y.domain(), (0.0, 10.0));
        assert_eq!(y.map(0.0), 400.0);
        assert_eq!(y.map(10.0), 0.0);

        let y = LinearScale::value_axis(Some(40.0), 10.0, 400.0);
        assert_eq!(y.domain(), (0.0, 40.0));
        assert_eq!(y.map(20.0), 200.0);

        let y = LinearScale::value_axis(None, 10.0, 400.0);
        assert_eq!(y.domain(), (0.0, 10.0));
    }

    #[test]
    fn test_degenerate_domain_maps_to_midpoint() {
        let x = LinearScale::new((5.0, 5.0), (0.0, 100.0));
        assert_eq!(x.map(5.0), 50.0);
    }

    #[test]
    fn test_ticks() {
        let y = LinearScale::new((0.0, 10.0), (400.0, 0.0));
        assert_eq!(
            y.ticks(10),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]
        );
        let x = LinearScale::new((7_571_000.0, 7_591_000.0), (0.0, 800.0));
        let ticks = x.ticks(10);
        assert_eq!(x.tick_step(10), 2000.0);
        assert_eq!(ticks.first(), Some(&7_572_000.0));
        assert_eq!(ticks.last(), Some(&7_590_000.0));
        let small = LinearScale::new((0.0, 1.0), (0.0, 100.0));
        assert_eq!(small.ticks(5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(7_572_000.0, 2000.0), "7,572,000");
        assert_eq!(format_tick(0.4, 0.2), "0.4");
        assert_eq!(format_tick(15.0, 5.0), "15");
        assert_eq!(format_tick(-1500.0, 500.0), "-1,500");
        assert_eq!(format_tick(0.0, 1.0), "0");
    }
}
