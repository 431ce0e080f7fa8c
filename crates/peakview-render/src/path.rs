use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Polyline through `points` as SVG path data (`M x,y L x,y ...`).
/// Non-finite points are skipped; no points yields `None`.
pub fn line_path(points: &[Point]) -> Option<String> {
    let mut d = String::new();
    for p in points.iter().filter(|p| p.x.is_finite() && p.y.is_finite()) {
        let cmd = if d.is_empty() { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{},{}", p.x, p.y);
    }
    (!d.is_empty()).then_some(d)
}

/// Vertical segment of `length` pixels starting at the local origin.
pub fn vertical_rule(length: f64) -> String {
    format!("M0,0L0,{length}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_path() {
        let points = vec![
            Point::new(0.0, 10.0),
            Point::new(2.5, 4.0),
            Point::new(5.0, 0.0),
        ];
        assert_eq!(line_path(&points).unwrap(), "M0,10L2.5,4L5,0");
        assert_eq!(line_path(&[]), None);
    }

    #[test]
    fn test_line_path_skips_gaps() {
        let points = vec![Point::new(f64::NAN, 1.0), Point::new(1.0, 1.0)];
        assert_eq!(line_path(&points).unwrap(), "M1,1");
        assert_eq!(vertical_rule(450.0), "M0,0L0,450");
    }
}
