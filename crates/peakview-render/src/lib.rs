//! Headless chart primitives and SVG export for peakview.

pub mod axis;
pub mod chart;
pub mod path;
pub mod scale;
pub mod svg_export;

pub use chart::{ChartScene, ChartStyle, Margin, PlotOptions, SceneInput};
pub use svg_export::{export_peak_chart_svg, export_track_chart_svg};
