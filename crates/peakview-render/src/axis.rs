use crate::scale::{format_tick, LinearScale};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TICK_COUNT: usize = 10;
pub const TICK_SIZE: f64 = 6.0;
pub const TICK_PADDING: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisOrient {
    Bottom,
    Left,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisTick {
    pub value: f64,
    /// Pixel offset along the axis.
    pub offset: f64,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub orient: AxisOrient,
    pub extent: (f64, f64),
    pub ticks: Vec<AxisTick>,
    pub title: Option<String>,
}

impl Axis {
    pub fn new(orient: AxisOrient, scale: &LinearScale) -> Self {
        let step = scale.tick_step(DEFAULT_TICK_COUNT);
        let ticks = scale
            .ticks(DEFAULT_TICK_COUNT)
            .into_iter()
            .map(|value| AxisTick {
                value,
                offset: scale.map(value),
                label: format_tick(value, step),
            })
            .collect();
        Self {
            orient,
            extent: scale.range(),
            ticks,
            title: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

pub fn axis_bottom(scale: &LinearScale) -> Axis {
    Axis::new(AxisOrient::Bottom, scale)
}

pub fn axis_left(scale: &LinearScale) -> Axis {
    Axis::new(AxisOrient::Left, scale)
}
