use crate::{
    axis::{axis_bottom, axis_left, Axis},
    path::Point,
    scale::LinearScale,
};
use peakview_protocol::{
    BrowseMode, Collection, CollectionScope, DatasetId, GeneAnnotation, PeakRecord, PlotResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Smallest upper bound of every value axis.
pub const VALUE_FLOOR: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 50.0,
            right: 40.0,
            bottom: 50.0,
            left: 40.0,
        }
    }
}

/// Pixel geometry shared by every chart of one page.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotOptions {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub font_size: f64,
}

impl PlotOptions {
    /// The chart is narrower than its container by four font sizes.
    pub fn for_container(container_width: f64, font_size: f64, height: f64, margin: Margin) -> Self {
        Self {
            width: container_width - 4.0 * font_size,
            height,
            margin,
            font_size,
        }
    }

    pub fn plot_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn plot_height(&self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self::for_container(1000.0, 16.0, 500.0, Margin::default())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub clc_color: String,
    pub homer_color: String,
    pub gene_bar_color: String,
    pub gene_label_color: String,
    pub highlight_experiment: String,
    pub highlight_color: String,
    pub experiment_color: String,
    pub promoter_color: String,
    /// Width in bp of the promoter-proximal zone at each end of a global window.
    pub promoter_offset: u64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            clc_color: "rgb(57, 181, 173)".to_string(),
            homer_color: "rgb(219, 54, 41)".to_string(),
            gene_bar_color: "rgb(117, 117, 117)".to_string(),
            gene_label_color: "#fff".to_string(),
            highlight_experiment: "p53".to_string(),
            highlight_color: "steelblue".to_string(),
            experiment_color: "green".to_string(),
            promoter_color: "#000".to_string(),
            promoter_offset: 10_000,
        }
    }
}

impl ChartStyle {
    pub fn collection_color(&self, collection: Collection) -> &str {
        match collection {
            Collection::Clc => &self.clc_color,
            Collection::Homer => &self.homer_color,
        }
    }

    pub fn experiment_color(&self, experiment: &str) -> &str {
        if experiment == self.highlight_experiment {
            &self.highlight_color
        } else {
            &self.experiment_color
        }
    }
}

/// One peak clipped to the window. `start`, `end` and `value` are in data
/// space, `points` in plot-area pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakShape {
    pub collection: Collection,
    pub start: u64,
    pub end: u64,
    pub value: f64,
    pub points: [Point; 4],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakChart {
    pub dataset: DatasetId,
    pub title: String,
    pub y_scale: LinearScale,
    pub shapes: Vec<PeakShape>,
}

impl PeakChart {
    /// Outline through every trapezoid of `collection`, in input order.
    pub fn outline(&self, collection: Collection) -> Vec<Point> {
        self.shapes
            .iter()
            .filter(|s| s.collection == collection)
            .flat_map(|s| s.points)
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackSeries {
    pub experiment: String,
    pub color: String,
    pub points: Vec<Point>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackChart {
    pub dataset: DatasetId,
    pub title: String,
    pub y_scale: LinearScale,
    pub series: Vec<TrackSeries>,
}

/// Gene bar in absolute SVG coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneBar {
    pub gene_name: String,
    pub strand: char,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
}

/// Dashed vertical promoter boundary in absolute SVG coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromoterMarker {
    pub x: f64,
    pub y0: f64,
    pub y1: f64,
}

pub struct SceneInput<'a> {
    pub result: &'a PlotResult,
    pub datasets: &'a [DatasetId],
    pub scope: CollectionScope,
    pub browse: BrowseMode,
    /// Chart title per dataset; datasets without an entry use their id.
    pub titles: &'a BTreeMap<DatasetId, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartScene {
    pub options: PlotOptions,
    pub style: ChartStyle,
    pub start: u64,
    pub range: u64,
    pub x_scale: LinearScale,
    pub peak_charts: Vec<PeakChart>,
    /// Empty when the reply carried no track data at all.
    pub track_charts: Vec<TrackChart>,
    pub gene_bars: Vec<GeneBar>,
    pub promoters: Vec<PromoterMarker>,
}

impl ChartScene {
    pub fn build(input: &SceneInput, options: PlotOptions, style: ChartStyle) -> Self {
        let start = input.result.start_position;
        let range = input.result.range;
        let end = input.result.end_position();
        let x_scale = LinearScale::new((start as f64, end as f64), (0.0, options.plot_width()));
        let title_of = |dataset: &str| {
            input
                .titles
                .get(dataset)
                .cloned()
                .unwrap_or_else(|| dataset.to_string())
        };

        let peak_charts = input
            .datasets
            .iter()
            .map(|dataset| {
                let peaks = input
                    .result
                    .data
                    .peak
                    .iter()
                    .filter(|p| {
                        &p.dataset == dataset
                            && input.scope.includes(p.collection)
                            && p.overlaps(start, end)
                    })
                    .collect::<Vec<_>>();
                let observed = peaks.iter().map(|p| p.value()).reduce(f64::max);
                let y_scale =
                    LinearScale::value_axis(observed, VALUE_FLOOR, options.plot_height());
                let shapes = peaks
                    .into_iter()
                    .map(|peak| peak_shape(peak, start, end, &x_scale, &y_scale))
                    .collect();
                PeakChart {
                    dataset: dataset.clone(),
                    title: title_of(dataset),
                    y_scale,
                    shapes,
                }
            })
            .collect();

        let track_charts = if input.result.data.track.is_empty() {
            vec![]
        } else {
            input
                .datasets
                .iter()
                .map(|dataset| {
                    let experiments = input.result.data.track.get(dataset);
                    let observed = experiments.and_then(|map| {
                        map.values()
                            .flat_map(|values| values.iter().copied())
                            .filter(|v| v.is_finite())
                            .reduce(f64::max)
                    });
                    let y_scale =
                        LinearScale::value_axis(observed, VALUE_FLOOR, options.plot_height());
                    let series = experiments
                        .map(|map| {
                            map.iter()
                                .map(|(experiment, values)| TrackSeries {
                                    experiment: experiment.clone(),
                                    color: style.experiment_color(experiment).to_string(),
                                    points: values
                                        .iter()
                                        .enumerate()
                                        .map(|(i, v)| {
                                            Point::new(
                                                x_scale.map(start.saturating_add(i as u64) as f64),
                                                y_scale.map(*v),
                                            )
                                        })
                                        .collect(),
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    TrackChart {
                        dataset: dataset.clone(),
                        title: title_of(dataset),
                        y_scale,
                        series,
                    }
                })
                .collect()
        };

        let gene_bars = input
            .result
            .data
            .gene
            .iter()
            .map(|gene| gene_bar(gene, start, end, &x_scale, &options))
            .collect();

        let promoters = if input.browse == BrowseMode::Global {
            let half = style.promoter_offset as f64 / 2.0;
            let y0 = options.margin.top;
            let y1 = options.margin.top + options.plot_height() + options.margin.bottom;
            [start as f64 + half, end as f64 - half]
                .into_iter()
                .map(|pos| PromoterMarker {
                    x: options.margin.left + x_scale.map(pos),
                    y0,
                    y1,
                })
                .collect()
        } else {
            vec![]
        };

        Self {
            options,
            style,
            start,
            range,
            x_scale,
            peak_charts,
            track_charts,
            gene_bars,
            promoters,
        }
    }

    pub fn has_tracks(&self) -> bool {
        !self.track_charts.is_empty()
    }

    pub fn x_axis(&self) -> Axis {
        axis_bottom(&self.x_scale)
    }

    pub fn y_axis(y_scale: &LinearScale) -> Axis {
        axis_left(y_scale).with_title("Value")
    }
}

fn peak_shape(
    peak: &PeakRecord,
    start: u64,
    end: u64,
    x_scale: &LinearScale,
    y_scale: &LinearScale,
) -> PeakShape {
    let clipped_start = peak.peak_start.max(start);
    let clipped_end = peak.peak_end.min(end);
    let value = peak.value();
    let (x0, x1) = (
        x_scale.map(clipped_start as f64),
        x_scale.map(clipped_end as f64),
    );
    let (base, top) = (y_scale.map(0.0), y_scale.map(value));
    PeakShape {
        collection: peak.collection,
        start: clipped_start,
        end: clipped_end,
        value,
        points: [
            Point::new(x0, base),
            Point::new(x0, top),
            Point::new(x1, top),
            Point::new(x1, base),
        ],
    }
}

fn gene_bar(
    gene: &GeneAnnotation,
    start: u64,
    end: u64,
    x_scale: &LinearScale,
    options: &PlotOptions,
) -> GeneBar {
    let x0 = x_scale.map(gene.transcript_start.max(start) as f64);
    let x1 = x_scale.map(gene.transcript_end.min(end) as f64);
    let strand = gene.strand_symbol();
    GeneBar {
        gene_name: gene.gene_name.clone(),
        strand,
        x: options.margin.left + x0,
        y: options.height - options.margin.bottom / 2.0,
        width: (x1 - x0).max(0.0),
        height: options.margin.bottom * 2.0 / 5.0,
        label: format!("{} ({strand})", gene.gene_name),
    }
}
