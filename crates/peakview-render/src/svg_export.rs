use crate::{
    axis::{Axis, AxisOrient, TICK_PADDING, TICK_SIZE},
    chart::{ChartScene, PeakChart, TrackChart},
    path::{line_path, vertical_rule},
    scale::LinearScale,
};
use peakview_protocol::Collection;
use svg::node::element::{Group, Line, Path, Rectangle, Text};
use svg::Document;

const AXIS_COLOR: &str = "#000";
const AXIS_FONT_SIZE: f64 = 10.0;

fn translate(x: f64, y: f64) -> String {
    format!("translate({x},{y})")
}

fn frame(scene: &ChartScene, title: &str) -> (Document, Group) {
    let opts = &scene.options;
    let doc = Document::new()
        .set("viewBox", (0, 0, opts.width, opts.height))
        .set("width", opts.width)
        .set("height", opts.height);
    let plot = Group::new()
        .set("transform", translate(opts.margin.left, opts.margin.top))
        .add(
            Text::new(title.to_string())
                .set("x", opts.plot_width() / 2.0)
                .set("dy", -opts.margin.top / 2.0)
                .set("text-anchor", "middle")
                .set("font-size", opts.font_size * 1.3)
                .set("font-style", "italic")
                .set("text-decoration", "underline"),
        );
    (doc, plot)
}

fn axis_group(axis: &Axis) -> Group {
    let (r0, r1) = axis.extent;
    let mut group = Group::new()
        .set("fill", "none")
        .set("font-size", AXIS_FONT_SIZE)
        .set("font-family", "sans-serif");
    group = match axis.orient {
        AxisOrient::Bottom => group
            .set("text-anchor", "middle")
            .add(axis_line(r0, 0.0, r1, 0.0)),
        AxisOrient::Left => group
            .set("text-anchor", "end")
            .add(axis_line(0.0, r0, 0.0, r1)),
    };
    for tick in &axis.ticks {
        let (mark, label) = match axis.orient {
            AxisOrient::Bottom => (
                axis_line(tick.offset, 0.0, tick.offset, TICK_SIZE),
                Text::new(tick.label.clone())
                    .set("x", tick.offset)
                    .set("y", TICK_SIZE + TICK_PADDING)
                    .set("dy", "0.71em"),
            ),
            AxisOrient::Left => (
                axis_line(0.0, tick.offset, -TICK_SIZE, tick.offset),
                Text::new(tick.label.clone())
                    .set("x", -(TICK_SIZE + TICK_PADDING))
                    .set("y", tick.offset)
                    .set("dy", "0.32em"),
            ),
        };
        group = group.add(mark).add(label.set("fill", AXIS_COLOR));
    }
    if let Some(title) = &axis.title {
        group = group.add(
            Text::new(title.clone())
                .set("transform", "rotate(-90)")
                .set("y", 6)
                .set("dy", "0.71em")
                .set("fill", AXIS_COLOR),
        );
    }
    group
}

fn axis_line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
    Line::new()
        .set("x1", x1)
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", y2)
        .set("stroke", AXIS_COLOR)
}

fn add_axes(plot: Group, scene: &ChartScene, y_scale: &LinearScale) -> Group {
    plot.add(
        axis_group(&scene.x_axis()).set("transform", translate(0.0, scene.options.plot_height())),
    )
    .add(axis_group(&ChartScene::y_axis(y_scale)))
}

/// Gene bars and promoter boundaries drawn on top of every chart.
fn add_overlay(mut doc: Document, scene: &ChartScene) -> Document {
    let opts = &scene.options;
    for bar in &scene.gene_bars {
        doc = doc.add(
            Group::new()
                .set("transform", translate(bar.x, bar.y))
                .add(
                    Rectangle::new()
                        .set("width", bar.width)
                        .set("height", bar.height)
                        .set("fill", scene.style.gene_bar_color.as_str()),
                )
                .add(
                    Text::new(bar.label.clone())
                        .set("y", opts.margin.bottom / 5.0)
                        .set("dy", opts.margin.bottom / 10.0)
                        .set("fill", scene.style.gene_label_color.as_str())
                        .set("font-style", "italic"),
                ),
        );
    }
    for marker in &scene.promoters {
        doc = doc.add(
            Group::new()
                .set("transform", translate(marker.x, marker.y0))
                .add(
                    Path::new()
                        .set("fill", "none")
                        .set("stroke", scene.style.promoter_color.as_str())
                        .set("stroke-width", 1.5)
                        .set("stroke-dasharray", 2)
                        .set("d", vertical_rule(marker.y1 - marker.y0)),
                ),
        );
    }
    doc
}

pub fn export_peak_chart_svg(scene: &ChartScene, chart: &PeakChart) -> String {
    let (doc, plot) = frame(scene, &chart.title);
    let mut plot = add_axes(plot, scene, &chart.y_scale);
    for collection in Collection::ALL {
        let Some(d) = line_path(&chart.outline(collection)) else {
            continue;
        };
        let color = scene.style.collection_color(collection);
        plot = plot.add(
            Path::new()
                .set("class", format!("peak {collection}"))
                .set("fill", color)
                .set("stroke", color)
                .set("stroke-linejoin", "round")
                .set("stroke-linecap", "round")
                .set("stroke-width", 1.5)
                .set("d", d),
        );
    }
    add_overlay(doc.add(plot), scene).to_string()
}

pub fn export_track_chart_svg(scene: &ChartScene, chart: &TrackChart) -> String {
    let (doc, plot) = frame(scene, &chart.title);
    let mut plot = add_axes(plot, scene, &chart.y_scale);
    for series in &chart.series {
        let Some(d) = line_path(&series.points) else {
            continue;
        };
        plot = plot.add(
            Group::new().set("class", "experiment").add(
                Path::new()
                    .set("data-experiment", series.experiment.as_str())
                    .set("fill", "none")
                    .set("stroke", series.color.as_str())
                    .set("stroke-linejoin", "round")
                    .set("stroke-linecap", "round")
                    .set("stroke-width", 1.5)
                    .set("d", d),
            ),
        );
    }
    add_overlay(doc.add(plot), scene).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartStyle, Margin, PlotOptions, SceneInput};
    use peakview_protocol::{
        BrowseMode, CollectionScope, GeneAnnotation, PeakRecord, PlotData, PlotResult,
    };
    use std::collections::BTreeMap;

    fn scene(browse: BrowseMode) -> ChartScene {
        let mut track = peakview_protocol::TrackMap::new();
        track
            .entry("D3".to_string())
            .or_default()
            .insert("p53".to_string(), vec![2.0, 8.0, 30.0, 4.0]);
        let result = PlotResult {
            start_position: 20_000,
            range: 40_000,
            data: PlotData {
                gene: vec![GeneAnnotation {
                    gene_name: "MDM2".to_string(),
                    transcript_start: 25_000,
                    transcript_end: 55_000,
                    strand: "1".to_string(),
                }],
                peak: vec![PeakRecord {
                    collection: Collection::Homer,
                    dataset: "D3".to_string(),
                    chr_name: "12".to_string(),
                    peak_start: 30_000,
                    peak_end: 31_000,
                    score: None,
                    local_score: Some(17.0),
                }],
                track,
            },
        };
        let datasets = vec!["D3".to_string()];
        let mut titles = BTreeMap::new();
        titles.insert("D3".to_string(), "D3: MCF7, WT, Nutlin".to_string());
        let input = SceneInput {
            result: &result,
            datasets: &datasets,
            scope: CollectionScope::All,
            browse,
            titles: &titles,
        };
        let opts = PlotOptions::for_container(1064.0, 16.0, 500.0, Margin::default());
        ChartScene::build(&input, opts, ChartStyle::default())
    }

    #[test]
    fn test_export_peak_chart_svg() {
        let scene = scene(BrowseMode::Global);
        let svg = export_peak_chart_svg(&scene, &scene.peak_charts[0]);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("D3: MCF7, WT, Nutlin"));
        assert!(svg.contains("peak homer"));
        assert!(svg.contains("rgb(219, 54, 41)"));
        assert!(svg.contains("MDM2 (+)"));
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("Value"));
    }

    #[test]
    fn test_export_track_chart_svg_without_promoters() {
        let scene = scene(BrowseMode::Customized);
        let svg = export_track_chart_svg(&scene, &scene.track_charts[0]);
        assert!(svg.contains("data-experiment=\"p53\""));
        assert!(svg.contains("steelblue"));
        assert!(!svg.contains("stroke-dasharray"));
    }
}
