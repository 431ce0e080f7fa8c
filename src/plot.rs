//! Chart rendering of one `plot` reply: the peak information panel, chart
//! geometry and SVG for every requested dataset.

use crate::{catalog::DatasetCatalog, config::AppConfig};
use peakview_protocol::{
    BrowseMode, Collection, CollectionScope, DatasetId, GeneAnnotation, PlotResult,
};
use peakview_render::{export_peak_chart_svg, export_track_chart_svg, ChartScene, SceneInput};
use serde::{Deserialize, Serialize};

pub const NO_PEAK: &str = "No Peak";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakEntry {
    pub location: String,
    pub value: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetPeaks {
    pub dataset: DatasetId,
    pub peak_amount: usize,
    pub first_peak: PeakEntry,
    pub other_peaks: Vec<PeakEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectionPeaks {
    pub collection: Collection,
    pub datasets: Vec<DatasetPeaks>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotInfo {
    pub target: String,
    pub start: u64,
    pub end: u64,
    pub gene_list: Vec<GeneAnnotation>,
    pub collections: Vec<CollectionPeaks>,
}

impl PlotInfo {
    /// Groups the reply's peaks by collection (restricted to `scope`) and
    /// then by requested dataset. Datasets without peaks get a single
    /// `No Peak` entry.
    pub fn build(
        target: &str,
        result: &PlotResult,
        datasets: &[DatasetId],
        scope: CollectionScope,
    ) -> Self {
        let collections = scope
            .collections()
            .into_iter()
            .map(|collection| CollectionPeaks {
                collection,
                datasets: datasets
                    .iter()
                    .map(|dataset| {
                        let mut entries = result
                            .data
                            .peak
                            .iter()
                            .filter(|p| p.collection == collection && &p.dataset == dataset)
                            .map(|p| PeakEntry {
                                location: p.location(),
                                value: Some(p.value()),
                            })
                            .collect::<Vec<_>>();
                        if entries.is_empty() {
                            entries.push(PeakEntry {
                                location: NO_PEAK.to_string(),
                                value: None,
                            });
                        }
                        let peak_amount = entries.len();
                        let first_peak = entries.remove(0);
                        DatasetPeaks {
                            dataset: dataset.clone(),
                            peak_amount,
                            first_peak,
                            other_peaks: entries,
                        }
                    })
                    .collect(),
            })
            .collect();
        Self {
            target: target.to_string(),
            start: result.start_position,
            end: result.end_position(),
            gene_list: result.data.gene.clone(),
            collections,
        }
    }
}

/// Everything the plot panel shows for one reply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotView {
    pub info: PlotInfo,
    pub scene: ChartScene,
    pub peak_svgs: Vec<String>,
    pub track_svgs: Vec<String>,
}

impl PlotView {
    pub fn has_tracks(&self) -> bool {
        self.scene.has_tracks()
    }
}

/// Query context a plot reply is rendered in.
pub struct PlotContext<'a> {
    pub target: &'a str,
    pub datasets: &'a [DatasetId],
    pub scope: CollectionScope,
    pub browse: BrowseMode,
}

pub fn render_plot(
    ctx: &PlotContext,
    result: &PlotResult,
    catalog: &DatasetCatalog,
    config: &AppConfig,
) -> PlotView {
    let titles = catalog.titles(ctx.datasets);
    let input = SceneInput {
        result,
        datasets: ctx.datasets,
        scope: ctx.scope,
        browse: ctx.browse,
        titles: &titles,
    };
    let scene = ChartScene::build(&input, config.plot_options(), config.style.clone());
    let peak_svgs = scene
        .peak_charts
        .iter()
        .map(|chart| export_peak_chart_svg(&scene, chart))
        .collect();
    let track_svgs = scene
        .track_charts
        .iter()
        .map(|chart| export_track_chart_svg(&scene, chart))
        .collect();
    PlotView {
        info: PlotInfo::build(ctx.target, result, ctx.datasets, ctx.scope),
        scene,
        peak_svgs,
        track_svgs,
    }
}
