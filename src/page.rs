use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlotTab {
    #[default]
    Info,
    Peak,
    Track,
}

impl PlotTab {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().trim_start_matches("plot-") {
            "info" => Some(Self::Info),
            "peak" => Some(Self::Peak),
            "track" => Some(Self::Track),
            _ => None,
        }
    }
}

/// Page sections the view can scroll to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Home,
    Browse,
    Search,
    Results,
    Plot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    SearchRows,
    TableHead,
    TableBody,
    TableFoot,
    PlotInfo,
    PeakCharts,
    TrackCharts,
}

/// Rendering targets of the browser page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub search_rows: String,
    pub table_head: String,
    pub table_body: String,
    pub table_foot: String,
    pub plot_info: String,
    pub peak_charts: Vec<String>,
    pub track_charts: Vec<String>,
    pub submit_loading: bool,
    pub result_visible: bool,
    pub plot_visible: bool,
    pub active_tab: PlotTab,
    pub track_tab_enabled: bool,
    pub scroll_target: Option<Section>,
    repaints: BTreeMap<Region, u64>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    fn count(&mut self, region: Region) {
        *self.repaints.entry(region).or_default() += 1;
    }

    pub fn paint(&mut self, region: Region, markup: String) {
        match region {
            Region::SearchRows => self.search_rows = markup,
            Region::TableHead => self.table_head = markup,
            Region::TableBody => self.table_body = markup,
            Region::TableFoot => self.table_foot = markup,
            Region::PlotInfo => self.plot_info = markup,
            Region::PeakCharts => self.peak_charts = vec![markup],
            Region::TrackCharts => self.track_charts = vec![markup],
        }
        self.count(region);
    }

    pub fn paint_charts(&mut self, region: Region, charts: Vec<String>) {
        match region {
            Region::PeakCharts => self.peak_charts = charts,
            Region::TrackCharts => self.track_charts = charts,
            other => {
                self.paint(other, charts.concat());
                return;
            }
        }
        self.count(region);
    }

    /// How many times `region` was repainted.
    pub fn repaints(&self, region: Region) -> u64 {
        self.repaints.get(&region).copied().unwrap_or(0)
    }

    pub fn scroll_to(&mut self, section: Section) {
        self.scroll_target = Some(section);
    }

    /// Switches the plot panel to `tab`. Disabled tabs stay unselected.
    pub fn select_tab(&mut self, tab: PlotTab) -> bool {
        if tab == PlotTab::Track && !self.track_tab_enabled {
            return false;
        }
        self.active_tab = tab;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_counts_regions() {
        let mut page = Page::new();
        page.paint(Region::TableBody, "<tr></tr>".to_string());
        page.paint(Region::TableBody, "<tr></tr><tr></tr>".to_string());
        page.paint_charts(Region::PeakCharts, vec!["<svg/>".to_string(); 3]);
        assert_eq!(page.repaints(Region::TableBody), 2);
        assert_eq!(page.repaints(Region::TableFoot), 0);
        assert_eq!(page.peak_charts.len(), 3);
        assert_eq!(page.repaints(Region::PeakCharts), 1);
    }

    #[test]
    fn test_disabled_track_tab_is_ignored() {
        let mut page = Page::new();
        assert!(!page.select_tab(PlotTab::Track));
        assert_eq!(page.active_tab, PlotTab::Info);
        assert!(page.select_tab(PlotTab::Peak));
        page.track_tab_enabled = true;
        assert!(page.select_tab(PlotTab::Track));
        assert_eq!(PlotTab::parse("plot-track"), Some(PlotTab::Track));
    }
}
