use crate::error::PeakViewError;
use peakview_render::{ChartStyle, Margin, PlotOptions};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

pub const DEFAULT_CONFIG_PATH: &str = "peakview.json";
pub const DEFAULT_REFERENCE_URL: &str = "http://asia.ensembl.org/Homo_sapiens/Gene/Summary?db=core;g={id};r={chr}:{start}-{end};t={transcript}";

/// Startup settings. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    /// Seconds before a remote call is abandoned.
    pub request_timeout_secs: u64,
    /// Width of the column hosting the charts.
    pub container_width: f64,
    /// Root font size of the page.
    pub font_size: f64,
    pub plot_height: f64,
    pub margin: Margin,
    pub style: ChartStyle,
    pub items_per_page: usize,
    /// Window size (bp) plotted around a gene picked from a global search.
    pub global_browsing_range: u64,
    /// Gene names whose reference link is fixed instead of built from the
    /// gene-reference table.
    pub redirects: BTreeMap<String, String>,
    pub reference_url: String,
    /// Dataset ids matching this pattern are wildtype, all others mutant.
    pub wildtype_pattern: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let redirects = [
            (
                "FAM95C",
                "http://asia.ensembl.org/Homo_sapiens/Gene/Summary?db=core;g=ENSG00000283486;r=9:38540569-38577207",
            ),
            (
                "OR8S1",
                "http://asia.ensembl.org/Homo_sapiens/Gene/Summary?db=core;g=ENSG00000284723;r=12:48525632-48528103",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            server_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 30,
            container_width: 1064.0,
            font_size: 16.0,
            plot_height: 500.0,
            margin: Margin::default(),
            style: ChartStyle::default(),
            items_per_page: 10,
            global_browsing_range: 20_000,
            redirects,
            reference_url: DEFAULT_REFERENCE_URL.to_string(),
            wildtype_pattern: "^D[1-9]$".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json_str(text: &str) -> Result<Self, PeakViewError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &str) -> Result<Self, PeakViewError> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Could not read config '{path}': {e}"))?;
        Self::from_json_str(&text)
            .map_err(|e| PeakViewError::String(format!("Could not load config '{path}': {e}")))
    }

    /// Reads `path` when it exists, the defaults otherwise.
    pub fn load_or_default(path: &str) -> Result<Self, PeakViewError> {
        if std::path::Path::new(path).exists() {
            Self::from_json_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), PeakViewError> {
        if self.items_per_page == 0 {
            return Err("items_per_page must be at least 1".to_string().into());
        }
        let opts = self.plot_options();
        if opts.plot_width() <= 0.0 || opts.plot_height() <= 0.0 {
            return Err(format!(
                "Plot area {}x{} leaves no room inside the margins",
                opts.width, opts.height
            )
            .into());
        }
        self.wildtype_regex()?;
        Ok(())
    }

    pub fn plot_options(&self) -> PlotOptions {
        PlotOptions::for_container(
            self.container_width,
            self.font_size,
            self.plot_height,
            self.margin,
        )
    }

    pub fn wildtype_regex(&self) -> Result<Regex, PeakViewError> {
        Ok(Regex::new(&self.wildtype_pattern)?)
    }
}
