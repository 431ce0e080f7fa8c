//! Wire contracts shared by the peakview controller, its transports and the
//! chart renderer.
//!
//! Two remote calls exist, `search` and `plot`. Both are single-shot
//! request/response exchanges whose replies are error-first envelopes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, error::Error, fmt};

pub type DatasetId = String;
pub type ExperimentId = String;

/// Dataset id → experiment name → one signal value per genomic position.
pub type TrackMap = BTreeMap<DatasetId, BTreeMap<ExperimentId, Vec<f64>>>;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowseMode {
    #[default]
    Global,
    Customized,
}

impl BrowseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Customized => "customized",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "global" => Some(Self::Global),
            "customized" | "custom" => Some(Self::Customized),
            _ => None,
        }
    }
}

/// Peak-calling pipeline a peak record was produced by.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Clc,
    Homer,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Clc, Collection::Homer];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clc => "clc",
            Self::Homer => "homer",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "clc" => Some(Self::Clc),
            "homer" => Some(Self::Homer),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection choice of a query. `All` keeps the peaks of both pipelines.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionScope {
    Clc,
    Homer,
    #[default]
    All,
}

impl CollectionScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clc => "clc",
            Self::Homer => "homer",
            Self::All => "all",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "clc" => Some(Self::Clc),
            "homer" => Some(Self::Homer),
            "all" | "both" => Some(Self::All),
            _ => None,
        }
    }

    pub fn includes(self, collection: Collection) -> bool {
        match self {
            Self::Clc => collection == Collection::Clc,
            Self::Homer => collection == Collection::Homer,
            Self::All => true,
        }
    }

    pub fn collections(self) -> Vec<Collection> {
        Collection::ALL
            .into_iter()
            .filter(|c| self.includes(*c))
            .collect()
    }
}

/// Set operation the server applies across the chosen datasets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Intersection,
    Union,
    /// Genes of the first dataset that are absent from the second one.
    Complement,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intersection => "intersection",
            Self::Union => "union",
            Self::Complement => "complement",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "intersection" => Some(Self::Intersection),
            "union" => Some(Self::Union),
            "complement" => Some(Self::Complement),
            _ => None,
        }
    }

    /// Complement is only defined for exactly two datasets.
    pub fn required_dataset_count(self) -> Option<usize> {
        match self {
            Self::Complement => Some(2),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub browse: BrowseMode,
    pub collection: CollectionScope,
    pub action: Action,
    pub datasets: Vec<DatasetId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotRequest {
    pub collection: CollectionScope,
    pub datasets: Vec<DatasetId>,
    pub target: String,
    pub range: u64,
}

/// JavaScript-style truthiness used by presence flags on the wire.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// One row of a search result. Every key besides the gene name is a
/// per-dataset presence flag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneRecord {
    pub gene_name: String,
    #[serde(default)]
    pub occurrence: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_range: Option<u64>,
    #[serde(flatten)]
    pub flags: BTreeMap<DatasetId, Value>,
}

impl GeneRecord {
    pub fn new(gene_name: &str) -> Self {
        Self {
            gene_name: gene_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_flag(mut self, dataset: &str, present: bool) -> Self {
        self.flags.insert(dataset.to_string(), Value::Bool(present));
        self
    }

    pub fn is_present_in(&self, dataset: &str) -> bool {
        self.flags.get(dataset).map(is_truthy).unwrap_or(false)
    }

    /// Recomputes `occurrence` over `datasets` and returns it.
    pub fn count_occurrence(&mut self, datasets: &[DatasetId]) -> usize {
        self.occurrence = datasets.iter().filter(|d| self.is_present_in(d)).count();
        self.occurrence
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakRecord {
    pub collection: Collection,
    pub dataset: DatasetId,
    #[serde(deserialize_with = "string_or_number")]
    pub chr_name: String,
    pub peak_start: u64,
    pub peak_end: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(
        default,
        rename = "localScore",
        skip_serializing_if = "Option::is_none"
    )]
    pub local_score: Option<f64>,
}

impl PeakRecord {
    /// Signal value: `score`, falling back to `localScore` when the score is
    /// absent or zero.
    pub fn value(&self) -> f64 {
        match self.score {
            Some(score) if score != 0.0 && !score.is_nan() => score,
            _ => self.local_score.unwrap_or(0.0),
        }
    }

    pub fn location(&self) -> String {
        format!(
            "chr{}:{} - {}",
            self.chr_name, self.peak_start, self.peak_end
        )
    }

    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.peak_start < end && self.peak_end > start
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneAnnotation {
    pub gene_name: String,
    pub transcript_start: u64,
    pub transcript_end: u64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub strand: String,
}

impl GeneAnnotation {
    pub fn strand_symbol(&self) -> char {
        if self.strand == "1" || self.strand == "+" {
            '+'
        } else {
            '-'
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotData {
    #[serde(default)]
    pub gene: Vec<GeneAnnotation>,
    #[serde(default)]
    pub peak: Vec<PeakRecord>,
    #[serde(default)]
    pub track: TrackMap,
}

/// Decoded plot reply for the genomic window `[start_position, start_position + range)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotResult {
    pub start_position: u64,
    pub range: u64,
    pub data: PlotData,
}

impl PlotResult {
    /// Window end, saturating at `u64::MAX`.
    pub fn end_position(&self) -> u64 {
        self.start_position.saturating_add(self.range)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The server answered with an error.
    Remote,
    /// The request never produced a reply.
    Transport,
    /// The reply could not be decoded.
    Decode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: ErrorCode,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Remote, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Decode, message)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for RemoteError {}

fn error_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Error-first envelope of a `search` reply.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchReply {
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub gene_list: Option<Vec<GeneRecord>>,
}

impl SearchReply {
    pub fn ok(gene_list: Vec<GeneRecord>) -> Self {
        Self {
            error: None,
            gene_list: Some(gene_list),
        }
    }

    pub fn into_result(self) -> Result<Vec<GeneRecord>, RemoteError> {
        if let Some(message) = error_text(self.error) {
            return Err(RemoteError::remote(message));
        }
        self.gene_list
            .ok_or_else(|| RemoteError::decode("search reply carries no gene_list"))
    }
}

/// Error-first envelope of a `plot` reply.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlotReply {
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub start_position: Option<u64>,
    #[serde(default)]
    pub range: Option<u64>,
    #[serde(default)]
    pub data: Option<PlotData>,
}

impl PlotReply {
    pub fn ok(result: PlotResult) -> Self {
        Self {
            error: None,
            start_position: Some(result.start_position),
            range: Some(result.range),
            data: Some(result.data),
        }
    }

    pub fn into_result(self) -> Result<PlotResult, RemoteError> {
        if let Some(message) = error_text(self.error) {
            return Err(RemoteError::remote(message));
        }
        match (self.start_position, self.range, self.data) {
            (Some(start_position), Some(range), Some(data)) => {
                if start_position.checked_add(range).is_none() {
                    return Err(RemoteError::decode(format!(
                        "plot window {start_position}+{range} exceeds the coordinate space"
                    )));
                }
                Ok(PlotResult {
                    start_position,
                    range,
                    data,
                })
            }
            _ => Err(RemoteError::decode(
                "plot reply needs start_position, range and data",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gene_record_flags() {
        let mut gene: GeneRecord = serde_json::from_value(json!({
            "gene_name": "TP53I3",
            "D1": 1,
            "D2": 0,
            "D3": true,
            "D4": null
        }))
        .unwrap();
        assert_eq!(gene.gene_name, "TP53I3");
        assert!(gene.is_present_in("D1"));
        assert!(!gene.is_present_in("D2"));
        assert!(gene.is_present_in("D3"));
        assert!(!gene.is_present_in("D4"));
        assert!(!gene.is_present_in("D5"));
        let datasets = vec!["D1".to_string(), "D2".to_string(), "D3".to_string()];
        assert_eq!(gene.count_occurrence(&datasets), 2);
        assert_eq!(gene.occurrence, 2);
    }

    #[test]
    fn test_peak_value_and_location() {
        let peak: PeakRecord = serde_json::from_value(json!({
            "collection": "homer",
            "dataset": "D2",
            "chr_name": 17,
            "peak_start": 7571720,
            "peak_end": 7590868,
            "localScore": 12.5
        }))
        .unwrap();
        assert_eq!(peak.collection, Collection::Homer);
        assert_eq!(peak.value(), 12.5);
        assert_eq!(peak.location(), "chr17:7571720 - 7590868");
        assert!(peak.overlaps(7590000, 7600000));
        assert!(!peak.overlaps(7590868, 7600000));
    }

    #[test]
    fn test_collection_scope() {
        assert_eq!(CollectionScope::Clc.collections(), vec![Collection::Clc]);
        assert_eq!(
            CollectionScope::All.collections(),
            vec![Collection::Clc, Collection::Homer]
        );
        assert_eq!(CollectionScope::parse("HOMER"), Some(CollectionScope::Homer));
        assert_eq!(BrowseMode::parse("customized"), Some(BrowseMode::Customized));
    }

    #[test]
    fn test_search_reply_error_first() {
        let reply: SearchReply =
            serde_json::from_value(json!({ "error": "database offline" })).unwrap();
        let err = reply.into_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::Remote);
        assert_eq!(err.message, "database offline");

        let reply: SearchReply = serde_json::from_value(json!({
            "error": null,
            "gene_list": [{ "gene_name": "MDM2", "D1": 1 }]
        }))
        .unwrap();
        let genes = reply.into_result().unwrap();
        assert_eq!(genes.len(), 1);
        assert!(genes[0].is_present_in("D1"));
    }

    #[test]
    fn test_plot_reply_requires_window() {
        let reply: PlotReply =
            serde_json::from_value(json!({ "error": null, "data": {} })).unwrap();
        assert_eq!(reply.into_result().unwrap_err().code, ErrorCode::Decode);

        let reply: PlotReply = serde_json::from_value(json!({
            "start_position": 1000,
            "range": 500,
            "data": {
                "gene": [{ "gene_name": "CDKN1A", "transcript_start": 900, "transcript_end": 1300, "strand": 1 }],
                "peak": [],
                "track": {}
            }
        }))
        .unwrap();
        let result = reply.into_result().unwrap();
        assert_eq!(result.end_position(), 1500);
        assert_eq!(result.data.gene[0].strand_symbol(), '+');
        assert!(result.data.track.is_empty());
    }

    #[test]
    fn test_plot_reply_rejects_overflowing_window() {
        let reply: PlotReply = serde_json::from_value(json!({
            "start_position": u64::MAX - 10,
            "range": 20000,
            "data": {}
        }))
        .unwrap();
        let err = reply.into_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::Decode);

        let result = PlotResult {
            start_position: u64::MAX - 10,
            range: 20000,
            data: PlotData::default(),
        };
        assert_eq!(result.end_position(), u64::MAX);
    }
}
