use crate::error::PeakViewError;
use peakview_protocol::DatasetId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fs;

/// Metadata of one experimental sample.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    #[serde(default)]
    pub id: DatasetId,
    #[serde(rename = "cellLine")]
    pub cell_line: String,
    pub tp53: String,
    pub treatment: String,
}

impl DatasetInfo {
    pub fn title(&self) -> String {
        format!(
            "{}: {}, {}, {}",
            self.id, self.cell_line, self.tp53, self.treatment
        )
    }
}

/// Orders `D2` before `D10`.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let split = |s: &str| {
        let idx = s
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        let (prefix, digits) = s.split_at(idx);
        (prefix.to_string(), digits.parse::<u64>().ok())
    };
    let (pa, na) = split(a);
    let (pb, nb) = split(b);
    pa.cmp(&pb).then(na.cmp(&nb)).then(a.cmp(b))
}

#[derive(Clone, Debug, Default)]
pub struct DatasetCatalog {
    datasets: Vec<DatasetInfo>,
}

impl DatasetCatalog {
    pub fn from_json_str(data: &str) -> Result<Self, PeakViewError> {
        let entries: HashMap<DatasetId, DatasetInfo> = serde_json::from_str(data)?;
        let mut datasets = entries
            .into_iter()
            .map(|(id, mut info)| {
                info.id = id;
                info
            })
            .collect::<Vec<_>>();
        datasets.sort_by(|a, b| natural_cmp(&a.id, &b.id));
        Ok(Self { datasets })
    }

    pub fn from_json_file(path: &str) -> Result<Self, PeakViewError> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Could not read dataset catalog '{path}': {e}"))?;
        Self::from_json_str(&text).map_err(|e| {
            PeakViewError::String(format!("Could not parse dataset catalog '{path}': {e}"))
        })
    }

    pub fn get(&self, id: &str) -> Option<&DatasetInfo> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetInfo> {
        self.datasets.iter()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Chart titles for `datasets`; unknown ids fall back to the bare id.
    pub fn titles(&self, datasets: &[DatasetId]) -> BTreeMap<DatasetId, String> {
        datasets
            .iter()
            .map(|id| {
                let title = self.get(id).map(DatasetInfo::title).unwrap_or_else(|| id.clone());
                (id.clone(), title)
            })
            .collect()
    }
}

/// External reference of one gene: Ensembl gene id, chromosome, start, end
/// and transcript id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>")]
pub struct GeneReference {
    pub ensembl_id: String,
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub transcript_id: String,
}

impl TryFrom<Vec<Value>> for GeneReference {
    type Error = String;

    fn try_from(parts: Vec<Value>) -> Result<Self, Self::Error> {
        if parts.len() != 5 {
            return Err(format!(
                "gene reference needs 5 entries, found {}",
                parts.len()
            ));
        }
        let text = |v: &Value| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let coord = |v: &Value| -> Result<u64, String> {
            match v {
                Value::Number(n) => n.as_u64().ok_or_else(|| format!("bad coordinate {n}")),
                Value::String(s) => s
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| format!("bad coordinate '{s}': {e}")),
                other => Err(format!("bad coordinate {other}")),
            }
        };
        Ok(Self {
            ensembl_id: text(&parts[0]),
            chromosome: text(&parts[1]),
            start: coord(&parts[2])?,
            end: coord(&parts[3])?,
            transcript_id: text(&parts[4]),
        })
    }
}

impl GeneReference {
    /// Fills `{id}`, `{chr}`, `{start}`, `{end}` and `{transcript}` in `template`.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{id}", &self.ensembl_id)
            .replace("{chr}", &self.chromosome)
            .replace("{start}", &self.start.to_string())
            .replace("{end}", &self.end.to_string())
            .replace("{transcript}", &self.transcript_id)
    }
}

#[derive(Clone, Debug, Default)]
pub struct GeneReferenceTable {
    entries: HashMap<String, GeneReference>,
}

impl GeneReferenceTable {
    pub fn from_json_str(data: &str) -> Result<Self, PeakViewError> {
        let entries: HashMap<String, GeneReference> = serde_json::from_str(data)?;
        Ok(Self { entries })
    }

    pub fn from_json_file(path: &str) -> Result<Self, PeakViewError> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Could not read gene reference table '{path}': {e}"))?;
        Self::from_json_str(&text).map_err(|e| {
            PeakViewError::String(format!(
                "Could not parse gene reference table '{path}': {e}"
            ))
        })
    }

    pub fn get(&self, gene_name: &str) -> Option<&GeneReference> {
        self.entries.get(gene_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn default_datasets() -> DatasetCatalog {
    DatasetCatalog::from_json_str(include_str!("../assets/datasets.json"))
        .unwrap_or_default()
}

pub fn default_gene_references() -> GeneReferenceTable {
    GeneReferenceTable::from_json_str(include_str!("../assets/gene_ref.json"))
        .unwrap_or_default()
}
