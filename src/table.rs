//! Result table state: the gene list of the latest successful search, its
//! sort order and the pagination cursor.

use crate::{
    catalog::GeneReferenceTable,
    config::AppConfig,
    form::CustomWindow,
};
use peakview_protocol::{BrowseMode, CollectionScope, DatasetId, GeneRecord, SearchRequest};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceMarker {
    Present,
    Absent,
    /// Presence not known yet; shown for the synthetic row of a
    /// customized search.
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyRow {
    pub gene_name: String,
    pub occurrence: usize,
    pub custom_range: Option<u64>,
    pub markers: Vec<PresenceMarker>,
    pub reference: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadModel {
    pub datasets: Vec<DatasetId>,
    pub wildtype: usize,
    pub mutant: usize,
    pub sortable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FooterModel {
    pub colspan: usize,
    pub current_page: usize,
    /// Directly reachable middle pages, always inside `(1, last_page)`.
    pub pages: Vec<usize>,
    /// `None` when there is only one page.
    pub last_page: Option<usize>,
    pub pre_escape: bool,
    pub post_escape: bool,
    /// False when page links, previous and next do nothing.
    pub interactive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableMode {
    Paged,
    /// Single synthetic row of a customized-range search.
    Custom,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub browse: BrowseMode,
    pub collection: CollectionScope,
    pub datasets: Vec<DatasetId>,
    pub gene_list: Vec<GeneRecord>,
    pub curr_page: usize,
    pub items_per_page: usize,
    pub last_page: usize,
    /// Renders an empty body regardless of the gene list.
    pub suppress_rows: bool,
    pub mode: TableMode,
    pub custom: Option<CustomWindow>,
}

impl TableState {
    pub fn last_page_for(gene_count: usize, items_per_page: usize) -> usize {
        gene_count / items_per_page.max(1) + 1
    }

    pub fn visible_range(&self) -> Range<usize> {
        if self.suppress_rows {
            return 0..0;
        }
        let len = self.gene_list.len();
        let from = (self.items_per_page * (self.curr_page - 1)).min(len);
        let to = (self.items_per_page * self.curr_page).min(len);
        from..to
    }

    pub fn visible_genes(&self) -> &[GeneRecord] {
        &self.gene_list[self.visible_range()]
    }
}

/// Builds outbound reference links for gene names.
pub struct ReferenceLinks<'a> {
    pub config: &'a AppConfig,
    pub genes: &'a GeneReferenceTable,
}

impl ReferenceLinks<'_> {
    pub fn resolve(&self, gene_name: &str) -> Option<String> {
        if let Some(url) = self.config.redirects.get(gene_name) {
            return Some(url.clone());
        }
        self.genes
            .get(gene_name)
            .map(|r| r.url(&self.config.reference_url))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ResultTable {
    #[default]
    Empty,
    Populated(TableState),
}

impl ResultTable {
    pub fn new() -> Self {
        Self::Empty
    }

    pub fn state(&self) -> Option<&TableState> {
        match self {
            Self::Empty => None,
            Self::Populated(state) => Some(state),
        }
    }

    fn paged_mut(&mut self) -> Option<&mut TableState> {
        match self {
            Self::Populated(state) if state.mode == TableMode::Paged => Some(state),
            _ => None,
        }
    }

    pub fn is_populated(&self) -> bool {
        self.state().is_some()
    }

    /// Replaces the whole table with a search payload and rewinds to page 1.
    pub fn populate(
        &mut self,
        request: &SearchRequest,
        mut gene_list: Vec<GeneRecord>,
        items_per_page: usize,
        global_browsing_range: u64,
    ) {
        for gene in gene_list.iter_mut() {
            gene.custom_range = Some(global_browsing_range);
            gene.count_occurrence(&request.datasets);
        }
        let last_page = TableState::last_page_for(gene_list.len(), items_per_page);
        *self = Self::Populated(TableState {
            browse: request.browse,
            collection: request.collection,
            datasets: request.datasets.clone(),
            gene_list,
            curr_page: 1,
            items_per_page,
            last_page,
            suppress_rows: false,
            mode: TableMode::Paged,
            custom: None,
        });
    }

    /// Table of a customized-range search: one synthetic row, one page.
    pub fn populate_custom(
        &mut self,
        request: &SearchRequest,
        gene_list: Vec<GeneRecord>,
        items_per_page: usize,
        window: CustomWindow,
    ) {
        *self = Self::Populated(TableState {
            browse: request.browse,
            collection: request.collection,
            datasets: request.datasets.clone(),
            gene_list,
            curr_page: 1,
            items_per_page,
            last_page: 1,
            suppress_rows: false,
            mode: TableMode::Custom,
            custom: Some(window),
        });
    }

    pub fn set_rows_suppressed(&mut self, suppressed: bool) {
        if let Self::Populated(state) = self {
            state.suppress_rows = suppressed;
        }
    }

    pub fn body_rows(&self, links: &ReferenceLinks) -> Vec<BodyRow> {
        let Some(state) = self.state() else {
            return vec![];
        };
        if state.suppress_rows {
            return vec![];
        }
        if let (TableMode::Custom, Some(window)) = (state.mode, &state.custom) {
            return vec![BodyRow {
                gene_name: window.target.clone(),
                occurrence: state.datasets.len(),
                custom_range: Some(window.range),
                markers: vec![PresenceMarker::Unknown; state.datasets.len()],
                reference: None,
            }];
        }
        state
            .visible_genes()
            .iter()
            .map(|gene| BodyRow {
                gene_name: gene.gene_name.clone(),
                occurrence: gene.occurrence,
                custom_range: gene.custom_range,
                markers: state
                    .datasets
                    .iter()
                    .map(|d| {
                        if gene.is_present_in(d) {
                            PresenceMarker::Present
                        } else {
                            PresenceMarker::Absent
                        }
                    })
                    .collect(),
                reference: links.resolve(&gene.gene_name),
            })
            .collect()
    }

    pub fn head(&self, wildtype: &Regex) -> HeadModel {
        let Some(state) = self.state() else {
            return HeadModel {
                datasets: vec![],
                wildtype: 0,
                mutant: 0,
                sortable: false,
            };
        };
        let wildtype_count = state.datasets.iter().filter(|d| wildtype.is_match(d)).count();
        HeadModel {
            datasets: state.datasets.clone(),
            wildtype: wildtype_count,
            mutant: state.datasets.len() - wildtype_count,
            sortable: state.mode == TableMode::Paged,
        }
    }

    pub fn footer(&self) -> Option<FooterModel> {
        let state = self.state()?;
        let curr = state.curr_page;
        let last = state.last_page;
        let pages = [curr.saturating_sub(1), curr, curr + 1]
            .into_iter()
            .filter(|p| 1 < *p && *p < last)
            .collect::<Vec<_>>();
        let (pre_escape, post_escape) = match (pages.first(), pages.last()) {
            (Some(first), Some(last_shown)) => (*first > 2, last - 1 > *last_shown),
            _ => (false, false),
        };
        Some(FooterModel {
            colspan: 3 + state.datasets.len(),
            current_page: curr,
            pages,
            last_page: (last != 1).then_some(last),
            pre_escape,
            post_escape,
            interactive: state.mode == TableMode::Paged,
        })
    }

    /// Jumps to `page`. Returns whether the cursor moved.
    pub fn goto_page(&mut self, page: usize) -> bool {
        let Some(state) = self.paged_mut() else {
            return false;
        };
        if page < 1 || page > state.last_page || page == state.curr_page {
            return false;
        }
        state.curr_page = page;
        true
    }

    pub fn previous_page(&mut self) -> bool {
        match self.paged_mut() {
            Some(state) if state.curr_page > 1 => {
                state.curr_page -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn next_page(&mut self) -> bool {
        match self.paged_mut() {
            Some(state) if state.curr_page < state.last_page => {
                state.curr_page += 1;
                true
            }
            _ => false,
        }
    }

    /// Stable sort, most frequent genes first, then back to page 1.
    pub fn sort_by_occurrence(&mut self) -> bool {
        let Some(state) = self.paged_mut() else {
            return false;
        };
        state
            .gene_list
            .sort_by(|a, b| b.occurrence.cmp(&a.occurrence));
        state.curr_page = 1;
        true
    }

    /// Moves the genes present in `dataset` ahead of the others, keeping
    /// the relative order inside both groups.
    pub fn sort_by_dataset(&mut self, dataset: &str) -> bool {
        let Some(state) = self.paged_mut() else {
            return false;
        };
        if !state.datasets.iter().any(|d| d == dataset) {
            return false;
        }
        let (owned, exiled): (Vec<_>, Vec<_>) = std::mem::take(&mut state.gene_list)
            .into_iter()
            .partition(|g| g.is_present_in(dataset));
        state.gene_list = owned;
        state.gene_list.extend(exiled);
        true
    }

    /// Plot target of the `row`-th visible row: gene name (or custom target)
    /// and window size.
    pub fn plot_target(&self, row: usize) -> Option<(String, u64)> {
        let state = self.state()?;
        if let (TableMode::Custom, Some(window)) = (state.mode, &state.custom) {
            return (row == 0).then(|| (window.target.clone(), window.range));
        }
        let gene = state.visible_genes().get(row)?;
        Some((gene.gene_name.clone(), gene.custom_range?))
    }
}
