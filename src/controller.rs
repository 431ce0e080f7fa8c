//! The view-model controller: one owned context holding the search form,
//! the result table, the latest plot and the page it paints.
//!
//! The controller performs no I/O. Submitting a search or requesting a plot
//! hands back a [`PendingRequest`]; whoever carries it to the server reports
//! the outcome through [`Controller::complete_search`] or
//! [`Controller::complete_plot`], in any order.

use crate::{
    catalog::{DatasetCatalog, GeneReferenceTable},
    config::AppConfig,
    dispatcher::{Dispatcher, PendingRequest, RemoteCall, RequestKind, RequestTicket},
    error::PeakViewError,
    form::{SearchForm, ValidatedSearch, ValidationError},
    page::{Page, PlotTab, Region, Section},
    plot::{render_plot, PlotContext, PlotView},
    table::{ReferenceLinks, ResultTable},
    templates::{HtmlTemplates, Templates},
};
use peakview_protocol::{
    Action, BrowseMode, CollectionScope, DatasetId, GeneRecord, PlotRequest, PlotResult,
    RemoteError,
};
use regex::Regex;
use tracing::{debug, error, info, warn};

/// What a completion did to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Applied,
    /// The server or transport failed; state is unchanged.
    Failed(RemoteError),
    /// A newer request of the same kind superseded this one; ignored.
    Stale,
}

/// Query context captured when a plot is requested.
#[derive(Debug, Clone)]
struct PlotQuery {
    target: String,
    datasets: Vec<DatasetId>,
    scope: CollectionScope,
    browse: BrowseMode,
}

pub struct Controller<T: Templates = HtmlTemplates> {
    config: AppConfig,
    wildtype: Regex,
    catalog: DatasetCatalog,
    gene_refs: GeneReferenceTable,
    templates: T,
    form: SearchForm,
    table: ResultTable,
    dispatcher: Dispatcher,
    pending_search: Option<(RequestTicket, ValidatedSearch)>,
    pending_plot: Option<(RequestTicket, PlotQuery)>,
    plot: Option<PlotView>,
    page: Page,
}

impl Controller<HtmlTemplates> {
    pub fn new(
        config: AppConfig,
        catalog: DatasetCatalog,
        gene_refs: GeneReferenceTable,
    ) -> Result<Self, PeakViewError> {
        Self::with_templates(config, catalog, gene_refs, HtmlTemplates)
    }
}

impl<T: Templates> Controller<T> {
    pub fn with_templates(
        config: AppConfig,
        catalog: DatasetCatalog,
        gene_refs: GeneReferenceTable,
        templates: T,
    ) -> Result<Self, PeakViewError> {
        config.validate()?;
        let wildtype = config.wildtype_regex()?;
        let mut ret = Self {
            config,
            wildtype,
            catalog,
            gene_refs,
            templates,
            form: SearchForm::new(),
            table: ResultTable::new(),
            dispatcher: Dispatcher::new(),
            pending_search: None,
            pending_plot: None,
            plot: None,
            page: Page::new(),
        };
        ret.render_search_rows();
        Ok(ret)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }

    pub fn form(&self) -> &SearchForm {
        &self.form
    }

    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn plot_view(&self) -> Option<&PlotView> {
        self.plot.as_ref()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /* Search filters */

    pub fn choose_browse(&mut self, browse: BrowseMode) {
        self.form.choose_browse(browse);
    }

    pub fn choose_collection(&mut self, collection: CollectionScope) {
        self.form.choose_collection(collection);
        self.render_search_rows();
    }

    pub fn set_custom_window(&mut self, target: &str, range: &str) {
        self.form.set_custom_window(target, range);
    }

    pub fn toggle_dataset(&mut self, dataset: &str) -> Result<bool, PeakViewError> {
        if !self.catalog.contains(dataset) {
            return Err(format!("Unknown dataset '{dataset}'").into());
        }
        let checked = self.form.toggle_dataset(dataset);
        self.render_search_rows();
        Ok(checked)
    }

    pub fn choose_action(&mut self, action: Action) -> Result<(), ValidationError> {
        self.form.choose_action(action)
    }

    /// Validates the form and issues one `search` call. Nothing changes on
    /// a validation failure.
    pub fn submit(&mut self) -> Result<PendingRequest, ValidationError> {
        let search = self.form.validate().inspect_err(|e| {
            debug!(reason = %e, "search not submitted");
        })?;
        let pending = self
            .dispatcher
            .issue(RemoteCall::Search(search.request.clone()));
        self.pending_search = Some((pending.ticket, search));
        self.page.submit_loading = true;
        Ok(pending)
    }

    pub fn complete_search(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<GeneRecord>, RemoteError>,
    ) -> Completion {
        if !self.dispatcher.settle(ticket) {
            warn!(seq = ticket.seq, "dropping stale search reply");
            return Completion::Stale;
        }
        let search = match self.pending_search.take() {
            Some((pending, search)) if pending == ticket => search,
            _ => {
                warn!(seq = ticket.seq, "search reply without pending request");
                return Completion::Stale;
            }
        };

        self.page.submit_loading = false;
        self.form.reset_selection();
        self.render_search_rows();

        let genes = match result {
            Ok(genes) => genes,
            Err(e) => {
                error!(error = %e, "search failed");
                return Completion::Failed(e);
            }
        };
        info!(
            genes = genes.len(),
            browse = search.request.browse.as_str(),
            action = search.request.action.as_str(),
            "search completed"
        );

        let items_per_page = self.config.items_per_page;
        match search.custom {
            Some(window) => {
                self.table
                    .populate_custom(&search.request, genes, items_per_page, window)
            }
            None => self.table.populate(
                &search.request,
                genes,
                items_per_page,
                self.config.global_browsing_range,
            ),
        }

        if let Some(cancelled) = self.dispatcher.cancel(RequestKind::Plot) {
            debug!(seq = cancelled.seq, "plot request outdated by new search");
            self.pending_plot = None;
        }
        self.plot = None;
        self.page.plot_visible = false;

        self.render_head();
        self.render_body();
        self.render_footer();
        self.page.result_visible = true;
        self.page.scroll_to(Section::Results);
        Completion::Applied
    }

    /* Result table */

    pub fn render_head(&mut self) {
        let head = self.table.head(&self.wildtype);
        let markup = self.templates.table_head(&head);
        self.page.paint(Region::TableHead, markup);
    }

    pub fn render_body(&mut self) {
        let rows = self.table.body_rows(&ReferenceLinks {
            config: &self.config,
            genes: &self.gene_refs,
        });
        let markup = self.templates.table_body(&rows);
        self.page.paint(Region::TableBody, markup);
    }

    pub fn render_footer(&mut self) {
        let Some(footer) = self.table.footer() else {
            return;
        };
        let markup = self.templates.table_foot(&footer);
        self.page.paint(Region::TableFoot, markup);
    }

    fn repaint_page(&mut self) {
        self.render_body();
        self.render_footer();
    }

    pub fn goto_page(&mut self, page: usize) -> bool {
        let moved = self.table.goto_page(page);
        if moved {
            self.repaint_page();
        }
        moved
    }

    pub fn previous_page(&mut self) -> bool {
        let moved = self.table.previous_page();
        if moved {
            self.repaint_page();
        }
        moved
    }

    pub fn next_page(&mut self) -> bool {
        let moved = self.table.next_page();
        if moved {
            self.repaint_page();
        }
        moved
    }

    pub fn sort_by_occurrence(&mut self) -> bool {
        let sorted = self.table.sort_by_occurrence();
        if sorted {
            self.repaint_page();
        }
        sorted
    }

    pub fn sort_by_dataset(&mut self, dataset: &str) -> bool {
        let sorted = self.table.sort_by_dataset(dataset);
        if sorted {
            self.render_body();
        }
        sorted
    }

    pub fn set_rows_suppressed(&mut self, suppressed: bool) {
        self.table.set_rows_suppressed(suppressed);
        self.render_body();
    }

    /* Charts */

    /// Requests the chart of the `row`-th visible table row.
    pub fn plot_row(&mut self, row: usize) -> Result<PendingRequest, PeakViewError> {
        let (target, range) = self
            .table
            .plot_target(row)
            .ok_or_else(|| format!("No plottable row {row} on this page"))?;
        self.plot(&target, range)
    }

    pub fn plot(&mut self, target: &str, range: u64) -> Result<PendingRequest, PeakViewError> {
        let state = self
            .table
            .state()
            .ok_or_else(|| "Nothing to plot before a search completed".to_string())?;
        let query = PlotQuery {
            target: target.to_string(),
            datasets: state.datasets.clone(),
            scope: state.collection,
            browse: state.browse,
        };
        let pending = self.dispatcher.issue(RemoteCall::Plot(PlotRequest {
            collection: query.scope,
            datasets: query.datasets.clone(),
            target: query.target.clone(),
            range,
        }));
        self.pending_plot = Some((pending.ticket, query));
        Ok(pending)
    }

    pub fn complete_plot(
        &mut self,
        ticket: RequestTicket,
        result: Result<PlotResult, RemoteError>,
    ) -> Completion {
        if !self.dispatcher.settle(ticket) {
            warn!(seq = ticket.seq, "dropping stale plot reply");
            return Completion::Stale;
        }
        let query = match self.pending_plot.take() {
            Some((pending, query)) if pending == ticket => query,
            _ => {
                warn!(seq = ticket.seq, "plot reply without pending request");
                return Completion::Stale;
            }
        };
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, plot_target = query.target.as_str(), "plot failed");
                return Completion::Failed(e);
            }
        };

        let ctx = PlotContext {
            target: &query.target,
            datasets: &query.datasets,
            scope: query.scope,
            browse: query.browse,
        };
        let view = render_plot(&ctx, &result, &self.catalog, &self.config);
        debug!(
            plot_target = query.target.as_str(),
            peaks = result.data.peak.len(),
            genes = result.data.gene.len(),
            tracks = view.has_tracks(),
            "plot rendered"
        );

        self.page.track_tab_enabled = view.has_tracks();
        self.page.select_tab(PlotTab::Info);
        let info = self.templates.plot_info(&view.info);
        self.page.paint(Region::PlotInfo, info);
        self.page
            .paint_charts(Region::PeakCharts, view.peak_svgs.clone());
        self.page
            .paint_charts(Region::TrackCharts, view.track_svgs.clone());
        self.page.plot_visible = true;
        self.page.scroll_to(Section::Plot);
        self.plot = Some(view);
        Completion::Applied
    }

    pub fn select_tab(&mut self, tab: PlotTab) -> bool {
        self.page.select_tab(tab)
    }

    pub fn navigate(&mut self, section: Section) {
        self.page.scroll_to(section);
    }

    fn render_search_rows(&mut self) {
        let markup = self.templates.search_rows(&self.catalog, &self.form);
        self.page.paint(Region::SearchRows, markup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{default_datasets, default_gene_references};
    use crate::table::TableMode;
    use peakview_protocol::{Collection, PeakRecord, PlotData, TrackMap};

    fn controller() -> Controller {
        Controller::new(
            AppConfig::default(),
            default_datasets(),
            default_gene_references(),
        )
        .unwrap()
    }

    fn genes(count: usize) -> Vec<GeneRecord> {
        (0..count)
            .map(|i| {
                GeneRecord::new(&format!("G{i}"))
                    .with_flag("D1", i % 2 == 0)
                    .with_flag("D10", i % 5 == 0)
            })
            .collect()
    }

    fn submit(c: &mut Controller) -> PendingRequest {
        c.toggle_dataset("D1").unwrap();
        c.toggle_dataset("D10").unwrap();
        c.choose_action(Action::Union).unwrap();
        c.submit().unwrap()
    }

    fn populated(count: usize) -> Controller {
        let mut c = controller();
        let pending = submit(&mut c);
        assert_eq!(
            c.complete_search(pending.ticket, Ok(genes(count))),
            Completion::Applied
        );
        c
    }

    fn plot_result(track: TrackMap) -> PlotResult {
        PlotResult {
            start_position: 68_800_000,
            range: 20_000,
            data: PlotData {
                gene: vec![],
                peak: vec![PeakRecord {
                    collection: Collection::Clc,
                    dataset: "D1".to_string(),
                    chr_name: "12".to_string(),
                    peak_start: 68_805_000,
                    peak_end: 68_806_000,
                    score: Some(14.0),
                    local_score: None,
                }],
                track,
            },
        }
    }

    #[test]
    fn test_invalid_submit_changes_nothing() {
        let mut c = controller();
        let before = c.page().clone();
        assert_eq!(c.submit(), Err(ValidationError::MissingAction));
        c.choose_action(Action::Union).unwrap();
        assert_eq!(c.submit(), Err(ValidationError::NoDatasets));
        assert_eq!(c.dispatcher().issued(), 0);
        assert_eq!(c.page().submit_loading, before.submit_loading);
        assert_eq!(c.page().table_body, before.table_body);
    }

    #[test]
    fn test_submit_marks_loading_and_completion_resets_form() {
        let mut c = controller();
        let pending = submit(&mut c);
        match &pending.call {
            RemoteCall::Search(req) => {
                assert_eq!(req.datasets, vec!["D1".to_string(), "D10".to_string()]);
                assert_eq!(req.action, Action::Union);
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert!(c.page().submit_loading);
        c.complete_search(pending.ticket, Ok(genes(25)));
        assert!(!c.page().submit_loading);
        assert!(c.form().datasets.is_empty());
        assert_eq!(c.form().action, None);
        assert!(c.page().result_visible);
        assert_eq!(c.page().scroll_target, Some(Section::Results));
        let state = c.table().state().unwrap();
        assert_eq!(state.last_page, 3);
        assert_eq!(state.gene_list[0].occurrence, 2);
        assert_eq!(c.page().table_body.matches("<tr>").count(), 10);
    }

    #[test]
    fn test_failed_search_keeps_previous_table() {
        let mut c = populated(25);
        let before = c.table().clone();
        let body = c.page().table_body.clone();
        let pending = submit(&mut c);
        let outcome = c.complete_search(pending.ticket, Err(RemoteError::remote("boom")));
        assert!(matches!(outcome, Completion::Failed(_)));
        assert_eq!(c.table(), &before);
        assert_eq!(c.page().table_body, body);
        assert!(!c.page().submit_loading);
        assert!(c.form().datasets.is_empty());
    }

    #[test]
    fn test_out_of_order_search_replies() {
        let mut c = controller();
        let first = submit(&mut c);
        let second = c.submit().unwrap();
        assert!(second.ticket.seq > first.ticket.seq);
        assert_eq!(
            c.complete_search(second.ticket, Ok(genes(3))),
            Completion::Applied
        );
        assert_eq!(
            c.complete_search(first.ticket, Ok(genes(40))),
            Completion::Stale
        );
        assert_eq!(c.table().state().unwrap().gene_list.len(), 3);
    }

    #[test]
    fn test_stale_reply_leaves_loading_for_newer_request() {
        let mut c = controller();
        let first = submit(&mut c);
        let second = c.submit().unwrap();
        assert_eq!(
            c.complete_search(first.ticket, Ok(genes(40))),
            Completion::Stale
        );
        assert!(c.page().submit_loading);
        assert!(!c.table().is_populated());
        assert_eq!(c.form().datasets.len(), 2);
        assert_eq!(
            c.complete_search(second.ticket, Ok(genes(3))),
            Completion::Applied
        );
        assert!(!c.page().submit_loading);
        assert_eq!(c.table().state().unwrap().gene_list.len(), 3);
    }

    #[test]
    fn test_paging_repaints_body_and_footer() {
        let mut c = populated(25);
        let body = c.page().repaints(Region::TableBody);
        let foot = c.page().repaints(Region::TableFoot);
        assert!(c.next_page());
        assert!(c.goto_page(3));
        assert!(!c.next_page());
        assert_eq!(c.page().repaints(Region::TableBody), body + 2);
        assert_eq!(c.page().repaints(Region::TableFoot), foot + 2);
        assert_eq!(c.page().table_body.matches("<tr>").count(), 5);
        assert!(c.page().table_foot.contains("<a class=\"item active\" data-page=\"3\">3</a>"));
    }

    #[test]
    fn test_dataset_sort_repaints_body_only() {
        let mut c = populated(25);
        let foot = c.page().repaints(Region::TableFoot);
        assert!(c.sort_by_dataset("D10"));
        assert_eq!(c.page().repaints(Region::TableFoot), foot);
        let first = &c.table().state().unwrap().gene_list[0];
        assert!(first.is_present_in("D10"));
        assert!(c.sort_by_occurrence());
        assert_eq!(c.table().state().unwrap().curr_page, 1);
    }

    #[test]
    fn test_customized_search_renders_synthetic_row() {
        let mut c = controller();
        c.choose_browse(BrowseMode::Customized);
        c.set_custom_window("chr17:7571720", "8000");
        let pending = submit(&mut c);
        c.complete_search(pending.ticket, Ok(genes(30)));
        let state = c.table().state().unwrap();
        assert_eq!(state.mode, TableMode::Custom);
        assert_eq!(c.page().table_body.matches("<tr>").count(), 1);
        assert!(c.page().table_body.contains("chr17:7571720"));
        assert!(c.page().table_foot.contains("menu disabled"));
        let body = c.page().repaints(Region::TableBody);
        assert!(!c.next_page());
        assert!(!c.goto_page(2));
        assert!(!c.sort_by_occurrence());
        assert_eq!(c.page().repaints(Region::TableBody), body);
        let pending = c.plot_row(0).unwrap();
        match pending.call {
            RemoteCall::Plot(req) => {
                assert_eq!(req.target, "chr17:7571720");
                assert_eq!(req.range, 8000);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn test_plot_without_tracks_disables_track_tab() {
        let mut c = populated(25);
        let pending = c.plot_row(0).unwrap();
        match &pending.call {
            RemoteCall::Plot(req) => {
                assert_eq!(req.target, "G0");
                assert_eq!(req.range, 20_000);
                assert_eq!(req.collection, CollectionScope::All);
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(
            c.complete_plot(pending.ticket, Ok(plot_result(TrackMap::new()))),
            Completion::Applied
        );
        let page = c.page();
        assert!(page.plot_visible);
        assert!(!page.track_tab_enabled);
        assert_eq!(page.active_tab, PlotTab::Info);
        assert_eq!(page.peak_charts.len(), 2);
        assert!(page.track_charts.is_empty());
        assert_eq!(page.scroll_target, Some(Section::Plot));
        assert!(!c.select_tab(PlotTab::Track));
        assert!(c.select_tab(PlotTab::Peak));
    }

    #[test]
    fn test_plot_with_tracks_enables_track_tab() {
        let mut c = populated(5);
        let pending = c.plot("MDM2", 20_000).unwrap();
        let mut track = TrackMap::new();
        track
            .entry("D1".to_string())
            .or_default()
            .insert("p53".to_string(), vec![1.0, 3.0, 2.0]);
        c.complete_plot(pending.ticket, Ok(plot_result(track)));
        assert!(c.page().track_tab_enabled);
        assert_eq!(c.page().track_charts.len(), 2);
        assert!(c.select_tab(PlotTab::Track));
        assert!(c.plot_view().unwrap().scene.promoters.len() == 2);
    }

    #[test]
    fn test_new_search_outdates_pending_plot() {
        let mut c = populated(5);
        let plot = c.plot("MDM2", 20_000).unwrap();
        let search = submit(&mut c);
        c.complete_search(search.ticket, Ok(genes(2)));
        assert_eq!(
            c.complete_plot(plot.ticket, Ok(plot_result(TrackMap::new()))),
            Completion::Stale
        );
        assert!(!c.page().plot_visible);
    }

    #[test]
    fn test_plot_before_search_is_rejected() {
        let mut c = controller();
        assert!(c.plot("MDM2", 20_000).is_err());
        assert!(c.plot_row(0).is_err());
        assert!(c.toggle_dataset("nope").is_err());
    }
}
