//! Drives a [`Controller`] from a list of user events, resolving every
//! remote call through a [`Transport`].

use crate::{
    controller::{Completion, Controller},
    dispatcher::{PendingRequest, RemoteCall},
    error::PeakViewError,
    page::{Page, PlotTab, Section},
    templates::Templates,
    transport::Transport,
};
use peakview_protocol::{Action, BrowseMode, CollectionScope};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One user interaction with the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    ChooseBrowse { browse: BrowseMode },
    ChooseCollection { collection: CollectionScope },
    ToggleDataset { dataset: String },
    ChooseAction { action: Action },
    SetCustomWindow { target: String, range: String },
    Submit,
    GotoPage { page: usize },
    PreviousPage,
    NextPage,
    SortByOccurrence,
    SortByDataset { dataset: String },
    PlotRow { row: usize },
    Plot { target: String, range: u64 },
    SelectTab { tab: PlotTab },
    Navigate { section: Section },
}

/// What applying one event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Local state change only.
    Local,
    /// The event was refused; nothing changed.
    Ignored(String),
    /// A remote call was made and completed.
    Remote(Completion),
}

pub struct Session<C: Transport, T: Templates> {
    controller: Controller<T>,
    transport: C,
    calls: usize,
}

impl<C: Transport, T: Templates> Session<C, T> {
    pub fn new(controller: Controller<T>, transport: C) -> Self {
        Self {
            controller,
            transport,
            calls: 0,
        }
    }

    pub fn controller(&self) -> &Controller<T> {
        &self.controller
    }

    pub fn page(&self) -> &Page {
        self.controller.page()
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }

    /// Remote calls made so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Sends `pending` to the transport and reports the reply back.
    pub fn resolve(&mut self, pending: PendingRequest) -> Completion {
        self.calls += 1;
        match pending.call {
            RemoteCall::Search(request) => {
                let reply = self.transport.search(&request);
                self.controller.complete_search(pending.ticket, reply)
            }
            RemoteCall::Plot(request) => {
                let reply = self.transport.plot(&request);
                self.controller.complete_plot(pending.ticket, reply)
            }
        }
    }

    pub fn apply(&mut self, event: Event) -> Result<Outcome, PeakViewError> {
        let c = &mut self.controller;
        let moved = |changed: bool, what: &str| {
            if changed {
                Outcome::Local
            } else {
                Outcome::Ignored(format!("{what} had no effect"))
            }
        };
        let outcome = match event {
            Event::ChooseBrowse { browse } => {
                c.choose_browse(browse);
                Outcome::Local
            }
            Event::ChooseCollection { collection } => {
                c.choose_collection(collection);
                Outcome::Local
            }
            Event::ToggleDataset { dataset } => {
                c.toggle_dataset(&dataset)?;
                Outcome::Local
            }
            Event::ChooseAction { action } => match c.choose_action(action) {
                Ok(()) => Outcome::Local,
                Err(e) => Outcome::Ignored(e.to_string()),
            },
            Event::SetCustomWindow { target, range } => {
                c.set_custom_window(&target, &range);
                Outcome::Local
            }
            Event::Submit => match c.submit() {
                Ok(pending) => Outcome::Remote(self.resolve(pending)),
                Err(e) => Outcome::Ignored(e.to_string()),
            },
            Event::GotoPage { page } => moved(c.goto_page(page), "page change"),
            Event::PreviousPage => moved(c.previous_page(), "previous page"),
            Event::NextPage => moved(c.next_page(), "next page"),
            Event::SortByOccurrence => moved(c.sort_by_occurrence(), "occurrence sort"),
            Event::SortByDataset { dataset } => moved(c.sort_by_dataset(&dataset), "dataset sort"),
            Event::PlotRow { row } => {
                let pending = c.plot_row(row)?;
                Outcome::Remote(self.resolve(pending))
            }
            Event::Plot { target, range } => {
                let pending = c.plot(&target, range)?;
                Outcome::Remote(self.resolve(pending))
            }
            Event::SelectTab { tab } => moved(c.select_tab(tab), "tab switch"),
            Event::Navigate { section } => {
                c.navigate(section);
                Outcome::Local
            }
        };
        if let Outcome::Ignored(reason) = &outcome {
            warn!(reason = reason.as_str(), "event ignored");
        }
        Ok(outcome)
    }

    /// Applies `events` in order, stopping at the first hard error.
    pub fn run(&mut self, events: Vec<Event>) -> Result<Vec<Outcome>, PeakViewError> {
        let total = events.len();
        let outcomes = events
            .into_iter()
            .map(|event| self.apply(event))
            .collect::<Result<Vec<_>, _>>()?;
        info!(events = total, calls = self.calls, "session finished");
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{default_datasets, default_gene_references},
        config::AppConfig,
        page::Region,
        templates::HtmlTemplates,
        transport::ReplayTransport,
    };
    use peakview_protocol::{
        Collection, GeneRecord, PeakRecord, PlotData, PlotReply, PlotResult, SearchReply,
    };

    fn session(transport: ReplayTransport) -> Session<ReplayTransport, HtmlTemplates> {
        let controller = Controller::new(
            AppConfig::default(),
            default_datasets(),
            default_gene_references(),
        )
        .unwrap();
        Session::new(controller, transport)
    }

    fn events(json: &str) -> Vec<Event> {
        serde_json::from_str(json).unwrap()
    }

    fn genes(count: usize) -> Vec<GeneRecord> {
        (0..count)
            .map(|i| GeneRecord::new(&format!("G{i}")).with_flag("D1", true))
            .collect()
    }

    #[test]
    fn test_submit_without_datasets_makes_no_call() {
        let mut s = session(ReplayTransport::default());
        let outcomes = s
            .run(events(
                r#"[{"event":"choose_action","action":"union"},{"event":"submit"}]"#,
            ))
            .unwrap();
        assert!(matches!(outcomes[1], Outcome::Ignored(_)));
        assert_eq!(s.calls(), 0);
        assert!(s.transport().calls().is_empty());
        assert!(!s.page().submit_loading);
    }

    #[test]
    fn test_search_then_browse_pages() {
        let mut transport = ReplayTransport::default();
        transport.push_search(SearchReply::ok(genes(25)));
        let mut s = session(transport);
        s.run(events(
            r#"[
                {"event":"toggle_dataset","dataset":"D1"},
                {"event":"choose_action","action":"intersection"},
                {"event":"submit"},
                {"event":"goto_page","page":3}
            ]"#,
        ))
        .unwrap();
        assert_eq!(s.calls(), 1);
        assert_eq!(s.page().table_body.matches("<tr>").count(), 5);
        assert!(s.page().table_body.contains(">G24<"));
        let outcome = s.apply(Event::NextPage).unwrap();
        assert!(matches!(outcome, Outcome::Ignored(_)));
        assert_eq!(s.page().repaints(Region::TableBody), 2);
    }

    #[test]
    fn test_remote_error_keeps_page() {
        let mut transport = ReplayTransport::default();
        transport.push_search(SearchReply {
            error: Some(serde_json::json!({"code": 500})),
            gene_list: None,
        });
        let mut s = session(transport);
        let outcomes = s
            .run(events(
                r#"[
                    {"event":"toggle_dataset","dataset":"D2"},
                    {"event":"choose_action","action":"union"},
                    {"event":"submit"}
                ]"#,
            ))
            .unwrap();
        assert!(matches!(outcomes[2], Outcome::Remote(Completion::Failed(_))));
        assert!(!s.page().result_visible);
        assert!(!s.page().submit_loading);
    }

    #[test]
    fn test_plot_flow_without_tracks() {
        let mut transport = ReplayTransport::default();
        transport.push_search(SearchReply::ok(genes(3)));
        transport.push_plot(PlotReply::ok(PlotResult {
            start_position: 1_000,
            range: 20_000,
            data: PlotData {
                peak: vec![PeakRecord {
                    collection: Collection::Homer,
                    dataset: "D1".to_string(),
                    chr_name: "1".to_string(),
                    peak_start: 5_000,
                    peak_end: 6_000,
                    score: None,
                    local_score: Some(3.5),
                }],
                ..PlotData::default()
            },
        }));
        let mut s = session(transport);
        s.run(events(
            r#"[
                {"event":"choose_collection","collection":"homer"},
                {"event":"toggle_dataset","dataset":"D1"},
                {"event":"choose_action","action":"union"},
                {"event":"submit"},
                {"event":"plot_row","row":1},
                {"event":"select_tab","tab":"track"}
            ]"#,
        ))
        .unwrap();
        assert_eq!(s.calls(), 2);
        match &s.transport().calls()[1] {
            RemoteCall::Plot(req) => {
                assert_eq!(req.target, "G1");
                assert_eq!(req.collection, CollectionScope::Homer);
            }
            other => panic!("unexpected call {other:?}"),
        }
        let page = s.page();
        assert!(page.plot_visible);
        assert_eq!(page.active_tab, PlotTab::Info);
        assert!(!page.track_tab_enabled);
        assert!(page.plot_info.contains("chr1:5000 - 6000"));
        assert!(!page.plot_info.contains("data-collection=\"clc\""));
    }

    #[test]
    fn test_plot_before_search_is_an_error() {
        let mut s = session(ReplayTransport::default());
        assert!(s.apply(Event::PlotRow { row: 0 }).is_err());
        assert_eq!(s.calls(), 0);
    }
}
