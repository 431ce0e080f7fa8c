//! Markup for the page regions the controller repaints.

use crate::{
    catalog::DatasetCatalog,
    form::SearchForm,
    plot::{PeakEntry, PlotInfo},
    table::{BodyRow, FooterModel, HeadModel, PresenceMarker},
};
use itertools::Itertools;
use std::fmt::Write;

/// Turns view models into markup fragments.
pub trait Templates {
    fn search_rows(&self, catalog: &DatasetCatalog, form: &SearchForm) -> String;
    fn table_head(&self, head: &HeadModel) -> String;
    fn table_body(&self, rows: &[BodyRow]) -> String;
    fn table_foot(&self, footer: &FooterModel) -> String;
    fn plot_info(&self, info: &PlotInfo) -> String;
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const PRESENT_MARKER: &str = r#"<i class="large green checkmark icon"></i>"#;
const UNKNOWN_MARKER: &str = r#"<div data-tooltip="click `Link` for advanced search" data-position="bottom center"><i class="large grey warning sign icon"></i></div>"#;

/// Semantic-UI flavoured HTML fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTemplates;

impl HtmlTemplates {
    fn marker(marker: PresenceMarker) -> &'static str {
        match marker {
            PresenceMarker::Present => PRESENT_MARKER,
            PresenceMarker::Absent => "",
            PresenceMarker::Unknown => UNKNOWN_MARKER,
        }
    }

    fn peak_item(out: &mut String, peak: &PeakEntry) {
        let value = peak
            .value
            .map(|v| format!(" <span class=\"score\">{v}</span>"))
            .unwrap_or_default();
        let _ = write!(
            out,
            "<div class=\"item\">{}{value}</div>",
            html_escape(&peak.location)
        );
    }
}

impl Templates for HtmlTemplates {
    fn search_rows(&self, catalog: &DatasetCatalog, form: &SearchForm) -> String {
        let list = form.collection.as_str().to_ascii_uppercase();
        let mut out = String::new();
        for info in catalog.iter() {
            let checked = form.is_checked(&info.id);
            let _ = write!(
                out,
                "<tr><td><div class=\"ui checkbox\"><input type=\"checkbox\" data-dataset=\"{id}\"{checked}><label>{id}</label></div></td>\
                 <td>{cell}</td><td>{tp53}</td><td>{treatment}</td><td class=\"list{disabled}\">{list}</td></tr>",
                id = html_escape(&info.id),
                checked = if checked { " checked" } else { "" },
                cell = html_escape(&info.cell_line),
                tp53 = html_escape(&info.tp53),
                treatment = html_escape(&info.treatment),
                disabled = if checked { "" } else { " disabled" },
            );
        }
        out
    }

    fn table_head(&self, head: &HeadModel) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "<tr><th colspan=\"2\"></th><th colspan=\"{wt}\">Wildtype ({wt})</th><th colspan=\"{mt}\">Mutant ({mt})</th><th></th></tr>",
            wt = head.wildtype,
            mt = head.mutant
        );
        let sort_attr = |attr: &str| {
            if head.sortable {
                format!(" {attr}")
            } else {
                String::new()
            }
        };
        let dataset_cells = head
            .datasets
            .iter()
            .map(|d| {
                format!(
                    "<th{}>{}</th>",
                    sort_attr(&format!("data-dataset=\"{}\"", html_escape(d))),
                    html_escape(d)
                )
            })
            .join("");
        let _ = write!(
            out,
            "<tr><th>Gene</th><th{}>Occurrence</th>{dataset_cells}<th>Plot</th></tr>",
            sort_attr("data-sort-by-occurrence")
        );
        out
    }

    fn table_body(&self, rows: &[BodyRow]) -> String {
        let mut out = String::new();
        for row in rows {
            let name = html_escape(&row.gene_name);
            let link = match &row.reference {
                Some(url) => format!(
                    "<a href=\"{}\" target=\"_blank\">{name}</a>",
                    html_escape(url)
                ),
                None => format!("<a>{name}</a>"),
            };
            let markers = row
                .markers
                .iter()
                .map(|m| format!("<td>{}</td>", Self::marker(*m)))
                .join("");
            let range = row
                .custom_range
                .map(|r| r.to_string())
                .unwrap_or_default();
            let _ = write!(
                out,
                "<tr><td>{link}</td><td>{}</td>{markers}<td><a class=\"ui button\" data-plot=\"{name}\" data-range=\"{range}\">Plot</a></td></tr>",
                row.occurrence
            );
        }
        out
    }

    fn table_foot(&self, footer: &FooterModel) -> String {
        let page_link = |page: usize| {
            let active = if page == footer.current_page { " active" } else { "" };
            format!("<a class=\"item{active}\" data-page=\"{page}\">{page}</a>")
        };
        let mut items = vec![
            "<a class=\"icon item\" data-page-minus><i class=\"left chevron icon\"></i></a>"
                .to_string(),
            page_link(1),
        ];
        if footer.pre_escape {
            items.push("<div class=\"disabled item\">...</div>".to_string());
        }
        items.extend(footer.pages.iter().map(|p| page_link(*p)));
        if footer.post_escape {
            items.push("<div class=\"disabled item\">...</div>".to_string());
        }
        if let Some(last) = footer.last_page {
            items.push(page_link(last));
        }
        items.push(
            "<a class=\"icon item\" data-page-plus><i class=\"right chevron icon\"></i></a>"
                .to_string(),
        );
        let inert = if footer.interactive { "" } else { " disabled" };
        format!(
            "<tr><th colspan=\"{}\"><div class=\"ui right floated pagination menu{inert}\">{}</div></th></tr>",
            footer.colspan,
            items.join("")
        )
    }

    fn plot_info(&self, info: &PlotInfo) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "<h3 class=\"ui header\">{} <span class=\"window\">{}-{}</span></h3>",
            html_escape(&info.target),
            info.start,
            info.end
        );
        out.push_str("<div class=\"ui list genes\">");
        for gene in &info.gene_list {
            let _ = write!(
                out,
                "<div class=\"item\"><i>{}</i> ({}) {}-{}</div>",
                html_escape(&gene.gene_name),
                gene.strand_symbol(),
                gene.transcript_start,
                gene.transcript_end
            );
        }
        out.push_str("</div>");
        for group in &info.collections {
            let _ = write!(
                out,
                "<table class=\"ui celled table\" data-collection=\"{}\"><thead><tr><th>Dataset</th><th>Peaks</th></tr></thead><tbody>",
                group.collection
            );
            for dataset in &group.datasets {
                let _ = write!(
                    out,
                    "<tr><td rowspan=\"{}\">{}</td><td>",
                    dataset.peak_amount,
                    html_escape(&dataset.dataset)
                );
                Self::peak_item(&mut out, &dataset.first_peak);
                out.push_str("</td></tr>");
                for peak in &dataset.other_peaks {
                    out.push_str("<tr><td>");
                    Self::peak_item(&mut out, peak);
                    out.push_str("</td></tr>");
                }
            }
            out.push_str("</tbody></table>");
        }
        out
    }
}
