use catalog::{DatasetCatalog, GeneReferenceTable};
use lazy_static::lazy_static;

pub mod about;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod form;
pub mod page;
pub mod plot;
pub mod session;
pub mod table;
pub mod templates;
pub mod transport;

lazy_static! {
    // Datasets offered in the search form
    pub static ref DATASETS: DatasetCatalog = catalog::default_datasets();

    // Reference coordinates behind gene links
    pub static ref GENE_REFERENCES: GeneReferenceTable = catalog::default_gene_references();
}
