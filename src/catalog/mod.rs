mod domain;
mod error;
mod loader;
mod reference_store;

pub use domain::{
    Catalog, Directive, DirectiveCategory, EdgeCondition, EdgeSource, FlowEdge, FlowType,
    WILDCARD_SOURCE,
};
pub use error::CatalogError;
pub use loader::load_catalog;
pub use reference_store::ReferenceStore;
