pub mod catalog_service;
pub mod types;

pub use catalog_service::{CatalogSource, StopCatalog};
