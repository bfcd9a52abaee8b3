#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to load stop catalog: {0}")]
    LoadFailure(String),
    #[error("Failed to parse stop catalog: {0}")]
    ParseFailure(String),
}

impl CatalogError {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::LoadFailure(_) => "catalog_load_failure",
            CatalogError::ParseFailure(_) => "catalog_parse_failure",
        }
    }
}
