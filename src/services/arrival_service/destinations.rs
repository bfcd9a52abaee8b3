use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::services::catalog_service::StopCatalog;

/// Resolves a destination stop code to a display name.
#[async_trait]
pub trait DestinationLookup: Send + Sync {
    async fn destination_name(&self, code: &str) -> Option<String>;
}

pub const UNKNOWN_DESTINATION: &str = "Unknown destination";

pub async fn destination_label(lookup: &dyn DestinationLookup, code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        return UNKNOWN_DESTINATION.to_string();
    }

    match lookup.destination_name(code).await {
        Some(name) => name,
        None => format!("Stop {}", code),
    }
}

/// Fixed code-to-name table. Only covers the major interchanges.
#[derive(Clone, Debug)]
pub struct StaticDestinations {
    names: HashMap<String, String>,
}

impl Default for StaticDestinations {
    fn default() -> Self {
        let names = [
            ("10009", "Bt Merah Int"),
            ("22009", "Boon Lay Int"),
            ("28009", "Jurong East Int"),
            ("46009", "Woodlands Int"),
            ("52009", "Toa Payoh Int"),
            ("59009", "Yishun Int"),
            ("75009", "Tampines Int"),
            ("77009", "Pasir Ris Int"),
            ("84009", "Bedok Int"),
        ]
        .into_iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect();

        Self { names }
    }
}

#[async_trait]
impl DestinationLookup for StaticDestinations {
    async fn destination_name(&self, code: &str) -> Option<String> {
        self.names.get(code).cloned()
    }
}

/// Destinations are stop codes, so the loaded stop catalog names almost all of them. Falls back
/// to a static table for anything the catalog doesn't know.
#[derive(Clone)]
pub struct CatalogDestinations {
    catalog: StopCatalog,
    fallback: Arc<dyn DestinationLookup>,
}

impl CatalogDestinations {
    pub fn new(catalog: StopCatalog, fallback: Arc<dyn DestinationLookup>) -> Self {
        Self { catalog, fallback }
    }
}

#[async_trait]
impl DestinationLookup for CatalogDestinations {
    async fn destination_name(&self, code: &str) -> Option<String> {
        match self.catalog.find(code).await {
            Some(stop) => Some(stop.name),
            None => self.fallback.destination_name(code).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog_service::CatalogSource;

    #[tokio::test]
    async fn unknown_code_gets_placeholder() {
        let lookup = StaticDestinations::default();

        assert_eq!(destination_label(&lookup, "75009").await, "Tampines Int");
        assert_eq!(destination_label(&lookup, "12345").await, "Stop 12345");
    }

    #[tokio::test]
    async fn blank_code_is_unknown_destination() {
        let lookup = StaticDestinations::default();

        assert_eq!(destination_label(&lookup, "").await, UNKNOWN_DESTINATION);
        assert_eq!(destination_label(&lookup, "  ").await, UNKNOWN_DESTINATION);
    }

    #[tokio::test]
    async fn catalog_lookup_prefers_catalog_names() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stops.csv")
            .with_body(
                "BusStopCode,Description,RoadName,Latitude,Longitude\n\
                 75009,Tampines Bus Interchange,Tampines Ctrl 1,1.354,103.943\n",
            )
            .create_async()
            .await;

        let catalog = StopCatalog::new(CatalogSource::Url(format!("{}/stops.csv", server.url())));
        catalog.load().await.unwrap();

        let fallback = StaticDestinations {
            names: HashMap::from([("84009".to_string(), "Bedok Int".to_string())]),
        };
        let lookup = CatalogDestinations::new(catalog, Arc::new(fallback));

        assert_eq!(
            destination_label(&lookup, "75009").await,
            "Tampines Bus Interchange"
        );
        assert_eq!(destination_label(&lookup, "84009").await, "Bedok Int");
        assert_eq!(destination_label(&lookup, "00000").await, "Stop 00000");
    }
}
