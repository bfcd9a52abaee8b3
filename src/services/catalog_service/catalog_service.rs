use std::{collections::HashSet, fmt, io::Read, path::PathBuf, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::types::{
    catalog_error::CatalogError,
    catalog_record::{CatalogRecord, REQUIRED_COLUMNS},
};
use crate::types::stop::Stop;

#[derive(Clone, Debug, PartialEq)]
pub enum CatalogSource {
    Path(PathBuf),
    Url(String),
}

impl CatalogSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            CatalogSource::Url(raw.to_string())
        } else {
            CatalogSource::Path(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CatalogSource::Path(path) => write!(f, "{}", path.display()),
            CatalogSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Reads a headed stop CSV. Rows that cannot become a valid [`Stop`] are skipped; only a broken
/// stream or a missing column fails the whole catalog.
pub fn parse_catalog<R: Read>(reader: R) -> Result<Vec<Stop>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| CatalogError::ParseFailure(e.to_string()))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(CatalogError::ParseFailure(format!(
                "missing column {}",
                column
            )));
        }
    }

    let mut seen = HashSet::new();
    let mut stops = Vec::new();
    for (idx, rec) in reader.deserialize::<CatalogRecord>().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let rec = match rec {
            Ok(rec) => rec,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(CatalogError::ParseFailure(e.to_string()));
            }
            Err(e) => {
                warn!(line, error = %e, "Skipping unreadable catalog row");
                continue;
            }
        };

        let Some(stop) = validate_record(rec) else {
            warn!(line, "Skipping malformed catalog row");
            continue;
        };

        if !seen.insert(stop.code.clone()) {
            warn!(line, code = %stop.code, "Skipping duplicate stop code");
            continue;
        }
        stops.push(stop);
    }

    Ok(stops)
}

fn validate_record(rec: CatalogRecord) -> Option<Stop> {
    if rec.BusStopCode.is_empty() || rec.Description.is_empty() {
        return None;
    }

    let latitude = rec.Latitude.parse::<f64>().ok()?;
    let longitude = rec.Longitude.parse::<f64>().ok()?;
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    Some(Stop {
        code: rec.BusStopCode,
        name: rec.Description,
        road: rec.RoadName,
        latitude,
        longitude,
    })
}

enum CatalogSlot {
    Empty,
    Loaded(Arc<Vec<Stop>>),
    Failed(CatalogError),
}

/// The stop catalog for the running service. A load either replaces the whole catalog or
/// leaves it failed; readers never see a partial catalog.
#[derive(Clone)]
pub struct StopCatalog {
    source: CatalogSource,
    client: reqwest::Client,
    slot: Arc<RwLock<CatalogSlot>>,
}

impl StopCatalog {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            source,
            client: reqwest::Client::new(),
            slot: Arc::new(RwLock::new(CatalogSlot::Empty)),
        }
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub async fn load(&self) -> Result<usize, CatalogError> {
        info!(source = %self.source, "Loading stop catalog");

        let result = match self.read_source().await {
            Ok(bytes) => parse_catalog(bytes.as_slice()),
            Err(e) => Err(e),
        };

        let mut slot = self.slot.write().await;
        match result {
            Ok(stops) => {
                let count = stops.len();
                info!(stop_count = count, "Stop catalog loaded");
                *slot = CatalogSlot::Loaded(Arc::new(stops));
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Stop catalog unavailable");
                *slot = CatalogSlot::Failed(e.clone());
                Err(e)
            }
        }
    }

    async fn read_source(&self) -> Result<Vec<u8>, CatalogError> {
        match &self.source {
            CatalogSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| CatalogError::LoadFailure(format!("{}: {}", path.display(), e))),
            CatalogSource::Url(url) => {
                let resp = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| CatalogError::LoadFailure(format!("Failed to send request: {}", e)))?;

                if !resp.status().is_success() {
                    return Err(CatalogError::LoadFailure(format!(
                        "catalog source responded with {}",
                        resp.status()
                    )));
                }

                resp.bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(|e| CatalogError::LoadFailure(format!("Failed to read body: {}", e)))
            }
        }
    }

    pub async fn stops(&self) -> Result<Arc<Vec<Stop>>, CatalogError> {
        match &*self.slot.read().await {
            CatalogSlot::Loaded(stops) => Ok(stops.clone()),
            CatalogSlot::Failed(e) => Err(e.clone()),
            CatalogSlot::Empty => Err(CatalogError::LoadFailure(
                "catalog has not been loaded".to_string(),
            )),
        }
    }

    /// Returns the loaded catalog, attempting a load first if there is none yet or the last one
    /// failed.
    pub async fn stops_or_load(&self) -> Result<Arc<Vec<Stop>>, CatalogError> {
        if let Ok(stops) = self.stops().await {
            return Ok(stops);
        }

        debug!("Catalog not loaded, retrying");
        self.load().await?;
        self.stops().await
    }

    pub async fn find(&self, code: &str) -> Option<Stop> {
        match &*self.slot.read().await {
            CatalogSlot::Loaded(stops) => stops.iter().find(|s| s.code == code).cloned(),
            _ => None,
        }
    }
}
