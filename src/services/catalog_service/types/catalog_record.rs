#![allow(non_snake_case)]
use serde::{Deserialize, Serialize};

pub const REQUIRED_COLUMNS: [&str; 5] = [
    "BusStopCode",
    "Description",
    "RoadName",
    "Latitude",
    "Longitude",
];

/// One raw catalog row. Every column is read as text so a bad cell skips the row instead of
/// failing the whole file.
#[derive(Deserialize, Serialize)]
pub struct CatalogRecord {
    #[serde(default)]
    pub BusStopCode: String,
    #[serde(default)]
    pub Description: String,
    #[serde(default)]
    pub RoadName: String,
    #[serde(default)]
    pub Latitude: String,
    #[serde(default)]
    pub Longitude: String,
}
