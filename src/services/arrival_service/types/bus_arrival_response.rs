#![allow(non_snake_case)]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NextBus {
    #[serde(default)]
    pub OriginCode: String,
    #[serde(default)]
    pub DestinationCode: String,
    /// RFC 3339 timestamp, empty when there is no prediction.
    #[serde(default)]
    pub EstimatedArrival: String,
    #[serde(default)]
    pub Load: String,
    #[serde(default)]
    pub Feature: String,
    #[serde(default)]
    pub Type: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BusArrivalService {
    pub ServiceNo: String,
    #[serde(default)]
    pub Operator: String,
    #[serde(default)]
    pub NextBus: Option<NextBus>,
    #[serde(default)]
    pub NextBus2: Option<NextBus>,
    #[serde(default)]
    pub NextBus3: Option<NextBus>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BusArrivalResponse {
    #[serde(default)]
    pub BusStopCode: String,
    #[serde(default)]
    pub Services: Vec<BusArrivalService>,
}
