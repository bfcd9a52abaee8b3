use serde::{Deserialize, Serialize};

/// A bus stop as listed in the stop catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub code: String,
    pub name: String,
    pub road: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A [`Stop`] with its distance from the user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedStop {
    #[serde(flatten)]
    pub stop: Stop,
    pub distance_meters: f64,
    pub distance_label: String,
}
