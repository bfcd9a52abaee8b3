use serde::{Deserialize, Serialize};

pub const ETA_SLOTS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occupancy {
    Low,
    Medium,
    High,
    Unknown,
}

impl Occupancy {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "SEA" => Occupancy::Low,
            "SDA" => Occupancy::Medium,
            "LSD" => Occupancy::High,
            _ => Occupancy::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VehicleType {
    SingleDeck,
    DoubleDeck,
    Bendy,
    Unknown,
}

impl VehicleType {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "SD" => VehicleType::SingleDeck,
            "DD" => VehicleType::DoubleDeck,
            "BD" => VehicleType::Bendy,
            _ => VehicleType::Unknown,
        }
    }
}

/// Upcoming arrivals of one service at one stop.
///
/// At least one entry of `eta_minutes` is always `Some`, and every `Some` is non-negative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrivalEstimate {
    pub service_number: String,
    pub operator: String,
    pub destination_label: String,
    pub eta_minutes: [Option<i64>; ETA_SLOTS],
    pub occupancy: Occupancy,
    pub vehicle_type: VehicleType,
    pub wheelchair_accessible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_map_to_unknown() {
        assert_eq!(Occupancy::from_code("XYZ"), Occupancy::Unknown);
        assert_eq!(Occupancy::from_code(""), Occupancy::Unknown);
        assert_eq!(VehicleType::from_code("XYZ"), VehicleType::Unknown);
        assert_eq!(VehicleType::from_code(""), VehicleType::Unknown);
    }

    #[test]
    fn known_codes() {
        assert_eq!(Occupancy::from_code("SEA"), Occupancy::Low);
        assert_eq!(Occupancy::from_code("SDA"), Occupancy::Medium);
        assert_eq!(Occupancy::from_code("LSD"), Occupancy::High);
        assert_eq!(VehicleType::from_code("SD"), VehicleType::SingleDeck);
        assert_eq!(VehicleType::from_code("DD"), VehicleType::DoubleDeck);
        assert_eq!(VehicleType::from_code("BD"), VehicleType::Bendy);
    }

    #[test]
    fn serialized_names() {
        assert_eq!(
            serde_json::to_string(&VehicleType::DoubleDeck).unwrap(),
            "\"double-deck\""
        );
        assert_eq!(serde_json::to_string(&Occupancy::High).unwrap(), "\"high\"");
    }
}
