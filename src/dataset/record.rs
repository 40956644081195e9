use serde::{Deserialize, Serialize};

/// One labeled example: a flight code and its true IATA aircraft type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Operator-specific flight identifier used as the raw text feature.
    #[serde(rename = "FlightCode")]
    pub flight_code: String,
    /// IATA aircraft type code used as the classification target.
    #[serde(rename = "IATACode")]
    pub true_label: String,
}

impl FeatureRecord {
    pub fn new(flight_code: impl Into<String>, true_label: impl Into<String>) -> Self {
        Self {
            flight_code: flight_code.into(),
            true_label: true_label.into(),
        }
    }
}
