use super::{DerivedFeature, FeatureMapper};
use crate::ml::error::ModelError;

/// Substrings marking a Boeing 737-800 in a flight code.
const SPECIAL_MARKERS: [&str; 2] = ["B738", "73H"];

/// Flags flight codes that mention a Boeing 737-800.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlightCodeMapping;

impl FlightCodeMapping {
    pub const NAME: &'static str = "FlightCodeMapping";
}

impl FeatureMapper for FlightCodeMapping {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn map(&self, flight_code: Option<&str>) -> Result<DerivedFeature, ModelError> {
        let code = flight_code
            .ok_or_else(|| ModelError::invalid_input("flight code is required"))?;
        let special = SPECIAL_MARKERS.iter().any(|marker| code.contains(marker));
        Ok(DerivedFeature::from_flag(special))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn special(code: &str) -> f32 {
        FlightCodeMapping.map(Some(code)).unwrap().special_feature
    }

    #[test]
    fn markers_produce_exactly_one() {
        assert_eq!(special("B738x"), 1.0);
        assert_eq!(special("A73H2"), 1.0);
        assert_eq!(special("QFB738-73H"), 1.0);
    }

    #[test]
    fn other_codes_produce_exactly_zero() {
        assert_eq!(special("A320"), 0.0);
        assert_eq!(special(""), 0.0);
        assert_eq!(special("b738"), 0.0);
        assert_eq!(special("B73-8"), 0.0);
    }

    #[test]
    fn missing_code_is_invalid_input() {
        let err = FlightCodeMapping.map(None).unwrap_err();
        assert!(matches!(err, ModelError::InvalidInput { .. }));
    }
}
