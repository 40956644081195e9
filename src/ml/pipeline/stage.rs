//! Serializable description of the fixed transform chain.

use serde::{Deserialize, Serialize};

use crate::ml::error::ModelError;

pub const FLIGHT_CODE_COLUMN: &str = "FlightCode";
pub const IATA_CODE_COLUMN: &str = "IATACode";
pub const LABEL_COLUMN: &str = "Label";
pub const SPECIAL_FEATURE_COLUMN: &str = "SpecialFeature";
pub const FEATURIZED_COLUMN: &str = "FlightCodeFeaturized";
pub const FEATURES_COLUMN: &str = "Features";
pub const PREDICTED_LABEL_COLUMN: &str = "PredictedLabel";

/// One named stage of the pipeline topology.
///
/// Only names and column wiring are persisted; fitted state lives beside the
/// topology and custom mappings are re-bound by `name` at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageSpec {
    MapValueToKey {
        input: String,
        output: String,
    },
    CustomMapping {
        name: String,
        input: String,
        output: String,
    },
    FeaturizeText {
        input: String,
        output: String,
    },
    Concatenate {
        output: String,
        inputs: Vec<String>,
    },
    Classifier {
        label: String,
        features: String,
    },
    MapKeyToValue {
        input: String,
        output: String,
    },
}

impl StageSpec {
    /// Short stage label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MapValueToKey { .. } => "map_value_to_key",
            Self::CustomMapping { .. } => "custom_mapping",
            Self::FeaturizeText { .. } => "featurize_text",
            Self::Concatenate { .. } => "concatenate",
            Self::Classifier { .. } => "classifier",
            Self::MapKeyToValue { .. } => "map_key_to_value",
        }
    }
}

/// The flight-code chain: label encode, custom feature, featurize, concatenate,
/// classify, label decode.
pub fn flight_code_chain(mapping_name: &str) -> Vec<StageSpec> {
    vec![
        StageSpec::MapValueToKey {
            input: IATA_CODE_COLUMN.to_string(),
            output: LABEL_COLUMN.to_string(),
        },
        StageSpec::CustomMapping {
            name: mapping_name.to_string(),
            input: FLIGHT_CODE_COLUMN.to_string(),
            output: SPECIAL_FEATURE_COLUMN.to_string(),
        },
        StageSpec::FeaturizeText {
            input: FLIGHT_CODE_COLUMN.to_string(),
            output: FEATURIZED_COLUMN.to_string(),
        },
        StageSpec::Concatenate {
            output: FEATURES_COLUMN.to_string(),
            inputs: vec![
                FEATURIZED_COLUMN.to_string(),
                SPECIAL_FEATURE_COLUMN.to_string(),
            ],
        },
        StageSpec::Classifier {
            label: LABEL_COLUMN.to_string(),
            features: FEATURES_COLUMN.to_string(),
        },
        StageSpec::MapKeyToValue {
            input: PREDICTED_LABEL_COLUMN.to_string(),
            output: PREDICTED_LABEL_COLUMN.to_string(),
        },
    ]
}

/// Check a persisted topology against the fixed chain and return the custom
/// mapping name it references.
pub(crate) fn validate_chain(stages: &[StageSpec]) -> Result<&str, ModelError> {
    let name = match stages.get(1) {
        Some(StageSpec::CustomMapping { name, .. }) => name.as_str(),
        _ => {
            return Err(ModelError::ModelLoad(
                "stage 2 must be a custom mapping".to_string(),
            ));
        }
    };
    if stages != flight_code_chain(name).as_slice() {
        let kinds: Vec<&str> = stages.iter().map(StageSpec::kind).collect();
        return Err(ModelError::ModelLoad(format!(
            "unsupported stage topology [{}]",
            kinds.join(", ")
        )));
    }
    Ok(name)
}
