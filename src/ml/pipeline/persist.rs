//! Zip-archive persistence for [`TrainedModel`].
//!
//! Layout:
//! - `manifest.json`: format version, stage topology, label vocabulary,
//!   featurizer state, classifier header and a blake3 digest of the parameters.
//! - `classifier/weights.f32le`, `classifier/bias.f32le`: raw little-endian
//!   parameters so reloaded models score bit-identically.
//!
//! The custom mapping is stored by name only and resolved against the caller's
//! [`MappingRegistry`] before a model is returned.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::TrainedModel;
use super::stage::{StageSpec, validate_chain};
use crate::ml::error::ModelError;
use crate::ml::logreg::LogRegModel;
use crate::ml::mapping::MappingRegistry;
use crate::ml::text::TextFeaturizer;
use crate::ml::vocab::LabelVocabulary;

/// Artifact format written by this crate.
pub const MODEL_FORMAT_VERSION: i64 = 1;

const MANIFEST_ENTRY: &str = "manifest.json";
const WEIGHTS_ENTRY: &str = "classifier/weights.f32le";
const BIAS_ENTRY: &str = "classifier/bias.f32le";

#[derive(Debug, Serialize, Deserialize)]
struct ModelManifest {
    format_version: i64,
    stages: Vec<StageSpec>,
    labels: LabelVocabulary,
    featurizer: TextFeaturizer,
    classifier: ClassifierHeader,
    parameters_blake3: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassifierHeader {
    feature_len: usize,
    n_classes: usize,
    temperature: f32,
}

impl TrainedModel {
    /// Serialize the model to `writer`.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<(), ModelError> {
        let weights = encode_f32le(&self.classifier.weights);
        let bias = encode_f32le(&self.classifier.bias);
        let manifest = ModelManifest {
            format_version: MODEL_FORMAT_VERSION,
            stages: self.stages.clone(),
            labels: self.labels.clone(),
            featurizer: self.featurizer.clone(),
            classifier: ClassifierHeader {
                feature_len: self.classifier.feature_len,
                n_classes: self.classifier.n_classes,
                temperature: self.classifier.temperature,
            },
            parameters_blake3: parameters_digest(&weights, &bias),
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest).map_err(std::io::Error::from)?;

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in [
            (MANIFEST_ENTRY, manifest_json.as_slice()),
            (WEIGHTS_ENTRY, weights.as_slice()),
            (BIAS_ENTRY, bias.as_slice()),
        ] {
            zip.start_file(name, options).map_err(zip_write_error)?;
            zip.write_all(data)?;
        }
        let archive = zip.finish().map_err(zip_write_error)?.into_inner();
        writer.write_all(&archive)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize the model to a file, creating parent directories as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        self.save(writer)?;
        tracing::info!("Saved model to {}", path.display());
        Ok(())
    }

    /// Reconstruct a model from bytes written by [`TrainedModel::save`].
    ///
    /// Every referenced custom mapping must be present in `registry`.
    pub fn load<R: Read>(mut reader: R, registry: &MappingRegistry) -> Result<Self, ModelError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|err| ModelError::ModelLoad(format!("invalid model archive: {err}")))?;

        let manifest: ModelManifest = serde_json::from_slice(&read_entry(
            &mut archive,
            MANIFEST_ENTRY,
        )?)
        .map_err(|err| ModelError::ModelLoad(format!("invalid manifest: {err}")))?;
        if manifest.format_version != MODEL_FORMAT_VERSION {
            return Err(ModelError::ModelLoad(format!(
                "unsupported format_version {} (expected {MODEL_FORMAT_VERSION})",
                manifest.format_version
            )));
        }
        let mapper = registry.resolve(validate_chain(&manifest.stages)?)?;

        let weights = read_entry(&mut archive, WEIGHTS_ENTRY)?;
        let bias = read_entry(&mut archive, BIAS_ENTRY)?;
        if parameters_digest(&weights, &bias) != manifest.parameters_blake3 {
            return Err(ModelError::ModelLoad(
                "classifier parameters digest mismatch".to_string(),
            ));
        }
        let classifier = LogRegModel {
            feature_len: manifest.classifier.feature_len,
            n_classes: manifest.classifier.n_classes,
            weights: decode_f32le(&weights)?,
            bias: decode_f32le(&bias)?,
            temperature: manifest.classifier.temperature,
        };
        classifier.validate().map_err(ModelError::ModelLoad)?;
        if classifier.n_classes != manifest.labels.len() {
            return Err(ModelError::ModelLoad(format!(
                "classifier has {} classes but vocabulary has {} labels",
                classifier.n_classes,
                manifest.labels.len()
            )));
        }
        if classifier.feature_len != manifest.featurizer.dimension() + 1 {
            return Err(ModelError::ModelLoad(format!(
                "classifier expects {} features but pipeline produces {}",
                classifier.feature_len,
                manifest.featurizer.dimension() + 1
            )));
        }

        Ok(Self::new(
            manifest.stages,
            mapper,
            manifest.featurizer,
            classifier,
            manifest.labels,
        ))
    }

    /// Load a model file written by [`TrainedModel::save_to_path`].
    pub fn load_from_path(path: &Path, registry: &MappingRegistry) -> Result<Self, ModelError> {
        let reader = BufReader::new(File::open(path)?);
        let model = Self::load(reader, registry)?;
        tracing::info!("Loaded model from {}", path.display());
        Ok(model)
    }
}

fn read_entry<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, ModelError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|err| ModelError::ModelLoad(format!("missing entry {name}: {err}")))?;
    let mut out = Vec::new();
    entry
        .read_to_end(&mut out)
        .map_err(|err| ModelError::ModelLoad(format!("corrupt entry {name}: {err}")))?;
    Ok(out)
}

fn zip_write_error(err: zip::result::ZipError) -> ModelError {
    match err {
        zip::result::ZipError::Io(source) => ModelError::Persistence(source),
        other => ModelError::Persistence(std::io::Error::other(other)),
    }
}

fn parameters_digest(weights: &[u8], bias: &[u8]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(weights);
    hasher.update(bias);
    hasher.finalize().to_hex().to_string()
}

fn encode_f32le(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_f32le(bytes: &[u8]) -> Result<Vec<f32>, ModelError> {
    if bytes.len() % 4 != 0 {
        return Err(ModelError::ModelLoad(
            "parameter blob size is not a multiple of 4".to_string(),
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FeatureRecord;
    use crate::ml::pipeline::PipelineBuilder;
    use tempfile::tempdir;

    fn trained() -> TrainedModel {
        let rows = vec![
            FeatureRecord::new("B738-ABC", "737"),
            FeatureRecord::new("A320-XYZ", "320"),
            FeatureRecord::new("QF73H-001", "737"),
            FeatureRecord::new("JQ320-002", "320"),
        ];
        PipelineBuilder::default().build().fit(&rows).unwrap()
    }

    fn saved_bytes(model: &TrainedModel) -> Vec<u8> {
        let mut bytes = Vec::new();
        model.save(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn reload_scores_bit_identically() {
        let model = trained();
        let registry = MappingRegistry::with_builtin().unwrap();
        let loaded = TrainedModel::load(saved_bytes(&model).as_slice(), &registry).unwrap();
        for code in ["B738-DEF", "A320-QQQ", "ZZZ", ""] {
            let before = model.predict(code).unwrap();
            let after = loaded.predict(code).unwrap();
            assert_eq!(before.predicted_label, after.predicted_label);
            let before_bits: Vec<u32> = before.scores.iter().map(|v| v.to_bits()).collect();
            let after_bits: Vec<u32> = after.scores.iter().map(|v| v.to_bits()).collect();
            assert_eq!(before_bits, after_bits);
        }
    }

    #[test]
    fn empty_registry_fails_with_unknown_mapping() {
        let bytes = saved_bytes(&trained());
        let err = TrainedModel::load(bytes.as_slice(), &MappingRegistry::empty()).unwrap_err();
        assert!(
            matches!(err, ModelError::UnknownCustomMapping { ref name } if name == "FlightCodeMapping")
        );
    }

    #[test]
    fn truncated_archive_is_a_load_error() {
        let bytes = saved_bytes(&trained());
        let registry = MappingRegistry::with_builtin().unwrap();
        let err = TrainedModel::load(&bytes[..bytes.len() / 2], &registry).unwrap_err();
        assert!(matches!(err, ModelError::ModelLoad(_)));
        assert!(err.is_persistence());
    }

    #[test]
    fn garbage_bytes_are_a_load_error() {
        let registry = MappingRegistry::with_builtin().unwrap();
        let err = TrainedModel::load(&b"not a model"[..], &registry).unwrap_err();
        assert!(matches!(err, ModelError::ModelLoad(_)));
    }

    #[test]
    fn save_to_unwritable_path_is_a_persistence_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let err = trained()
            .save_to_path(&blocker.join("model.zip"))
            .unwrap_err();
        assert!(matches!(err, ModelError::Persistence(_)));
    }

    #[test]
    fn path_round_trip_preserves_labels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models").join("savedmodel.zip");
        let model = trained();
        model.save_to_path(&path).unwrap();
        let registry = MappingRegistry::with_builtin().unwrap();
        let loaded = TrainedModel::load_from_path(&path, &registry).unwrap();
        assert_eq!(loaded.labels(), model.labels());
        assert_eq!(loaded.mapping_name(), "FlightCodeMapping");
    }

    #[test]
    fn f32le_rejects_ragged_blobs() {
        assert!(decode_f32le(&[0, 0, 0]).is_err());
        assert_eq!(decode_f32le(&encode_f32le(&[1.5, -2.0])).unwrap(), [1.5, -2.0]);
    }
}
