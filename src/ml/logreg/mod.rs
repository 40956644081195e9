//! Multinomial logistic regression head over combined feature vectors.

use serde::{Deserialize, Serialize};

mod train;
pub use train::{TrainDataset, TrainOptions, train_logreg};

/// Fitted logistic regression parameters.
///
/// `weights` is row-major `[n_classes][feature_len]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRegModel {
    pub feature_len: usize,
    pub n_classes: usize,
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
    pub temperature: f32,
}

impl LogRegModel {
    /// Validate dimensions and parameter sanity.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_classes < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if self.weights.len() != self.n_classes * self.feature_len {
            return Err("weights length mismatch".to_string());
        }
        if self.bias.len() != self.n_classes {
            return Err("bias length mismatch".to_string());
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err("temperature must be > 0".to_string());
        }
        if self
            .weights
            .iter()
            .chain(self.bias.iter())
            .any(|v| !v.is_finite())
        {
            return Err("non-finite parameters".to_string());
        }
        Ok(())
    }

    /// Raw per-class logits for a feature vector.
    pub fn logits(&self, features: &[f32]) -> Vec<f32> {
        if features.len() != self.feature_len {
            return Vec::new();
        }
        let temp = self.temperature.max(1e-6);
        (0..self.n_classes)
            .map(|c| {
                let row = &self.weights[c * self.feature_len..(c + 1) * self.feature_len];
                let sum = self.bias[c]
                    + row
                        .iter()
                        .zip(features)
                        .map(|(w, x)| w * x)
                        .sum::<f32>();
                sum / temp
            })
            .collect()
    }

    /// Class probabilities for a feature vector; empty on dimension mismatch.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        softmax(&self.logits(features))
    }
}

/// Numerically-stable softmax.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut exps = Vec::with_capacity(raw.len());
    let mut sum = 0.0f32;
    for &v in raw {
        let e = (v - max).exp();
        exps.push(e);
        sum += e;
    }
    if sum == 0.0 {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    for v in &mut exps {
        *v /= sum;
    }
    exps
}

/// Index and value of the largest entry; ties resolve to the lowest index.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            Some((_, best_val)) if value <= best_val => {}
            _ => best = Some((idx, value)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_class_model() -> LogRegModel {
        LogRegModel {
            feature_len: 2,
            n_classes: 2,
            weights: vec![1.0, 0.0, 0.0, 1.0],
            bias: vec![0.0, 0.0],
            temperature: 1.0,
        }
    }

    #[test]
    fn probabilities_sum_to_one() {
        let model = two_class_model();
        model.validate().unwrap();
        let proba = model.predict_proba(&[2.0, 0.5]);
        let sum: f32 = proba.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(argmax(&proba).map(|(idx, _)| idx), Some(0));
    }

    #[test]
    fn dimension_mismatch_yields_empty_scores() {
        assert!(two_class_model().predict_proba(&[1.0]).is_empty());
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let mut model = two_class_model();
        model.bias.pop();
        assert!(model.validate().is_err());
        let mut model = two_class_model();
        model.weights[0] = f32::NAN;
        assert!(model.validate().is_err());
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.2, 0.7, 0.7]), Some((1, 0.7)));
        assert_eq!(argmax(&[]), None);
    }
}
