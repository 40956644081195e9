//! Evaluation metrics for classification models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    /// Add another matrix of the same shape into this one.
    pub fn merge(&mut self, other: &ConfusionMatrix) {
        if other.n_classes != self.n_classes {
            return;
        }
        for (into, from) in self.counts.iter_mut().zip(&other.counts) {
            *into = into.saturating_add(*from);
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&v| v as u64).sum()
    }

    /// Off-diagonal cells sorted by count, largest first: `(count, truth, predicted)`.
    pub fn top_confusions(&self, limit: usize) -> Vec<(u32, usize, usize)> {
        let mut confusions = Vec::new();
        for truth in 0..self.n_classes {
            for predicted in 0..self.n_classes {
                if truth == predicted {
                    continue;
                }
                let count = self.get(truth, predicted);
                if count > 0 {
                    confusions.push((count, truth, predicted));
                }
            }
        }
        confusions.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
        confusions.truncate(limit);
        confusions
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Precision/recall statistics for a single class.
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f32,
    /// `TP / (TP + FN)`.
    pub recall: f32,
    /// Total number of true examples for the class.
    pub support: u32,
}

impl PerClassStats {
    pub fn f1(&self) -> f32 {
        f1_score(self.precision, self.recall)
    }
}

/// Compute per-class precision and recall from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f32;
        let mut fp = 0f32;
        let mut fn_ = 0f32;
        let mut support = 0u32;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f32;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f32;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        stats.push(PerClassStats {
            precision,
            recall,
            support,
        });
    }
    stats
}

pub fn f1_score(precision: f32, recall: f32) -> f32 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}
