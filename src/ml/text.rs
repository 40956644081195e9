//! Bag-of-n-grams text featurizer.
//!
//! Text is lower-cased and split into word n-grams and boundary-marked
//! character n-grams. Fitting keeps the most frequent n-grams as a frozen
//! vocabulary; transforming yields an L2-normalized term-frequency vector whose
//! width equals the vocabulary size.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Featurizer knobs, persisted with the fitted vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturizerOptions {
    /// Character n-gram length (0 disables character grams).
    pub char_ngram: usize,
    /// Longest word n-gram (0 disables word grams).
    pub word_ngram: usize,
    /// Upper bound on vocabulary size.
    pub max_vocabulary: usize,
    /// Minimum corpus count for an n-gram to enter the vocabulary.
    pub min_count: u32,
}

impl Default for FeaturizerOptions {
    fn default() -> Self {
        Self {
            char_ngram: 3,
            word_ngram: 2,
            max_vocabulary: 20_000,
            min_count: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeaturizerState {
    options: FeaturizerOptions,
    terms: Vec<String>,
}

/// Fitted text featurizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "FeaturizerState", into = "FeaturizerState")]
pub struct TextFeaturizer {
    options: FeaturizerOptions,
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl TextFeaturizer {
    /// Build the n-gram vocabulary from training texts.
    pub fn fit<'a, I>(texts: I, options: &FeaturizerOptions) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for text in texts {
            for gram in ngrams(text, options) {
                *counts.entry(gram).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(String, u32)> = counts
            .into_iter()
            .filter(|(_, count)| *count >= options.min_count.max(1))
            .collect();
        // Stable sort keeps lexical order among equal counts.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(options.max_vocabulary);
        let terms = ranked.into_iter().map(|(term, _)| term).collect();
        Self::from(FeaturizerState {
            options: options.clone(),
            terms,
        })
    }

    /// Width of the produced feature vector.
    pub fn dimension(&self) -> usize {
        self.terms.len()
    }

    pub fn options(&self) -> &FeaturizerOptions {
        &self.options
    }

    /// Featurize into a freshly allocated vector.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut out = vec![0.0f32; self.dimension()];
        self.transform_into(text, &mut out);
        out
    }

    /// Featurize into `out`, which must be at least [`Self::dimension`] long.
    pub fn transform_into(&self, text: &str, out: &mut [f32]) {
        let out = &mut out[..self.dimension()];
        out.fill(0.0);
        for gram in ngrams(text, &self.options) {
            if let Some(&idx) = self.index.get(&gram) {
                out[idx] += 1.0;
            }
        }
        let norm = out.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in out.iter_mut() {
                *v /= norm;
            }
        }
    }
}

impl From<FeaturizerState> for TextFeaturizer {
    fn from(state: FeaturizerState) -> Self {
        let index = state
            .terms
            .iter()
            .cloned()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();
        Self {
            options: state.options,
            terms: state.terms,
            index,
        }
    }
}

impl From<TextFeaturizer> for FeaturizerState {
    fn from(featurizer: TextFeaturizer) -> Self {
        Self {
            options: featurizer.options,
            terms: featurizer.terms,
        }
    }
}

fn ngrams(text: &str, options: &FeaturizerOptions) -> Vec<String> {
    let normalized = text.to_lowercase();
    let mut grams = Vec::new();

    if options.word_ngram > 0 {
        let words: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        for n in 1..=options.word_ngram {
            for window in words.windows(n) {
                grams.push(format!("w:{}", window.join(" ")));
            }
        }
    }

    if options.char_ngram > 0 && !normalized.is_empty() {
        let chars: Vec<char> = std::iter::once('<')
            .chain(normalized.chars())
            .chain(std::iter::once('>'))
            .collect();
        let n = options.char_ngram.min(chars.len());
        for window in chars.windows(n) {
            let mut gram = String::with_capacity(2 + n);
            gram.push_str("c:");
            gram.extend(window);
            grams.push(gram);
        }
    }

    grams
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ngrams_cover_words_and_marked_chars() {
        let grams = ngrams("B7-x", &FeaturizerOptions::default());
        assert!(grams.contains(&"w:b7".to_string()));
        assert!(grams.contains(&"w:b7 x".to_string()));
        assert!(grams.contains(&"c:<b7".to_string()));
        assert!(grams.contains(&"c:-x>".to_string()));
    }

    #[test]
    fn transform_is_normalized_and_deterministic() {
        let featurizer = TextFeaturizer::fit(
            ["B738-ABC", "A320-XYZ"],
            &FeaturizerOptions::default(),
        );
        assert!(featurizer.dimension() > 0);
        let a = featurizer.transform("B738-DEF");
        let b = featurizer.transform("B738-DEF");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn unseen_text_maps_to_zero_vector() {
        let featurizer = TextFeaturizer::fit(["aaa"], &FeaturizerOptions::default());
        assert!(featurizer.transform("zzz").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn vocabulary_cap_keeps_most_frequent() {
        let options = FeaturizerOptions {
            char_ngram: 0,
            word_ngram: 1,
            max_vocabulary: 1,
            min_count: 1,
        };
        let featurizer = TextFeaturizer::fit(["qf qf", "qf ba"], &options);
        assert_eq!(featurizer.dimension(), 1);
        assert_eq!(featurizer.transform("qf"), vec![1.0]);
    }

    #[test]
    fn state_round_trips_through_json() {
        let featurizer = TextFeaturizer::fit(["B738-ABC"], &FeaturizerOptions::default());
        let json = serde_json::to_string(&featurizer).unwrap();
        let back: TextFeaturizer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transform("B738-ABC"), featurizer.transform("B738-ABC"));
    }
}
