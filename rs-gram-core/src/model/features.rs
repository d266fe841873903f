use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{GramError, Result};
use crate::normalize::tokens;

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 20_000;

/// Feature extraction parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct VectorizerConfig {
	/// Maximum vocabulary size.
	pub max_features: usize,
	/// Smallest n-gram length (inclusive).
	pub min_n: usize,
	/// Largest n-gram length (inclusive).
	pub max_n: usize,
}

impl Default for VectorizerConfig {
	fn default() -> Self {
		Self { max_features: DEFAULT_MAX_FEATURES, min_n: 1, max_n: 3 }
	}
}

impl VectorizerConfig {
	pub fn validate(&self) -> Result<()> {
		if self.max_features == 0 {
			return Err(GramError::InvalidConfig("max_features must be > 0".to_owned()));
		}
		if self.min_n == 0 || self.min_n > self.max_n {
			return Err(GramError::InvalidConfig(format!(
				"invalid n-gram range ({}, {})",
				self.min_n, self.max_n
			)));
		}
		Ok(())
	}
}

/// Word n-grams of `text` for every length in `min_n..=max_n`, tokens joined
/// by a single space. Shorter lengths come first.
pub fn ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
	let tokens: Vec<&str> = tokens(text).collect();
	let mut grams = Vec::new();
	for n in min_n.max(1)..=max_n {
		if n > tokens.len() {
			break;
		}
		grams.extend(tokens.windows(n).map(|window| window.join(" ")));
	}
	grams
}

/// Sparse TF-IDF row: `(index, weight)` pairs sorted by index.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureVector {
	dimension: usize,
	entries: Vec<(usize, f64)>,
}

impl FeatureVector {
	/// Builds a vector from arbitrary entries. Entries are sorted by index.
	///
	/// Indices are not checked here; `ClassifierModel::train` rejects any
	/// entry at or past `dimension`.
	pub fn new(dimension: usize, mut entries: Vec<(usize, f64)>) -> Self {
		entries.sort_by_key(|(index, _)| *index);
		Self { dimension, entries }
	}

	/// Size of the vocabulary the vector was built against.
	pub fn dimension(&self) -> usize {
		self.dimension
	}

	pub fn entries(&self) -> &[(usize, f64)] {
		&self.entries
	}

	/// True when no vocabulary term occurred in the text.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Dot product with a dense weight vector. Indices past its end count as 0.
	pub fn dot(&self, weights: &[f64]) -> f64 {
		self.entries
			.iter()
			.map(|(index, weight)| weights.get(*index).map_or(0.0, |w| w * weight))
			.sum()
	}
}

/// Frozen n-gram vocabulary with learned inverse document frequencies.
///
/// Created once by `fit` and never updated afterwards: `transform` drops
/// n-grams it does not know.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FeatureVocabulary {
	min_n: usize,
	max_n: usize,
	max_features: usize,
	/// Term to column index.
	terms: HashMap<String, usize>,
	/// Inverse document frequency per column.
	idf: Vec<f64>,
}

impl FeatureVocabulary {
	/// Learns the vocabulary from normalized training texts.
	///
	/// Candidate n-grams are ranked by total term frequency across the
	/// split (ties: lexicographic) and the first `max_features` are kept.
	/// Kept terms are indexed in lexicographic order, and each gets the
	/// smoothed idf `ln((1 + N) / (1 + df)) + 1`.
	///
	/// # Errors
	/// Returns an error if `config` is invalid.
	pub fn fit<S: AsRef<str>>(texts: &[S], config: &VectorizerConfig) -> Result<Self> {
		config.validate()?;

		let mut term_freq: HashMap<String, usize> = HashMap::new();
		let mut doc_freq: HashMap<String, usize> = HashMap::new();

		for text in texts {
			let mut seen: HashMap<String, usize> = HashMap::new();
			for gram in ngrams(text.as_ref(), config.min_n, config.max_n) {
				*seen.entry(gram).or_insert(0) += 1;
			}
			for (gram, count) in seen {
				*term_freq.entry(gram.clone()).or_insert(0) += count;
				*doc_freq.entry(gram).or_insert(0) += 1;
			}
		}

		let candidates = term_freq.len();
		let mut ranked: Vec<(String, usize)> = term_freq.into_iter().collect();
		ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
		ranked.truncate(config.max_features);

		let mut kept: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
		kept.sort_unstable();

		let n_docs = texts.len() as f64;
		let idf: Vec<f64> = kept
			.iter()
			.map(|term| {
				let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
				((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
			})
			.collect();
		let terms: HashMap<String, usize> = kept.into_iter().enumerate().map(|(index, term)| (term, index)).collect();

		info!(
			"Fitted vocabulary: {} of {} candidate n-grams from {} texts",
			terms.len(),
			candidates,
			texts.len()
		);

		Ok(Self {
			min_n: config.min_n,
			max_n: config.max_n,
			max_features: config.max_features,
			terms,
			idf,
		})
	}

	/// Number of terms (the dimension of every produced vector).
	pub fn len(&self) -> usize {
		self.terms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	/// Configured cap; `len() <= capacity()` always holds.
	pub fn capacity(&self) -> usize {
		self.max_features
	}

	pub fn index_of(&self, term: &str) -> Option<usize> {
		self.terms.get(term).copied()
	}

	/// Converts one normalized text to its L2-normalized TF-IDF row.
	pub fn transform_one(&self, text: &str) -> FeatureVector {
		let mut counts: HashMap<usize, usize> = HashMap::new();
		for gram in ngrams(text, self.min_n, self.max_n) {
			if let Some(index) = self.terms.get(&gram) {
				*counts.entry(*index).or_insert(0) += 1;
			}
		}

		let mut entries: Vec<(usize, f64)> = counts
			.into_iter()
			.map(|(index, count)| (index, count as f64 * self.idf[index]))
			.collect();
		// Sort before summing so the norm does not depend on hash order
		entries.sort_by_key(|(index, _)| *index);

		let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
		if norm > 0.0 {
			for (_, weight) in &mut entries {
				*weight /= norm;
			}
		}

		FeatureVector { dimension: self.len(), entries }
	}

	/// Converts every text; unknown n-grams are silently dropped.
	pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> Vec<FeatureVector> {
		texts.iter().map(|text| self.transform_one(text.as_ref())).collect()
	}
}
