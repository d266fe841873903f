use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::augment::AugmentConfig;
use crate::error::{GramError, Result};
use crate::model::classifier::ClassifierConfig;
use crate::model::features::VectorizerConfig;
use crate::model::ngram_model::{DEFAULT_ORDER, DEFAULT_TOP_K};

/// Every tunable of a training run.
///
/// Missing TOML keys fall back to the defaults:
///
/// ```toml
/// augment_count = 8000
/// test_fraction = 0.2
/// seed = 42
/// ngram_order = 3
/// top_k = 3
///
/// [classifier]
/// inverse_regularization_strength = 100.0
/// max_iterations = 2000
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
	/// Draws per augmentation pool (one pool per label).
	pub augment_count: usize,
	/// Share of examples held out for evaluation.
	pub test_fraction: f64,
	/// Seed for augmentation, shuffling and splitting.
	pub seed: u64,
	/// Language model order.
	pub ngram_order: usize,
	/// Suggestions per query.
	pub top_k: usize,
	pub augment: AugmentConfig,
	pub vectorizer: VectorizerConfig,
	pub classifier: ClassifierConfig,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			augment_count: 8000,
			test_fraction: 0.2,
			seed: 42,
			ngram_order: DEFAULT_ORDER,
			top_k: DEFAULT_TOP_K,
			augment: AugmentConfig::default(),
			vectorizer: VectorizerConfig::default(),
			classifier: ClassifierConfig::default(),
		}
	}
}

impl PipelineConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a TOML file.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		Self::from_toml_str(&std::fs::read_to_string(path)?)
	}

	pub fn validate(&self) -> Result<()> {
		if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
			return Err(GramError::InvalidConfig(format!(
				"test_fraction must be between 0 and 1 (exclusive), got {}",
				self.test_fraction
			)));
		}
		if self.ngram_order < 2 {
			return Err(GramError::InvalidConfig(format!("ngram_order must be >= 2, got {}", self.ngram_order)));
		}
		self.augment.validate()?;
		self.vectorizer.validate()?;
		self.classifier.validate()
	}
}
