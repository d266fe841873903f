use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::classifier::{ClassifierConfig, ClassifierModel};
use super::features::{FeatureVocabulary, VectorizerConfig};
use super::metrics::{Evaluation, evaluate};
use crate::config::PipelineConfig;
use crate::dataset::{Label, LabeledExample, SentencePair, build_examples, labels, texts, train_test_split};
use crate::error::{GramError, Result};
use crate::normalize::normalize;

/// Grammar classifier bundled with the vocabulary it was trained against.
///
/// Both parts are frozen together; classifying raw text normalizes it and
/// projects it onto the same vocabulary.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GrammarChecker {
	vocabulary: FeatureVocabulary,
	model: ClassifierModel,
}

impl GrammarChecker {
	/// Fits the vocabulary and the classifier on a normalized training split.
	///
	/// # Errors
	/// `InsufficientData` on an empty or single-class split.
	pub fn train(examples: &[LabeledExample], vectorizer: &VectorizerConfig, classifier: &ClassifierConfig) -> Result<Self> {
		if examples.is_empty() {
			return Err(GramError::InsufficientData("no training examples".to_owned()));
		}

		let texts = texts(examples);
		let vocabulary = FeatureVocabulary::fit(&texts, vectorizer)?;
		let features = vocabulary.transform(&texts);
		let model = ClassifierModel::train(&features, &labels(examples), classifier)?;

		Ok(Self { vocabulary, model })
	}

	/// Builds the augmented dataset from sentence pairs, splits it, trains
	/// on the training part and evaluates on the held-out part.
	///
	/// All randomness comes from one generator seeded with `config.seed`.
	pub fn from_pairs(pairs: &[SentencePair], config: &PipelineConfig) -> Result<(Self, Evaluation)> {
		config.validate()?;

		let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
		let examples = build_examples(pairs, config.augment_count, &config.augment, &mut rng);
		let (train, test) = train_test_split(examples, config.test_fraction, &mut rng)?;

		let checker = Self::train(&train, &config.vectorizer, &config.classifier)?;
		let evaluation = checker.evaluate(&test)?;
		Ok((checker, evaluation))
	}

	/// Classifies raw text.
	pub fn check(&self, raw: &str) -> Label {
		self.model.predict(&self.vocabulary.transform_one(&normalize(raw)))
	}

	/// Classifies each raw text independently.
	pub fn check_batch<S: AsRef<str>>(&self, raws: &[S]) -> Vec<Label> {
		raws.iter().map(|raw| self.check(raw.as_ref())).collect()
	}

	/// Probability that raw text is well-formed.
	pub fn probability(&self, raw: &str) -> f64 {
		self.model.probability(&self.vocabulary.transform_one(&normalize(raw)))
	}

	/// Scores a held-out split.
	pub fn evaluate(&self, examples: &[LabeledExample]) -> Result<Evaluation> {
		let predicted = self.check_batch(&texts(examples));
		evaluate(&labels(examples), &predicted)
	}

	pub fn vocabulary(&self) -> &FeatureVocabulary {
		&self.vocabulary
	}

	pub fn model(&self) -> &ClassifierModel {
		&self.model
	}
}
