use log::{debug, info, log_enabled, Level};
use serde::{Deserialize, Serialize};

use super::features::FeatureVector;
use crate::dataset::Label;
use crate::error::{GramError, Result};

/// Logistic-regression training parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
	/// `C`: larger values mean weaker L2 regularization.
	pub inverse_regularization_strength: f64,
	/// Upper bound on gradient steps.
	pub max_iterations: usize,
	/// Step size as a fraction of `1 / L`, where `L` bounds the curvature
	/// of the objective. Must lie in `(0, 2)`.
	pub learning_rate: f64,
	/// Training stops once every gradient component is below this value.
	pub tolerance: f64,
}

impl Default for ClassifierConfig {
	fn default() -> Self {
		Self {
			inverse_regularization_strength: 100.0,
			max_iterations: 2000,
			learning_rate: 1.0,
			tolerance: 1e-4,
		}
	}
}

impl ClassifierConfig {
	pub fn validate(&self) -> Result<()> {
		if !(self.inverse_regularization_strength > 0.0) {
			return Err(GramError::InvalidConfig(format!(
				"inverse regularization strength must be > 0, got {}",
				self.inverse_regularization_strength
			)));
		}
		if !(self.learning_rate > 0.0 && self.learning_rate < 2.0) {
			return Err(GramError::InvalidConfig(format!(
				"learning rate must be in (0, 2), got {}",
				self.learning_rate
			)));
		}
		Ok(())
	}
}

/// Linear decision boundary over a frozen feature vocabulary.
///
/// Immutable once trained; retraining produces a new model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClassifierModel {
	weights: Vec<f64>,
	bias: f64,
	iterations: usize,
}

fn sigmoid(z: f64) -> f64 {
	if z >= 0.0 {
		1.0 / (1.0 + (-z).exp())
	} else {
		let e = z.exp();
		e / (1.0 + e)
	}
}

fn target(label: Label) -> f64 {
	match label {
		Label::Incorrect => 0.0,
		Label::Correct => 1.0,
	}
}

impl ClassifierModel {
	/// Fits an L2-regularized logistic regression.
	///
	/// Minimizes `0.5 * |w|^2 + C * sum(logloss)` (scaled by `1 / (C * N)`)
	/// with full-batch gradient descent. The intercept is not regularized.
	/// The step is `learning_rate / L` with
	/// `L = 1 / (C * N) + 0.25 * max(|x|^2 + 1)`, so any valid config
	/// descends regardless of `C`.
	///
	/// # Errors
	/// - `InsufficientData` on zero examples, a single class, or a
	///   label count that differs from the feature count.
	/// - `InvalidConfig` on a bad config, mixed vector dimensions, an entry
	///   index outside its vector's dimension, a non-finite entry, or a
	///   model that ends up non-finite.
	pub fn train(features: &[FeatureVector], labels: &[Label], config: &ClassifierConfig) -> Result<Self> {
		config.validate()?;

		if features.is_empty() {
			return Err(GramError::InsufficientData("no training examples".to_owned()));
		}
		if features.len() != labels.len() {
			return Err(GramError::InsufficientData(format!(
				"{} feature vectors but {} labels",
				features.len(),
				labels.len()
			)));
		}
		let positives = labels.iter().filter(|label| **label == Label::Correct).count();
		if positives == 0 || positives == labels.len() {
			return Err(GramError::InsufficientData(
				"training labels contain a single class".to_owned(),
			));
		}

		let dimension = features[0].dimension();
		if let Some(other) = features.iter().find(|f| f.dimension() != dimension) {
			return Err(GramError::InvalidConfig(format!(
				"mixed feature dimensions: {} and {}",
				dimension,
				other.dimension()
			)));
		}

		for feature in features {
			if let Some((index, value)) = feature
				.entries()
				.iter()
				.find(|(index, value)| *index >= dimension || !value.is_finite())
			{
				return Err(GramError::InvalidConfig(format!(
					"bad feature entry ({}, {}) for dimension {}",
					index, value, dimension
				)));
			}
		}

		let n = features.len() as f64;
		let penalty = 1.0 / (config.inverse_regularization_strength * n);
		let widest = features
			.iter()
			.map(|f| f.entries().iter().map(|(_, v)| v * v).sum::<f64>() + 1.0)
			.fold(0.0, f64::max);
		let step = config.learning_rate / (penalty + 0.25 * widest);
		let mut weights = vec![0.0; dimension];
		let mut bias = 0.0;
		let mut gradient = vec![0.0; dimension];
		let mut iterations = 0;

		while iterations < config.max_iterations {
			gradient.iter_mut().zip(&weights).for_each(|(g, w)| *g = penalty * w);
			let mut bias_gradient = 0.0;

			for (feature, label) in features.iter().zip(labels) {
				let error = (sigmoid(feature.dot(&weights) + bias) - target(*label)) / n;
				for (index, value) in feature.entries() {
					gradient[*index] += error * value;
				}
				bias_gradient += error;
			}

			let largest = gradient.iter().fold(bias_gradient.abs(), |acc, g| acc.max(g.abs()));
			if largest < config.tolerance {
				debug!("Converged after {} iterations (gradient {:.3e})", iterations, largest);
				break;
			}

			for (w, g) in weights.iter_mut().zip(&gradient) {
				*w -= step * g;
			}
			bias -= step * bias_gradient;
			iterations += 1;

			if iterations % 100 == 0 && log_enabled!(Level::Debug) {
				let loss = Self::log_loss(&weights, bias, features, labels);
				debug!("iteration {}: log-loss {:.6}", iterations, loss);
			}
		}

		if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
			return Err(GramError::InvalidConfig(format!(
				"training diverged after {} iterations",
				iterations
			)));
		}

		info!(
			"Trained classifier on {} examples ({} positive) over {} features in {} iterations",
			features.len(),
			positives,
			dimension,
			iterations
		);

		Ok(Self { weights, bias, iterations })
	}

	fn log_loss(weights: &[f64], bias: f64, features: &[FeatureVector], labels: &[Label]) -> f64 {
		let total: f64 = features
			.iter()
			.zip(labels)
			.map(|(feature, label)| {
				let p = sigmoid(feature.dot(weights) + bias).clamp(1e-15, 1.0 - 1e-15);
				match label {
					Label::Correct => -p.ln(),
					Label::Incorrect => -(1.0 - p).ln(),
				}
			})
			.sum();
		total / features.len() as f64
	}

	/// Signed distance-like score: positive favors `Correct`.
	pub fn decision_score(&self, feature: &FeatureVector) -> f64 {
		feature.dot(&self.weights) + self.bias
	}

	/// Probability of `Correct`.
	pub fn probability(&self, feature: &FeatureVector) -> f64 {
		sigmoid(self.decision_score(feature))
	}

	/// `Correct` only when the score is strictly positive; a zero score is `Incorrect`.
	pub fn predict(&self, feature: &FeatureVector) -> Label {
		if self.decision_score(feature) > 0.0 { Label::Correct } else { Label::Incorrect }
	}

	pub fn predict_batch(&self, features: &[FeatureVector]) -> Vec<Label> {
		features.iter().map(|feature| self.predict(feature)).collect()
	}

	pub fn dimension(&self) -> usize {
		self.weights.len()
	}

	pub fn weights(&self) -> &[f64] {
		&self.weights
	}

	pub fn bias(&self) -> f64 {
		self.bias
	}

	/// Gradient steps taken during training.
	pub fn iterations(&self) -> usize {
		self.iterations
	}
}
