use std::fmt;

use indexmap::IndexSet;
use log::info;
use serde::{Deserialize, Serialize};

use crate::augment::{AugmentConfig, DrawSource, augment};
use crate::error::{GramError, Result};
use crate::normalize::normalize;

/// Binary grammaticality label.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Label {
	/// Ungrammatical sentence (0).
	Incorrect,
	/// Well-formed sentence (1).
	Correct,
}

impl Label {
	pub fn as_u8(self) -> u8 {
		match self {
			Label::Incorrect => 0,
			Label::Correct => 1,
		}
	}

	/// Returns `None` for anything other than 0 or 1.
	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(Label::Incorrect),
			1 => Some(Label::Correct),
			_ => None,
		}
	}
}

impl fmt::Display for Label {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Label::Incorrect => write!(f, "Incorrect"),
			Label::Correct => write!(f, "Correct"),
		}
	}
}

/// A sentence and its label.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LabeledExample {
	pub text: String,
	pub label: Label,
}

impl LabeledExample {
	pub fn new(text: impl Into<String>, label: Label) -> Self {
		Self { text: text.into(), label }
	}
}

/// One row of the source grammar data: an ungrammatical sentence and its
/// standard form. Either side may be missing.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SentencePair {
	pub incorrect: Option<String>,
	pub correct: Option<String>,
}

impl SentencePair {
	pub fn new(incorrect: impl Into<String>, correct: impl Into<String>) -> Self {
		Self { incorrect: Some(incorrect.into()), correct: Some(correct.into()) }
	}
}

/// Builds the labeled training pool from sentence pairs.
///
/// 1. Non-blank sentences of each column are deduplicated (first-seen order).
/// 2. Incorrect sentences are labeled 0, correct ones 1.
/// 3. The correct pool is augmented twice, `augment_count` draws per label.
/// 4. Everything is concatenated, shuffled and normalized.
pub fn build_examples<D>(pairs: &[SentencePair], augment_count: usize, config: &AugmentConfig, draws: &mut D) -> Vec<LabeledExample>
where
	D: DrawSource + ?Sized,
{
	let incorrect = unique_non_blank(pairs.iter().map(|p| p.incorrect.as_deref()));
	let correct = unique_non_blank(pairs.iter().map(|p| p.correct.as_deref()));

	let mut examples: Vec<LabeledExample> = Vec::with_capacity(incorrect.len() + correct.len() + 2 * augment_count);
	examples.extend(incorrect.iter().map(|s| LabeledExample::new(*s, Label::Incorrect)));
	examples.extend(correct.iter().map(|s| LabeledExample::new(*s, Label::Correct)));
	examples.extend(augment(&correct, Label::Incorrect, augment_count, config, draws));
	examples.extend(augment(&correct, Label::Correct, augment_count, config, draws));

	draws.shuffle(&mut examples);
	for example in &mut examples {
		example.text = normalize(&example.text);
	}

	info!(
		"Built {} examples ({} incorrect, {} correct seeds)",
		examples.len(),
		incorrect.len(),
		correct.len()
	);
	examples
}

fn unique_non_blank<'a>(column: impl Iterator<Item = Option<&'a str>>) -> Vec<&'a str> {
	column
		.flatten()
		.filter(|s| !s.trim().is_empty())
		.collect::<IndexSet<_>>()
		.into_iter()
		.collect()
}

/// Shuffles `examples` and splits them into `(train, test)`.
///
/// The test split holds `ceil(len * test_fraction)` examples.
///
/// # Errors
/// Returns `InvalidConfig` if `test_fraction` is not strictly between 0 and 1.
pub fn train_test_split<D>(
	mut examples: Vec<LabeledExample>,
	test_fraction: f64,
	draws: &mut D,
) -> Result<(Vec<LabeledExample>, Vec<LabeledExample>)>
where
	D: DrawSource + ?Sized,
{
	if !(test_fraction > 0.0 && test_fraction < 1.0) {
		return Err(GramError::InvalidConfig(format!(
			"test fraction must be between 0 and 1 (exclusive), got {}",
			test_fraction
		)));
	}

	draws.shuffle(&mut examples);
	let n_test = ((examples.len() as f64) * test_fraction).ceil() as usize;
	let train = examples.split_off(n_test.min(examples.len()));
	Ok((train, examples))
}

/// Texts of a split, in order.
pub fn texts(examples: &[LabeledExample]) -> Vec<&str> {
	examples.iter().map(|e| e.text.as_str()).collect()
}

/// Labels of a split, in order.
pub fn labels(examples: &[LabeledExample]) -> Vec<Label> {
	examples.iter().map(|e| e.label).collect()
}
