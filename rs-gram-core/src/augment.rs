use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::{Label, LabeledExample};
use crate::error::{GramError, Result};
use crate::normalize::tokens;

/// Source of random draws used by augmentation, shuffling and splitting.
///
/// Every `rand::Rng` is a `DrawSource`. Tests can implement the trait on a
/// scripted sequence to assert exact outputs.
pub trait DrawSource {
	/// Uniform index in `0..len`. `len` is always > 0.
	fn pick(&mut self, len: usize) -> usize;

	/// Uniform value in `[0, 1)`.
	fn unit(&mut self) -> f64;

	/// Fisher-Yates shuffle driven by `pick`.
	fn shuffle<T>(&mut self, items: &mut [T]) {
		for i in (1..items.len()).rev() {
			let j = self.pick(i + 1);
			items.swap(i, j);
		}
	}
}

impl<R: Rng> DrawSource for R {
	fn pick(&mut self, len: usize) -> usize {
		self.random_range(0..len)
	}

	fn unit(&mut self) -> f64 {
		self.random::<f64>()
	}
}

/// Mix of noise strategies used for label-0 augmentation.
///
/// A unit draw `u` selects the strategy:
/// - `u < deletion_probability`: delete one random token
/// - `u <= deletion_probability + swap_probability`: swap one adjacent pair
/// - otherwise: shuffle every token
///
/// The defaults shuffle 80% of the time and swap the remaining 20%.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AugmentConfig {
	pub swap_probability: f64,
	pub deletion_probability: f64,
}

impl Default for AugmentConfig {
	fn default() -> Self {
		Self { swap_probability: 0.2, deletion_probability: 0.0 }
	}
}

impl AugmentConfig {
	/// Checks both probabilities are in `[0, 1]` and sum to at most 1.
	pub fn validate(&self) -> Result<()> {
		let valid = (0.0..=1.0).contains(&self.swap_probability)
			&& (0.0..=1.0).contains(&self.deletion_probability)
			&& self.swap_probability + self.deletion_probability <= 1.0;
		if !valid {
			return Err(GramError::InvalidConfig(format!(
				"augmentation probabilities must be in [0, 1] and sum to <= 1, got swap={} deletion={}",
				self.swap_probability, self.deletion_probability
			)));
		}
		Ok(())
	}
}

/// Generates synthetic labeled examples from seed sentences.
///
/// Performs `count` draws (with replacement) from `seeds`:
/// - `Label::Correct`: the seed is emitted verbatim (class balancing).
/// - `Label::Incorrect`: the seed's tokens are scrambled (see `AugmentConfig`).
///   Seeds with fewer than two tokens are skipped without a retry, so the
///   realized count can be lower than `count`.
///
/// This is heuristic noise injection, not an error model: the "incorrect"
/// class is built only by scrambling correct seeds, so it is biased toward
/// shuffled and swapped variants rather than naturally occurring errors.
///
/// Returns an empty vector when `seeds` is empty.
pub fn augment<S, D>(seeds: &[S], label: Label, count: usize, config: &AugmentConfig, draws: &mut D) -> Vec<LabeledExample>
where
	S: AsRef<str>,
	D: DrawSource + ?Sized,
{
	let mut augmented = Vec::new();
	if seeds.is_empty() {
		return augmented;
	}

	for _ in 0..count {
		let text = seeds[draws.pick(seeds.len())].as_ref();

		match label {
			Label::Correct => augmented.push(LabeledExample::new(text, label)),
			Label::Incorrect => {
				let mut words: Vec<&str> = tokens(text).collect();
				if words.len() < 2 {
					continue;
				}
				scramble(&mut words, config, draws);
				augmented.push(LabeledExample::new(words.join(" "), label));
			}
		}
	}

	info!("Generated {} augmented samples for label {}", augmented.len(), label.as_u8());
	augmented
}

/// Applies one noise strategy to `words` (which holds at least two tokens).
fn scramble<D: DrawSource + ?Sized>(words: &mut Vec<&str>, config: &AugmentConfig, draws: &mut D) {
	let u = draws.unit();
	if u < config.deletion_probability {
		let idx = draws.pick(words.len());
		words.remove(idx);
	} else if u <= config.deletion_probability + config.swap_probability {
		let idx = draws.pick(words.len() - 1);
		words.swap(idx, idx + 1);
	} else {
		draws.shuffle(words);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand_chacha::ChaCha8Rng;
	use std::collections::VecDeque;

	/// Replays a fixed script of draws.
	struct Scripted {
		picks: VecDeque<usize>,
		units: VecDeque<f64>,
	}

	impl Scripted {
		fn new(picks: &[usize], units: &[f64]) -> Self {
			Self { picks: picks.iter().copied().collect(), units: units.iter().copied().collect() }
		}
	}

	impl DrawSource for Scripted {
		fn pick(&mut self, len: usize) -> usize {
			self.picks.pop_front().expect("script exhausted") % len
		}

		fn unit(&mut self) -> f64 {
			self.units.pop_front().expect("script exhausted")
		}
	}

	const SEEDS: [&str; 3] = ["she goes to the store", "the cat drinks milk", "they are playing soccer"];

	#[test]
	fn correct_label_duplicates_seeds() {
		let mut draws = Scripted::new(&[2, 0, 2], &[]);
		let out = augment(&SEEDS, Label::Correct, 3, &AugmentConfig::default(), &mut draws);
		let texts: Vec<&str> = out.iter().map(|e| e.text.as_str()).collect();
		assert_eq!(texts, vec![SEEDS[2], SEEDS[0], SEEDS[2]]);
		assert!(out.iter().all(|e| e.label == Label::Correct));
	}

	#[test]
	fn low_draw_swaps_an_adjacent_pair() {
		// seed index 1, unit 0.2 (swap branch, inclusive), swap position 2
		let mut draws = Scripted::new(&[1, 2], &[0.2]);
		let out = augment(&SEEDS, Label::Incorrect, 1, &AugmentConfig::default(), &mut draws);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].text, "the cat milk drinks");
		assert_eq!(out[0].label, Label::Incorrect);
	}

	#[test]
	fn high_draw_shuffles_every_token() {
		// seed index 1 then one Fisher-Yates pick per i = 3, 2, 1
		let mut draws = Scripted::new(&[1, 0, 0, 0], &[0.9]);
		let out = augment(&SEEDS, Label::Incorrect, 1, &AugmentConfig::default(), &mut draws);
		// [the cat drinks milk] -> swap(3,0) -> [milk cat drinks the]
		// -> swap(2,0) -> [drinks cat milk the] -> swap(1,0) -> [cat drinks milk the]
		assert_eq!(out[0].text, "cat drinks milk the");
	}

	#[test]
	fn deletion_is_opt_in() {
		let config = AugmentConfig { swap_probability: 0.2, deletion_probability: 0.3 };
		let mut draws = Scripted::new(&[0, 1], &[0.1]);
		let out = augment(&SEEDS, Label::Incorrect, 1, &config, &mut draws);
		assert_eq!(out[0].text, "she to the store");
	}

	#[test]
	fn single_token_seeds_are_skipped_not_retried() {
		let seeds = ["hello", "good morning"];
		let mut draws = Scripted::new(&[0, 0, 1, 0], &[0.0]);
		let out = augment(&seeds, Label::Incorrect, 3, &AugmentConfig::default(), &mut draws);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].text, "morning good");
	}

	#[test]
	fn empty_seeds_yield_nothing() {
		let seeds: [&str; 0] = [];
		let mut rng = ChaCha8Rng::seed_from_u64(1);
		assert!(augment(&seeds, Label::Incorrect, 100, &AugmentConfig::default(), &mut rng).is_empty());
	}

	#[test]
	fn same_seed_same_output() {
		let run = |seed| {
			let mut rng = ChaCha8Rng::seed_from_u64(seed);
			augment(&SEEDS, Label::Incorrect, 200, &AugmentConfig::default(), &mut rng)
		};
		assert_eq!(run(42), run(42));
		assert_ne!(run(42), run(7));
	}

	#[test]
	fn every_output_carries_the_requested_label() {
		let mut rng = ChaCha8Rng::seed_from_u64(3);
		for label in [Label::Incorrect, Label::Correct] {
			let out = augment(&SEEDS, label, 100, &AugmentConfig::default(), &mut rng);
			assert_eq!(out.len(), 100);
			assert!(out.iter().all(|e| e.label == label));
		}
	}

	#[test]
	fn scrambled_output_keeps_the_same_tokens() {
		let mut rng = ChaCha8Rng::seed_from_u64(11);
		for example in augment(&SEEDS, Label::Incorrect, 50, &AugmentConfig::default(), &mut rng) {
			let mut got: Vec<&str> = example.text.split(' ').collect();
			got.sort_unstable();
			let matched = SEEDS.iter().any(|seed| {
				let mut want: Vec<&str> = seed.split(' ').collect();
				want.sort_unstable();
				want == got
			});
			assert!(matched, "{} is not a permutation of a seed", example.text);
		}
	}

	#[test]
	fn rejects_probabilities_summing_above_one() {
		let config = AugmentConfig { swap_probability: 0.9, deletion_probability: 0.2 };
		assert!(matches!(config.validate(), Err(GramError::InvalidConfig(_))));
		assert!(AugmentConfig::default().validate().is_ok());
	}
}
