use std::sync::mpsc;
use std::thread;

use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};

use super::state::State;
use crate::augment::DrawSource;
use crate::error::{GramError, Result};
use crate::normalize::tokens;

/// Default model order (trigrams: two-token histories).
pub const DEFAULT_ORDER: usize = 3;

/// Default number of suggestions returned by `predict_top_k`.
pub const DEFAULT_TOP_K: usize = 3;

/// Represents a word n-gram language model.
///
/// The `NGramModel` stores a state per history of `n-1` tokens and counts
/// the tokens that followed it.
///
/// # Responsibilities
/// - Build the model by streaming token windows over a corpus
/// - Serve top-k next-token suggestions for a prefix
/// - Merge with another model of the same order `n`
///
/// # Training is additive
/// Calling `train` again on an existing model adds the new counts to the
/// previous ones. Use a fresh model for a different corpus.
///
/// # Lookup misses
/// A history never seen in training yields an empty suggestion list. There
/// is no smoothing and no back-off to a shorter history.
///
/// # Invariants
/// - `n` is always >= 2
/// - Each state key is `n-1` tokens joined by a single space
/// - States and transitions keep first-seen order
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NGramModel {
	/// The order of the model (number of tokens in the n-gram)
	n: usize, // must be >= 2

	/// Mapping from a history key to its corresponding state
	states: IndexMap<String, State>,
}

impl NGramModel {
	/// Creates a new n-gram model of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 2`.
	pub fn new(n: usize) -> Result<Self> {
		if n < 2 {
			return Err(GramError::InvalidConfig(format!("n must be >= 2, got {}", n)));
		}
		Ok(Self { n, states: IndexMap::new() })
	}

	/// Order of the model.
	pub fn order(&self) -> usize {
		self.n
	}

	/// Number of distinct histories seen so far.
	pub fn history_count(&self) -> usize {
		self.states.len()
	}

	/// Number of times `next` followed `history` during training.
	pub fn count(&self, history: &[&str], next: &str) -> usize {
		self.states
			.get(history.join(" ").as_str())
			.map(|state| state.count(next))
			.unwrap_or(0)
	}

	/// Trains the model on normalized corpus text.
	///
	/// Every full window of `n` tokens contributes one count: the first
	/// `n-1` tokens form the history, the last one is the continuation.
	/// Corpora shorter than `n` tokens train nothing.
	pub fn train(&mut self, text: &str) {
		let tokens: Vec<&str> = tokens(text).collect();
		info!("Training {}-gram model on {} tokens", self.n, tokens.len());
		self.train_tokens(&tokens);
	}

	fn train_tokens<T: AsRef<str>>(&mut self, tokens: &[T]) {
		if tokens.len() < self.n {
			// Corpus too short, no windows to count
			return;
		}

		for window in tokens.windows(self.n) {
			let key = window[..self.n - 1]
				.iter()
				.map(|token| token.as_ref())
				.collect::<Vec<&str>>()
				.join(" ");
			let next_token = window[self.n - 1].as_ref();

			// Get or create the state for this history
			let state = self.states.entry(key.clone()).or_insert_with(|| State::new(&key));
			state.add_transition(next_token);
		}
	}

	/// Trains the model on worker threads.
	///
	/// Window starts are split into contiguous slices (CPU cores * factor),
	/// each slice is counted by a partial model, and partial models are
	/// merged in slice order. The result is identical to `train`.
	///
	/// # Errors
	/// Returns an error if a worker fails before reporting its partial model.
	pub fn train_parallel(&mut self, text: &str) -> Result<()> {
		let tokens: Vec<String> = tokens(text).map(str::to_owned).collect();
		info!("Training {}-gram model on {} tokens (parallel)", self.n, tokens.len());
		if tokens.len() < self.n {
			return Ok(());
		}

		let windows = tokens.len() - self.n + 1;
		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = windows.div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		let mut spawned = 0;
		for (index, start) in (0..windows).step_by(chunk_size).enumerate() {
			let end = (start + chunk_size).min(windows);
			// Windows [start, end) need tokens up to the last window's end
			let chunk: Vec<String> = tokens[start..end + self.n - 1].to_vec();
			let tx = tx.clone();
			let n = self.n;

			thread::spawn(move || {
				let mut partial_model = NGramModel { n, states: IndexMap::new() };
				partial_model.train_tokens(&chunk);
				// The receiver outlives every worker
				let _ = tx.send((index, partial_model));
			});
			spawned += 1;
		}
		drop(tx);

		let mut partial_models: Vec<(usize, NGramModel)> = rx.iter().collect();
		if partial_models.len() != spawned {
			return Err(GramError::InsufficientData(format!(
				"{} of {} training workers did not report",
				spawned - partial_models.len(),
				spawned
			)));
		}
		partial_models.sort_by_key(|(index, _)| *index);

		for (_, partial_model) in &partial_models {
			self.merge(partial_model)?;
		}

		Ok(())
	}

	/// Returns at most `k` next-token suggestions for a normalized prefix.
	///
	/// The last `n-1` prefix tokens form the history (all of them if the
	/// prefix is shorter; such short histories almost always miss). An
	/// unknown history returns an empty list.
	pub fn predict_top_k(&self, prefix: &str, k: usize) -> Vec<String> {
		let tokens: Vec<&str> = tokens(prefix).collect();
		let start = tokens.len().saturating_sub(self.n - 1);
		let key = tokens[start..].join(" ");

		match self.states.get(key.as_str()) {
			Some(state) => state.top_k(k).into_iter().map(str::to_owned).collect(),
			None => Vec::new(),
		}
	}

	/// Merges another n-gram model into this one.
	///
	/// # Notes
	/// - Both models must have the same order `n`.
	/// - Occurrence counts for matching states and transitions are summed.
	/// - Histories new to `self` are appended in `other`'s order.
	///
	/// # Errors
	/// Returns an error if the model orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.n != other.n {
			return Err(GramError::InvalidConfig(format!("n mismatch: {} vs {}", self.n, other.n)));
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}

		Ok(())
	}

	/// Fraction of sampled windows of `text` whose actual next token is
	/// among the top-`k` suggestions.
	///
	/// Samples up to `sample` distinct windows. Returns 0.0 when `text`
	/// has no full window.
	pub fn top_k_accuracy<D>(&self, text: &str, k: usize, sample: usize, draws: &mut D) -> f64
	where
		D: DrawSource + ?Sized,
	{
		let tokens: Vec<&str> = tokens(text).collect();
		if tokens.len() < self.n {
			return 0.0;
		}

		let mut starts: Vec<usize> = (0..=tokens.len() - self.n).collect();
		draws.shuffle(&mut starts);
		starts.truncate(sample);
		if starts.is_empty() {
			return 0.0;
		}

		let hits = starts
			.iter()
			.filter(|&&i| {
				let history = tokens[i..i + self.n - 1].join(" ");
				let actual = tokens[i + self.n - 1];
				self.predict_top_k(&history, k).iter().any(|token| token == actual)
			})
			.count();

		hits as f64 / starts.len() as f64
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand_chacha::ChaCha8Rng;

	const CORPUS: &str = "the sun rises the sun sets the sun rises";

	fn trained(n: usize, text: &str) -> NGramModel {
		let mut model = NGramModel::new(n).unwrap();
		model.train(text);
		model
	}

	/// Histories and continuations in stored order.
	fn layout(model: &NGramModel) -> Vec<(String, Vec<(String, usize)>)> {
		model
			.states
			.iter()
			.map(|(key, state)| {
				(key.clone(), state.transitions().map(|(t, c)| (t.to_owned(), c)).collect())
			})
			.collect()
	}

	#[test]
	fn rejects_orders_below_two() {
		assert!(matches!(NGramModel::new(1), Err(GramError::InvalidConfig(_))));
		assert!(NGramModel::new(2).is_ok());
	}

	#[test]
	fn counts_every_full_window() {
		let model = trained(3, CORPUS);
		assert_eq!(model.count(&["the", "sun"], "rises"), 2);
		assert_eq!(model.count(&["the", "sun"], "sets"), 1);
		assert_eq!(model.count(&["sun", "rises"], "the"), 1);
		assert_eq!(model.count(&["rises", "the"], "sun"), 1);
		assert_eq!(model.count(&["sun", "sets"], "the"), 1);
		assert_eq!(model.history_count(), 5);
	}

	#[test]
	fn suggests_most_frequent_first() {
		let model = trained(3, CORPUS);
		assert_eq!(model.predict_top_k("the sun", 3), vec!["rises", "sets"]);
		assert_eq!(model.predict_top_k("the sun", 1), vec!["rises"]);
		assert_eq!(model.predict_top_k("look at the sun", 3), vec!["rises", "sets"]);
	}

	#[test]
	fn ranking_follows_counts() {
		let model = trained(3, "the sun rises . the sun rises . the sun rises . the sun sets");
		assert_eq!(model.predict_top_k("the sun", 1), vec!["rises"]);
	}

	#[test]
	fn unseen_history_is_an_empty_result() {
		let model = trained(3, CORPUS);
		assert!(model.predict_top_k("the moon", 3).is_empty());
		assert!(model.predict_top_k("", 3).is_empty());
		// Shorter than n-1 tokens: looked up as-is and missed
		assert!(model.predict_top_k("sun", 3).is_empty());
		assert!(model.predict_top_k("the sun", 0).is_empty());
	}

	#[test]
	fn short_corpus_trains_nothing() {
		let model = trained(3, "hello world");
		assert_eq!(model.history_count(), 0);
	}

	#[test]
	fn bigram_model_uses_one_token_history() {
		let model = trained(2, "i am here i am there i was");
		assert_eq!(model.predict_top_k("so i", 3), vec!["am", "was"]);
		assert_eq!(model.predict_top_k("i am", 3), vec!["here", "there"]);
	}

	#[test]
	fn training_twice_adds_counts() {
		let mut model = trained(3, CORPUS);
		model.train("the sun sets the sun sets");
		assert_eq!(model.count(&["the", "sun"], "sets"), 3);
		assert_eq!(model.predict_top_k("the sun", 1), vec!["sets"]);
	}

	#[test]
	fn parallel_training_matches_sequential() {
		let text = vec![CORPUS; 40].join(" ") + " the moon glows the moon sets";
		let sequential = trained(3, &text);
		let mut parallel = NGramModel::new(3).unwrap();
		parallel.train_parallel(&text).unwrap();
		assert_eq!(layout(&parallel), layout(&sequential));
	}

	#[test]
	fn parallel_training_on_short_corpus_is_a_no_op() {
		let mut model = NGramModel::new(3).unwrap();
		model.train_parallel("two words").unwrap();
		assert_eq!(model.history_count(), 0);
	}

	#[test]
	fn merge_requires_same_order() {
		let mut model = trained(3, CORPUS);
		assert!(model.merge(&trained(2, CORPUS)).is_err());
	}

	#[test]
	fn merge_of_consecutive_slices_matches_whole() {
		let whole = trained(3, CORPUS);
		// Slices overlap by n-1 tokens so every window is counted once
		let mut merged = trained(3, "the sun rises the sun");
		merged.merge(&trained(3, "the sun sets the sun rises")).unwrap();
		assert_eq!(layout(&merged), layout(&whole));
	}

	#[test]
	fn perfect_recall_on_training_text() {
		let model = trained(3, "a b c d e f g");
		let mut rng = ChaCha8Rng::seed_from_u64(42);
		assert_eq!(model.top_k_accuracy("a b c d e f g", 3, 500, &mut rng), 1.0);
		assert_eq!(model.top_k_accuracy("x y", 3, 500, &mut rng), 0.0);
	}
}
