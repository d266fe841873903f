use indexmap::IndexMap;

use serde::{Deserialize, Serialize};

use crate::error::{GramError, Result};

/// Represents a state in a word n-gram model.
///
/// A `State` corresponds to a fixed history of (n-1) tokens (`key`, tokens
/// joined by one space) and stores every observed continuation of it.
///
/// ## Responsibilities:
/// - Accumulate continuation occurrences during training
/// - Rank continuations by count for top-k retrieval
/// - Merge with another state having the same key (parallel training support)
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
/// - Transitions keep the order in which they were first seen
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct State {
	/// Identifier of the state (history tokens joined by a space).
	key: String,
	/// Continuations in first-seen order with their occurrence counts.
	/// Example: { "rises" => 2, "sets" => 1 }
	transitions: IndexMap<String, usize>,
}

impl State {
	/// Creates a new empty state for the given history key.
	pub fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			transitions: IndexMap::new(),
		}
	}

	/// Records one occurrence of `next_token` after this history.
	pub fn add_transition(&mut self, next_token: &str) {
		if let Some(occurrence) = self.transitions.get_mut(next_token) {
			*occurrence += 1;
		} else {
			self.transitions.insert(next_token.to_owned(), 1);
		}
	}

	/// Number of times `next_token` followed this history.
	pub fn count(&self, next_token: &str) -> usize {
		self.transitions.get(next_token).copied().unwrap_or(0)
	}

	/// Iterates continuations in first-seen order.
	pub fn transitions(&self) -> impl Iterator<Item = (&str, usize)> {
		self.transitions.iter().map(|(token, occurrence)| (token.as_str(), *occurrence))
	}

	/// Returns at most `k` continuations, most frequent first.
	///
	/// Ties keep first-seen order (the sort is stable).
	pub fn top_k(&self, k: usize) -> Vec<&str> {
		let mut ranked: Vec<(&str, usize)> = self.transitions().collect();
		ranked.sort_by(|a, b| b.1.cmp(&a.1));
		ranked.into_iter().take(k).map(|(token, _)| token).collect()
	}

	/// Merges another state into this one.
	///
	/// Occurrence counts are summed; continuations unknown to `self` are
	/// appended after the existing ones.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.key != other.key {
			return Err(GramError::InvalidConfig(format!(
				"history mismatch: '{}' vs '{}'",
				self.key, other.key
			)));
		}

		for (next_token, occurrence) in &other.transitions {
			*self.transitions.entry(next_token.clone()).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn state(key: &str, tokens: &[&str]) -> State {
		let mut state = State::new(key);
		for token in tokens {
			state.add_transition(token);
		}
		state
	}

	#[test]
	fn ranks_by_count_then_first_seen() {
		let state = state("the sun", &["sets", "rises", "glows", "rises", "glows"]);
		assert_eq!(state.top_k(3), vec!["rises", "glows", "sets"]);
		assert_eq!(state.top_k(1), vec!["rises"]);
		assert_eq!(state.count("glows"), 2);
		assert_eq!(state.count("falls"), 0);
	}

	#[test]
	fn ties_are_not_alphabetical() {
		let state = state("a b", &["zebra", "apple"]);
		assert_eq!(state.top_k(2), vec!["zebra", "apple"]);
	}

	#[test]
	fn merge_sums_and_appends() {
		let mut left = state("a b", &["x", "y"]);
		let right = state("a b", &["z", "y"]);
		left.merge(&right).unwrap();
		let merged: Vec<_> = left.transitions().collect();
		assert_eq!(merged, vec![("x", 1), ("y", 2), ("z", 1)]);
	}

	#[test]
	fn merge_rejects_other_histories() {
		let mut left = State::new("a b");
		assert!(left.merge(&State::new("b c")).is_err());
	}
}
