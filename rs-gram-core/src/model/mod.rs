//! Models of the two pipeline paths.
//!
//! - Classification: `features` → `classifier` (wrapped by `grammar`), reported by `metrics`
//! - Suggestion: `ngram_model`, built on per-history `State`s

/// Sparse word n-gram TF-IDF features over a frozen vocabulary.
pub mod features;

/// Logistic-regression grammar classifier.
pub mod classifier;

/// Accuracy, precision and recall over a held-out split.
pub mod metrics;

/// Vocabulary + classifier bundle classifying raw text.
pub mod grammar;

/// Word n-gram language model (`n >= 2`).
///
/// Handles corpus ingestion, continuation counting, top-k suggestion
/// and model merging.
pub mod ngram_model;

/// Internal representation of a single history state.
///
/// Tracks continuation counts in first-seen order.
/// This module is not exposed publicly.
mod state;
