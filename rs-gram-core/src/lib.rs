//! Statistical text-understanding library.
//!
//! This crate provides the modeling core of a smart-keyboard pipeline:
//! - Deterministic text normalization shared by every path
//! - Synthetic data augmentation for grammar classification
//! - Sparse n-gram TF-IDF features feeding a logistic-regression classifier
//! - A word-level n-gram language model for next-word suggestion
//!
//! The two paths (classification and suggestion) share only the normalizer.

/// Text normalization (lowercase, punctuation stripping, whitespace collapsing).
pub mod normalize;

/// Heuristic noise injection that manufactures labeled examples from seed sentences.
pub mod augment;

/// Labeled examples, training-set construction and train/test splitting.
pub mod dataset;

/// Feature extraction, grammar classification and the n-gram language model.
pub mod model;

/// Pipeline configuration (defaults, validation and TOML loading).
pub mod config;

/// Crate error type.
pub mod error;

/// I/O utilities (corpus loading, pair files, model snapshots, path helpers).
pub mod io;

pub use error::{GramError, Result};
