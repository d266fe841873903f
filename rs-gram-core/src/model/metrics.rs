use serde::{Deserialize, Serialize};

use crate::dataset::Label;
use crate::error::{GramError, Result};

/// Held-out classification report.
///
/// `Correct` is the positive class. `confusion[actual][predicted]` is
/// indexed by label number. Reporting only: nothing here feeds training.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Evaluation {
	pub accuracy: f64,
	pub precision: f64,
	pub recall: f64,
	pub confusion: [[usize; 2]; 2],
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
	if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}

/// Compares predictions with the actual labels.
///
/// Precision (or recall) with no predicted (or actual) positives is 0.0.
///
/// # Errors
/// Returns `InvalidConfig` when the two sequences differ in length.
pub fn evaluate(actual: &[Label], predicted: &[Label]) -> Result<Evaluation> {
	if actual.len() != predicted.len() {
		return Err(GramError::InvalidConfig(format!(
			"{} actual labels but {} predictions",
			actual.len(),
			predicted.len()
		)));
	}

	let mut confusion = [[0usize; 2]; 2];
	for (a, p) in actual.iter().zip(predicted) {
		confusion[a.as_u8() as usize][p.as_u8() as usize] += 1;
	}

	let true_negative = confusion[0][0];
	let false_positive = confusion[0][1];
	let false_negative = confusion[1][0];
	let true_positive = confusion[1][1];

	Ok(Evaluation {
		accuracy: ratio(true_positive + true_negative, actual.len()),
		precision: ratio(true_positive, true_positive + false_positive),
		recall: ratio(true_positive, true_positive + false_negative),
		confusion,
	})
}
