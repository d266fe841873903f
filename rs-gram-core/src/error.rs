use thiserror::Error;

/// Errors that can occur while building or training models.
///
/// A history missing from a language model is not an error: lookups
/// return an empty suggestion list instead.
#[derive(Error, Debug)]
pub enum GramError {
	#[error("Insufficient data: {0}")]
	InsufficientData(String),

	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("Malformed input: {0}")]
	InputFormat(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Snapshot encoding error: {0}")]
	Codec(#[from] postcard::Error),

	#[error("Malformed sentence pair file: {0}")]
	Csv(#[from] csv::Error),

	#[error("Failed to parse configuration: {0}")]
	Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GramError>;
