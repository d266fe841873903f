use std::fs::File;
use std::io::Read;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::dataset::SentencePair;
use crate::error::{GramError, Result};
use crate::model::ngram_model::NGramModel;
use crate::normalize::normalize;

/// Header of the ungrammatical column in a pair file.
pub const INCORRECT_COLUMN: &str = "Ungrammatical Statement";

/// Header of the standard-form column in a pair file.
pub const CORRECT_COLUMN: &str = "Standard English";

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Reads a corpus file as one normalized text block.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<String> {
	Ok(normalize(&fs::read_to_string(path)?))
}

/// Like `load_corpus`, but logs failures and returns an empty corpus.
pub fn load_corpus_or_empty<P: AsRef<Path>>(path: P) -> String {
	load_corpus(&path).unwrap_or_else(|e| {
		warn!("Error loading {}: {}", path.as_ref().display(), e);
		String::new()
	})
}

/// Reads sentence pairs from a delimited file with a header row.
///
/// Comma-separated with standard quoting, or tab-separated when the file
/// ends in `.tsv`. The header must name both `INCORRECT_COLUMN` and
/// `CORRECT_COLUMN` (in any position). Short rows are accepted; blank or
/// missing cells become `None` and rows with neither cell are skipped.
///
/// # Errors
/// - I/O and parse failures
/// - `InputFormat` if the file is empty or a column is missing
pub fn read_sentence_pairs<P: AsRef<Path>>(path: P) -> Result<Vec<SentencePair>> {
	let path = path.as_ref();
	let delimiter = if path.extension() == Some(OsStr::new("tsv")) { b'\t' } else { b',' };
	let mut reader = csv::ReaderBuilder::new()
		.delimiter(delimiter)
		.flexible(true)
		.trim(csv::Trim::All)
		.from_path(path)?;

	let header = reader.headers()?.clone();
	if header.is_empty() {
		return Err(GramError::InputFormat(format!("{} is empty", path.display())));
	}
	let column = |name: &str| {
		header
			.iter()
			.position(|h| h == name)
			.ok_or_else(|| GramError::InputFormat(format!("missing column '{}'", name)))
	};
	let incorrect = column(INCORRECT_COLUMN)?;
	let correct = column(CORRECT_COLUMN)?;

	let mut pairs = Vec::new();
	for record in reader.records() {
		let record = record?;
		let cell = |index: usize| record.get(index).filter(|c| !c.is_empty()).map(str::to_owned);
		let pair = SentencePair { incorrect: cell(incorrect), correct: cell(correct) };
		if pair.incorrect.is_some() || pair.correct.is_some() {
			pairs.push(pair);
		}
	}

	info!("Read {} sentence pairs from {}", pairs.len(), path.display());
	Ok(pairs)
}

/// Like `read_sentence_pairs`, but logs failures and returns no pairs.
pub fn read_sentence_pairs_or_empty<P: AsRef<Path>>(path: P) -> Vec<SentencePair> {
	read_sentence_pairs(&path).unwrap_or_else(|e| {
		warn!("Error loading {}: {}", path.as_ref().display(), e);
		Vec::new()
	})
}

/// Serializes any model to a compact `postcard` file.
pub fn save_snapshot<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
	let bytes = postcard::to_stdvec(value)?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Reads a model written by `save_snapshot`.
pub fn load_snapshot<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
	let bytes = fs::read(path)?;
	Ok(postcard::from_bytes(&bytes)?)
}

/// Loads a language model for a corpus file.
///
/// - If a `.bin` snapshot of the same order sits beside the corpus, it is loaded.
/// - Otherwise the corpus is normalized, trained in parallel and the
///   snapshot is written for the next start. A failed write is logged and
///   the freshly built model is still returned.
pub fn load_or_build_language_model<P: AsRef<Path>>(corpus_path: P, n: usize) -> Result<NGramModel> {
	let binary_data_path = build_output_path(&corpus_path, "bin")?;
	if binary_data_path.exists() {
		match load_snapshot::<NGramModel, _>(&binary_data_path) {
			Ok(model) if model.order() == n => return Ok(model),
			Ok(model) => info!(
				"Snapshot {} has order {}, rebuilding for order {}",
				binary_data_path.display(),
				model.order(),
				n
			),
			Err(e) => warn!("Ignoring unreadable snapshot {}: {}", binary_data_path.display(), e),
		}
	}

	let corpus = load_corpus(&corpus_path)?;
	let mut model = NGramModel::new(n)?;
	model.train_parallel(&corpus)?;
	if let Err(e) = save_snapshot(&model, &binary_data_path) {
		warn!("Could not write snapshot {}: {}", binary_data_path.display(), e);
	}
	Ok(model)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/english.txt` + `"bin"` → `data/english.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/marathi.txt"` → `"marathi"`
/// - `"marathi.txt"` → `"marathi"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory, sorted by name.
///
/// Returns file names only (no paths).
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::ngram_model::DEFAULT_ORDER;
	use tempfile::tempdir;

	#[test]
	fn corpus_is_normalized() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("english.txt");
		fs::write(&path, "The Sun rises.\nThe sun sets!\n").unwrap();
		assert_eq!(load_corpus(&path).unwrap(), "the sun rises the sun sets");
	}

	#[test]
	fn missing_corpus_degrades_to_empty() {
		let dir = tempdir().unwrap();
		assert!(load_corpus(dir.path().join("nope.txt")).is_err());
		assert_eq!(load_corpus_or_empty(dir.path().join("nope.txt")), "");
	}

	#[test]
	fn reads_quoted_csv_pairs() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("grammar.csv");
		fs::write(
			&path,
			"Serial Number,Error Type,Ungrammatical Statement,Standard English\n\
			 1,Verb Tense Errors,\"I goes, then I eat.\",\"I go, then I eat.\"\n\
			 2,Quotes,\"He said \"\"hi\"\" loud\",\n\
			 3,Short row\n",
		)
		.unwrap();
		let pairs = read_sentence_pairs(&path).unwrap();
		assert_eq!(pairs.len(), 2);
		assert_eq!(pairs[0], SentencePair::new("I goes, then I eat.", "I go, then I eat."));
		assert_eq!(pairs[1].incorrect.as_deref(), Some("He said \"hi\" loud"));
		assert_eq!(pairs[1].correct, None);
	}

	#[test]
	fn reads_pairs_by_header_name() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("grammar.tsv");
		fs::write(
			&path,
			"Serial\tStandard English\tUngrammatical Statement\n\
			 1\tShe goes to the store.\tShe go to the store.\n\
			 2\t\tThe cat drink milk.\n\
			 \n\
			 3\tThey are playing.\n",
		)
		.unwrap();
		let pairs = read_sentence_pairs(&path).unwrap();
		assert_eq!(pairs.len(), 3);
		assert_eq!(pairs[0], SentencePair::new("She go to the store.", "She goes to the store."));
		assert_eq!(pairs[1].correct, None);
		assert_eq!(pairs[2].incorrect, None);
	}

	#[test]
	fn missing_column_is_a_format_error() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("grammar.csv");
		fs::write(&path, "text,label\nhello,1\n").unwrap();
		assert!(matches!(read_sentence_pairs(&path), Err(GramError::InputFormat(_))));
		assert!(read_sentence_pairs_or_empty(&path).is_empty());

		let empty = dir.path().join("empty.csv");
		fs::write(&empty, "").unwrap();
		assert!(matches!(read_sentence_pairs(&empty), Err(GramError::InputFormat(_))));
	}

	#[test]
	fn language_model_snapshot_is_reused() {
		let dir = tempdir().unwrap();
		let corpus = dir.path().join("english.txt");
		fs::write(&corpus, "the sun rises the sun sets the sun rises").unwrap();

		let built = load_or_build_language_model(&corpus, DEFAULT_ORDER).unwrap();
		assert!(dir.path().join("english.bin").exists());

		// The snapshot wins over the (now different) corpus
		fs::write(&corpus, "something else entirely").unwrap();
		let cached = load_or_build_language_model(&corpus, DEFAULT_ORDER).unwrap();
		assert_eq!(cached.predict_top_k("the sun", 3), built.predict_top_k("the sun", 3));

		// A different order rebuilds from the corpus
		let rebuilt = load_or_build_language_model(&corpus, 2).unwrap();
		assert_eq!(rebuilt.order(), 2);
		assert_eq!(rebuilt.predict_top_k("something", 3), vec!["else"]);
	}

	#[test]
	fn unwritable_snapshot_still_returns_the_model() {
		let dir = tempdir().unwrap();
		let corpus = dir.path().join("english.txt");
		fs::write(&corpus, "the sun rises the sun sets the sun rises").unwrap();
		// A directory where the snapshot file should go makes the write fail
		fs::create_dir(dir.path().join("english.bin")).unwrap();

		let model = load_or_build_language_model(&corpus, DEFAULT_ORDER).unwrap();
		assert_eq!(model.predict_top_k("the sun", 3), vec!["rises", "sets"]);
		assert!(dir.path().join("english.bin").is_dir());
	}

	#[test]
	fn path_helpers() {
		assert_eq!(build_output_path("data/english.txt", "bin").unwrap(), PathBuf::from("data/english.bin"));
		assert_eq!(get_filename("./data/marathi.txt").unwrap(), "marathi");

		let dir = tempdir().unwrap();
		fs::write(dir.path().join("b.txt"), "").unwrap();
		fs::write(dir.path().join("a.txt"), "").unwrap();
		fs::write(dir.path().join("a.bin"), "").unwrap();
		assert_eq!(list_files(dir.path(), "txt").unwrap(), vec!["a.txt", "b.txt"]);
	}
}
