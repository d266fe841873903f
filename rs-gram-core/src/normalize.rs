/// Normalizes raw text.
///
/// - Lowercases every character (no-op for scripts without case, e.g. Devanagari)
/// - Removes ASCII punctuation
/// - Collapses any whitespace run to a single space and trims both ends
///
/// The function is total and idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(raw: &str) -> String {
	let lowered: String = raw
		.chars()
		.flat_map(char::to_lowercase)
		.filter(|c| !c.is_ascii_punctuation())
		.collect();

	tokens(&lowered).collect::<Vec<_>>().join(" ")
}

/// Normalizes optional input. Missing text normalizes to an empty string.
pub fn normalize_opt(raw: Option<&str>) -> String {
	raw.map(normalize).unwrap_or_default()
}

/// Splits text into whitespace-delimited tokens.
pub fn tokens(text: &str) -> impl Iterator<Item = &str> {
	text.split_whitespace()
}
