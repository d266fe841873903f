use rs_gram_core::model::ngram_model::{DEFAULT_ORDER, DEFAULT_TOP_K, NGramModel};
use rs_gram_core::normalize::normalize;

#[test]
fn end_to_end_suggestions_from_raw_text() {
	let corpus = normalize("The sun rises. The sun sets! The sun rises...");
	assert_eq!(corpus, "the sun rises the sun sets the sun rises");

	let mut model = NGramModel::new(DEFAULT_ORDER).unwrap();
	model.train(&corpus);

	assert_eq!(model.count(&["the", "sun"], "rises"), 2);
	assert_eq!(model.count(&["the", "sun"], "sets"), 1);
	assert_eq!(model.count(&["sun", "rises"], "the"), 1);
	assert_eq!(model.count(&["rises", "the"], "sun"), 1);

	assert_eq!(model.predict_top_k(&normalize("The sun"), DEFAULT_TOP_K), vec!["rises", "sets"]);
	assert_eq!(model.predict_top_k("the sun", 1), vec!["rises"]);
}

#[test]
fn unseen_history_never_errors() {
	let mut model = NGramModel::new(DEFAULT_ORDER).unwrap();
	model.train("i want to go home i want to eat");
	assert!(model.predict_top_k("she is", DEFAULT_TOP_K).is_empty());
	assert_eq!(model.predict_top_k("i want", DEFAULT_TOP_K), vec!["to"]);
	assert_eq!(model.predict_top_k("want to", DEFAULT_TOP_K), vec!["go", "eat"]);
}

#[test]
fn one_model_per_language() {
	let mut english = NGramModel::new(DEFAULT_ORDER).unwrap();
	let mut marathi = NGramModel::new(DEFAULT_ORDER).unwrap();
	english.train(&normalize("I am going to school. I am going home."));
	marathi.train(&normalize("मी शाळेत जातो. मी शाळेत जाते. मी घरी जातो."));

	assert_eq!(english.predict_top_k("i am", 3), vec!["going"]);
	assert_eq!(marathi.predict_top_k("मी शाळेत", 3), vec!["जातो", "जाते"]);
	assert!(english.predict_top_k("मी शाळेत", 3).is_empty());
}
