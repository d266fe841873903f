use std::path::Path;

use log::warn;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rs_gram_core::config::PipelineConfig;
use rs_gram_core::dataset::SentencePair;
use rs_gram_core::io::{load_corpus_or_empty, read_sentence_pairs_or_empty};
use rs_gram_core::model::grammar::GrammarChecker;
use rs_gram_core::model::ngram_model::NGramModel;
use rs_gram_core::normalize::normalize;

/// Fallback grammar pairs used when `data/grammar.csv` is missing.
const SAMPLE_PAIRS: [(&str, &str); 6] = [
    ("She go to the store.", "She goes to the store."),
    ("The cat drink milk.", "The cat drinks milk."),
    ("They is playing soccer.", "They are playing soccer."),
    ("I has a book.", "I have a book."),
    ("He don't like apples.", "He doesn't like apples."),
    ("We was learning machine learning.", "We were learning machine learning."),
];

/// Fallback corpora used when `data/<language>.txt` is missing.
const SAMPLE_ENGLISH: &str = "The sun rises in the east. The sun sets in the west. \
    I want to learn. I want to go home. She is reading a book. She is going to school. \
    I am going to the market. I am learning machine learning.";
const SAMPLE_MARATHI: &str = "मी शाळेत जातो. मी घरी जातो. शुभ सकाळ. शुभ रात्री. \
    भारत माझा देश आहे. भारत महान देश आहे. मी शाळेत जाते.";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Everything is read from the "data" directory; missing files fall back to samples
    let data = Path::new("./data");
    let config_path = data.join("pipeline.toml");
    let config = if config_path.exists() {
        PipelineConfig::from_file(&config_path)?
    } else {
        PipelineConfig::default()
    };

    println!("Training grammar model...");
    let mut pairs = read_sentence_pairs_or_empty(data.join("grammar.csv"));
    if pairs.is_empty() {
        warn!("No grammar pairs found, using built-in samples");
        pairs = SAMPLE_PAIRS
            .iter()
            .map(|(incorrect, correct)| SentencePair::new(*incorrect, *correct))
            .collect();
    }

    // Fails loudly: a single-class or empty dataset cannot train a classifier
    let (checker, evaluation) = GrammarChecker::from_pairs(&pairs, &config)?;
    println!("Grammar Model Accuracy: {:.4}", evaluation.accuracy);
    println!("Grammar Model Precision: {:.4}", evaluation.precision);
    println!("Grammar Model Recall: {:.4}", evaluation.recall);
    println!("Confusion matrix (rows = actual, columns = predicted): {:?}", evaluation.confusion);

    let mut models = Vec::new();
    for (language, sample, phrases) in [
        ("english", SAMPLE_ENGLISH, vec!["the sun", "she is", "i am", "i want"]),
        ("marathi", SAMPLE_MARATHI, vec!["मी शाळेत", "शुभ", "भारत माझा"]),
    ] {
        println!("\nTraining {} next-word model...", language);
        let mut corpus = load_corpus_or_empty(data.join(format!("{}.txt", language)));
        if corpus.is_empty() {
            warn!("No {} corpus found, using built-in sample", language);
            corpus = normalize(sample);
        }

        let mut model = NGramModel::new(config.ngram_order)?;
        model.train_parallel(&corpus)?;

        // Training-set accuracy over a sample of windows, for reporting only
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let accuracy = model.top_k_accuracy(&corpus, config.top_k, 500, &mut rng);
        println!("Next-Word Model ({}) Training Accuracy (Top-{}): {:.2}%", language, config.top_k, accuracy * 100.0);
        models.push((language, model, phrases));
    }

    println!("\nEnglish Grammar Checker:");
    for text in ["She go to the store.", "I am learning machine learning.", "The cat drink milk.", "They are playing soccer."] {
        println!("   Input: '{}' -> Classification: {}", text, checker.check(text));
    }

    for (language, model, phrases) in &models {
        println!("\n{} Next Word Prediction:", language);
        for phrase in phrases {
            let suggestions = model.predict_top_k(&normalize(phrase), config.top_k);
            println!("   Input: '{}' -> Suggestions: {:?}", phrase, suggestions);
        }
    }

    Ok(())
}
