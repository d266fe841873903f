use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use rs_gram_core::config::PipelineConfig;
use rs_gram_core::io::{get_filename, list_files, load_or_build_language_model, normalize_folder, read_sentence_pairs_or_empty};
use rs_gram_core::model::grammar::GrammarChecker;
use rs_gram_core::model::ngram_model::NGramModel;
use rs_gram_core::normalize::normalize;

/// File holding grammar training pairs inside the data directory.
const GRAMMAR_FILE: &str = "grammar.csv";

/// Optional TOML configuration inside the data directory.
const CONFIG_FILE: &str = "pipeline.toml";

/// Struct representing query parameters for the `/v1/suggest` endpoint
#[derive(Deserialize)]
struct SuggestParams {
	lang: String,
	text: String,
	k: Option<usize>,
}

/// Struct representing query parameters for the `/v1/classify` endpoint
#[derive(Deserialize)]
struct ClassifyParams {
	text: String,
}

#[derive(Deserialize)]
struct LanguageQuery {
	names: Option<String>,
}

#[derive(Serialize)]
struct Classification {
	label: u8,
	probability: f64,
}

/// Read-mostly state: models are only replaced wholesale.
struct SharedData {
	folder: PathBuf,
	config: PipelineConfig,
	languages: RwLock<BTreeMap<String, NGramModel>>,
	checker: Option<GrammarChecker>,
}

/// Loads one language model per `<name>.txt` corpus.
///
/// When `names` is given, only those corpora are loaded. A corpus that
/// fails to load is logged and skipped.
fn load_languages(folder: &Path, config: &PipelineConfig, names: Option<&[&str]>) -> BTreeMap<String, NGramModel> {
	let mut languages = BTreeMap::new();
	let files = match list_files(folder, "txt") {
		Ok(files) => files,
		Err(e) => {
			warn!("Failed to list corpora in {}: {}", folder.display(), e);
			return languages;
		}
	};

	for file in files {
		let path = folder.join(&file);
		let name = match get_filename(&path) {
			Ok(name) => name,
			Err(_) => continue,
		};
		if names.is_some_and(|names| !names.contains(&name.as_str())) {
			continue;
		}
		match load_or_build_language_model(&path, config.ngram_order) {
			Ok(model) => {
				info!("Loaded language '{}' ({} histories)", name, model.history_count());
				languages.insert(name, model);
			}
			Err(e) => warn!("Failed to load language '{}': {}", name, e),
		}
	}
	languages
}

/// Trains the grammar checker from `grammar.csv`, if any pairs are available.
fn load_checker(folder: &Path, config: &PipelineConfig) -> Option<GrammarChecker> {
	let pairs = read_sentence_pairs_or_empty(folder.join(GRAMMAR_FILE));
	match GrammarChecker::from_pairs(&pairs, config) {
		Ok((checker, evaluation)) => {
			info!(
				"Grammar checker ready: accuracy {:.4}, precision {:.4}, recall {:.4}",
				evaluation.accuracy, evaluation.precision, evaluation.recall
			);
			Some(checker)
		}
		Err(e) => {
			warn!("Grammar checker unavailable: {}", e);
			None
		}
	}
}

/// HTTP GET endpoint `/v1/suggest`
///
/// Returns up to `k` next-word suggestions (JSON array) for `text` in `lang`.
#[get("/v1/suggest")]
async fn get_suggestions(data: web::Data<SharedData>, query: web::Query<SuggestParams>) -> impl Responder {
	let prefix = normalize(&query.text);
	if prefix.is_empty() {
		return HttpResponse::BadRequest().body("Text is required");
	}
	let k = query.k.unwrap_or(data.config.top_k);

	let languages = match data.languages.read() {
		Ok(languages) => languages,
		Err(_) => return HttpResponse::InternalServerError().body("Language lock failed"),
	};

	match languages.get(&query.lang) {
		Some(model) => HttpResponse::Ok().json(model.predict_top_k(&prefix, k)),
		None => HttpResponse::BadRequest().body(format!("Language {} not loaded", query.lang)),
	}
}

/// HTTP GET endpoint `/v1/classify`
///
/// Returns the grammaticality label (0 or 1) and the probability of label 1.
#[get("/v1/classify")]
async fn get_classification(data: web::Data<SharedData>, query: web::Query<ClassifyParams>) -> impl Responder {
	let checker = match &data.checker {
		Some(checker) => checker,
		None => return HttpResponse::ServiceUnavailable().body("Grammar checker not trained"),
	};

	HttpResponse::Ok().json(Classification {
		label: checker.check(&query.text).as_u8(),
		probability: checker.probability(&query.text),
	})
}

#[get("/v1/languages")]
async fn get_languages(data: web::Data<SharedData>) -> impl Responder {
	match data.languages.read() {
		Ok(languages) => HttpResponse::Ok().json(languages.keys().collect::<Vec<_>>()),
		Err(_) => HttpResponse::InternalServerError().body("Language lock failed"),
	}
}

#[put("/v1/load_languages")]
async fn put_languages(data: web::Data<SharedData>, query: web::Query<LanguageQuery>) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty language name"),
	};

	let names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();

	// Build outside the lock, then swap the whole set
	let loaded = load_languages(&data.folder, &data.config, Some(names.as_slice()));
	if let Some(missing) = names.iter().find(|name| !loaded.contains_key(**name)) {
		return HttpResponse::BadRequest().body(format!("Failed to load language {}", missing));
	}

	match data.languages.write() {
		Ok(mut languages) => {
			*languages = loaded;
			HttpResponse::Ok().body("Languages loaded successfully")
		}
		Err(_) => HttpResponse::InternalServerError().body("Language lock failed"),
	}
}

/// Main entry point for the server.
///
/// Trains every model from the data directory (first argument, `./data`
/// by default) and serves them on 127.0.0.1:5000.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let folder = normalize_folder(&std::env::args().nth(1).unwrap_or_else(|| "./data".to_owned()));
	let config_path = folder.join(CONFIG_FILE);
	let config = if config_path.exists() {
		PipelineConfig::from_file(&config_path).unwrap_or_else(|e| {
			warn!("Ignoring {}: {}", config_path.display(), e);
			PipelineConfig::default()
		})
	} else {
		PipelineConfig::default()
	};

	let languages = load_languages(&folder, &config, None);
	let checker = load_checker(&folder, &config);
	let shared_data = web::Data::new(SharedData {
		folder,
		config,
		languages: RwLock::new(languages),
		checker,
	});

	info!("Listening on 127.0.0.1:5000");
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_suggestions)
			.service(get_classification)
			.service(get_languages)
			.service(put_languages)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
