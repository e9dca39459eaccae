use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use formfill::{
    preprocess, Classifier, CustomFields, DetectedField, EngineConfig, FieldKind, FileStore, FormFiller,
    MappingCache, OptionCandidate,
};
use log::info;
use serde::Deserialize;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine config file (JSON); defaults plus FORMFILL_* variables otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a single form label
    Classify {
        label: String,
        /// Number of ranked fields to print
        #[arg(short, long, default_value_t = 3)]
        top: usize,
    },
    /// Map detected form fields to profile values
    Fill {
        /// Profile snapshot (JSON)
        #[arg(long)]
        profile: PathBuf,
        /// Detected fields (JSON array of {label, kind, options})
        #[arg(long)]
        fields: PathBuf,
        /// Custom fields (JSON object of strings)
        #[arg(long)]
        custom: Option<PathBuf>,
        /// Mapping cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Do not read or update the mapping cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Remove expired mapping cache entries
    Cleanup {
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Print information about the built-in classifier
    Info,
}

#[derive(Deserialize)]
struct FieldInput {
    label: String,
    kind: String,
    #[serde(default)]
    options: Vec<OptionInput>,
}

#[derive(Deserialize)]
struct OptionInput {
    #[serde(default)]
    value: String,
    #[serde(default)]
    label: String,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::from_env()?,
    };
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))
}

/// Option handles are the option's position in the input.
fn detected_fields(inputs: Vec<FieldInput>) -> Result<Vec<DetectedField<usize>>> {
    inputs
        .into_iter()
        .map(|input| {
            let options = input
                .options
                .into_iter()
                .enumerate()
                .map(|(i, o)| OptionCandidate::new(o.value, o.label, i))
                .collect();
            let kind = FieldKind::from_name(&input.kind, options)
                .ok_or_else(|| anyhow!("Unknown field kind '{}' for {:?}", input.kind, input.label))?;
            Ok(DetectedField::new(input.label, kind))
        })
        .collect()
}

fn mapping_cache(dir: Option<PathBuf>, config: &EngineConfig) -> Arc<MappingCache> {
    let store = match dir {
        Some(dir) => FileStore::new(dir),
        None => FileStore::new_default(),
    };
    info!("Using mapping cache in {:?}", store.dir());
    Arc::new(MappingCache::new(Arc::new(store), config))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Classify { label, top } => {
            let classifier = Classifier::builtin()?;
            let cleaned = preprocess(&label);
            let result = classifier.predict(&cleaned.cleaned);

            println!("Cleaned label: {}", cleaned.cleaned);
            println!("Accepts NA: {}", cleaned.has_na_instruction);
            match result.predicted_field {
                Some(field) => println!("Predicted field: {} ({:.4})", field, result.confidence),
                None => println!("Predicted field: none"),
            }
            for (field, score) in classifier.predict_scores(&cleaned.cleaned).into_iter().take(top) {
                println!("  {}: {:.4}", field, score);
            }
        }
        Command::Fill {
            profile,
            fields,
            custom,
            cache_dir,
            no_cache,
        } => {
            let profile: serde_json::Value = read_json(&profile)?;
            let fields = detected_fields(read_json(&fields)?)?;
            let custom: CustomFields = match custom {
                Some(path) => read_json(&path)?,
                None => CustomFields::new(),
            };

            let mut filler = FormFiller::builtin(config.clone())?;
            if !no_cache {
                filler = filler.with_cache(mapping_cache(cache_dir, &config));
            }
            let mappings = filler.fill(&fields, &profile, &custom).await;
            println!("{}", serde_json::to_string_pretty(&mappings)?);
        }
        Command::Cleanup { cache_dir } => {
            let removed = mapping_cache(cache_dir, &config).cleanup().await;
            println!("Removed {} expired entries", removed);
        }
        Command::Info => {
            let info = Classifier::builtin()?.info();
            println!("Fields: {}", info.num_classes);
            println!("Vocabulary: {}", info.vocabulary_size);
            println!("Examples: {}", info.num_examples);
            println!("Corpus fingerprint: {}", info.corpus_fingerprint);
        }
    }
    Ok(())
}
