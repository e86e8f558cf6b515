use anyhow::{Context, Result};
use bioactivity_classifiers::config::{PipelineConfig, SearchMetric, TrainingStrategy};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RunConfig {
    /// Labeled descriptor table: identifier, features, trailing 0/1 label.
    pub dataset: String,
    /// Fingerprint table to score; `null` skips scoring.
    pub predict: Option<String>,
    pub output_dir: String,
    /// Write `report.html` next to the tables.
    pub report: bool,
    /// Worker threads; 0 uses every core.
    pub threads: usize,
    pub pipeline: PipelineConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            dataset: String::from("dataset.csv"),
            predict: Some(String::from("predict.csv")),
            output_dir: String::from("results"),
            report: true,
            threads: 0,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl RunConfig {
    /// Build the run configuration from an optional JSON file plus CLI overrides.
    ///
    /// Fields missing from the file keep their defaults; command-line flags
    /// take precedence over both.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::load(path)?,
            None => {
                log::info!("No config file provided; using defaults.");
                RunConfig::default()
            }
        };

        if let Some(dataset) = matches.get_one::<String>("dataset") {
            config.dataset = dataset.clone();
        }
        if let Some(predict) = matches.get_one::<String>("predict") {
            config.predict = Some(predict.clone());
        }
        if let Some(output_dir) = matches.get_one::<String>("output_dir") {
            config.output_dir = output_dir.clone();
        }
        if let Some(strategy) = matches.get_one::<String>("strategy") {
            config.pipeline.strategy =
                TrainingStrategy::from_str(strategy).map_err(anyhow::Error::msg)?;
        }
        if let Some(metric) = matches.get_one::<String>("metric") {
            config.pipeline.search_metric =
                SearchMetric::from_str(metric).map_err(anyhow::Error::msg)?;
        }
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.pipeline.seed = *seed;
        }
        if let Some(threads) = matches.get_one::<usize>("threads") {
            config.threads = *threads;
        }
        if matches.get_flag("no_report") {
            config.report = false;
        }

        Ok(config)
    }

    /// Read a JSON config, falling back to the default for absent or invalid fields.
    pub fn load(config_path: &PathBuf) -> Result<Self> {
        let config_json = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        let partial: serde_json::Value = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        let mut config = RunConfig::default();

        macro_rules! load_or_default {
            ($field:ident) => {
                if let Some(val) = partial.get(stringify!($field)) {
                    if let Ok(parsed) = serde_json::from_value(val.clone()) {
                        config.$field = parsed;
                    } else {
                        log::warn!(
                            "Config Invalid value for '{}', using default: {:?}",
                            stringify!($field),
                            config.$field
                        );
                    }
                } else {
                    log::debug!(
                        "Config Missing field '{}', using default: {:?}",
                        stringify!($field),
                        config.$field
                    );
                }
            };
        }

        load_or_default!(dataset);
        load_or_default!(predict);
        load_or_default!(output_dir);
        load_or_default!(report);
        load_or_default!(threads);

        // Unlike the fields above, a malformed pipeline section is a hard error
        if let Some(val) = partial.get("pipeline") {
            config.pipeline = serde_json::from_value(val.clone())
                .with_context(|| format!("Invalid 'pipeline' section in {:?}", config_path))?;
        }

        Ok(config)
    }
}
