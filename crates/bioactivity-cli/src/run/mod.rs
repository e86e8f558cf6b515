pub mod input;
pub mod output;

use anyhow::{Context, Result};
use bioactivity_classifiers::io::{read_prediction_table, read_training_table};
use bioactivity_classifiers::{Pipeline, PipelineRun};

use crate::run::input::RunConfig;
use crate::run::output::write_run_outputs;
use crate::util::{ensure_output_dir, validate_tsv_or_csv_file};

/// Size rayon's global pool; a pool that already exists is kept.
fn configure_threads(threads: usize) {
    if threads == 0 {
        return;
    }
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        log::warn!("Could not size the thread pool to {}: {}", threads, e);
    }
}

/// Read the inputs, run the pipeline and write every output file.
pub fn run_pipeline(config: &RunConfig) -> Result<PipelineRun> {
    validate_tsv_or_csv_file(&config.dataset)?;
    if let Some(predict) = &config.predict {
        validate_tsv_or_csv_file(predict)?;
    }
    configure_threads(config.threads);

    let dataset = read_training_table(&config.dataset)
        .with_context(|| format!("Failed to load dataset {}", config.dataset))?;
    let prediction_set = match &config.predict {
        Some(path) => Some(
            read_prediction_table(path)
                .with_context(|| format!("Failed to load prediction set {}", path))?,
        ),
        None => None,
    };

    let pipeline = Pipeline::new(config.pipeline.clone())?;
    let run = pipeline.run(&dataset, prediction_set.as_ref())?;
    run.log_summary();

    let output_dir = ensure_output_dir(&config.output_dir)?;
    write_run_outputs(&run, config, &output_dir)?;
    Ok(run)
}
