use anyhow::Result;
use maud::html;
use std::path::{Path, PathBuf};

use bioactivity_classifiers::io::{write_evaluation_table, write_prediction_table};
use bioactivity_classifiers::report::{build_run_report, ReportSection};
use bioactivity_classifiers::PipelineRun;

use crate::run::input::RunConfig;

pub const EVALUATION_FILE: &str = "evaluation.csv";
pub const PREDICTIONS_FILE: &str = "predictions.csv";
pub const REPORT_FILE: &str = "report.html";

/// Write the evaluation table, the prediction table (when a prediction set
/// was scored) and the HTML report into `output_dir`. Returns the written paths.
pub fn write_run_outputs(run: &PipelineRun, config: &RunConfig, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let evaluation_path = output_dir.join(EVALUATION_FILE);
    write_evaluation_table(&run.evaluations, &evaluation_path)?;
    written.push(evaluation_path);

    if let Some(table) = &run.predictions {
        let predictions_path = output_dir.join(PREDICTIONS_FILE);
        write_prediction_table(table, &predictions_path)?;
        written.push(predictions_path);
    }

    if config.report {
        let mut report = build_run_report(run, env!("CARGO_PKG_VERSION"));

        let mut config_section = ReportSection::new("Configuration");
        config_section.add_content(html! {
            style {
                ".code-container {
                    background-color: #f5f5f5;
                    padding: 10px;
                    border-radius: 5px;
                    overflow-x: auto;
                    font-family: monospace;
                    white-space: pre-wrap;
                }"
            }
            div class="code-container" {
                pre {
                    code { (serde_json::to_string_pretty(config)?) }
                }
            }
        });
        report.add_section(config_section);

        let report_path = output_dir.join(REPORT_FILE);
        report.save_to_file(&report_path)?;
        written.push(report_path);
    }

    for path in &written {
        log::info!("Wrote {}", path.display());
    }
    Ok(written)
}
