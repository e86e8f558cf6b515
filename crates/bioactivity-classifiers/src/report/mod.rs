//! Self-contained HTML report of a pipeline run.
pub mod plots;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::pipeline::PipelineRun;
use crate::report::plots::{plot_confusion_matrix, plot_roc_curves};

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

pub struct ReportSection {
    title: String,
    blocks: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(content);
    }

    /// Embed `plot` under a div with id `plot_id`.
    pub fn add_plot(&mut self, plot: Plot, plot_id: &str) {
        self.blocks
            .push(PreEscaped(plot.to_inline_html(Some(plot_id))));
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.blocks {
                    div class="block" { (block) }
                }
            }
        }
    }
}

pub struct Report {
    title: String,
    version: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, version: &str) -> Self {
        Report {
            title: title.to_string(),
            version: version.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> String {
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let page = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_JS) {}
                    style {
                        "body { font-family: sans-serif; margin: 2em; }
                        table { border-collapse: collapse; }
                        th, td { border: 1px solid #ccc; padding: 4px 10px; text-align: right; }
                        th:first-child, td:first-child { text-align: left; }
                        .grid { display: flex; flex-wrap: wrap; gap: 1em; }"
                    }
                }
                body {
                    h1 { (self.title) }
                    p class="meta" { "Version " (self.version) ", generated " (generated) }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        };
        page.into_string()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render())
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}

fn format_metric(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.3}", value)
    }
}

/// Build the standard sections for `run`: overview, evaluation table, ROC
/// overlay, confusion matrices and search results.
pub fn build_run_report(run: &PipelineRun, version: &str) -> Report {
    let mut report = Report::new("Bioactivity Classification Report", version);

    let mut overview = ReportSection::new("Overview");
    overview.add_content(html! {
        p {
            (run.models.len()) " models trained on " (run.n_train) " compounds and evaluated on "
            (run.n_test) " held-out compounds with " (run.standardizer.n_features()) " features."
        }
        @if !run.standardizer.constant_columns().is_empty() {
            p { (run.standardizer.constant_columns().len()) " constant feature columns were left unscaled." }
        }
        @if let Some(table) = &run.predictions {
            p { (table.ids.len()) " external compounds scored." }
        }
        @if !run.failures.is_empty() {
            h3 { "Failures" }
            ul {
                @for failure in &run.failures {
                    li { (failure.family) " (" (failure.stage) "): " (failure.error) }
                }
            }
        }
    });
    report.add_section(overview);

    let mut evaluation = ReportSection::new("Held-out evaluation");
    evaluation.add_content(html! {
        table {
            tr {
                @for column in crate::io::tables::EVALUATION_COLUMNS {
                    th { (column) }
                }
            }
            @for record in &run.evaluations {
                tr {
                    td { (record.family) }
                    @for value in record.metric_values() {
                        td { (format_metric(value)) }
                    }
                }
            }
        }
    });
    if run.evaluations.iter().any(|r| !r.roc.is_empty()) {
        evaluation.add_plot(plot_roc_curves(&run.evaluations, "ROC curves"), "roc-overlay");
    }
    report.add_section(evaluation);

    let mut confusion = ReportSection::new("Confusion matrices");
    let heatmaps: Vec<Markup> = run
        .evaluations
        .iter()
        .map(|record| {
            let id = format!("confusion-{}", record.family);
            PreEscaped(plot_confusion_matrix(record).to_inline_html(Some(&id)))
        })
        .collect();
    confusion.add_content(html! {
        div class="grid" {
            @for heatmap in &heatmaps {
                div { (heatmap) }
            }
        }
    });
    report.add_section(confusion);

    let searched: Vec<_> = run.models.iter().filter(|m| !m.candidates.is_empty()).collect();
    if !searched.is_empty() {
        let mut search = ReportSection::new("Hyperparameter search");
        for model in searched {
            search.add_content(html! {
                h3 { (model.family) ": selected " (model.params) }
                table {
                    tr { th { "Parameters" } th { "Mean CV score" } th { "Std" } }
                    @for candidate in &model.candidates {
                        tr {
                            td { (candidate.params) }
                            td { (format!("{:.4}", candidate.mean)) }
                            td { (format!("{:.4}", candidate.std)) }
                        }
                    }
                }
            });
        }
        report.add_section(search);
    }

    report
}
