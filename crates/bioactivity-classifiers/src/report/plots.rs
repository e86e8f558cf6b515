use plotly::common::{DashType, Line, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{HeatMap, Plot, Scatter};

use crate::evaluation::EvaluationRecord;

/// ROC curves of every evaluated model on one set of axes, with the chance diagonal.
pub fn plot_roc_curves(records: &[EvaluationRecord], title: &str) -> Plot {
    let mut plot = Plot::new();
    for record in records.iter().filter(|r| !r.roc.is_empty()) {
        let fpr: Vec<f64> = record.roc.iter().map(|p| p.fpr).collect();
        let tpr: Vec<f64> = record.roc.iter().map(|p| p.tpr).collect();
        let label = format!("{} (AUC = {:.3})", record.family, record.auc);
        let trace = Scatter::new(fpr, tpr).mode(Mode::Lines).name(&label);
        plot.add_trace(trace);
    }

    let chance = Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
        .mode(Mode::Lines)
        .name("Chance")
        .line(Line::new().color("gray").dash(DashType::Dash));
    plot.add_trace(chance);

    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("False positive rate").range(vec![0.0, 1.0]))
            .y_axis(Axis::new().title("True positive rate").range(vec![0.0, 1.05])),
    );
    plot
}

/// 2x2 heatmap of one model's confusion matrix.
pub fn plot_confusion_matrix(record: &EvaluationRecord) -> Plot {
    let labels = vec!["Inactive".to_string(), "Active".to_string()];
    // Heatmap rows are drawn bottom-up; reverse so actual "Inactive" is on top
    let rows = record.confusion.as_rows();
    let z = vec![rows[1].to_vec(), rows[0].to_vec()];
    let y_labels = vec!["Active".to_string(), "Inactive".to_string()];

    let trace = HeatMap::new(labels, y_labels, z).name(record.family.as_str());
    let title = format!("{} confusion matrix", record.family);

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(
        Layout::new()
            .title(title.as_str())
            .x_axis(Axis::new().title("Predicted"))
            .y_axis(Axis::new().title("Actual"))
            .width(420)
            .height(380),
    );
    plot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelFamily;
    use crate::metrics::{ConfusionMatrix, RocPoint};

    fn record(family: ModelFamily) -> EvaluationRecord {
        EvaluationRecord {
            family,
            accuracy: 0.75,
            weighted_f1: 0.75,
            auc: 0.8,
            sensitivity: 0.5,
            specificity: 1.0,
            precision: 1.0,
            mcc: 0.57,
            confusion: ConfusionMatrix { tn: 2, fp: 0, fn_: 1, tp: 1 },
            roc: vec![
                RocPoint { threshold: f64::INFINITY, fpr: 0.0, tpr: 0.0 },
                RocPoint { threshold: 0.7, fpr: 0.0, tpr: 0.5 },
                RocPoint { threshold: 0.1, fpr: 1.0, tpr: 1.0 },
            ],
        }
    }

    #[test]
    fn roc_overlay_has_one_trace_per_model_plus_chance() {
        let plot = plot_roc_curves(
            &[record(ModelFamily::RandomForest), record(ModelFamily::Svm)],
            "ROC",
        );
        let html = plot.to_inline_html(Some("roc"));
        assert!(html.contains("RF (AUC"));
        assert!(html.contains("SVM (AUC"));
        assert!(html.contains("Chance"));
    }

    #[test]
    fn confusion_heatmap_names_the_model() {
        let html = plot_confusion_matrix(&record(ModelFamily::LogisticRegression))
            .to_inline_html(Some("cm"));
        assert!(html.contains("LR confusion matrix"));
    }
}
