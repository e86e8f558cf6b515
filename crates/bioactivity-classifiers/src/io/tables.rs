//! CSV/TSV readers for screening tables and writers for result tables.
//!
//! The delimiter follows the file extension: `.tsv` is tab-separated,
//! anything else is read and written as comma-separated.
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csv::StringRecord;
use ndarray::{Array1, Array2};

use crate::data_handling::{Dataset, PredictionSet};
use crate::evaluation::EvaluationRecord;
use crate::scoring::PredictionTable;

/// Column headers of the evaluation table, in order.
pub const EVALUATION_COLUMNS: [&str; 8] = [
    "Model",
    "Accuracy",
    "F1 Score",
    "AUC",
    "Sensitivity",
    "Specificity",
    "Precision",
    "MCC",
];

fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") => b'\t',
        _ => b',',
    }
}

fn open_reader(path: &Path) -> Result<(csv::Reader<File>, StringRecord)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_for(path))
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open table: {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();
    Ok((reader, headers))
}

fn parse_feature(value: &str, headers: &StringRecord, col: usize, row_idx: usize) -> Result<f64> {
    value.parse::<f64>().with_context(|| {
        format!(
            "Invalid value '{}' in column '{}' at row {}",
            value,
            headers.get(col).unwrap_or(""),
            row_idx + 1
        )
    })
}

fn parse_label(value: &str, row_idx: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => return Ok(true),
        "0" | "false" => return Ok(false),
        _ => {}
    }
    match value.parse::<f64>() {
        Ok(v) if v == 1.0 => Ok(true),
        Ok(v) if v == 0.0 => Ok(false),
        _ => Err(anyhow!(
            "Invalid label '{}' at row {}; expected 0 or 1",
            value,
            row_idx + 1
        )),
    }
}

/// Read a labeled table: identifier first, features in between, label last.
pub fn read_training_table<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let (mut reader, headers) = open_reader(path)?;
    if headers.len() < 3 {
        bail!(
            "{} needs an identifier column, at least one feature column and a label column",
            path.display()
        );
    }
    let label_idx = headers.len() - 1;
    let feature_names: Vec<String> = headers
        .iter()
        .skip(1)
        .take(label_idx - 1)
        .map(str::to_string)
        .collect();

    let mut ids = Vec::new();
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        if record.len() != headers.len() {
            bail!(
                "Row {} has {} fields, expected {}",
                row_idx + 1,
                record.len(),
                headers.len()
            );
        }
        ids.push(record[0].to_string());
        for col in 1..label_idx {
            features.push(parse_feature(&record[col], &headers, col, row_idx)?);
        }
        labels.push(parse_label(&record[label_idx], row_idx)?);
    }

    let x = Array2::from_shape_vec((labels.len(), feature_names.len()), features)
        .context("Failed to build feature matrix")?;
    let dataset = Dataset::new(
        headers.get(0).unwrap_or("ID"),
        ids,
        feature_names,
        x,
        Array1::from_vec(labels),
    )?;
    log::debug!(
        "Read {} labeled rows x {} features from {}",
        dataset.n_samples(),
        dataset.n_features(),
        path.display()
    );
    Ok(dataset)
}

/// Read an unlabeled table: identifier first, then the fingerprint bits.
pub fn read_prediction_table<P: AsRef<Path>>(path: P) -> Result<PredictionSet> {
    let path = path.as_ref();
    let (mut reader, headers) = open_reader(path)?;
    if headers.len() < 2 {
        bail!(
            "{} needs an identifier column followed by feature columns",
            path.display()
        );
    }
    let n_features = headers.len() - 1;

    let mut ids = Vec::new();
    let mut features = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        if record.len() != headers.len() {
            bail!(
                "Row {} has {} fields, expected {}",
                row_idx + 1,
                record.len(),
                headers.len()
            );
        }
        ids.push(record[0].to_string());
        for col in 1..headers.len() {
            features.push(parse_feature(&record[col], &headers, col, row_idx)?);
        }
    }

    let x = Array2::from_shape_vec((ids.len(), n_features), features)
        .context("Failed to build feature matrix")?;
    let set = PredictionSet::new(headers.get(0).unwrap_or("ID"), ids, x)?;
    log::debug!(
        "Read {} compounds x {} features from {}",
        set.n_samples(),
        set.n_features(),
        path.display()
    );
    Ok(set)
}

fn create_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter_for(path))
        .from_writer(BufWriter::new(file)))
}

/// One row per model with the metric columns of [`EVALUATION_COLUMNS`].
pub fn write_evaluation_table<P: AsRef<Path>>(records: &[EvaluationRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create_writer(path)?;
    writer.write_record(EVALUATION_COLUMNS)?;
    for record in records {
        let mut row = vec![record.family.to_string()];
        row.extend(record.metric_values().iter().map(|v| format!("{:.4}", v)));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Identifier column followed by one `<Family>_Probability` column per model.
pub fn write_prediction_table<P: AsRef<Path>>(table: &PredictionTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create_writer(path)?;
    let mut header = vec![table.id_column.clone()];
    header.extend(table.column_names());
    writer.write_record(&header)?;
    for (id, probabilities) in table.records() {
        let mut row = vec![id.to_string()];
        row.extend(probabilities.iter().map(|p| format!("{:.6}", p)));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelFamily;
    use crate::metrics::ConfusionMatrix;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_training_csv() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "train.csv",
            "ChEMBL_ID,MolWt,LogP,Activity\nC1,300.5,2.1,1\nC2,210.0,-0.4,0\nC3,180.2,1.0,1.0\n",
        );
        let dataset = read_training_table(&path).unwrap();
        assert_eq!(dataset.id_column, "ChEMBL_ID");
        assert_eq!(dataset.feature_names, vec!["MolWt", "LogP"]);
        assert_eq!(dataset.ids, vec!["C1", "C2", "C3"]);
        assert_eq!(dataset.y.to_vec(), vec![true, false, true]);
        assert!((dataset.x[[1, 1]] + 0.4).abs() < 1e-12);
    }

    #[test]
    fn reads_prediction_tsv() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "fp.tsv", "ID\tb0\tb1\tb2\nX1\t0\t1\t1\nX2\t1\t0\t0\n");
        let set = read_prediction_table(&path).unwrap();
        assert_eq!(set.x.dim(), (2, 3));
        assert_eq!(set.ids, vec!["X1", "X2"]);
        assert_eq!(set.x[[0, 2]], 1.0);
    }

    #[test]
    fn rejects_bad_labels_and_ragged_rows() {
        let dir = tempdir().unwrap();
        let bad_label = write_file(dir.path(), "a.csv", "ID,f,label\nA,1.0,2\n");
        let err = read_training_table(&bad_label).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid label"));

        let ragged = write_file(dir.path(), "b.csv", "ID,f,label\nA,1.0\n");
        assert!(read_training_table(&ragged).is_err());

        let bad_value = write_file(dir.path(), "c.csv", "ID,f,label\nA,abc,1\n");
        assert!(read_training_table(&bad_value).is_err());
    }

    #[test]
    fn writes_result_tables() {
        let dir = tempdir().unwrap();
        let record = EvaluationRecord {
            family: ModelFamily::RandomForest,
            accuracy: 0.9,
            weighted_f1: 0.88,
            auc: f64::NAN,
            sensitivity: 1.0,
            specificity: 0.8,
            precision: 0.5,
            mcc: 0.6,
            confusion: ConfusionMatrix::default(),
            roc: Vec::new(),
        };
        let eval_path = dir.path().join("evaluation.csv");
        write_evaluation_table(&[record], &eval_path).unwrap();
        let text = std::fs::read_to_string(&eval_path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Model,Accuracy,F1 Score,AUC,Sensitivity,Specificity,Precision,MCC"
        );
        assert_eq!(lines.next().unwrap(), "RF,0.9000,0.8800,NaN,1.0000,0.8000,0.5000,0.6000");

        let table = PredictionTable {
            id_column: "ID".to_string(),
            ids: vec!["X1".to_string()],
            families: vec![ModelFamily::LogisticRegression, ModelFamily::Svm],
            probabilities: ndarray::array![[0.25, 0.5]],
        };
        let pred_path = dir.path().join("predictions.tsv");
        write_prediction_table(&table, &pred_path).unwrap();
        let text = std::fs::read_to_string(&pred_path).unwrap();
        assert_eq!(
            text,
            "ID\tLR_Probability\tSVM_Probability\nX1\t0.250000\t0.500000\n"
        );
    }
}
