//! JSON and CSV output files.

use crate::error::PipelineResult;
use crate::models::{CategoryCounts, StudentRecord, SubjectMetrics};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Column delimiter for every CSV file we write.
pub const CSV_DELIMITER: u8 = b'\t';

/// Write any serializable value as pretty-printed JSON.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> PipelineResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    info!("Saved {} in JSON format.", path.display());
    Ok(())
}

fn csv_writer(path: &Path) -> PipelineResult<csv::Writer<std::fs::File>> {
    Ok(csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_path(path)?)
}

/// Render a JSON value as a CSV cell.
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Write records as a tab-delimited table.
///
/// The header comes from the first record's keys; fields missing from a
/// later record are left empty and fields not in the header are dropped.
pub fn save_records_csv(records: &[StudentRecord], path: &Path) -> PipelineResult<()> {
    let mut writer = csv_writer(path)?;

    let headers: Vec<String> = match records.first() {
        Some(first) => first.keys().cloned().collect(),
        None => Vec::new(),
    };
    writer.write_record(&headers)?;

    let known: HashSet<&str> = headers.iter().map(String::as_str).collect();
    for record in records {
        if let Some(extra) = record.keys().find(|k| !known.contains(k.as_str())) {
            warn!(
                "Field '{}' is not in the CSV header and will be dropped",
                extra
            );
        }
        let row: Vec<String> = headers.iter().map(|h| cell(record.get(h))).collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!(
        "Saved {} records to {} in CSV format.",
        records.len(),
        path.display()
    );
    Ok(())
}

/// Write one row per subject, with the subject name in the first column.
pub fn save_subject_metrics_csv(metrics: &[SubjectMetrics], path: &Path) -> PipelineResult<()> {
    let mut writer = csv_writer(path)?;
    writer.write_record(["Subject", "mean", "median", "stdev", "max", "min"])?;

    for m in metrics {
        writer.write_record([
            m.subject.clone(),
            m.mean.to_string(),
            m.median.to_string(),
            m.stdev.to_string(),
            m.max.to_string(),
            m.min.to_string(),
        ])?;
    }

    writer.flush()?;
    info!("Saved subject metrics to {}.", path.display());
    Ok(())
}

/// Write a single-row table of category counts.
pub fn save_category_csv(counts: &CategoryCounts, path: &Path) -> PipelineResult<()> {
    let mut writer = csv_writer(path)?;
    if counts.is_empty() {
        warn!(
            "No category values to write, {} is left empty.",
            path.display()
        );
        writer.flush()?;
        return Ok(());
    }

    let (labels, values): (Vec<&str>, Vec<String>) = counts
        .iter()
        .map(|(label, count)| (label, count.to_string()))
        .unzip();

    writer.write_record(&labels)?;
    writer.write_record(&values)?;
    writer.flush()?;
    info!("Saved category counts to {}.", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn records() -> Vec<StudentRecord> {
        serde_json::from_value(json!([
            {"id": 1, "first_name": "Paul", "part_time_job": false, "math_score": 73},
            {"id": 2, "first_name": "Danielle", "math_score": 90, "nickname": "Dani"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_records_csv_is_tab_delimited() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("student_data.csv");
        save_records_csv(&records(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "id\tfirst_name\tpart_time_job\tmath_score");
        assert_eq!(lines[1], "1\tPaul\tfalse\t73");
        assert_eq!(lines[2], "2\tDanielle\t\t90");
    }

    #[test]
    fn test_subject_metrics_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subject_metrics.csv");
        let metrics = vec![SubjectMetrics {
            subject: "math_score".to_string(),
            mean: 81.5,
            median: 81.5,
            stdev: 0.0,
            max: 90.0,
            min: 73.0,
        }];
        save_subject_metrics_csv(&metrics, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Subject\tmean\tmedian\tstdev\tmax\tmin");
        assert_eq!(lines[1], "math_score\t81.5\t81.5\t0\t90\t73");
    }

    #[test]
    fn test_category_csv_single_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gender_metrics.csv");
        let mut counts = CategoryCounts::default();
        counts.observe("male".to_string());
        counts.observe("female".to_string());
        counts.observe("female".to_string());
        save_category_csv(&counts, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "male\tfemale\n1\t2\n");
    }

    #[test]
    fn test_empty_category_csv_is_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("career_metrics.csv");
        save_category_csv(&CategoryCounts::default(), &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_save_json_pretty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("student_data.json");
        save_json(&records(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  {"));
        let back: Vec<StudentRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(back, records());
    }
}
