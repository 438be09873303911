//! Loading records from a previous run's output files.

use crate::error::{PipelineError, PipelineResult};
use crate::models::StudentRecord;
use crate::pipeline::parse_student_data;
use serde_json::{Map, Number, Value};
use std::path::Path;
use tracing::{error, info};

/// Input file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    /// Infers the format from a file extension.
    pub fn from_path(path: &Path) -> PipelineResult<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Ok(InputFormat::Json),
            Some("csv") => Ok(InputFormat::Csv),
            _ => Err(PipelineError::UnsupportedInput(path.display().to_string())),
        }
    }
}

/// Loads already-processed records from a `.json` or `.csv` file.
pub fn load_records(path: &Path) -> PipelineResult<Vec<StudentRecord>> {
    let records = match InputFormat::from_path(path)? {
        InputFormat::Json => load_json(path)?,
        InputFormat::Csv => load_csv(path)?,
    };
    info!(
        "Loaded {} records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

fn load_json(path: &Path) -> PipelineResult<Vec<StudentRecord>> {
    let content = std::fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&content)?;
    let entries = parse_student_data(raw)?;

    let mut records = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::Object(fields) => records.push(StudentRecord::new(fields)),
            other => error!(
                "Skipping entry {} of {}: expected an object, got {}",
                position,
                path.display(),
                other
            ),
        }
    }
    Ok(records)
}

fn load_csv(path: &Path) -> PipelineResult<Vec<StudentRecord>> {
    let mut reader = csv::ReaderBuilder::new().delimiter(b'\t').from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut fields = Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if let Some(value) = infer_cell(cell) {
                fields.insert(header.to_string(), value);
            }
        }
        records.push(StudentRecord::new(fields));
    }

    Ok(records)
}

/// Parses a CSV cell into the narrowest JSON type; empty cells are dropped.
pub fn infer_cell(cell: &str) -> Option<Value> {
    if cell.is_empty() {
        return None;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    if let Ok(float) = cell.parse::<f64>() {
        if let Some(number) = Number::from_f64(float) {
            return Some(Value::Number(number));
        }
    }
    match cell {
        "true" | "True" => Some(Value::Bool(true)),
        "false" | "False" => Some(Value::Bool(false)),
        _ => Some(Value::String(cell.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            InputFormat::from_path(Path::new("a/student_data.json")).unwrap(),
            InputFormat::Json
        );
        assert_eq!(
            InputFormat::from_path(Path::new("student_data.CSV")).unwrap(),
            InputFormat::Csv
        );
        let unsupported = InputFormat::from_path(Path::new("student_data.xml"));
        assert!(unsupported.is_err());
    }

    #[test]
    fn test_infer_cell() {
        assert_eq!(infer_cell(""), None);
        assert_eq!(infer_cell("73"), Some(json!(73)));
        assert_eq!(infer_cell("81.5"), Some(json!(81.5)));
        assert_eq!(infer_cell("False"), Some(json!(false)));
        assert_eq!(infer_cell("Lawyer"), Some(json!("Lawyer")));
    }

    #[test]
    fn test_load_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("student_data.json");
        std::fs::write(
            &path,
            r#"[{"id": "1", "email": "abc"}, {"id": "2", "email": "def"}]"#,
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get_str("id"), Some("2"));
    }

    #[test]
    fn test_load_json_skips_non_objects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("student_data.json");
        std::fs::write(&path, r#"[{"id": 1}, 7, "x", {"id": 2}]"#).unwrap();

        let records = load_records(&path).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.get("id").cloned()).collect();
        assert_eq!(ids, vec![Some(json!(1)), Some(json!(2))]);
    }

    #[test]
    fn test_load_json_not_a_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("student_data.json");
        std::fs::write(&path, r#"{"id": 1}"#).unwrap();
        assert!(matches!(
            load_records(&path),
            Err(PipelineError::NotAList(_))
        ));
    }

    #[test]
    fn test_load_csv_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("student_data.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "id\tfirst_name\tgender\tmath_score").unwrap();
        writeln!(file, "1\tPaul\t\t73").unwrap();
        drop(file);

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("math_score"), Some(&json!(73)));
        assert_eq!(records[0].get("gender"), None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_records(Path::new("/nonexistent/student_data.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
