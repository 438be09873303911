//! Payload parsing and null stripping.

use crate::error::{PipelineError, PipelineResult};
use crate::models::StudentRecord;
use serde_json::Value;
use tracing::{debug, error, info};

/// Checks that the payload is a list and returns its elements.
pub fn parse_student_data(raw: Value) -> PipelineResult<Vec<Value>> {
    info!("Parsing student data...");
    match raw {
        Value::Array(items) => {
            debug!("Payload is a list of {} entries", items.len());
            Ok(items)
        }
        other => Err(PipelineError::NotAList(json_kind(&other))),
    }
}

/// Turns list entries into records, dropping null-valued fields.
///
/// Entries that are not JSON objects are logged and skipped.
pub fn clean_records(entries: Vec<Value>) -> Vec<StudentRecord> {
    let mut cleaned = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry {
            Value::Object(mut fields) => {
                fields.retain(|_, value| !value.is_null());
                cleaned.push(StudentRecord::new(fields));
            }
            other => {
                error!(
                    "Error cleaning student data: expected an object, got {}",
                    json_kind(&other)
                );
            }
        }
    }

    info!("Total cleaned student records: {}", cleaned.len());
    cleaned
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rejects_non_list() {
        let err = parse_student_data(json!({"students": []})).unwrap_err();
        assert!(matches!(err, PipelineError::NotAList("an object")));
    }

    #[test]
    fn test_parse_accepts_list() {
        let items = parse_student_data(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_clean_strips_nulls_and_keeps_order() {
        let records = clean_records(vec![json!({
            "id": 1,
            "first_name": "Paul",
            "gender": null,
            "email": "p@test.com"
        })]);

        assert_eq!(records.len(), 1);
        let keys: Vec<_> = records[0].keys().cloned().collect();
        assert_eq!(keys, vec!["id", "first_name", "email"]);
    }

    #[test]
    fn test_clean_skips_non_objects() {
        let records = clean_records(vec![json!(3), json!({"id": 2}), json!("x")]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("id"), Some(&json!(2)));
    }
}
