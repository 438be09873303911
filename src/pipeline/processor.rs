//! The record processor: validate, deduplicate, encrypt, flag.

use crate::crypto::FieldCipher;
use crate::models::{display_value, LowScoreReport, StudentRecord};
use crate::pipeline::dedup::{Deduplicator, Insertion};
use crate::pipeline::validator::{validate_student_record, RejectReason};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info, warn};

/// Default score below which a subject is reported.
pub const DEFAULT_LOW_SCORE_THRESHOLD: f64 = 65.0;

/// A record excluded by validation.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub record: StudentRecord,
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "student {}: {}",
            display_value(self.record.get("id")),
            self.reason
        )
    }
}

/// Result of one [`RecordProcessor::process`] call.
#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
    /// All final records known to the processor, in first-occurrence order.
    pub records: Vec<StudentRecord>,
    /// Records rejected in this call.
    pub rejected: Vec<Rejection>,
    /// Number of duplicates merged in this call.
    pub merged: usize,
}

/// Owns all per-run state: the identity index and the pending low-score batch.
#[derive(Debug)]
pub struct RecordProcessor {
    cipher: FieldCipher,
    threshold: f64,
    dedup: Deduplicator,
    low_scores: Vec<LowScoreReport>,
}

impl RecordProcessor {
    pub fn new(cipher: FieldCipher) -> Self {
        Self {
            cipher,
            threshold: DEFAULT_LOW_SCORE_THRESHOLD,
            dedup: Deduplicator::new(),
            low_scores: Vec::new(),
        }
    }

    /// Overrides the low-score threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[cfg(test)]
    pub fn cipher(&self) -> &FieldCipher {
        &self.cipher
    }

    /// Low-score reports queued so far.
    #[cfg(test)]
    pub fn pending_low_scores(&self) -> &[LowScoreReport] {
        &self.low_scores
    }

    /// Drains the queued low-score reports.
    pub fn take_low_scores(&mut self) -> Vec<LowScoreReport> {
        std::mem::take(&mut self.low_scores)
    }

    /// Processes cleaned records.
    pub fn process(&mut self, records: Vec<StudentRecord>) -> ProcessReport {
        debug!("Processing {} student records", records.len());
        let mut rejected = Vec::new();
        let mut merged = 0;

        for record in records {
            if let Err(reason) = validate_student_record(&record) {
                warn!(
                    "Student record is invalid and will be excluded ({}): {:?}",
                    reason, record.0
                );
                rejected.push(Rejection { record, reason });
                continue;
            }

            let key = record.identity();
            if self.dedup.contains(&key) {
                warn!("Duplicate student record found, updating: {}", key);
            }

            match self.dedup.insert(key, record) {
                Insertion::Merged => merged += 1,
                Insertion::Fresh(stored) => {
                    encrypt_email(&self.cipher, stored);
                    if let Some(report) = check_for_low_scores(stored, self.threshold) {
                        info!("Low score subjects found for student {}", report.id);
                        self.low_scores.push(report);
                    }
                }
            }
        }

        info!("Total valid student records: {}", self.dedup.len());
        ProcessReport {
            records: self.dedup.records().to_vec(),
            rejected,
            merged,
        }
    }
}

fn encrypt_email(cipher: &FieldCipher, record: &mut StudentRecord) {
    let encrypted = record
        .get_str("email")
        .and_then(|email| cipher.encrypt(email));
    if let Some(ciphertext) = encrypted {
        record.insert("email", Value::String(ciphertext));
    }
}

/// Builds a low-score report if any numeric `*_score` is below `threshold`.
pub fn check_for_low_scores(record: &StudentRecord, threshold: f64) -> Option<LowScoreReport> {
    let low_scores: Map<String, Value> = record
        .scores()
        .filter(|&(_, score)| score < threshold)
        .filter_map(|(field, _)| {
            record
                .get(field)
                .map(|value| (field.to_string(), value.clone()))
        })
        .collect();

    if low_scores.is_empty() {
        return None;
    }

    let field = |name: &str| record.get(name).cloned().unwrap_or(Value::Null);
    Some(LowScoreReport {
        id: field("id"),
        first_name: field("first_name"),
        last_name: field("last_name"),
        email: field("email"),
        low_scores,
    })
}
