//! Score aggregation and statistics.
//!
//! This module computes per-subject descriptive statistics and categorical
//! breakdowns across the final record set.

use crate::models::{
    display_value, CategoryCounts, Comparisons, StudentRecord, SubjectMetrics, SummaryMetrics,
    SUBJECTS,
};
use chrono::Utc;
use tracing::{debug, info};

/// Collect the numeric values of one subject across all records.
pub fn collect_scores(records: &[StudentRecord], subject: &str) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.get(subject).and_then(|v| v.as_f64()))
        .collect()
}

/// Compute mean, median, sample standard deviation, max and min.
///
/// Every statistic is 0 for an empty sample; the standard deviation is 0
/// for fewer than two values.
pub fn describe(subject: &str, scores: &[f64]) -> SubjectMetrics {
    if scores.is_empty() {
        return SubjectMetrics {
            subject: subject.to_string(),
            ..Default::default()
        };
    }

    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;

    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let stdev = if scores.len() > 1 {
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    } else {
        0.0
    };

    SubjectMetrics {
        subject: subject.to_string(),
        mean,
        median,
        stdev,
        max: sorted[sorted.len() - 1],
        min: sorted[0],
    }
}

/// Count the distinct values of a categorical field (absent counts as `null`).
pub fn count_by(records: &[StudentRecord], field: &str) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for record in records {
        counts.observe(display_value(record.get(field)));
    }
    counts
}

/// Compute the full summary for a final record set.
pub fn calculate_summary_metrics(records: &[StudentRecord]) -> SummaryMetrics {
    debug!("Calculating summary metrics over {} records", records.len());

    let subject_metrics: Vec<SubjectMetrics> = SUBJECTS
        .iter()
        .map(|name| describe(name, &collect_scores(records, name)))
        .collect();

    let comparisons = Comparisons {
        by_gender: count_by(records, "gender"),
        by_career_aspiration: count_by(records, "career_aspiration"),
        by_extracurricular_activities: count_by(records, "extracurricular_activities"),
    };

    info!(
        "Summary metrics calculated for {} subjects",
        subject_metrics.len()
    );

    SummaryMetrics {
        generated_at: Utc::now(),
        subject_metrics,
        comparisons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_students() -> Vec<StudentRecord> {
        serde_json::from_value(json!([
            {
                "id": 1, "first_name": "Paul", "last_name": "Casey",
                "email": "4792c46fbce89bc3be74143005348a9c",
                "gender": "male", "part_time_job": false, "absence_days": 3,
                "extracurricular_activities": false, "weekly_self_study_hours": 27,
                "career_aspiration": "Lawyer",
                "math_score": 73, "history_score": 81, "physics_score": 93,
                "chemistry_score": 97, "biology_score": 63, "english_score": 80,
                "geography_score": 87
            },
            {
                "id": 2, "first_name": "Danielle", "last_name": "Sandoval",
                "email": "0802beb5718e064c5d51dfd9743d578a",
                "gender": "female", "part_time_job": false, "absence_days": 2,
                "extracurricular_activities": false, "weekly_self_study_hours": 47,
                "career_aspiration": "Doctor",
                "math_score": 90, "history_score": 86, "physics_score": 96,
                "chemistry_score": 100, "biology_score": 90, "english_score": 88,
                "geography_score": 90
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_subject_means() {
        let summary = calculate_summary_metrics(&two_students());
        let mean = |s: &str| summary.subject(s).unwrap().mean;

        assert_eq!(mean("math_score"), 81.5);
        assert_eq!(mean("history_score"), 83.5);
        assert_eq!(mean("physics_score"), 94.5);
        assert_eq!(mean("chemistry_score"), 98.5);
        assert_eq!(mean("biology_score"), 76.5);
        assert_eq!(mean("english_score"), 84.0);
        assert_eq!(mean("geography_score"), 88.5);
    }

    #[test]
    fn test_subject_extremes() {
        let summary = calculate_summary_metrics(&two_students());
        let math = summary.subject("math_score").unwrap();
        assert_eq!(math.max, 90.0);
        assert_eq!(math.min, 73.0);
        assert_eq!(math.median, 81.5);

        let history = summary.subject("history_score").unwrap();
        assert_eq!(history.max, 86.0);
        assert_eq!(history.min, 81.0);
    }

    #[test]
    fn test_sample_stdev() {
        let metrics = describe("math_score", &[73.0, 90.0]);
        // Sample stdev of two values is |a - b| / sqrt(2).
        assert!((metrics.stdev - 17.0 / 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(describe("math_score", &[73.0]).stdev, 0.0);
    }

    #[test]
    fn test_empty_subject_is_all_zero() {
        let records: Vec<StudentRecord> =
            serde_json::from_value(json!([{"id": 1, "math_score": "absent"}])).unwrap();
        let summary = calculate_summary_metrics(&records);
        let math = summary.subject("math_score").unwrap();
        assert_eq!(
            *math,
            SubjectMetrics {
                subject: "math_score".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_odd_median() {
        assert_eq!(describe("x", &[5.0, 1.0, 3.0]).median, 3.0);
    }

    #[test]
    fn test_categorical_counts() {
        let summary = calculate_summary_metrics(&two_students());
        let comparisons = &summary.comparisons;
        assert_eq!(comparisons.by_gender.get("male"), 1);
        assert_eq!(comparisons.by_gender.get("female"), 1);
        assert_eq!(comparisons.by_career_aspiration.get("Lawyer"), 1);
        assert_eq!(comparisons.by_career_aspiration.get("Doctor"), 1);
        assert_eq!(comparisons.by_extracurricular_activities.get("false"), 2);
    }

    #[test]
    fn test_absent_category_counts_as_null() {
        let records: Vec<StudentRecord> =
            serde_json::from_value(json!([{"id": 1}, {"id": 2, "gender": "female"}])).unwrap();
        let counts = count_by(&records, "gender");
        assert_eq!(counts.get("null"), 1);
        assert_eq!(counts.get("female"), 1);
    }

    #[test]
    fn test_subjects_in_fixed_order() {
        let summary = calculate_summary_metrics(&two_students());
        let subjects: Vec<_> = summary
            .subject_metrics
            .iter()
            .map(|m| m.subject.as_str())
            .collect();
        assert_eq!(subjects, SUBJECTS.to_vec());
    }
}
