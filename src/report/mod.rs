//! Output files for a pipeline run.
//!
//! Records and metrics are written as JSON and tab-delimited CSV, plus a
//! bar chart of subject means. A failure on one file is logged and the
//! remaining files are still written.

pub mod chart;
pub mod writer;

pub use chart::generate_report;
pub use writer::{save_category_csv, save_json, save_records_csv, save_subject_metrics_csv};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{StudentRecord, SummaryMetrics};
use std::path::{Path, PathBuf};
use tracing::error;

pub const STUDENT_DATA_JSON: &str = "student_data.json";
pub const STUDENT_DATA_CSV: &str = "student_data.csv";
pub const SUMMARY_METRICS_JSON: &str = "summary_metrics.json";
pub const SUBJECT_METRICS_CSV: &str = "subject_metrics.csv";
pub const GENDER_METRICS_CSV: &str = "gender_metrics.csv";
pub const CAREER_METRICS_CSV: &str = "career_metrics.csv";
pub const EXTRACURRICULAR_METRICS_CSV: &str = "extracurricular_metrics.csv";
pub const SUBJECT_METRICS_PNG: &str = "subject_metrics.png";

/// Which files were written and which failed.
#[derive(Debug, Default)]
pub struct WriteSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, PipelineError)>,
}

impl WriteSummary {
    fn record(&mut self, path: PathBuf, result: PipelineResult<()>) {
        match result {
            Ok(()) => self.written.push(path),
            Err(e) => {
                error!("Error saving {} to disk: {}", path.display(), e);
                self.failed.push((path, e));
            }
        }
    }
}

/// Write every output file into `dir`.
pub fn write_outputs(
    dir: &Path,
    records: &[StudentRecord],
    summary: &SummaryMetrics,
    with_chart: bool,
) -> WriteSummary {
    let mut result = WriteSummary::default();

    if let Err(e) = std::fs::create_dir_all(dir) {
        result.record(dir.to_path_buf(), Err(e.into()));
        return result;
    }

    let path = dir.join(STUDENT_DATA_JSON);
    result.record(path.clone(), save_json(records, &path));

    let path = dir.join(STUDENT_DATA_CSV);
    result.record(path.clone(), save_records_csv(records, &path));

    let path = dir.join(SUMMARY_METRICS_JSON);
    result.record(path.clone(), save_json(summary, &path));

    let path = dir.join(SUBJECT_METRICS_CSV);
    result.record(
        path.clone(),
        save_subject_metrics_csv(&summary.subject_metrics, &path),
    );

    let comparisons = &summary.comparisons;
    for (name, counts) in [
        (GENDER_METRICS_CSV, &comparisons.by_gender),
        (CAREER_METRICS_CSV, &comparisons.by_career_aspiration),
        (
            EXTRACURRICULAR_METRICS_CSV,
            &comparisons.by_extracurricular_activities,
        ),
    ] {
        let path = dir.join(name);
        result.record(path.clone(), save_category_csv(counts, &path));
    }

    if with_chart {
        let path = dir.join(SUBJECT_METRICS_PNG);
        result.record(
            path.clone(),
            generate_report(&summary.subject_metrics, &path),
        );
    }

    result
}
