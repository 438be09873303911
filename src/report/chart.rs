//! Bar chart of per-subject means.

use crate::error::{PipelineError, PipelineResult};
use crate::models::SubjectMetrics;
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

const CHART_SIZE: (u32, u32) = (1000, 600);
const BAR_COLOR: RGBColor = RGBColor(135, 206, 235);

/// Human-readable subject label: `math_score` becomes `math`.
pub fn subject_label(subject: &str) -> &str {
    subject
        .strip_suffix(crate::models::SCORE_SUFFIX)
        .unwrap_or(subject)
}

/// Upper bound of the y axis: the largest mean rounded up to a multiple of 10.
pub fn y_axis_limit(metrics: &[SubjectMetrics]) -> f64 {
    let max = metrics.iter().map(|m| m.mean).fold(0.0, f64::max);
    ((max / 10.0).ceil() * 10.0).max(10.0)
}

/// Render the average score of each subject as a PNG bar chart.
pub fn generate_report(metrics: &[SubjectMetrics], path: &Path) -> PipelineResult<()> {
    draw(metrics, path).map_err(|e| PipelineError::Chart(e.to_string()))?;
    info!("Graph saved as {}", path.display());
    Ok(())
}

fn draw(
    metrics: &[SubjectMetrics],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error + 'static>> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let labels: Vec<&str> = metrics.iter().map(|m| subject_label(&m.subject)).collect();
    let count = metrics.len() as u32;

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Scores by Subject", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (0u32..count).into_segmented(),
            0f64..y_axis_limit(metrics),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Subjects")
        .y_desc("Average Score")
        .x_labels(labels.len())
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => labels
                .get(*i as usize)
                .map(|l| l.to_string())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_COLOR.filled())
            .margin(10)
            .data(metrics.iter().enumerate().map(|(i, m)| (i as u32, m.mean))),
    )?;

    root.present()?;
    Ok(())
}
