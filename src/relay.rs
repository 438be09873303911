//! Batch relay of low-score reports.

use crate::error::{PipelineError, PipelineResult};
use crate::models::LowScoreReport;
use std::time::Duration;
use tracing::{debug, info};

/// Posts low-score reports to a remote endpoint in one request.
pub struct LowScoreRelay {
    url: String,
    client: reqwest::Client,
}

impl LowScoreRelay {
    /// Create a relay for `url` with a request timeout.
    pub fn new(url: impl Into<String>, timeout_seconds: u64) -> PipelineResult<Self> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|source| PipelineError::Http {
                url: url.clone(),
                source,
            })?;
        Ok(Self { url, client })
    }

    /// Send the whole batch as a JSON array. Returns the number of reports sent.
    ///
    /// Nothing is sent for an empty batch. There is no retry.
    pub async fn post_low_scores(&self, reports: &[LowScoreReport]) -> PipelineResult<usize> {
        if reports.is_empty() {
            debug!("No low score records to post");
            return Ok(0);
        }

        info!(
            "Posting {} low score records to {}",
            reports.len(),
            self.url
        );

        let response = self
            .client
            .post(&self.url)
            .json(reports)
            .send()
            .await
            .map_err(|source| PipelineError::Http {
                url: self.url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(PipelineError::Status {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        debug!("Low score records posted successfully");
        Ok(reports.len())
    }
}
