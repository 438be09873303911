//! Record sources.
//!
//! Records come either from the remote JSON endpoint or, when an input
//! file is given explicitly, from a previous run's JSON/CSV output.

pub mod input;

pub use input::load_records;

use crate::error::{PipelineError, PipelineResult};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Options for fetching the source document.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Whether to show a spinner while waiting.
    pub show_progress: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            show_progress: true,
        }
    }
}

/// Fetch and decode the JSON document at `url`.
pub async fn fetch_json(url: &str, options: &FetchOptions) -> PipelineResult<Value> {
    info!("Fetching JSON data from {}...", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(options.timeout_seconds))
        .build()
        .map_err(|source| PipelineError::Http {
            url: url.to_string(),
            source,
        })?;

    let spinner = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Downloading {}", url));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = download(&client, url).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let body = result?;
    info!("Data fetched successfully.");

    let parsed: Value = serde_json::from_str(&body)?;
    debug!("JSON data validated successfully.");
    Ok(parsed)
}

async fn download(client: &reqwest::Client, url: &str) -> PipelineResult<String> {
    let http_error = |source: reqwest::Error| PipelineError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(http_error)?;

    if !response.status().is_success() {
        return Err(PipelineError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.text().await.map_err(http_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quiet() -> FetchOptions {
        FetchOptions {
            timeout_seconds: 5,
            show_progress: false,
        }
    }

    #[tokio::test]
    async fn test_fetch_json_success() {
        let server = MockServer::start().await;
        let body = serde_json::json!([{"id": 1, "first_name": "Paul"}]);

        Mock::given(method("GET"))
            .and(path("/students.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let url = format!("{}/students.json", server.uri());
        let value = fetch_json(&url, &quiet()).await.unwrap();
        assert_eq!(value, body);
    }

    #[tokio::test]
    async fn test_fetch_json_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = fetch_json(&server.uri(), &quiet()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_fetch_json_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[{not json"))
            .mount(&server)
            .await;

        let err = fetch_json(&server.uri(), &quiet()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_json_unreachable() {
        let err = fetch_json("http://127.0.0.1:1/students.json", &quiet())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Http { .. }));
    }

    #[test]
    fn test_fetch_options_default() {
        let opts = FetchOptions::default();
        assert_eq!(opts.timeout_seconds, 10);
        assert!(opts.show_progress);
    }
}
