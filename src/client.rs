//! Client for the comment analysis service.
//!
//! The service fetches a video's comments and classifies them; this module
//! only speaks its JSON contract. [`AnalysisService`] is the seam the session
//! controller depends on, [`HttpAnalysisService`] the reqwest implementation.

use crate::error::FetchError;
use crate::models::{AnalysisResult, ClassifiedComment, Sentiment, INVALID_LABEL};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// The external collaborator that turns a video reference into classified comments.
pub trait AnalysisService: Send + Sync {
    /// Fetch and classify comments for `video_ref`, passed through as given.
    fn fetch_analysis(
        &self,
        video_ref: &str,
    ) -> impl Future<Output = Result<AnalysisResult, FetchError>> + Send;
}

/// Connection settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub endpoint: String,
    pub predict_endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            endpoint: "/api/fetch-comments".to_string(),
            predict_endpoint: "/api/predict".to_string(),
            timeout_seconds: 120,
        }
    }
}

impl ClientConfig {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Serialize)]
struct FetchCommentsRequest<'a> {
    youtube_url: &'a str,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    text: &'a str,
}

/// Response envelope of the fetch-comments endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    results: Option<Vec<ClassifiedComment>>,
    #[serde(default)]
    error: Option<String>,
}

/// Response of the single-text predict endpoint.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    text: String,
    predicted_label: String,
    probabilities: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// reqwest-backed analysis service.
pub struct HttpAnalysisService {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl HttpAnalysisService {
    pub fn new(config: ClientConfig) -> Result<Self> {
        info!(
            "Using analysis service at {} (timeout {}s)",
            config.base_url, config.timeout_seconds
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Classify a single piece of text.
    pub async fn predict_text(&self, text: &str) -> Result<ClassifiedComment, FetchError> {
        let url = self.config.url(&self.config.predict_endpoint);
        debug!("POST {}", url);

        let (success, status, body) = self.post(&url, &PredictRequest { text }).await?;
        parse_prediction(success, status, &body)
    }

    async fn post<T: Serialize>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<(bool, u16, String), FetchError> {
        let response = self
            .http_client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Transport(format!(
                        "Request timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    FetchError::Transport(format!(
                        "Cannot connect to analysis service at {}",
                        self.config.base_url
                    ))
                } else {
                    FetchError::Transport(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("Failed to read response body: {}", e)))?;

        Ok((status.is_success(), status.as_u16(), body))
    }
}

impl AnalysisService for HttpAnalysisService {
    async fn fetch_analysis(&self, video_ref: &str) -> Result<AnalysisResult, FetchError> {
        let url = self.config.url(&self.config.endpoint);
        debug!("POST {} for {}", url, video_ref);

        let (success, status, body) = self
            .post(&url, &FetchCommentsRequest {
                youtube_url: video_ref,
            })
            .await?;

        parse_envelope(success, status, &body)
    }
}

/// Interpret a fetch-comments response body.
///
/// On failure statuses a structured `error` field becomes a service error.
/// On success, `results` wins; an `error` without `results` is still a
/// service error and anything else is a transport failure.
pub(crate) fn parse_envelope(
    success: bool,
    status: u16,
    body: &str,
) -> Result<AnalysisResult, FetchError> {
    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if success => {
            return Err(FetchError::Transport(format!(
                "Malformed response from analysis service: {}",
                e
            )))
        }
        Err(_) => return Err(FetchError::Transport(format!("HTTP {}", status))),
    };

    if !success {
        return Err(match envelope.error {
            Some(error) => FetchError::Service(error),
            None => FetchError::Transport(format!("HTTP {}", status)),
        });
    }

    match (envelope.results, envelope.error) {
        (Some(results), _) => Ok(AnalysisResult::new(results)),
        (None, Some(error)) => Err(FetchError::Service(error)),
        (None, None) => Err(FetchError::Transport(
            "Response is missing the 'results' field".to_string(),
        )),
    }
}

/// Interpret a predict response body.
///
/// Unknown label names and missing probability entries are kept visible as
/// an out-of-range label or a short probability vector.
pub(crate) fn parse_prediction(
    success: bool,
    status: u16,
    body: &str,
) -> Result<ClassifiedComment, FetchError> {
    if !success {
        return Err(match serde_json::from_str::<ErrorBody>(body) {
            Ok(err) => FetchError::Service(err.error),
            Err(_) => FetchError::Transport(format!("HTTP {}", status)),
        });
    }

    let prediction: PredictResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::Transport(format!("Malformed response from analysis service: {}", e))
    })?;

    let sentiment_label = Sentiment::from_name(&prediction.predicted_label)
        .map(|s| s as i64)
        .unwrap_or(INVALID_LABEL);

    let sentiment_probabilities = Sentiment::ALL
        .iter()
        .filter_map(|s| prediction.probabilities.get(&s.to_string()).copied())
        .collect();

    Ok(ClassifiedComment {
        original_comment: prediction.text,
        cleaned_comment: None,
        sentiment_label,
        sentiment_probabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(
            config.url(&config.endpoint),
            "http://127.0.0.1:5000/api/fetch-comments"
        );
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = ClientConfig {
            base_url: "http://example.com/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.url("/api/predict"), "http://example.com/api/predict");
    }

    #[test]
    fn test_parse_success_envelope() {
        let body = r#"{"results": [
            {"original_comment": "Love it", "cleaned_comment": "love it",
             "sentiment_label": 2, "sentiment_probabilities": [0.1, 0.1, 0.8]},
            {"original_comment": "Meh", "sentiment_label": 1,
             "sentiment_probabilities": [0.2, 0.6, 0.2]}
        ]}"#;

        let result = parse_envelope(true, 200, body).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.comments()[0].original_comment, "Love it");
        assert_eq!(result.comments()[1].cleaned_comment, None);
    }

    #[test]
    fn test_parse_empty_results() {
        let result = parse_envelope(true, 200, r#"{"results": []}"#).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_parse_keeps_malformed_records() {
        let body = r#"{"results": [
            {"original_comment": "Fine", "sentiment_label": 2,
             "sentiment_probabilities": [0.1, 0.1, 0.8]},
            {"original_comment": "Null probs", "sentiment_label": 1,
             "sentiment_probabilities": null},
            {"original_comment": "No probs", "sentiment_label": 0},
            {"original_comment": "Text label", "sentiment_label": "positive",
             "sentiment_probabilities": [0.1, 0.1, 0.8]},
            {"original_comment": "Null entry", "sentiment_label": 1,
             "sentiment_probabilities": [0.1, null, 0.8]}
        ]}"#;

        let result = parse_envelope(true, 200, body).unwrap();
        assert_eq!(result.len(), 5);

        let comments = result.comments();
        assert!(comments[1].sentiment_probabilities.is_empty());
        assert!(comments[2].sentiment_probabilities.is_empty());
        assert_eq!(comments[3].sentiment_label, INVALID_LABEL);
        assert!(comments[4].sentiment_probabilities.is_empty());

        let counts = crate::analysis::count_by_category(&result);
        assert_eq!(counts.total, 1);
        assert_eq!(counts.positive, 1);
        assert_eq!(counts.unknown, 4);
    }

    #[test]
    fn test_parse_service_error() {
        let err = parse_envelope(false, 500, r#"{"error": "quota exceeded"}"#).unwrap_err();
        assert_eq!(err, FetchError::Service("quota exceeded".to_string()));
    }

    #[test]
    fn test_parse_error_without_body() {
        let err = parse_envelope(false, 502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));

        let err = parse_envelope(false, 500, r#"{"detail": "boom"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_parse_success_status_with_error_payload() {
        let err = parse_envelope(true, 200, r#"{"error": "Invalid YouTube URL"}"#).unwrap_err();
        assert_eq!(err, FetchError::Service("Invalid YouTube URL".to_string()));
    }

    #[test]
    fn test_parse_success_status_malformed() {
        let err = parse_envelope(true, 200, "not json").unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));

        let err = parse_envelope(true, 200, "{}").unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_parse_prediction() {
        let body = r#"{
            "text": "This is an amazing video!",
            "predicted_label": "Positive",
            "probabilities": {"Negative": 0.02, "Neutral": 0.08, "Positive": 0.9}
        }"#;

        let comment = parse_prediction(true, 200, body).unwrap();
        assert_eq!(comment.original_comment, "This is an amazing video!");
        assert_eq!(comment.sentiment_label, 2);
        assert_eq!(comment.sentiment_probabilities, vec![0.02, 0.08, 0.9]);
    }

    #[test]
    fn test_parse_prediction_unknown_label() {
        let body = r#"{"text": "hm", "predicted_label": "Mixed",
                       "probabilities": {"Negative": 0.5, "Positive": 0.5}}"#;

        let comment = parse_prediction(true, 200, body).unwrap();
        assert_eq!(comment.sentiment_label, -1);
        assert_eq!(comment.sentiment_probabilities.len(), 2);
    }

    #[test]
    fn test_parse_prediction_error() {
        let body = r#"{"error": "Invalid input. Please provide a 'text' field."}"#;
        let err = parse_prediction(false, 400, body).unwrap_err();
        assert_eq!(
            err,
            FetchError::Service("Invalid input. Please provide a 'text' field.".to_string())
        );
    }
}
