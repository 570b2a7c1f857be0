use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use log::{info, warn};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use url::Url;

use super::{SubmissionBackend, SubmissionError};
use crate::models::requests::AssessmentSubmission;
use crate::models::responses::ApiResponse;
use crate::models::results::ResultSummary;
use crate::settings::{self, SubmissionConfig};

const DEFAULT_RETRY_BASE_MS: u64 = 100;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);

/// POSTs the submission as JSON and expects an `ApiResponse<ResultSummary>` back.
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    /// Retries after the first attempt.
    max_retries: usize,
    retry_base_ms: u64,
}

impl HttpSubmitter {
    pub fn new(endpoint: Url, timeout: Duration, max_retries: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for inference endpoint")?;
        Ok(Self {
            client,
            endpoint,
            timeout,
            max_retries,
            retry_base_ms: DEFAULT_RETRY_BASE_MS,
        })
    }

    pub fn from_config(cfg: &SubmissionConfig) -> anyhow::Result<Self> {
        let raw = cfg
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .context("submission.endpoint is required for http mode")?;
        let endpoint = settings::validate_endpoint(raw)?;
        Self::new(
            endpoint,
            Duration::from_secs(cfg.timeout_secs),
            cfg.max_retries,
        )
    }

    /// Shorter backoff, for tests against a local listener.
    pub fn with_retry_base_ms(mut self, ms: u64) -> Self {
        self.retry_base_ms = ms.max(1);
        self
    }

    fn classify(&self, e: reqwest::Error) -> SubmissionError {
        if e.is_timeout() {
            SubmissionError::Timeout(self.timeout)
        } else {
            SubmissionError::Transport(e.to_string())
        }
    }

    async fn attempt(
        &self,
        submission: &AssessmentSubmission,
    ) -> Result<ResultSummary, SubmissionError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(submission)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| self.classify(e))?;
        let parsed: ApiResponse<ResultSummary> = serde_json::from_slice(&body)
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;
        let summary = parsed
            .into_result()
            .map_err(|message| SubmissionError::Unsuccessful { message })?;
        summary
            .check_ranges()
            .map_err(SubmissionError::InvalidResponse)?;
        Ok(summary)
    }
}

#[async_trait]
impl SubmissionBackend for HttpSubmitter {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn submit(
        &self,
        submission: &AssessmentSubmission,
    ) -> Result<ResultSummary, SubmissionError> {
        info!(
            "[PHASE: submission] [STEP: http] Posting {} section(s) to {} (correlation_id={})",
            submission.assessment.present_sections().len(),
            self.endpoint,
            submission.correlation_id
        );

        let retry_strategy = ExponentialBackoff::from_millis(self.retry_base_ms)
            .factor(2)
            .max_delay(MAX_RETRY_DELAY)
            .take(self.max_retries)
            .map(jitter);

        let correlation_id = submission.correlation_id.as_str();
        RetryIf::spawn(
            retry_strategy,
            || self.attempt(submission),
            |e: &SubmissionError| {
                let retry = e.is_retryable();
                if retry {
                    warn!(
                        "[PHASE: submission] [STEP: http] Attempt failed, retrying: {} (correlation_id={})",
                        e, correlation_id
                    );
                }
                retry
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aggregate::AssessmentAggregate;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::mpsc;

    enum Reply {
        Respond(u16, String),
        Hang,
    }

    async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return buf;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    return buf[end + 4..].to_vec();
                }
            }
        }
    }

    /// Serves `replies` in order, one connection each. Every request body is forwarded on the
    /// returned channel so the test itself can inspect it.
    async fn fake_endpoint(
        replies: Vec<Reply>,
    ) -> (Url, mpsc::UnboundedReceiver<serde_json::Value>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (body_tx, body_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            for reply in replies {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let body = read_request(&mut stream).await;
                let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();
                let _ = body_tx.send(parsed);
                match reply {
                    Reply::Respond(status, body) => {
                        let resp = format!(
                            "HTTP/1.1 {} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = stream.write_all(resp.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    }
                    Reply::Hang => {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });
        let url = Url::parse(&format!("http://{}/v1/assess", addr)).unwrap();
        (url, body_rx)
    }

    /// Request bodies received so far; each must carry the submission's correlation id.
    fn received(
        rx: &mut mpsc::UnboundedReceiver<serde_json::Value>,
        submission: &AssessmentSubmission,
    ) -> usize {
        let mut count = 0;
        while let Ok(body) = rx.try_recv() {
            assert_eq!(
                body["correlationId"].as_str(),
                Some(submission.correlation_id.as_str()),
                "request body: {}",
                body
            );
            count += 1;
        }
        count
    }

    fn ok_body() -> String {
        serde_json::json!({ "success": true, "data": ResultSummary::mock() }).to_string()
    }

    fn submitter(url: Url, max_retries: usize) -> HttpSubmitter {
        HttpSubmitter::new(url, Duration::from_secs(2), max_retries)
            .unwrap()
            .with_retry_base_ms(1)
    }

    fn submission() -> AssessmentSubmission {
        AssessmentSubmission::new(AssessmentAggregate::default())
    }

    #[tokio::test]
    async fn success_returns_summary() {
        let (url, mut bodies) = fake_endpoint(vec![Reply::Respond(200, ok_body())]).await;
        let sub = submission();
        let summary = submitter(url, 3).submit(&sub).await.unwrap();
        assert_eq!(summary.risk_score, 68);
        assert_eq!(received(&mut bodies, &sub), 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let (url, mut bodies) = fake_endpoint(vec![
            Reply::Respond(500, "{}".into()),
            Reply::Respond(503, "{}".into()),
            Reply::Respond(200, ok_body()),
        ])
        .await;
        let sub = submission();
        let summary = submitter(url, 3).submit(&sub).await.unwrap();
        assert_eq!(summary.risk_score, 68);
        assert_eq!(
            received(&mut bodies, &sub),
            3,
            "Every retry resends the same correlation id"
        );
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let (url, mut bodies) = fake_endpoint(vec![
            Reply::Respond(502, "{}".into()),
            Reply::Respond(502, "{}".into()),
            Reply::Respond(502, "{}".into()),
            Reply::Respond(200, ok_body()),
        ])
        .await;
        let sub = submission();
        let err = submitter(url, 2).submit(&sub).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Rejected { status: 502 }), "{}", err);
        assert_eq!(received(&mut bodies, &sub), 3, "one attempt plus two retries");
    }

    #[tokio::test]
    async fn client_errors_fail_fast() {
        let (url, mut bodies) = fake_endpoint(vec![
            Reply::Respond(400, "{}".into()),
            Reply::Respond(200, ok_body()),
        ])
        .await;
        let sub = submission();
        let err = submitter(url, 3).submit(&sub).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Rejected { status: 400 }), "{}", err);
        assert_eq!(received(&mut bodies, &sub), 1);
    }

    #[tokio::test]
    async fn unsuccessful_and_malformed_bodies_are_not_retried() {
        let (url, mut bodies) = fake_endpoint(vec![Reply::Respond(
            200,
            r#"{"success":false,"error":"model offline"}"#.into(),
        )])
        .await;
        let sub = submission();
        let err = submitter(url, 3).submit(&sub).await.unwrap_err();
        assert!(
            matches!(&err, SubmissionError::Unsuccessful { message } if message == "model offline"),
            "{}",
            err
        );
        assert_eq!(received(&mut bodies, &sub), 1);

        let (url, _) = fake_endpoint(vec![Reply::Respond(200, "not json".into())]).await;
        let err = submitter(url, 3).submit(&sub).await.unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidResponse(_)), "{}", err);
    }

    #[tokio::test]
    async fn out_of_range_summary_is_rejected() {
        let mut summary = serde_json::to_value(ResultSummary::mock()).unwrap();
        summary["riskScore"] = serde_json::json!(150);
        let body = serde_json::json!({ "success": true, "data": summary }).to_string();

        let (url, mut bodies) = fake_endpoint(vec![
            Reply::Respond(200, body),
            Reply::Respond(200, ok_body()),
        ])
        .await;
        let sub = submission();
        let err = submitter(url, 3).submit(&sub).await.unwrap_err();
        assert!(
            matches!(&err, SubmissionError::InvalidResponse(m) if m.contains("riskScore")),
            "{}",
            err
        );
        assert_eq!(received(&mut bodies, &sub), 1, "A bad payload is not retried");

        let mut summary = serde_json::to_value(ResultSummary::mock()).unwrap();
        summary["pcosProbability"] = serde_json::json!(1.7);
        let body = serde_json::json!({ "success": true, "data": summary }).to_string();
        let (url, _) = fake_endpoint(vec![Reply::Respond(200, body)]).await;
        let err = submitter(url, 0).submit(&sub).await.unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidResponse(_)), "{}", err);
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let (url, _) = fake_endpoint(vec![Reply::Hang]).await;
        let backend = HttpSubmitter::new(url, Duration::from_millis(150), 0)
            .unwrap()
            .with_retry_base_ms(1);
        let err = backend.submit(&submission()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Timeout(_)), "{}", err);
    }

    #[test]
    fn from_config_validates_endpoint() {
        let mut cfg = SubmissionConfig {
            mode: crate::settings::SubmissionMode::Http,
            endpoint: Some("not a url".into()),
            ..SubmissionConfig::default()
        };
        assert!(HttpSubmitter::from_config(&cfg).is_err());
        cfg.endpoint = Some("https://inference.example.org/assess".into());
        assert_eq!(HttpSubmitter::from_config(&cfg).unwrap().name(), "http");
    }
}
