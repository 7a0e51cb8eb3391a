//! Reqwest-based HTTP client for archive job submission.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use jiff::Timestamp;
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;

use crate::{
    JobSubmission, TRACING_TARGET, ZipGenConfig, ZipGenError, ZipGenResult, ZipJobProvider,
    ZipJobRequest,
};

type HmacSha256 = Hmac<Sha256>;

/// Inner client that holds the HTTP client and configuration.
struct ZipGenClientInner {
    http: Client,
    config: ZipGenConfig,
}

/// Acknowledgement body some workers return on submission.
///
/// The original Lambda worker answered with its invocation id; plain HTTP
/// workers may answer with an empty body. Both are fine.
#[derive(Debug, Deserialize)]
struct SubmissionAck {
    #[serde(default, alias = "lambda_request_id")]
    job_id: Option<String>,
}

/// Reqwest-based HTTP client for submitting archive jobs to the external
/// worker.
///
/// This client implements the [`ZipJobProvider`] trait. Submissions are
/// fire-and-forget: a 2xx acknowledgement means the worker accepted the job,
/// and the outcome arrives later on the callback URL.
#[derive(Clone)]
pub struct ZipGenClient {
    inner: Arc<ZipGenClientInner>,
}

impl std::fmt::Debug for ZipGenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipGenClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ZipGenClient {
    /// Creates a new archive worker client with the given configuration.
    pub fn new(config: ZipGenConfig) -> Self {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %config.zipgen_endpoint,
            timeout_ms = timeout.as_millis(),
            "Creating archive worker client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .expect("failed to create HTTP client");

        let inner = ZipGenClientInner { http, config };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ZipGenConfig {
        &self.inner.config
    }

    /// Signs a payload using HMAC-SHA256.
    ///
    /// The signature is computed over: `{timestamp}.{payload}`
    pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        let signing_input = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());

        let result = mac.finalize();
        hex::encode(result.into_bytes())
    }
}

#[async_trait::async_trait]
impl ZipJobProvider for ZipGenClient {
    async fn submit(&self, job: &ZipJobRequest) -> ZipGenResult<JobSubmission> {
        let started_at = Timestamp::now();
        let timestamp = started_at.as_second();

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %job.request_id,
            retreat_id = %job.retreat_id,
            files = job.file_count(),
            "Submitting archive job"
        );

        let payload = serde_json::to_vec(job)?;

        // Build the HTTP request
        let mut http_request = self
            .http()
            .post(self.config().zipgen_endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("x-zipgen-timestamp", timestamp.to_string())
            .header("x-zipgen-request-id", job.request_id.to_string());

        // Add HMAC-SHA256 signature if a secret is configured
        if let Some(secret) = self.config().zipgen_secret.as_deref() {
            let signature = Self::sign_payload(secret, timestamp, &payload);
            http_request = http_request.header("x-zipgen-signature", format!("sha256={signature}"));
        }

        let http_response = http_request.body(payload).send().await?;

        let status_code = http_response.status().as_u16();
        if !(200..300).contains(&status_code) {
            tracing::warn!(
                target: TRACING_TARGET,
                request_id = %job.request_id,
                status_code,
                "Archive worker rejected the job"
            );
            return Err(ZipGenError::Rejected {
                status: status_code,
            });
        }

        // The acknowledgement body is optional
        let job_id = http_response
            .json::<SubmissionAck>()
            .await
            .ok()
            .and_then(|ack| ack.job_id);

        let submission = JobSubmission::new(job.request_id, job_id, status_code, started_at);

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %job.request_id,
            status_code,
            job_id = submission.job_id.as_deref(),
            "Archive job accepted"
        );

        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    #[test]
    fn sign_payload_is_hex_sha256() {
        let secret = "test_secret";
        let timestamp = 1234567890i64;
        let payload = b"{\"request_id\":\"abc\"}";

        let signature = ZipGenClient::sign_payload(secret, timestamp, payload);

        // Signature should be a hex string (64 chars for SHA256)
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sign_payload_is_deterministic() {
        let payload = b"{\"request_id\":\"abc\"}";

        let first = ZipGenClient::sign_payload("secret", 1700000000, payload);
        let second = ZipGenClient::sign_payload("secret", 1700000000, payload);
        let other_secret = ZipGenClient::sign_payload("other", 1700000000, payload);
        let other_time = ZipGenClient::sign_payload("secret", 1700000001, payload);

        assert_eq!(first, second);
        assert_ne!(first, other_secret);
        assert_ne!(first, other_time);
    }

    #[test]
    fn client_creation() {
        let endpoint = Url::parse("https://worker.example.com/jobs").unwrap();
        let client = ZipGenClient::new(ZipGenConfig::new(endpoint));
        assert!(client.config().zipgen_secret.is_none());
    }

    #[test]
    fn ack_body_accepts_both_worker_dialects() {
        let ack: SubmissionAck = serde_json::from_str(r#"{"job_id":"j-1"}"#).unwrap();
        assert_eq!(ack.job_id.as_deref(), Some("j-1"));

        let ack: SubmissionAck =
            serde_json::from_str(r#"{"lambda_request_id":"l-2"}"#).unwrap();
        assert_eq!(ack.job_id.as_deref(), Some("l-2"));

        let ack: SubmissionAck = serde_json::from_str("{}").unwrap();
        assert!(ack.job_id.is_none());
    }
}
