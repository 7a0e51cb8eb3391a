#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;

pub mod request;
pub mod response;

pub use client::ZipGenClient;
pub use config::ZipGenConfig;
pub use error::{ZipGenError, ZipGenResult};
pub use request::ZipJobRequest;
pub use response::JobSubmission;

/// Tracing target for archive job submission.
pub const TRACING_TARGET: &str = "padma_zipgen";

/// Core trait for submitting archive generation jobs.
///
/// The worker acknowledges receipt synchronously and reports progress and
/// the final outcome later on the callback URL carried by the job payload.
#[async_trait::async_trait]
pub trait ZipJobProvider: Send + Sync {
    /// Submits an archive job to the external worker.
    async fn submit(&self, job: &ZipJobRequest) -> ZipGenResult<JobSubmission>;
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use url::Url;
    use uuid::Uuid;

    use super::*;

    struct StubProvider;

    #[async_trait::async_trait]
    impl ZipJobProvider for StubProvider {
        async fn submit(&self, job: &ZipJobRequest) -> ZipGenResult<JobSubmission> {
            let job_id = Some("stub-job".to_owned());
            Ok(JobSubmission::new(job.request_id, job_id, 202, Timestamp::now()))
        }
    }

    #[tokio::test]
    async fn stub_provider_drives_the_trait_seam() {
        let provider: Box<dyn ZipJobProvider> = Box::new(StubProvider);

        let job = ZipJobRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Spring Retreat 2025",
            vec!["audio/track-01.mp3".to_owned()],
            Url::parse("https://api.example.com/download-webhook").unwrap(),
        );

        let submission = provider.submit(&job).await.unwrap();
        assert!(submission.is_accepted());
        assert_eq!(submission.request_id, job.request_id);
        assert_eq!(submission.job_id.as_deref(), Some("stub-job"));
    }
}
