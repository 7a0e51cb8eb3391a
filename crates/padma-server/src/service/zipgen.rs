//! Archive job submission wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use padma_zipgen::{JobSubmission, ZipGenResult, ZipJobProvider, ZipJobRequest};

const TRACING_TARGET: &str = "padma_server::zipgen";

/// Archive job service wrapper.
///
/// Adds structured logging around any [`ZipJobProvider`] implementation. The
/// inner provider is wrapped in `Arc` for cheap cloning, which also lets
/// tests drive the orchestrator with a stub worker.
#[derive(Clone)]
pub struct ZipJobService {
    inner: Arc<dyn ZipJobProvider>,
}

impl fmt::Debug for ZipJobService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipJobService").finish_non_exhaustive()
    }
}

impl ZipJobService {
    /// Creates a new archive job service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: ZipJobProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Submits an archive generation job to the external worker.
    pub async fn submit(&self, job: &ZipJobRequest) -> ZipGenResult<JobSubmission> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %job.request_id,
            retreat_id = %job.retreat_id,
            file_count = job.file_count(),
            "Submitting archive job"
        );

        let result = self.inner.submit(job).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(submission) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    request_id = %job.request_id,
                    job_id = ?submission.job_id,
                    status_code = submission.status_code,
                    elapsed_ms = elapsed.as_millis(),
                    "Archive job accepted"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    request_id = %job.request_id,
                    error = %error,
                    transient = error.is_transient(),
                    elapsed_ms = elapsed.as_millis(),
                    "Archive job submission failed"
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use url::Url;
    use uuid::Uuid;

    use super::*;

    struct AcceptingWorker;

    #[async_trait::async_trait]
    impl ZipJobProvider for AcceptingWorker {
        async fn submit(&self, job: &ZipJobRequest) -> ZipGenResult<JobSubmission> {
            Ok(JobSubmission::new(
                job.request_id,
                Some("job-7".to_owned()),
                202,
                Timestamp::now(),
            ))
        }
    }

    #[tokio::test]
    async fn wrapper_delegates_to_the_provider() {
        let service = ZipJobService::new(AcceptingWorker);

        let job = ZipJobRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Winter Retreat",
            vec!["audio/track-01.mp3".to_owned()],
            Url::parse("https://api.example.com/download-webhook").unwrap(),
        );

        let submission = service.submit(&job).await.unwrap();
        assert!(submission.is_accepted());
        assert_eq!(submission.job_id.as_deref(), Some("job-7"));
    }

    #[test]
    fn debug_does_not_expose_the_provider() {
        let service = ZipJobService::new(AcceptingWorker);
        assert_eq!(format!("{service:?}"), "ZipJobService { .. }");
    }
}
