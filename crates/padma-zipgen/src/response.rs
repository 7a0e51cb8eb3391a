//! Archive job submission response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of an archive job submission attempt.
///
/// A submission only acknowledges receipt: the archive itself is produced
/// asynchronously, and the worker reports completion on the callback URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSubmission {
    /// Unique identifier for this submission attempt.
    pub submission_id: Uuid,
    /// Download request the job belongs to.
    pub request_id: Uuid,
    /// Worker-side job identifier, when the worker returned one.
    pub job_id: Option<String>,
    /// HTTP status code from the worker endpoint.
    pub status_code: u16,
    /// Timestamp when the submission was initiated.
    pub started_at: Timestamp,
    /// Timestamp when the acknowledgement was received.
    pub finished_at: Timestamp,
}

impl JobSubmission {
    /// Creates a new submission record.
    pub fn new(
        request_id: Uuid,
        job_id: Option<String>,
        status_code: u16,
        started_at: Timestamp,
    ) -> Self {
        Self {
            submission_id: Uuid::now_v7(),
            request_id,
            job_id,
            status_code,
            started_at,
            finished_at: Timestamp::now(),
        }
    }

    /// Returns whether the worker accepted the job (2xx status code).
    pub fn is_accepted(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Calculates the acknowledgement time as a duration.
    pub fn duration(&self) -> jiff::Span {
        self.started_at.until(self.finished_at).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_submission() {
        let request_id = Uuid::new_v4();
        let submission =
            JobSubmission::new(request_id, Some("job-1".to_owned()), 202, Timestamp::now());

        assert!(submission.is_accepted());
        assert_eq!(submission.request_id, request_id);
        assert_eq!(submission.job_id.as_deref(), Some("job-1"));
    }

    #[test]
    fn acceptance_covers_the_whole_2xx_range() {
        let started_at = Timestamp::now();

        assert!(JobSubmission::new(Uuid::new_v4(), None, 200, started_at).is_accepted());
        assert!(JobSubmission::new(Uuid::new_v4(), None, 202, started_at).is_accepted());

        assert!(!JobSubmission::new(Uuid::new_v4(), None, 301, started_at).is_accepted());
        assert!(!JobSubmission::new(Uuid::new_v4(), None, 400, started_at).is_accepted());
        assert!(!JobSubmission::new(Uuid::new_v4(), None, 500, started_at).is_accepted());
    }
}
