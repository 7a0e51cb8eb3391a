//! Archive job submission payload types.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// An archive generation job for the external worker.
///
/// Field names on the wire follow the worker contract, which predates this
/// crate: the source object keys travel as `audio_files` and the callback
/// URL as `webhook_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZipJobRequest {
    /// Download request this job belongs to. Echoed back on every callback.
    pub request_id: Uuid,
    /// Retreat the archive is generated for.
    pub retreat_id: Uuid,
    /// Human-readable retreat name, used for the archive file name.
    pub retreat_name: String,
    /// Object keys of the recordings to pack, in track order.
    #[serde(rename = "audio_files")]
    pub source_keys: Vec<String>,
    /// Endpoint the worker reports progress and the final outcome to.
    #[serde(rename = "webhook_url")]
    pub callback_url: Url,
}

impl ZipJobRequest {
    /// Creates a new archive job.
    pub fn new(
        request_id: Uuid,
        retreat_id: Uuid,
        retreat_name: impl Into<String>,
        source_keys: Vec<String>,
        callback_url: Url,
    ) -> Self {
        Self {
            request_id,
            retreat_id,
            retreat_name: retreat_name.into(),
            source_keys,
            callback_url,
        }
    }

    /// Number of recordings the job packs.
    pub fn file_count(&self) -> usize {
        self.source_keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> ZipJobRequest {
        ZipJobRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Autumn Retreat 2025",
            vec![
                "audio/track-01.mp3".to_owned(),
                "audio/track-02.mp3".to_owned(),
            ],
            Url::parse("https://api.example.com/download-webhook").unwrap(),
        )
    }

    #[test]
    fn request_creation() {
        let job = sample_job();
        assert_eq!(job.retreat_name, "Autumn Retreat 2025");
        assert_eq!(job.file_count(), 2);
    }

    #[test]
    fn wire_names_match_the_worker_contract() {
        let job = sample_job();
        let value = serde_json::to_value(&job).unwrap();

        assert!(value.get("audio_files").is_some());
        assert!(value.get("webhook_url").is_some());
        assert!(value.get("source_keys").is_none());
        assert!(value.get("callback_url").is_none());
        assert_eq!(value["audio_files"][0], "audio/track-01.mp3");
    }
}
