//! Typed views over the `progress` and `performance` jsonb columns.

use serde::{Deserialize, Serialize};

/// Progress reported by the archive worker while a request is processing.
///
/// Stored in the `download_requests.progress` jsonb column and surfaced
/// verbatim on the status endpoint.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ProgressInfo {
    /// Completion percentage in the `0..=100` range.
    pub percent: i32,
    /// Number of audio files already packed into the archive.
    pub processed_files: i32,
    /// Total number of audio files in the job.
    pub total_files: i32,
    /// Cumulative uncompressed size processed so far, in megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size_mb: Option<f64>,
}

/// Performance figures reported by the archive worker on completion.
///
/// Stored in the `download_requests.performance` jsonb column. All fields
/// are optional because older worker builds omit some of them.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct PerformanceMetrics {
    /// Seconds spent compressing the audio files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_secs: Option<f64>,
    /// Seconds spent uploading the finished archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_secs: Option<f64>,
    /// End-to-end processing time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_secs: Option<f64>,
    /// Total uncompressed input size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_size: Option<i64>,
    /// Compressed size divided by original size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    /// Number of files included in the archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_processed: Option<i32>,
}

impl ProgressInfo {
    /// Serializes into a jsonb-compatible value.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Deserializes from a jsonb column value, ignoring malformed payloads.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

impl PerformanceMetrics {
    /// Serializes into a jsonb-compatible value.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Deserializes from a jsonb column value, ignoring malformed payloads.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_round_trip() {
        let progress = ProgressInfo {
            percent: 40,
            processed_files: 8,
            total_files: 20,
            total_size_mb: Some(512.5),
        };

        let value = progress.to_value();
        assert_eq!(ProgressInfo::from_value(&value), Some(progress));
    }

    #[test]
    fn progress_tolerates_missing_optional_fields() {
        let value = serde_json::json!({
            "percent": 10,
            "processed_files": 2,
            "total_files": 20,
        });

        let progress = ProgressInfo::from_value(&value).unwrap();
        assert_eq!(progress.percent, 10);
        assert_eq!(progress.total_size_mb, None);
    }

    #[test]
    fn performance_rejects_malformed_payload() {
        let value = serde_json::json!({"compression_secs": "not a number"});
        assert_eq!(PerformanceMetrics::from_value(&value), None);
    }
}
