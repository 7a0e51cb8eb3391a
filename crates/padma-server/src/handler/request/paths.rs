//! Path parameter types for HTTP handlers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Path parameters for retreat-level operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetreatPathParams {
    /// Unique identifier of the retreat.
    pub retreat_id: Uuid,
}

/// Path parameters for download request operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequestPathParams {
    /// Unique identifier of the download request.
    pub request_id: Uuid,
}
