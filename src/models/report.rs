//! Report data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a generated or scheduled report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique identifier
    pub id: Uuid,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Kind of report, e.g. `CARBON_FOOTPRINT` or `FIRMWARE_COMPLIANCE`.
    /// Left free-form since the API grows new types between releases.
    #[serde(default)]
    pub report_type: Option<String>,

    /// Generation state reported by the API
    #[serde(default)]
    pub state: Option<String>,

    /// URI of the generated row data, when generation has completed
    #[serde(default)]
    pub report_data_uri: Option<String>,

    #[serde(default)]
    pub resource_uri: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Whether row data can be fetched for this report.
    pub fn has_data(&self) -> bool {
        self.report_data_uri.is_some()
    }
}
