//! Per-operation status records returned by mutating calls

use serde::{Deserialize, Serialize};

/// Terminal state of a single mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    Complete,
    Failed,
    Warning,
}

impl OperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::Complete => "Complete",
            OperationState::Failed => "Failed",
            OperationState::Warning => "Warning",
        }
    }
}

/// Outcome of one create/update/delete call against a named resource.
///
/// Batch operations return one of these per input so a partial failure
/// never hides the items that did succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    /// Resource name the operation targeted.
    pub name: String,
    /// Region the operation ran in.
    pub region: String,
    pub status: OperationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Underlying error text when `status` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl OperationStatus {
    pub fn complete(name: impl Into<String>, region: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            status: OperationState::Complete,
            details: Some(details.into()),
            exception: None,
        }
    }

    pub fn warning(name: impl Into<String>, region: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            status: OperationState::Warning,
            details: Some(details.into()),
            exception: None,
        }
    }

    pub fn failed(
        name: impl Into<String>,
        region: impl Into<String>,
        details: impl Into<String>,
        exception: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            status: OperationState::Failed,
            details: Some(details.into()),
            exception,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == OperationState::Complete
    }
}
