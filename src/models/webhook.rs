//! Webhook data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery state reported by the API for a webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookState {
    /// Created but the destination handshake has not completed.
    Pending,
    Ok,
    Disabled,
    Error,
}

impl WebhookState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookState::Pending => "PENDING",
            WebhookState::Ok => "OK",
            WebhookState::Disabled => "DISABLED",
            WebhookState::Error => "ERROR",
        }
    }
}

/// Represents a webhook subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    /// Unique identifier
    pub id: Uuid,

    /// Webhook name, unique within a region
    pub name: String,

    /// HTTPS endpoint events are delivered to
    pub destination: String,

    /// Event selection expression, e.g.
    /// `type eq 'compute-ops-mgmt/server' and operation eq 'Created'`
    pub event_filter: String,

    #[serde(default)]
    pub state: Option<WebhookState>,

    #[serde(default)]
    pub resource_uri: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /webhooks`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebhookPayload {
    pub name: String,
    pub destination: String,
    pub event_filter: String,
}

/// Body of `PATCH /webhooks/{id}` (merge-patch; unset fields untouched).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<WebhookState>,
}
