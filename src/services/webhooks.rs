//! Webhook operations

use tracing::{info, warn};

use crate::models::{
    CreateWebhookPayload, OperationStatus, Webhook, WebhookState, WebhookUpdatePayload,
};
use crate::services::com::{
    CollectionResponse, ComClient, FilterBuilder, ListParams, WEBHOOKS_URI,
};
use crate::utils::error::{ComError, ComResult};
use crate::utils::validation::validate_webhook_destination;

const WEBHOOK_NOT_FOUND: &str = "Webhook cannot be found in the region!";

/// Webhook service
#[derive(Clone)]
pub struct WebhookService {
    client: ComClient,
}

impl WebhookService {
    pub fn new(client: ComClient) -> Self {
        Self { client }
    }

    /// List one page of webhooks.
    pub async fn list(&self, params: ListParams) -> ComResult<CollectionResponse<Webhook>> {
        self.client.get_collection(WEBHOOKS_URI, &params).await
    }

    /// List every webhook in the region.
    pub async fn list_all(&self) -> ComResult<Vec<Webhook>> {
        self.client.get_all_items(WEBHOOKS_URI, None).await
    }

    /// Fetch a webhook by id.
    pub async fn get(&self, id: &str) -> ComResult<Option<Webhook>> {
        self.client
            .get_optional(&format!("{}/{}", WEBHOOKS_URI, urlencoding::encode(id)))
            .await
    }

    /// Fetch a webhook by name.
    pub async fn get_by_name(&self, name: &str) -> ComResult<Option<Webhook>> {
        let mut params = ListParams::new().limit(1);
        if let Some(filter) = FilterBuilder::new().equals("name", name).build() {
            params = params.filter(filter);
        }
        let page: CollectionResponse<Webhook> =
            self.client.get_collection(WEBHOOKS_URI, &params).await?;
        Ok(page.into_items().into_iter().next())
    }

    /// Create a webhook subscription. The destination must answer the
    /// API's handshake before the webhook leaves the `PENDING` state.
    pub async fn create_webhook(
        &self,
        name: &str,
        destination: &str,
        event_filter: &str,
    ) -> ComResult<OperationStatus> {
        if name.is_empty() || name.len() > 100 {
            return Err(ComError::validation(format!(
                "invalid webhook name '{}': 1 to 100 characters required",
                name
            )));
        }
        validate_webhook_destination(destination)?;
        if event_filter.trim().is_empty() {
            return Err(ComError::validation(
                "webhook eventFilter must not be empty",
            ));
        }

        match self.try_create(name, destination, event_filter).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Webhook cannot be created!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_create(
        &self,
        name: &str,
        destination: &str,
        event_filter: &str,
    ) -> ComResult<OperationStatus> {
        if self.get_by_name(name).await?.is_some() {
            warn!(
                "Webhook {} already exists in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::warning(
                name,
                self.client.region(),
                "Webhook already exists in the region! No action needed.",
            ));
        }

        let payload = CreateWebhookPayload {
            name: name.to_string(),
            destination: destination.to_string(),
            event_filter: event_filter.to_string(),
        };
        let webhook: Webhook = self.client.post(WEBHOOKS_URI, &payload).await?;
        info!(
            "Webhook {} created in region {} (state {:?})",
            webhook.name,
            self.client.region(),
            webhook.state
        );
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Webhook successfully created",
        ))
    }

    /// Update a webhook by name; unset fields stay untouched server-side.
    pub async fn update_webhook(
        &self,
        name: &str,
        changes: WebhookUpdatePayload,
    ) -> ComResult<OperationStatus> {
        if let Some(destination) = changes.destination.as_deref() {
            validate_webhook_destination(destination)?;
        }

        match self.try_update(name, changes).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Webhook cannot be updated!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_update(
        &self,
        name: &str,
        changes: WebhookUpdatePayload,
    ) -> ComResult<OperationStatus> {
        let Some(webhook) = self.get_by_name(name).await? else {
            warn!(
                "Webhook {} cannot be found in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::failed(
                name,
                self.client.region(),
                WEBHOOK_NOT_FOUND,
                None,
            ));
        };

        let path = format!("{}/{}", WEBHOOKS_URI, webhook.id);
        let _: Webhook = self.client.patch(&path, &changes).await?;
        info!("Webhook {} updated in region {}", name, self.client.region());
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Webhook successfully updated",
        ))
    }

    /// Re-enable a webhook that was disabled or errored out.
    pub async fn enable_webhook(&self, name: &str) -> ComResult<OperationStatus> {
        self.update_webhook(
            name,
            WebhookUpdatePayload {
                state: Some(WebhookState::Ok),
                ..Default::default()
            },
        )
        .await
    }

    /// Disable event delivery without deleting the subscription.
    pub async fn disable_webhook(&self, name: &str) -> ComResult<OperationStatus> {
        self.update_webhook(
            name,
            WebhookUpdatePayload {
                state: Some(WebhookState::Disabled),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete a webhook by name.
    pub async fn delete_webhook(&self, name: &str) -> ComResult<OperationStatus> {
        match self.try_delete(name).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Webhook cannot be deleted!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_delete(&self, name: &str) -> ComResult<OperationStatus> {
        let Some(webhook) = self.get_by_name(name).await? else {
            warn!(
                "Webhook {} cannot be found in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::failed(
                name,
                self.client.region(),
                WEBHOOK_NOT_FOUND,
                None,
            ));
        };

        self.client
            .delete(&format!("{}/{}", WEBHOOKS_URI, webhook.id))
            .await?;
        info!("Webhook {} deleted in region {}", name, self.client.region());
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Webhook successfully deleted",
        ))
    }
}

/// Verify the HMAC signature carried by a webhook event delivery.
///
/// The signature header has the form `sha256=<hex digest>` over the raw
/// request body, keyed with the webhook's shared secret.
pub fn verify_event_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let signature = match signature.strip_prefix("sha256=") {
        Some(s) => s,
        None => return false,
    };

    let signature_bytes = match hex::decode(signature) {
        Ok(b) => b,
        Err(_) => return false,
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };

    mac.update(payload);
    mac.verify_slice(&signature_bytes).is_ok()
}
