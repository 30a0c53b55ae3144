//! Compute Ops Management API client
//!
//! Shared HTTP transport for all resource services. Handles bearer
//! authentication, regional base URL construction, pagination and the
//! merge-patch content type used by update calls.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::ComConfig;
use crate::utils::error::{ComError, ComResult};

/// Groups collection path.
pub const GROUPS_URI: &str = "/compute-ops-mgmt/v1beta3/groups";
/// Server settings catalog path.
pub const SETTINGS_URI: &str = "/compute-ops-mgmt/v1beta1/settings";
/// Webhooks collection path.
pub const WEBHOOKS_URI: &str = "/compute-ops-mgmt/v1beta1/webhooks";
/// Saved filters collection path.
pub const FILTERS_URI: &str = "/compute-ops-mgmt/v1/filters";
/// Reports collection path.
pub const REPORTS_URI: &str = "/compute-ops-mgmt/v1beta2/reports";
/// Servers collection path (utilization insights hang off it).
pub const SERVERS_URI: &str = "/compute-ops-mgmt/v1beta2/servers";
/// Sustainability metrics path.
pub const SUSTAINABILITY_URI: &str = "/sustainability/v1beta1/metrics";

/// Content type for group update calls.
pub const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";

/// Page size used when walking a whole collection.
const PAGE_LIMIT: u32 = 100;

/// Compute Ops Management API client
#[derive(Clone)]
pub struct ComClient {
    client: Client,
    base_url: String,
    region: String,
    access_token: String,
}

/// Query parameters for paginated list requests
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Maximum number of results to return
    pub limit: Option<u32>,
    /// Number of results to skip
    pub offset: Option<u32>,
    /// Filter expression, e.g. `name eq 'ESXi-group'`
    pub filter: Option<String>,
    /// Sort expression, e.g. `createdAt desc`
    pub sort: Option<String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sort(mut self, field: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.sort = Some(format!("{} {}", field, direction));
        self
    }

    pub fn to_query_string(&self) -> String {
        let mut params = vec![];
        if let Some(limit) = self.limit {
            params.push(format!("limit={}", limit));
        }
        if let Some(offset) = self.offset {
            params.push(format!("offset={}", offset));
        }
        if let Some(ref filter) = self.filter {
            params.push(format!("filter={}", urlencoding::encode(filter)));
        }
        if let Some(ref sort) = self.sort {
            params.push(format!("sort={}", urlencoding::encode(sort)));
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

/// Standard collection envelope returned by list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> CollectionResponse<T> {
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Builder for filter expressions
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    conditions: Vec<String>,
}

fn escape_value(value: &str) -> String {
    value.replace('\'', "''")
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self { conditions: vec![] }
    }

    /// Add an equality condition: `field eq 'value'`
    pub fn equals(mut self, field: &str, value: &str) -> Self {
        self.conditions
            .push(format!("{} eq '{}'", field, escape_value(value)));
        self
    }

    /// Add an inequality condition: `field ne 'value'`
    pub fn not_equals(mut self, field: &str, value: &str) -> Self {
        self.conditions
            .push(format!("{} ne '{}'", field, escape_value(value)));
        self
    }

    /// Add a substring condition: `contains(field, 'value')`
    pub fn contains(mut self, field: &str, value: &str) -> Self {
        self.conditions
            .push(format!("contains({}, '{}')", field, escape_value(value)));
        self
    }

    /// Add a greater-than condition: `field gt value`
    pub fn greater_than(mut self, field: &str, value: &str) -> Self {
        self.conditions.push(format!("{} gt {}", field, value));
        self
    }

    /// Add a less-than condition: `field lt value`
    pub fn less_than(mut self, field: &str, value: &str) -> Self {
        self.conditions.push(format!("{} lt {}", field, value));
        self
    }

    /// Add a membership condition: `field in ('a', 'b')`
    pub fn in_list(mut self, field: &str, values: &[&str]) -> Self {
        let values_str = values
            .iter()
            .map(|v| format!("'{}'", escape_value(v)))
            .collect::<Vec<_>>()
            .join(", ");
        self.conditions.push(format!("{} in ({})", field, values_str));
        self
    }

    /// Add a raw condition string
    pub fn raw(mut self, condition: &str) -> Self {
        self.conditions.push(condition.to_string());
        self
    }

    /// Build the filter expression, `and`-joining all conditions
    pub fn build(&self) -> Option<String> {
        match self.conditions.len() {
            0 => None,
            1 => Some(self.conditions[0].clone()),
            _ => Some(self.conditions.join(" and ")),
        }
    }
}

impl ComClient {
    /// Create a new client for one region using the given configuration.
    pub fn new(config: &ComConfig) -> ComResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-api.compute.cloud.hpe.com", config.region));
        let base_url = base_url.trim_end_matches('/').to_string();

        info!(
            "Initializing Compute Ops Management client for region {} ({})",
            config.region, base_url
        );

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .use_rustls_tls();

        if !config.ssl_verify {
            warn!("SSL certificate verification is DISABLED - this is insecure!");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| ComError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            region: config.region.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// Region this client talks to.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ==================== Request Verbs ====================

    /// GET a single resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ComResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("COM: GET {}", url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .inspect_err(|e| error!("COM: request to {} failed: {}", url, e))?;
        self.handle_response(response).await
    }

    /// GET a resource that may not exist; 404 maps to `None`.
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> ComResult<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("COM: GET {}", url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .inspect_err(|e| error!("COM: request to {} failed: {}", url, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.handle_response(response).await.map(Some)
    }

    /// GET one page of a collection.
    pub async fn get_collection<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ListParams,
    ) -> ComResult<CollectionResponse<T>> {
        let url = format!("{}{}{}", self.base_url, path, params.to_query_string());
        debug!("COM: GET {}", url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .inspect_err(|e| error!("COM: request to {} failed: {}", url, e))?;
        self.handle_response(response).await
    }

    /// GET every item of a collection, walking pages until exhausted.
    pub async fn get_all_items<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: Option<&str>,
    ) -> ComResult<Vec<T>> {
        let mut items: Vec<T> = Vec::new();
        let mut offset = 0u32;
        loop {
            let mut params = ListParams::new().limit(PAGE_LIMIT).offset(offset);
            if let Some(f) = filter {
                params = params.filter(f);
            }
            let page: CollectionResponse<T> = self.get_collection(path, &params).await?;
            let fetched = page.items.len() as u32;
            let total = page.total;
            items.extend(page.items);
            match total {
                Some(total) if fetched > 0 && (items.len() as u64) < total => offset += fetched,
                _ => break,
            }
        }
        Ok(items)
    }

    /// POST a JSON body, returning the created resource.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ComResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("COM: POST {}", url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .inspect_err(|e| error!("COM: request to {} failed: {}", url, e))?;
        self.handle_response(response).await
    }

    /// PATCH with `application/merge-patch+json`, returning the updated resource.
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ComResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("COM: PATCH {}", url);
        let payload = serde_json::to_vec(body)?;
        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.access_token)
            .header(header::CONTENT_TYPE, MERGE_PATCH_CONTENT_TYPE)
            .body(payload)
            .send()
            .await
            .inspect_err(|e| error!("COM: request to {} failed: {}", url, e))?;
        self.handle_response(response).await
    }

    /// DELETE a resource; any 2xx counts as success.
    pub async fn delete(&self, path: &str) -> ComResult<()> {
        let url = format!("{}{}", self.base_url, path);
        debug!("COM: DELETE {}", url);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .inspect_err(|e| error!("COM: request to {} failed: {}", url, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            error!("COM: DELETE {} failed with status {}: {}", url, status, body);
            Err(ComError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }

    // ==================== Helper Methods ====================

    /// Handle HTTP response and parse JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ComResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str::<T>(&body).map_err(|e| {
                ComError::InvalidResponse(format!(
                    "Failed to parse response JSON ({}): {}",
                    e,
                    truncate_body(&body)
                ))
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            error!("COM: request failed with status {}: {}", status, body);
            Err(ComError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() > 500 {
        format!("{}... (truncated)", body.chars().take(500).collect::<String>())
    } else {
        body.to_string()
    }
}
