//! Server settings catalog access

use crate::models::{ServerSetting, SettingsCategory};
use crate::services::com::{CollectionResponse, ComClient, FilterBuilder, ListParams, SETTINGS_URI};
use crate::utils::error::{ComError, ComResult};

/// Settings catalog service
#[derive(Clone)]
pub struct SettingsService {
    client: ComClient,
}

impl SettingsService {
    pub fn new(client: ComClient) -> Self {
        Self { client }
    }

    /// List one page of catalog entries.
    pub async fn list(&self, params: ListParams) -> ComResult<CollectionResponse<ServerSetting>> {
        self.client.get_collection(SETTINGS_URI, &params).await
    }

    /// Fetch the whole settings catalog for the region.
    pub async fn list_all(&self) -> ComResult<Vec<ServerSetting>> {
        self.client.get_all_items(SETTINGS_URI, None).await
    }

    /// List all catalog entries of one category.
    pub async fn list_by_category(
        &self,
        category: SettingsCategory,
    ) -> ComResult<Vec<ServerSetting>> {
        let filter = FilterBuilder::new()
            .equals("category", category.as_str())
            .build();
        self.client
            .get_all_items(SETTINGS_URI, filter.as_deref())
            .await
    }

    /// Resolve a (category, name) pair to its catalog entry. A name that
    /// does not exist in the catalog is a terminating error.
    pub async fn resolve(&self, category: SettingsCategory, name: &str) -> ComResult<ServerSetting> {
        let filter = FilterBuilder::new()
            .equals("category", category.as_str())
            .equals("name", name)
            .build();
        let matches: Vec<ServerSetting> = self
            .client
            .get_all_items(SETTINGS_URI, filter.as_deref())
            .await?;
        matches
            .into_iter()
            .next()
            .ok_or_else(|| ComError::SettingNotFound {
                category,
                name: name.to_string(),
            })
    }
}
