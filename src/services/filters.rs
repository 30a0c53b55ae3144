//! Saved filter operations

use tracing::{info, warn};

use crate::models::{CreateFilterPayload, FilterUpdatePayload, OperationStatus, SavedFilter};
use crate::services::com::{CollectionResponse, ComClient, FilterBuilder, ListParams, FILTERS_URI};
use crate::utils::error::ComResult;

const FILTER_NOT_FOUND: &str = "Filter cannot be found in the region!";

/// Saved filter service
#[derive(Clone)]
pub struct FilterService {
    client: ComClient,
}

impl FilterService {
    pub fn new(client: ComClient) -> Self {
        Self { client }
    }

    /// List one page of saved filters.
    pub async fn list(&self, params: ListParams) -> ComResult<CollectionResponse<SavedFilter>> {
        self.client.get_collection(FILTERS_URI, &params).await
    }

    /// List every saved filter in the region.
    pub async fn list_all(&self) -> ComResult<Vec<SavedFilter>> {
        self.client.get_all_items(FILTERS_URI, None).await
    }

    /// Fetch a saved filter by id.
    pub async fn get(&self, id: &str) -> ComResult<Option<SavedFilter>> {
        self.client
            .get_optional(&format!("{}/{}", FILTERS_URI, urlencoding::encode(id)))
            .await
    }

    /// Fetch a saved filter by name.
    pub async fn get_by_name(&self, name: &str) -> ComResult<Option<SavedFilter>> {
        let mut params = ListParams::new().limit(1);
        if let Some(filter) = FilterBuilder::new().equals("name", name).build() {
            params = params.filter(filter);
        }
        let page: CollectionResponse<SavedFilter> =
            self.client.get_collection(FILTERS_URI, &params).await?;
        Ok(page.into_items().into_iter().next())
    }

    /// Save a filter expression under a name.
    pub async fn create_filter(
        &self,
        name: &str,
        filter: &str,
        description: Option<&str>,
        resource_type: Option<&str>,
    ) -> ComResult<OperationStatus> {
        match self
            .try_create(name, filter, description, resource_type)
            .await
        {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Filter cannot be created!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_create(
        &self,
        name: &str,
        filter: &str,
        description: Option<&str>,
        resource_type: Option<&str>,
    ) -> ComResult<OperationStatus> {
        if self.get_by_name(name).await?.is_some() {
            warn!(
                "Filter {} already exists in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::warning(
                name,
                self.client.region(),
                "Filter already exists in the region! No action needed.",
            ));
        }

        let payload = CreateFilterPayload {
            name: name.to_string(),
            filter: filter.to_string(),
            description: description.map(String::from),
            filter_resource_type: resource_type.map(String::from),
        };
        let saved: SavedFilter = self.client.post(FILTERS_URI, &payload).await?;
        info!("Filter {} created in region {}", saved.name, self.client.region());
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Filter successfully created",
        ))
    }

    /// Update a saved filter by name; unset fields stay untouched.
    pub async fn update_filter(
        &self,
        name: &str,
        changes: FilterUpdatePayload,
    ) -> ComResult<OperationStatus> {
        match self.try_update(name, changes).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Filter cannot be updated!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_update(
        &self,
        name: &str,
        changes: FilterUpdatePayload,
    ) -> ComResult<OperationStatus> {
        let Some(saved) = self.get_by_name(name).await? else {
            warn!(
                "Filter {} cannot be found in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::failed(
                name,
                self.client.region(),
                FILTER_NOT_FOUND,
                None,
            ));
        };

        let path = format!("{}/{}", FILTERS_URI, saved.id);
        let _: SavedFilter = self.client.patch(&path, &changes).await?;
        info!("Filter {} updated in region {}", name, self.client.region());
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Filter successfully updated",
        ))
    }

    /// Delete a saved filter by name.
    pub async fn delete_filter(&self, name: &str) -> ComResult<OperationStatus> {
        match self.try_delete(name).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Filter cannot be deleted!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_delete(&self, name: &str) -> ComResult<OperationStatus> {
        let Some(saved) = self.get_by_name(name).await? else {
            warn!(
                "Filter {} cannot be found in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::failed(
                name,
                self.client.region(),
                FILTER_NOT_FOUND,
                None,
            ));
        };

        self.client
            .delete(&format!("{}/{}", FILTERS_URI, saved.id))
            .await?;
        info!("Filter {} deleted in region {}", name, self.client.region());
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Filter successfully deleted",
        ))
    }
}
