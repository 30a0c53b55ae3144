//! Server group operations
//!
//! Each mutating call follows the same single-pass flow: look the group up,
//! resolve the full desired state, send one write, return an
//! [`OperationStatus`]. A failed send leaves the group in its prior
//! server-side state and is safe to retry.

use tracing::{info, warn};
use validator::Validate;

use crate::models::{
    AddGroupDevicesPayload, CreateGroupPayload, DeviceType, Group, GroupDevice, GroupDeviceRef,
    GroupPolicyParams, GroupUpdatePayload, OperationStatus, ServerSetting,
};
use crate::services::com::{
    CollectionResponse, ComClient, FilterBuilder, ListParams, GROUPS_URI, SETTINGS_URI,
};
use crate::services::resolver::GroupPolicyResolver;
use crate::utils::error::ComResult;
use crate::utils::validation::validate_group_name;

const GROUP_NOT_FOUND: &str = "Group cannot be found in the region!";

/// Server group service
#[derive(Clone)]
pub struct GroupService {
    client: ComClient,
}

impl GroupService {
    pub fn new(client: ComClient) -> Self {
        Self { client }
    }

    // ==================== Read Operations ====================

    /// List one page of groups.
    pub async fn list(&self, params: ListParams) -> ComResult<CollectionResponse<Group>> {
        self.client.get_collection(GROUPS_URI, &params).await
    }

    /// List every group in the region.
    pub async fn list_all(&self) -> ComResult<Vec<Group>> {
        self.client.get_all_items(GROUPS_URI, None).await
    }

    /// Fetch a group by id.
    pub async fn get(&self, id: &str) -> ComResult<Option<Group>> {
        self.client
            .get_optional(&format!("{}/{}", GROUPS_URI, urlencoding::encode(id)))
            .await
    }

    /// Fetch a group by its (region-unique) name.
    pub async fn get_by_name(&self, name: &str) -> ComResult<Option<Group>> {
        let mut params = ListParams::new().limit(1);
        if let Some(filter) = FilterBuilder::new().equals("name", name).build() {
            params = params.filter(filter);
        }
        let page: CollectionResponse<Group> = self.client.get_collection(GROUPS_URI, &params).await?;
        Ok(page.into_items().into_iter().next())
    }

    // ==================== Create ====================

    /// Create a group. An existing group with the same name is a Warning,
    /// not an error, and nothing is sent.
    pub async fn create_group(
        &self,
        name: &str,
        description: Option<&str>,
        device_type: DeviceType,
        params: &GroupPolicyParams,
    ) -> ComResult<OperationStatus> {
        validate_group_name(name)?;
        params.validate()?;

        match self.try_create(name, description, device_type, params).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Group cannot be created!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_create(
        &self,
        name: &str,
        description: Option<&str>,
        device_type: DeviceType,
        params: &GroupPolicyParams,
    ) -> ComResult<OperationStatus> {
        if self.get_by_name(name).await?.is_some() {
            warn!(
                "Group {} already exists in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::warning(
                name,
                self.client.region(),
                "Group already exists in the region! No action needed.",
            ));
        }

        let catalog = self.fetch_catalog().await?;
        let resolver = GroupPolicyResolver::new(&catalog);
        let resolved = resolver.resolve_create(params)?;
        let payload =
            resolved.into_create_payload(name.to_string(), description.map(String::from), device_type);

        let group: Group = self.client.post(GROUPS_URI, &payload).await?;
        info!("Group {} created in region {}", group.name, self.client.region());
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Group successfully created",
        ))
    }

    /// Compute the create payload without sending it. Returns `None` (with
    /// a warning) when a group with that name already exists.
    pub async fn plan_group_create(
        &self,
        name: &str,
        description: Option<&str>,
        device_type: DeviceType,
        params: &GroupPolicyParams,
    ) -> ComResult<Option<CreateGroupPayload>> {
        validate_group_name(name)?;
        params.validate()?;

        if self.get_by_name(name).await?.is_some() {
            warn!(
                "Group {} already exists in region {}; nothing would be created",
                name,
                self.client.region()
            );
            return Ok(None);
        }

        let catalog = self.fetch_catalog().await?;
        let resolver = GroupPolicyResolver::new(&catalog);
        let resolved = resolver.resolve_create(params)?;
        Ok(Some(resolved.into_create_payload(
            name.to_string(),
            description.map(String::from),
            device_type,
        )))
    }

    // ==================== Update ====================

    /// Update a group by name, recomputing the full settings/policy/tag
    /// state from the current group plus the caller's parameters.
    pub async fn update_group(
        &self,
        name: &str,
        new_name: Option<&str>,
        description: Option<&str>,
        params: &GroupPolicyParams,
    ) -> ComResult<OperationStatus> {
        if let Some(new_name) = new_name {
            validate_group_name(new_name)?;
        }
        params.validate()?;

        match self.try_update(name, new_name, description, params).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Group cannot be updated!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_update(
        &self,
        name: &str,
        new_name: Option<&str>,
        description: Option<&str>,
        params: &GroupPolicyParams,
    ) -> ComResult<OperationStatus> {
        let Some(group) = self.get_by_name(name).await? else {
            warn!(
                "Group {} cannot be found in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::failed(
                name,
                self.client.region(),
                GROUP_NOT_FOUND,
                None,
            ));
        };

        let catalog = self.fetch_catalog().await?;
        let resolver = GroupPolicyResolver::new(&catalog);
        let resolved = resolver.resolve_update(&group, params)?;

        let final_name = new_name.unwrap_or(name).to_string();
        let final_description = description.map(String::from).or_else(|| group.description.clone());
        let payload = resolved.into_update_payload(final_name, final_description);

        let path = format!("{}/{}", GROUPS_URI, group.id);
        let updated: Group = self.client.patch(&path, &payload).await?;
        info!(
            "Group {} updated in region {}",
            updated.name,
            self.client.region()
        );
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Group successfully updated",
        ))
    }

    /// Compute the update payload without sending it. Returns `None` (with
    /// a warning) when the group does not exist.
    pub async fn plan_group_update(
        &self,
        name: &str,
        new_name: Option<&str>,
        description: Option<&str>,
        params: &GroupPolicyParams,
    ) -> ComResult<Option<GroupUpdatePayload>> {
        if let Some(new_name) = new_name {
            validate_group_name(new_name)?;
        }
        params.validate()?;

        let Some(group) = self.get_by_name(name).await? else {
            warn!(
                "Group {} cannot be found in region {}; nothing would be updated",
                name,
                self.client.region()
            );
            return Ok(None);
        };

        let catalog = self.fetch_catalog().await?;
        let resolver = GroupPolicyResolver::new(&catalog);
        let resolved = resolver.resolve_update(&group, params)?;
        let final_name = new_name.unwrap_or(name).to_string();
        let final_description = description.map(String::from).or_else(|| group.description.clone());
        Ok(Some(resolved.into_update_payload(final_name, final_description)))
    }

    /// Apply the same update to several groups, strictly in input order.
    /// Per-item failures land in the returned statuses; only terminating
    /// errors abort the batch.
    pub async fn update_groups(
        &self,
        names: &[String],
        description: Option<&str>,
        params: &GroupPolicyParams,
    ) -> ComResult<Vec<OperationStatus>> {
        let mut statuses = Vec::with_capacity(names.len());
        for name in names {
            statuses.push(self.update_group(name, None, description, params).await?);
        }
        Ok(statuses)
    }

    // ==================== Delete ====================

    /// Delete a group by name.
    pub async fn delete_group(&self, name: &str) -> ComResult<OperationStatus> {
        match self.try_delete(name).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Group cannot be deleted!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_delete(&self, name: &str) -> ComResult<OperationStatus> {
        let Some(group) = self.get_by_name(name).await? else {
            warn!(
                "Group {} cannot be found in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::failed(
                name,
                self.client.region(),
                GROUP_NOT_FOUND,
                None,
            ));
        };

        self.client
            .delete(&format!("{}/{}", GROUPS_URI, group.id))
            .await?;
        info!("Group {} deleted in region {}", name, self.client.region());
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Group successfully deleted",
        ))
    }

    /// Delete several groups, strictly in input order.
    pub async fn delete_groups(&self, names: &[String]) -> ComResult<Vec<OperationStatus>> {
        let mut statuses = Vec::with_capacity(names.len());
        for name in names {
            statuses.push(self.delete_group(name).await?);
        }
        Ok(statuses)
    }

    // ==================== Device Membership ====================

    /// List the devices assigned to a group; `None` when the group does
    /// not exist.
    pub async fn list_devices(&self, name: &str) -> ComResult<Option<Vec<GroupDevice>>> {
        let Some(group) = self.get_by_name(name).await? else {
            warn!(
                "Group {} cannot be found in region {}",
                name,
                self.client.region()
            );
            return Ok(None);
        };
        let path = format!("{}/{}/devices", GROUPS_URI, group.id);
        let devices = self.client.get_all_items(&path, None).await?;
        Ok(Some(devices))
    }

    /// Add devices to a group by id.
    pub async fn add_devices(&self, name: &str, device_ids: &[String]) -> ComResult<OperationStatus> {
        match self.try_add_devices(name, device_ids).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Devices cannot be added to group!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_add_devices(&self, name: &str, device_ids: &[String]) -> ComResult<OperationStatus> {
        let Some(group) = self.get_by_name(name).await? else {
            warn!(
                "Group {} cannot be found in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::failed(
                name,
                self.client.region(),
                GROUP_NOT_FOUND,
                None,
            ));
        };

        let payload = AddGroupDevicesPayload {
            devices: device_ids
                .iter()
                .map(|id| GroupDeviceRef {
                    device_id: id.clone(),
                })
                .collect(),
        };
        let path = format!("{}/{}/devices", GROUPS_URI, group.id);
        self.client.post::<serde_json::Value, _>(&path, &payload).await?;
        info!(
            "Added {} device(s) to group {} in region {}",
            device_ids.len(),
            name,
            self.client.region()
        );
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Devices successfully added to group",
        ))
    }

    /// Remove one device from a group.
    pub async fn remove_device(&self, name: &str, device_id: &str) -> ComResult<OperationStatus> {
        match self.try_remove_device(name, device_id).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_terminating() => Err(e),
            Err(e) => Ok(OperationStatus::failed(
                name,
                self.client.region(),
                "Device cannot be removed from group!",
                Some(e.to_string()),
            )),
        }
    }

    async fn try_remove_device(&self, name: &str, device_id: &str) -> ComResult<OperationStatus> {
        let Some(group) = self.get_by_name(name).await? else {
            warn!(
                "Group {} cannot be found in region {}",
                name,
                self.client.region()
            );
            return Ok(OperationStatus::failed(
                name,
                self.client.region(),
                GROUP_NOT_FOUND,
                None,
            ));
        };

        let path = format!(
            "{}/{}/devices/{}",
            GROUPS_URI,
            group.id,
            urlencoding::encode(device_id)
        );
        self.client.delete(&path).await?;
        Ok(OperationStatus::complete(
            name,
            self.client.region(),
            "Device successfully removed from group",
        ))
    }

    async fn fetch_catalog(&self) -> ComResult<Vec<ServerSetting>> {
        self.client.get_all_items(SETTINGS_URI, None).await
    }
}
