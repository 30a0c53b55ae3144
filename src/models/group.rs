//! Server group data model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use super::settings::SettingsCategory;
use crate::utils::error::ComResult;
use crate::utils::validation::parse_auto_add_tag;

/// Kind of devices a group manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    #[default]
    DirectConnectServer,
    OveApplianceSynergy,
    OveApplianceVm,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::DirectConnectServer => "DIRECT_CONNECT_SERVER",
            DeviceType::OveApplianceSynergy => "OVE_APPLIANCE_SYNERGY",
            DeviceType::OveApplianceVm => "OVE_APPLIANCE_VM",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DIRECT_CONNECT_SERVER" => Some(DeviceType::DirectConnectServer),
            "OVE_APPLIANCE_SYNERGY" => Some(DeviceType::OveApplianceSynergy),
            "OVE_APPLIANCE_VM" => Some(DeviceType::OveApplianceVm),
            _ => None,
        }
    }
}

/// Represents a server group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Unique identifier
    pub id: Uuid,

    /// Group name, unique within a region
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,

    /// Kind of devices the group manages
    #[serde(default)]
    pub device_type: DeviceType,

    /// Resource URIs of the settings attached to this group, in
    /// canonical category order
    #[serde(default)]
    pub settings_uris: Vec<String>,

    /// Automation applied when devices join or re-apply configuration
    #[serde(default)]
    pub policies: GroupPolicies,

    /// At most one tag; devices carrying it are auto-assigned to the group
    #[serde(default)]
    pub auto_add_tags: Map<String, Value>,

    /// Devices currently assigned to the group
    #[serde(default)]
    pub devices: Vec<GroupDevice>,

    #[serde(default)]
    pub resource_uri: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Group {
    /// The group's auto-add tag as a `(name, value)` pair, if one is set.
    pub fn auto_add_tag(&self) -> Option<(&str, &str)> {
        self.auto_add_tags
            .iter()
            .next()
            .and_then(|(name, value)| value.as_str().map(|v| (name.as_str(), v)))
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

/// Device entry inside a group's membership list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDevice {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub resource_uri: Option<String>,
}

/// `policies` object carried by a group and by group write payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPolicies {
    #[serde(default, skip_serializing_if = "OnDeviceAddPolicy::is_empty")]
    pub on_device_add: OnDeviceAddPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_device_apply: Option<OnDeviceApplyPolicy>,
}

impl GroupPolicies {
    pub fn is_empty(&self) -> bool {
        self.on_device_add.is_empty() && self.on_device_apply.is_none()
    }
}

/// Flags applied when a device is newly added to the group.
///
/// A `None` field is omitted from the wire entirely; omission is a signal
/// (the flag is not configured), never an implicit `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnDeviceAddPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios_apply_settings: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios_factory_reset: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_storage_configuration: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_power_off: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ilo_apply_settings: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_completion_timeout_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_install: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_configuration: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_volume_deletion: Option<bool>,
}

impl OnDeviceAddPolicy {
    pub fn is_empty(&self) -> bool {
        self.bios_apply_settings.is_none()
            && self.bios_factory_reset.is_none()
            && self.external_storage_configuration.is_none()
            && self.firmware_power_off.is_none()
            && self.firmware_update.is_none()
            && self.ilo_apply_settings.is_none()
            && self.os_completion_timeout_min.is_none()
            && self.os_install.is_none()
            && self.storage_configuration.is_none()
            && self.storage_volume_deletion.is_none()
    }
}

/// Flags applied when configuration is (re)applied to member devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnDeviceApplyPolicy {
    pub firmware_downgrade: bool,
}

/// A parsed `name=value` auto-add tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAddTag {
    pub name: String,
    pub value: String,
}

impl AutoAddTag {
    /// Parses a raw `name=value` string, validating the allowed character set.
    pub fn parse(raw: &str) -> ComResult<Self> {
        parse_auto_add_tag(raw)
    }
}

impl fmt::Display for AutoAddTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Caller intent for one category's settings slot.
///
/// Distinguishes "parameter not passed" from "passed as empty" so that
/// carry-forward and explicit-drop never collapse into each other.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SettingSelection {
    /// Parameter not passed; keep whatever the group already has.
    #[default]
    Unchanged,
    /// Parameter passed as empty; drop the category's reference.
    Clear,
    /// Parameter passed with a settings name to resolve in the catalog.
    Named(String),
}

impl SettingSelection {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None => SettingSelection::Unchanged,
            Some("") => SettingSelection::Clear,
            Some(name) => SettingSelection::Named(name.to_string()),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, SettingSelection::Unchanged)
    }
}

/// Caller intent for the group's auto-add tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagSelection {
    /// Parameter not passed; keep the existing tag as-is.
    #[default]
    Unchanged,
    /// Parameter passed as empty; remove the existing tag.
    Clear,
    /// Parameter passed with a `name=value` tag to set.
    Set(AutoAddTag),
}

impl TagSelection {
    /// Maps a raw optional parameter onto the tri-state, validating the
    /// tag format when a non-empty value was passed.
    pub fn from_raw(raw: Option<&str>) -> ComResult<Self> {
        match raw {
            None => Ok(TagSelection::Unchanged),
            Some("") => Ok(TagSelection::Clear),
            Some(tag) => Ok(TagSelection::Set(parse_auto_add_tag(tag)?)),
        }
    }
}

/// Caller-supplied parameters for group create and update.
///
/// Every field defaults to "not passed": settings slots to
/// [`SettingSelection::Unchanged`], flags to `None`, the tag to
/// [`TagSelection::Unchanged`]. The resolver reads omission as "carry the
/// existing state forward", never as `false`.
#[derive(Debug, Clone, Default, Validate)]
pub struct GroupPolicyParams {
    pub bios_setting: SettingSelection,
    pub firmware_setting: SettingSelection,
    pub os_setting: SettingSelection,
    pub storage_setting: SettingSelection,
    pub ilo_setting: SettingSelection,
    pub external_storage_setting: SettingSelection,

    pub bios_apply_settings: Option<bool>,
    pub bios_factory_reset: Option<bool>,
    pub firmware_update: Option<bool>,
    pub firmware_power_off: Option<bool>,
    pub firmware_downgrade: Option<bool>,
    pub os_install: Option<bool>,
    /// Minutes to wait for OS installation before giving up.
    #[validate(range(min = 60, max = 720))]
    pub os_completion_timeout_min: Option<u32>,
    pub storage_configuration: Option<bool>,
    pub storage_volume_deletion: Option<bool>,
    pub ilo_apply_settings: Option<bool>,
    pub external_storage_configuration: Option<bool>,

    pub auto_add_tag: TagSelection,
}

impl GroupPolicyParams {
    /// The settings slot parameter for a given category.
    pub fn selection(&self, category: SettingsCategory) -> &SettingSelection {
        match category {
            SettingsCategory::Bios => &self.bios_setting,
            SettingsCategory::Firmware => &self.firmware_setting,
            SettingsCategory::Os => &self.os_setting,
            SettingsCategory::Storage => &self.storage_setting,
            SettingsCategory::IloSettings => &self.ilo_setting,
            SettingsCategory::ExternalStorage => &self.external_storage_setting,
        }
    }
}

/// Body of `POST /groups`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupPayload {
    pub name: String,
    /// Serialized even when `None`; the API reads `null` as "no description".
    pub description: Option<String>,
    pub device_type: DeviceType,
    pub settings_uris: Vec<String>,
    pub policies: GroupPolicies,
    pub auto_add_tags: Map<String, Value>,
}

/// Body of `PATCH /groups/{id}` (`application/merge-patch+json`).
///
/// Carries the full recomputed settings/policies/tag state. The API treats
/// the patch as a merge, so anything not carried forward here would be
/// dropped server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdatePayload {
    pub name: String,
    pub description: Option<String>,
    pub settings_uris: Vec<String>,
    pub policies: GroupPolicies,
    pub auto_add_tags: Map<String, Value>,
}

/// Body of `POST /groups/{id}/devices`.
#[derive(Debug, Clone, Serialize)]
pub struct AddGroupDevicesPayload {
    pub devices: Vec<GroupDeviceRef>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDeviceRef {
    pub device_id: String,
}
