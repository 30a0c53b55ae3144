//! Group settings and policy resolution
//!
//! Computes the full desired `settingsUris`/`policies`/`autoAddTags` state
//! for a group create or update from three inputs: the caller's parameters,
//! the group's current server-side state (update only) and the region's
//! settings catalog. The update call sends `application/merge-patch+json`
//! but the API merges at the top-level field granularity, so every field
//! this resolver touches must carry the complete desired value; anything
//! not carried forward would be dropped server-side.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{
    AutoAddTag, CreateGroupPayload, DeviceType, Group, GroupPolicies, GroupPolicyParams,
    GroupUpdatePayload, OnDeviceAddPolicy, OnDeviceApplyPolicy, ServerSetting, SettingSelection,
    SettingsCategory, TagSelection,
};
use crate::utils::error::{ComError, ComResult};

/// Fully resolved group state, ready to be wrapped into a request payload.
#[derive(Debug, Clone)]
pub struct ResolvedGroupState {
    /// Settings references in canonical category order.
    pub settings_uris: Vec<String>,
    pub policies: GroupPolicies,
    /// Tag instructions; `null` values delete keys server-side.
    pub auto_add_tags: Map<String, Value>,
}

impl ResolvedGroupState {
    pub fn into_create_payload(
        self,
        name: String,
        description: Option<String>,
        device_type: DeviceType,
    ) -> CreateGroupPayload {
        CreateGroupPayload {
            name,
            description,
            device_type,
            settings_uris: self.settings_uris,
            policies: self.policies,
            auto_add_tags: self.auto_add_tags,
        }
    }

    pub fn into_update_payload(self, name: String, description: Option<String>) -> GroupUpdatePayload {
        GroupUpdatePayload {
            name,
            description,
            settings_uris: self.settings_uris,
            policies: self.policies,
            auto_add_tags: self.auto_add_tags,
        }
    }
}

/// Resolves caller parameters against current group state and the settings
/// catalog.
///
/// The resolver is a pure function of its inputs; it performs no I/O. The
/// same inputs always produce byte-identical payloads, which makes a failed
/// send safe to retry.
pub struct GroupPolicyResolver<'a> {
    catalog: &'a [ServerSetting],
}

impl<'a> GroupPolicyResolver<'a> {
    pub fn new(catalog: &'a [ServerSetting]) -> Self {
        Self { catalog }
    }

    /// Resolve state for a new group. There is no existing state to carry
    /// forward, so only explicitly named settings and passed flags appear.
    pub fn resolve_create(&self, params: &GroupPolicyParams) -> ComResult<ResolvedGroupState> {
        self.resolve(None, params)
    }

    /// Resolve state for an update of `group`, carrying forward everything
    /// the caller did not touch.
    pub fn resolve_update(
        &self,
        group: &Group,
        params: &GroupPolicyParams,
    ) -> ComResult<ResolvedGroupState> {
        self.resolve(Some(group), params)
    }

    fn resolve(
        &self,
        existing: Option<&Group>,
        params: &GroupPolicyParams,
    ) -> ComResult<ResolvedGroupState> {
        let existing_refs = existing
            .map(|group| self.classify_existing(group))
            .unwrap_or_default();

        // Settings reference collection: one slot per category, walked in
        // canonical order so the output is deterministic.
        let mut settings_uris = Vec::new();
        let mut active: HashSet<SettingsCategory> = HashSet::new();
        for category in SettingsCategory::ALL {
            let resolved = match params.selection(category) {
                SettingSelection::Unchanged => {
                    existing_refs.get(&category).map(|uri| (*uri).to_string())
                }
                SettingSelection::Clear => {
                    if existing_refs.contains_key(&category) {
                        debug!("Dropping {} settings from group", category);
                    }
                    None
                }
                SettingSelection::Named(name) => Some(self.lookup(category, name)?),
            };
            if let Some(uri) = resolved {
                settings_uris.push(uri);
                active.insert(category);
            }
        }

        // Policy flag reconciliation. A flag only survives carry-forward
        // while its governing category keeps an active reference.
        let existing_add = existing
            .map(|group| group.policies.on_device_add.clone())
            .unwrap_or_default();
        let bios = active.contains(&SettingsCategory::Bios);
        let firmware = active.contains(&SettingsCategory::Firmware);
        let os = active.contains(&SettingsCategory::Os);
        let storage = active.contains(&SettingsCategory::Storage);
        let ilo = active.contains(&SettingsCategory::IloSettings);
        let external = active.contains(&SettingsCategory::ExternalStorage);

        let on_device_add = OnDeviceAddPolicy {
            bios_apply_settings: resolve_bool_flag(
                params.bios_apply_settings,
                bios,
                existing_add.bios_apply_settings,
            ),
            bios_factory_reset: resolve_bool_flag(
                params.bios_factory_reset,
                bios,
                existing_add.bios_factory_reset,
            ),
            external_storage_configuration: resolve_bool_flag(
                params.external_storage_configuration,
                external,
                existing_add.external_storage_configuration,
            ),
            firmware_power_off: resolve_bool_flag(
                params.firmware_power_off,
                firmware,
                existing_add.firmware_power_off,
            ),
            firmware_update: resolve_bool_flag(
                params.firmware_update,
                firmware,
                existing_add.firmware_update,
            ),
            ilo_apply_settings: resolve_bool_flag(
                params.ilo_apply_settings,
                ilo,
                existing_add.ilo_apply_settings,
            ),
            os_completion_timeout_min: resolve_numeric_flag(
                params.os_completion_timeout_min,
                os,
                existing_add.os_completion_timeout_min,
            ),
            os_install: resolve_bool_flag(params.os_install, os, existing_add.os_install),
            storage_configuration: resolve_bool_flag(
                params.storage_configuration,
                storage,
                existing_add.storage_configuration,
            ),
            storage_volume_deletion: resolve_bool_flag(
                params.storage_volume_deletion,
                storage,
                existing_add.storage_volume_deletion,
            ),
        };

        // The apply-time downgrade flag gates the whole onDeviceApply object.
        let existing_downgrade = existing
            .and_then(|group| group.policies.on_device_apply)
            .map(|policy| policy.firmware_downgrade);
        let on_device_apply =
            resolve_bool_flag(params.firmware_downgrade, firmware, existing_downgrade)
                .map(|firmware_downgrade| OnDeviceApplyPolicy { firmware_downgrade });

        let auto_add_tags = merge_tag(
            &params.auto_add_tag,
            existing.and_then(|group| group.auto_add_tag()),
        );

        Ok(ResolvedGroupState {
            settings_uris,
            policies: GroupPolicies {
                on_device_add,
                on_device_apply,
            },
            auto_add_tags,
        })
    }

    /// Maps the group's current settings references back onto categories.
    /// A reference the catalog no longer knows cannot be classified and is
    /// dropped from the recomputed state.
    fn classify_existing<'g>(&self, group: &'g Group) -> HashMap<SettingsCategory, &'g str> {
        let mut by_category = HashMap::new();
        for uri in &group.settings_uris {
            match self.catalog.iter().find(|s| s.resource_uri == *uri) {
                Some(entry) => {
                    by_category.entry(entry.category).or_insert(uri.as_str());
                }
                None => {
                    warn!(
                        "Settings reference {} on group {} is not in the catalog; dropping it",
                        uri, group.name
                    );
                }
            }
        }
        by_category
    }

    fn lookup(&self, category: SettingsCategory, name: &str) -> ComResult<String> {
        self.catalog
            .iter()
            .find(|s| s.category == category && s.name == name)
            .map(|s| s.resource_uri.clone())
            .ok_or_else(|| ComError::SettingNotFound {
                category,
                name: name.to_string(),
            })
    }
}

/// Three-way rule for one boolean flag: a passed value always wins (even
/// `false`), an existing `true` survives while its category stays active,
/// anything else leaves the flag out of the payload.
fn resolve_bool_flag(
    passed: Option<bool>,
    category_active: bool,
    existing: Option<bool>,
) -> Option<bool> {
    match passed {
        Some(value) => Some(value),
        None if category_active && existing == Some(true) => Some(true),
        None => None,
    }
}

/// Numeric variant of the three-way rule; zero counts as unset.
fn resolve_numeric_flag(
    passed: Option<u32>,
    category_active: bool,
    existing: Option<u32>,
) -> Option<u32> {
    match passed {
        Some(value) => Some(value),
        None => match existing {
            Some(value) if category_active && value != 0 => Some(value),
            _ => None,
        },
    }
}

/// Builds the `autoAddTags` instruction map. A rename emits two entries
/// (old name to `null`, new name to the value); a removal emits the old
/// name to `null`; otherwise at most one name/value pair is produced.
fn merge_tag(selection: &TagSelection, existing: Option<(&str, &str)>) -> Map<String, Value> {
    let mut tags = Map::new();
    match selection {
        TagSelection::Unchanged => {
            if let Some((name, value)) = existing {
                tags.insert(name.to_string(), Value::String(value.to_string()));
            }
        }
        TagSelection::Set(AutoAddTag { name, value }) => {
            if let Some((old_name, _)) = existing {
                if old_name != name {
                    tags.insert(old_name.to_string(), Value::Null);
                }
            }
            tags.insert(name.clone(), Value::String(value.clone()));
        }
        TagSelection::Clear => {
            if let Some((name, _)) = existing {
                tags.insert(name.to_string(), Value::Null);
            }
        }
    }
    tags
}
