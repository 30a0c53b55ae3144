//! Server group integration tests
//!
//! Exercise the full lookup / catalog-resolve / write flow against a mock
//! API, asserting on the exact request bodies the service sends.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use compute_ops_client::models::{
    AutoAddTag, DeviceType, GroupPolicyParams, OperationState, SettingSelection, TagSelection,
};
use compute_ops_client::services::com::{GROUPS_URI, MERGE_PATCH_CONTENT_TYPE};
use compute_ops_client::{ComError, GroupService};

use crate::common::fixtures::{collection, ids, GroupFixtures, SettingFixtures};
use crate::common::MockApi;

/// Parameters describing a fresh ESXi group with three settings
fn esxi_params() -> GroupPolicyParams {
    GroupPolicyParams {
        bios_setting: SettingSelection::Named("Gen11 BIOS Performance".to_string()),
        firmware_setting: SettingSelection::Named("2025.2 Firmware Baseline".to_string()),
        os_setting: SettingSelection::Named("ESXi 8.0 U3".to_string()),
        bios_apply_settings: Some(true),
        firmware_update: Some(true),
        firmware_downgrade: Some(true),
        os_install: Some(true),
        os_completion_timeout_min: Some(240),
        auto_add_tag: TagSelection::Set(AutoAddTag {
            name: "App".to_string(),
            value: "ESX".to_string(),
        }),
        ..Default::default()
    }
}

// ==================== Create ====================

#[tokio::test]
async fn test_create_group_resolves_settings_and_posts_payload() {
    let api = MockApi::start().await;
    api.mock_group_lookup("ESXi-gen11-group", None).await;
    api.mock_settings_catalog().await;
    Mock::given(method("POST"))
        .and(path(GROUPS_URI))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(GroupFixtures::bare("ESXi-gen11-group")),
        )
        .expect(1)
        .mount(&api.server)
        .await;

    let service = GroupService::new(api.client());
    let status = service
        .create_group(
            "ESXi-gen11-group",
            Some("Gen11 ESXi hosts"),
            DeviceType::DirectConnectServer,
            &esxi_params(),
        )
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Complete);
    assert_eq!(status.region, "eu-central");
    assert_eq!(status.details.as_deref(), Some("Group successfully created"));

    let bodies = api.request_bodies("POST", GROUPS_URI).await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["name"], "ESXi-gen11-group");
    assert_eq!(body["description"], "Gen11 ESXi hosts");
    assert_eq!(body["deviceType"], "DIRECT_CONNECT_SERVER");
    assert_eq!(
        body["settingsUris"],
        json!([
            SettingFixtures::uri(ids::BIOS_SETTING_ID),
            SettingFixtures::uri(ids::FIRMWARE_SETTING_ID),
            SettingFixtures::uri(ids::OS_SETTING_ID),
        ])
    );
    assert_eq!(
        body["policies"],
        json!({
            "onDeviceAdd": {
                "biosApplySettings": true,
                "firmwareUpdate": true,
                "osCompletionTimeoutMin": 240,
                "osInstall": true,
            },
            "onDeviceApply": {"firmwareDowngrade": true},
        })
    );
    assert_eq!(body["autoAddTags"], json!({"App": "ESX"}));
}

#[tokio::test]
async fn test_create_existing_group_warns_without_posting() {
    let api = MockApi::start().await;
    api.mock_group_lookup("ESXi-cluster-group", Some(GroupFixtures::esxi_cluster()))
        .await;
    Mock::given(method("POST"))
        .and(path(GROUPS_URI))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(GroupFixtures::bare("ESXi-cluster-group")),
        )
        .expect(0)
        .mount(&api.server)
        .await;

    let service = GroupService::new(api.client());
    let status = service
        .create_group(
            "ESXi-cluster-group",
            None,
            DeviceType::DirectConnectServer,
            &GroupPolicyParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Warning);
    assert_eq!(
        status.details.as_deref(),
        Some("Group already exists in the region! No action needed.")
    );
}

#[tokio::test]
async fn test_create_with_unknown_setting_name_aborts() {
    let api = MockApi::start().await;
    api.mock_group_lookup("new-group", None).await;
    api.mock_settings_catalog().await;

    let params = GroupPolicyParams {
        bios_setting: SettingSelection::Named("Nonexistent BIOS".to_string()),
        ..Default::default()
    };
    let service = GroupService::new(api.client());
    let err = service
        .create_group("new-group", None, DeviceType::DirectConnectServer, &params)
        .await
        .unwrap_err();

    assert!(matches!(err, ComError::SettingNotFound { .. }));
    assert!(api.request_bodies("POST", GROUPS_URI).await.is_empty());
}

#[tokio::test]
async fn test_create_with_invalid_name_fails_before_any_request() {
    let api = MockApi::start().await;

    let service = GroupService::new(api.client());
    let err = service
        .create_group(
            "bad/name",
            None,
            DeviceType::DirectConnectServer,
            &GroupPolicyParams::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ComError::Validation(_)));
    assert_eq!(api.request_count().await, 0);
}

#[tokio::test]
async fn test_create_with_out_of_range_timeout_fails_before_any_request() {
    let api = MockApi::start().await;

    let params = GroupPolicyParams {
        os_completion_timeout_min: Some(30),
        ..Default::default()
    };
    let service = GroupService::new(api.client());
    let err = service
        .create_group("new-group", None, DeviceType::DirectConnectServer, &params)
        .await
        .unwrap_err();

    assert!(matches!(err, ComError::Validation(_)));
    assert_eq!(api.request_count().await, 0);
}

#[tokio::test]
async fn test_create_api_error_becomes_failed_status() {
    let api = MockApi::start().await;
    api.mock_group_lookup("new-group", None).await;
    api.mock_settings_catalog().await;
    Mock::given(method("POST"))
        .and(path(GROUPS_URI))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&api.server)
        .await;

    let service = GroupService::new(api.client());
    let status = service
        .create_group(
            "new-group",
            None,
            DeviceType::DirectConnectServer,
            &GroupPolicyParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Failed);
    assert_eq!(status.details.as_deref(), Some("Group cannot be created!"));
    let exception = status.exception.unwrap();
    assert!(exception.contains("500"), "exception was: {}", exception);
}

#[tokio::test]
async fn test_plan_group_create_computes_payload_without_posting() {
    let api = MockApi::start().await;
    api.mock_group_lookup("planned-group", None).await;
    api.mock_settings_catalog().await;

    let params = GroupPolicyParams {
        bios_setting: SettingSelection::Named("Gen11 BIOS Performance".to_string()),
        ..Default::default()
    };
    let service = GroupService::new(api.client());
    let payload = service
        .plan_group_create("planned-group", None, DeviceType::DirectConnectServer, &params)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(payload.name, "planned-group");
    assert_eq!(
        payload.settings_uris,
        vec![SettingFixtures::uri(ids::BIOS_SETTING_ID)]
    );
    assert!(api.request_bodies("POST", GROUPS_URI).await.is_empty());
}

// ==================== Update ====================

#[tokio::test]
async fn test_update_group_carries_forward_existing_state() {
    let api = MockApi::start().await;
    api.mock_group_lookup("ESXi-cluster-group", Some(GroupFixtures::esxi_cluster()))
        .await;
    api.mock_settings_catalog().await;
    let patch_path = format!("{}/{}", GROUPS_URI, ids::GROUP_ID);
    Mock::given(method("PATCH"))
        .and(path(patch_path.clone()))
        .and(header("content-type", MERGE_PATCH_CONTENT_TYPE))
        .respond_with(ResponseTemplate::new(200).set_body_json(GroupFixtures::esxi_cluster()))
        .expect(1)
        .mount(&api.server)
        .await;

    let params = GroupPolicyParams {
        os_setting: SettingSelection::Named("ESXi 8.0 U3".to_string()),
        os_install: Some(true),
        os_completion_timeout_min: Some(240),
        ..Default::default()
    };
    let service = GroupService::new(api.client());
    let status = service
        .update_group("ESXi-cluster-group", None, None, &params)
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Complete);
    assert_eq!(status.details.as_deref(), Some("Group successfully updated"));

    // The patch must carry the full recomputed state: existing BIOS and
    // firmware references plus the new OS reference, truthy existing flags,
    // the existing apply policy and the existing tag.
    let bodies = api.request_bodies("PATCH", &patch_path).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        bodies[0],
        json!({
            "name": "ESXi-cluster-group",
            "description": "Production ESXi hosts",
            "settingsUris": [
                SettingFixtures::uri(ids::BIOS_SETTING_ID),
                SettingFixtures::uri(ids::FIRMWARE_SETTING_ID),
                SettingFixtures::uri(ids::OS_SETTING_ID),
            ],
            "policies": {
                "onDeviceAdd": {
                    "biosApplySettings": true,
                    "firmwareUpdate": true,
                    "osCompletionTimeoutMin": 240,
                    "osInstall": true,
                },
                "onDeviceApply": {"firmwareDowngrade": true},
            },
            "autoAddTags": {"App": "ESX"},
        })
    );
}

#[tokio::test]
async fn test_update_group_rename_and_clear_drops_dependent_flags() {
    let api = MockApi::start().await;
    api.mock_group_lookup("ESXi-cluster-group", Some(GroupFixtures::esxi_cluster()))
        .await;
    api.mock_settings_catalog().await;
    let patch_path = format!("{}/{}", GROUPS_URI, ids::GROUP_ID);
    Mock::given(method("PATCH"))
        .and(path(patch_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(GroupFixtures::esxi_cluster()))
        .mount(&api.server)
        .await;

    let params = GroupPolicyParams {
        bios_setting: SettingSelection::Clear,
        auto_add_tag: TagSelection::Clear,
        ..Default::default()
    };
    let service = GroupService::new(api.client());
    let status = service
        .update_group("ESXi-cluster-group", Some("esxi-cluster-legacy"), None, &params)
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Complete);

    // Clearing BIOS drops its carried flag; clearing the tag nulls the old
    // key so the merge patch removes it server-side.
    let bodies = api.request_bodies("PATCH", &patch_path).await;
    assert_eq!(
        bodies[0],
        json!({
            "name": "esxi-cluster-legacy",
            "description": "Production ESXi hosts",
            "settingsUris": [SettingFixtures::uri(ids::FIRMWARE_SETTING_ID)],
            "policies": {
                "onDeviceAdd": {"firmwareUpdate": true},
                "onDeviceApply": {"firmwareDowngrade": true},
            },
            "autoAddTags": {"App": null},
        })
    );
}

#[tokio::test]
async fn test_update_missing_group_returns_failed_status() {
    let api = MockApi::start().await;
    api.mock_group_lookup("missing-group", None).await;

    let service = GroupService::new(api.client());
    let status = service
        .update_group("missing-group", None, None, &GroupPolicyParams::default())
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Failed);
    assert_eq!(
        status.details.as_deref(),
        Some("Group cannot be found in the region!")
    );
    assert!(status.exception.is_none());
}

#[tokio::test]
async fn test_update_groups_batch_continues_after_failed_item() {
    let api = MockApi::start().await;
    api.mock_group_lookup("missing-group", None).await;
    api.mock_group_lookup("ESXi-cluster-group", Some(GroupFixtures::esxi_cluster()))
        .await;
    api.mock_settings_catalog().await;
    let patch_path = format!("{}/{}", GROUPS_URI, ids::GROUP_ID);
    Mock::given(method("PATCH"))
        .and(path(patch_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(GroupFixtures::esxi_cluster()))
        .mount(&api.server)
        .await;

    let params = GroupPolicyParams {
        firmware_update: Some(false),
        ..Default::default()
    };
    let service = GroupService::new(api.client());
    let statuses = service
        .update_groups(
            &["missing-group".to_string(), "ESXi-cluster-group".to_string()],
            None,
            &params,
        )
        .await
        .unwrap();

    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].name, "missing-group");
    assert_eq!(statuses[0].status, OperationState::Failed);
    assert_eq!(statuses[1].name, "ESXi-cluster-group");
    assert_eq!(statuses[1].status, OperationState::Complete);

    // A passed false always wins over the group's existing true.
    let bodies = api.request_bodies("PATCH", &patch_path).await;
    assert_eq!(bodies[0]["policies"]["onDeviceAdd"]["firmwareUpdate"], json!(false));
}

// ==================== Delete ====================

#[tokio::test]
async fn test_delete_group_success() {
    let api = MockApi::start().await;
    api.mock_group_lookup("ESXi-cluster-group", Some(GroupFixtures::esxi_cluster()))
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/{}", GROUPS_URI, ids::GROUP_ID)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&api.server)
        .await;

    let service = GroupService::new(api.client());
    let status = service.delete_group("ESXi-cluster-group").await.unwrap();

    assert_eq!(status.status, OperationState::Complete);
    assert_eq!(status.details.as_deref(), Some("Group successfully deleted"));
}

#[tokio::test]
async fn test_delete_missing_group_returns_failed_status() {
    let api = MockApi::start().await;
    api.mock_group_lookup("missing-group", None).await;

    let service = GroupService::new(api.client());
    let status = service.delete_group("missing-group").await.unwrap();

    assert_eq!(status.status, OperationState::Failed);
    assert_eq!(
        status.details.as_deref(),
        Some("Group cannot be found in the region!")
    );
}

// ==================== Device Membership ====================

#[tokio::test]
async fn test_add_devices_posts_device_refs() {
    let api = MockApi::start().await;
    api.mock_group_lookup("ESXi-cluster-group", Some(GroupFixtures::esxi_cluster()))
        .await;
    let devices_path = format!("{}/{}/devices", GROUPS_URI, ids::GROUP_ID);
    Mock::given(method("POST"))
        .and(path(devices_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&api.server)
        .await;

    let service = GroupService::new(api.client());
    let status = service
        .add_devices(
            "ESXi-cluster-group",
            &["dev-1001".to_string(), "dev-1002".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Complete);
    assert_eq!(
        status.details.as_deref(),
        Some("Devices successfully added to group")
    );

    let bodies = api.request_bodies("POST", &devices_path).await;
    assert_eq!(
        bodies[0],
        json!({"devices": [{"deviceId": "dev-1001"}, {"deviceId": "dev-1002"}]})
    );
}

#[tokio::test]
async fn test_remove_device_deletes_membership() {
    let api = MockApi::start().await;
    api.mock_group_lookup("ESXi-cluster-group", Some(GroupFixtures::esxi_cluster()))
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!(
            "{}/{}/devices/dev-0001",
            GROUPS_URI,
            ids::GROUP_ID
        )))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&api.server)
        .await;

    let service = GroupService::new(api.client());
    let status = service
        .remove_device("ESXi-cluster-group", "dev-0001")
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Complete);
    assert_eq!(
        status.details.as_deref(),
        Some("Device successfully removed from group")
    );
}

#[tokio::test]
async fn test_list_devices_fetches_membership_collection() {
    let api = MockApi::start().await;
    api.mock_group_lookup("ESXi-cluster-group", Some(GroupFixtures::esxi_cluster()))
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/{}/devices", GROUPS_URI, ids::GROUP_ID)))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection(vec![
            json!({"id": "dev-0001", "serialNumber": "CZ12340AB1"}),
            json!({"id": "dev-0002", "name": "esx-node-2"}),
        ])))
        .expect(1)
        .mount(&api.server)
        .await;

    let service = GroupService::new(api.client());
    let devices = service
        .list_devices("ESXi-cluster-group")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].serial_number.as_deref(), Some("CZ12340AB1"));
    assert_eq!(devices[1].name.as_deref(), Some("esx-node-2"));
}

#[tokio::test]
async fn test_list_devices_of_missing_group_is_none() {
    let api = MockApi::start().await;
    api.mock_group_lookup("ghost-group", None).await;

    let service = GroupService::new(api.client());
    assert!(service.list_devices("ghost-group").await.unwrap().is_none());
}

// ==================== Reads ====================

#[tokio::test]
async fn test_get_by_name_parses_group() {
    let api = MockApi::start().await;
    api.mock_group_lookup("ESXi-cluster-group", Some(GroupFixtures::esxi_cluster()))
        .await;

    let service = GroupService::new(api.client());
    let group = service.get_by_name("ESXi-cluster-group").await.unwrap().unwrap();

    assert_eq!(group.id, ids::GROUP_ID);
    assert_eq!(group.auto_add_tag(), Some(("App", "ESX")));
    assert_eq!(group.device_count(), 1);
}

#[tokio::test]
async fn test_get_unknown_id_is_none() {
    let api = MockApi::start().await;

    let service = GroupService::new(api.client());
    let group = service
        .get("eeeeeeee-eeee-4eee-8eee-eeeeeeeeeeee")
        .await
        .unwrap();

    assert!(group.is_none());
}
