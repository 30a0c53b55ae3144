//! Server settings catalog models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Settings domain a catalog entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettingsCategory {
    Bios,
    Firmware,
    Os,
    Storage,
    IloSettings,
    ExternalStorage,
}

impl SettingsCategory {
    /// Canonical category order used when assembling group `settingsUris`.
    pub const ALL: [SettingsCategory; 6] = [
        SettingsCategory::Bios,
        SettingsCategory::Firmware,
        SettingsCategory::Os,
        SettingsCategory::Storage,
        SettingsCategory::IloSettings,
        SettingsCategory::ExternalStorage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsCategory::Bios => "BIOS",
            SettingsCategory::Firmware => "FIRMWARE",
            SettingsCategory::Os => "OS",
            SettingsCategory::Storage => "STORAGE",
            SettingsCategory::IloSettings => "ILO_SETTINGS",
            SettingsCategory::ExternalStorage => "EXTERNAL_STORAGE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BIOS" => Some(SettingsCategory::Bios),
            "FIRMWARE" => Some(SettingsCategory::Firmware),
            "OS" => Some(SettingsCategory::Os),
            "STORAGE" => Some(SettingsCategory::Storage),
            "ILO_SETTINGS" => Some(SettingsCategory::IloSettings),
            "EXTERNAL_STORAGE" => Some(SettingsCategory::ExternalStorage),
            _ => None,
        }
    }
}

impl fmt::Display for SettingsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the server settings catalog.
///
/// The `resource_uri` is the value referenced from a group's `settingsUris`
/// list; the resolver matches on `name` + `category`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSetting {
    pub id: Uuid,
    pub name: String,
    pub category: SettingsCategory,
    pub resource_uri: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub platform_family: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
