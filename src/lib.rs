//! Compute Ops Management client library
//!
//! Typed async client for the HPE Compute Ops Management API: server
//! groups and their policies, server settings, webhooks, saved filters,
//! reports and sustainability metrics.
//!
//! ```no_run
//! use compute_ops_client::{ComClient, ComConfig, GroupService};
//!
//! # async fn run() -> compute_ops_client::ComResult<()> {
//! let config = ComConfig::load()?;
//! let client = ComClient::new(&config)?;
//! let groups = GroupService::new(client);
//! for group in groups.list_all().await? {
//!     println!("{} ({} devices)", group.name, group.device_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::ComConfig;
pub use services::{
    CollectionResponse, ComClient, FilterBuilder, FilterService, GroupService, ListParams,
    ReportService, SettingsService, SustainabilityService, WebhookService,
};
pub use utils::error::{ComError, ComResult};
