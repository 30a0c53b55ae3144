//! API services

pub mod com;
pub mod filters;
pub mod groups;
pub mod reports;
pub mod resolver;
pub mod settings;
pub mod sustainability;
pub mod webhooks;

pub use com::{CollectionResponse, ComClient, FilterBuilder, ListParams};
pub use filters::FilterService;
pub use groups::GroupService;
pub use reports::ReportService;
pub use resolver::{GroupPolicyResolver, ResolvedGroupState};
pub use settings::SettingsService;
pub use sustainability::SustainabilityService;
pub use webhooks::{verify_event_signature, WebhookService};
