//! Report retrieval

use serde_json::Value;
use tracing::debug;

use crate::models::Report;
use crate::services::com::{CollectionResponse, ComClient, FilterBuilder, ListParams, REPORTS_URI};
use crate::utils::error::{ComError, ComResult};

/// Report service
#[derive(Clone)]
pub struct ReportService {
    client: ComClient,
}

impl ReportService {
    pub fn new(client: ComClient) -> Self {
        Self { client }
    }

    /// List one page of reports.
    pub async fn list(&self, params: ListParams) -> ComResult<CollectionResponse<Report>> {
        self.client.get_collection(REPORTS_URI, &params).await
    }

    /// List every report in the region.
    pub async fn list_all(&self) -> ComResult<Vec<Report>> {
        self.client.get_all_items(REPORTS_URI, None).await
    }

    /// List reports of one type, e.g. `CARBON_FOOTPRINT`.
    pub async fn list_by_type(&self, report_type: &str) -> ComResult<Vec<Report>> {
        let filter = FilterBuilder::new().equals("reportType", report_type).build();
        self.client
            .get_all_items(REPORTS_URI, filter.as_deref())
            .await
    }

    /// Fetch a report by id.
    pub async fn get(&self, id: &str) -> ComResult<Option<Report>> {
        self.client
            .get_optional(&format!("{}/{}", REPORTS_URI, urlencoding::encode(id)))
            .await
    }

    /// Fetch the generated row data behind a report. Rows are returned as
    /// raw JSON objects since each report type has its own columns.
    pub async fn get_report_data(
        &self,
        report: &Report,
        params: ListParams,
    ) -> ComResult<CollectionResponse<Value>> {
        let Some(data_uri) = report.report_data_uri.as_deref() else {
            return Err(ComError::validation(format!(
                "Report {} has no generated data to fetch",
                report.id
            )));
        };
        debug!("Fetching report data from {}", data_uri);
        self.client.get_collection(data_uri, &params).await
    }
}
