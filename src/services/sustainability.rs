//! Sustainability and utilization insights

use tracing::debug;

use crate::models::{
    ServerUtilization, SustainabilityMetricType, SustainabilitySeries, SustainabilitySummary,
};
use crate::services::com::{
    CollectionResponse, ComClient, FilterBuilder, ListParams, SERVERS_URI, SUSTAINABILITY_URI,
};
use crate::utils::error::ComResult;

/// Sustainability insight service
#[derive(Clone)]
pub struct SustainabilityService {
    client: ComClient,
}

impl SustainabilityService {
    pub fn new(client: ComClient) -> Self {
        Self { client }
    }

    /// List one page of metric series.
    pub async fn list_metrics(
        &self,
        params: ListParams,
    ) -> ComResult<CollectionResponse<SustainabilitySeries>> {
        self.client.get_collection(SUSTAINABILITY_URI, &params).await
    }

    /// Fetch the series for one metric family, if the region reports it.
    pub async fn get_metric_series(
        &self,
        metric_type: SustainabilityMetricType,
    ) -> ComResult<Option<SustainabilitySeries>> {
        let mut params = ListParams::new().limit(1);
        if let Some(filter) = FilterBuilder::new()
            .equals("metricType", metric_type.as_str())
            .build()
        {
            params = params.filter(filter);
        }
        let page: CollectionResponse<SustainabilitySeries> =
            self.client.get_collection(SUSTAINABILITY_URI, &params).await?;
        Ok(page.into_items().into_iter().next())
    }

    /// Fetch every metric series and reduce each to a summary.
    pub async fn summarize_metrics(&self) -> ComResult<Vec<SustainabilitySummary>> {
        let series: Vec<SustainabilitySeries> =
            self.client.get_all_items(SUSTAINABILITY_URI, None).await?;
        debug!("Summarizing {} sustainability series", series.len());
        Ok(series.iter().map(SustainabilitySeries::summarize).collect())
    }

    /// Fetch utilization insight for one server; `None` if the server has
    /// no utilization data (or does not exist).
    pub async fn get_server_utilization(
        &self,
        server_id: &str,
    ) -> ComResult<Option<ServerUtilization>> {
        let path = format!(
            "{}/{}/utilization",
            SERVERS_URI,
            urlencoding::encode(server_id)
        );
        self.client.get_optional(&path).await
    }
}
