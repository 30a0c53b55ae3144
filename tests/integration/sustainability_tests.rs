//! Sustainability and utilization insight integration tests

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use compute_ops_client::models::SustainabilityMetricType;
use compute_ops_client::services::com::{SERVERS_URI, SUSTAINABILITY_URI};
use compute_ops_client::SustainabilityService;

use crate::common::fixtures::{collection, SustainabilityFixtures};
use crate::common::MockApi;

#[tokio::test]
async fn test_get_metric_series_picks_requested_metric() {
    let api = MockApi::start().await;
    Mock::given(method("GET"))
        .and(path(SUSTAINABILITY_URI))
        .and(query_param("limit", "1"))
        .and(query_param("filter", "metricType eq 'CARBON_EMISSIONS'"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(collection(vec![SustainabilityFixtures::carbon_series()])),
        )
        .mount(&api.server)
        .await;

    let service = SustainabilityService::new(api.client());
    let series = service
        .get_metric_series(SustainabilityMetricType::CarbonEmissions)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(series.unit.as_deref(), Some("kgCO2e"));
    assert_eq!(series.series.len(), 3);

    // The API-reported total wins over summing the samples.
    let summary = series.summarize();
    assert_eq!(summary.total, 42.5);
    assert_eq!(summary.peak, 16.5);
    assert_eq!(summary.sample_count, 3);
}

#[tokio::test]
async fn test_summarize_metrics_sums_series_without_total() {
    let api = MockApi::start().await;
    Mock::given(method("GET"))
        .and(path(SUSTAINABILITY_URI))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection(vec![
            SustainabilityFixtures::carbon_series(),
            SustainabilityFixtures::energy_series(),
        ])))
        .mount(&api.server)
        .await;

    let service = SustainabilityService::new(api.client());
    let summaries = service.summarize_metrics().await.unwrap();

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].metric_type, SustainabilityMetricType::CarbonEmissions);
    assert_eq!(summaries[0].total, 42.5);
    assert_eq!(summaries[1].metric_type, SustainabilityMetricType::EnergyConsumption);
    assert_eq!(summaries[1].total, 200.0);
    assert_eq!(summaries[1].average, 100.0);
}

#[tokio::test]
async fn test_server_utilization_reports_latest_sample() {
    let api = MockApi::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/srv-42/utilization", SERVERS_URI)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(SustainabilityFixtures::server_utilization("srv-42")),
        )
        .mount(&api.server)
        .await;

    let service = SustainabilityService::new(api.client());
    let utilization = service.get_server_utilization("srv-42").await.unwrap().unwrap();

    assert_eq!(utilization.server_id, "srv-42");
    let cpu = utilization.metric("cpu_utilization").unwrap();
    assert_eq!(cpu.latest().unwrap().value, 52.5);
}

#[tokio::test]
async fn test_server_without_utilization_data_is_none() {
    let api = MockApi::start().await;

    let service = SustainabilityService::new(api.client());
    let utilization = service.get_server_utilization("srv-unknown").await.unwrap();

    assert!(utilization.is_none());
}
