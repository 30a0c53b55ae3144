//! Sustainability and utilization insight models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metric families exposed by the sustainability endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SustainabilityMetricType {
    CarbonEmissions,
    EnergyConsumption,
    EnergyCost,
}

impl SustainabilityMetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SustainabilityMetricType::CarbonEmissions => "CARBON_EMISSIONS",
            SustainabilityMetricType::EnergyConsumption => "ENERGY_CONSUMPTION",
            SustainabilityMetricType::EnergyCost => "ENERGY_COST",
        }
    }
}

/// One sampled point of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A metric time series as returned by the sustainability endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SustainabilitySeries {
    pub metric_type: SustainabilityMetricType,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub series: Vec<MetricPoint>,
    /// Precomputed total reported by the API; absent on some ranges.
    #[serde(default)]
    pub total: Option<f64>,
}

/// Client-side aggregation of a series, for display alongside the raw data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SustainabilitySummary {
    pub metric_type: SustainabilityMetricType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub total: f64,
    pub average: f64,
    pub peak: f64,
    pub sample_count: usize,
}

impl SustainabilitySeries {
    /// Aggregates the series into total/average/peak. The API total is
    /// preferred when present; otherwise the sum of samples is used.
    pub fn summarize(&self) -> SustainabilitySummary {
        let sum: f64 = self.series.iter().map(|p| p.value).sum();
        let peak = self
            .series
            .iter()
            .map(|p| p.value)
            .fold(f64::NEG_INFINITY, f64::max);
        let count = self.series.len();
        SustainabilitySummary {
            metric_type: self.metric_type,
            unit: self.unit.clone(),
            total: self.total.unwrap_or(sum),
            average: if count == 0 { 0.0 } else { sum / count as f64 },
            peak: if count == 0 { 0.0 } else { peak },
            sample_count: count,
        }
    }
}

/// One utilization metric of a server (cpu, power, thermal, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationMetric {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub data_points: Vec<MetricPoint>,
}

impl UtilizationMetric {
    /// Most recent sample, by timestamp.
    pub fn latest(&self) -> Option<&MetricPoint> {
        self.data_points.iter().max_by_key(|p| p.timestamp)
    }
}

/// Utilization insight for one server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUtilization {
    /// Server resource id the metrics belong to
    pub server_id: String,
    #[serde(default)]
    pub metrics: Vec<UtilizationMetric>,
}

impl ServerUtilization {
    pub fn metric(&self, name: &str) -> Option<&UtilizationMetric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}
