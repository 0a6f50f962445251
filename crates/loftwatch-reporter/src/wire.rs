//! JSON bodies of the collector protocol

use loftwatch_domain::{DeltaReport, NormalizedReport};
use serde::{Deserialize, Serialize};

/// Body of the initial report
///
/// Absent values serialize as `null`. The distance is sent as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialReportBody {
    /// Monitored URL
    pub url: String,
    /// Event title
    pub title: Option<String>,
    /// UTC timestamp `DD.MM.YYYY HH:mm:ss`
    pub date_time: Option<String>,
    /// Distance in kilometres, as text
    pub distance: Option<String>,
    /// Release location
    pub location: Option<String>,
    /// Total from the arrivals counter
    pub total_birds: Option<String>,
}

impl From<&NormalizedReport> for InitialReportBody {
    fn from(report: &NormalizedReport) -> Self {
        Self {
            url: report.url.clone(),
            title: report.title.clone(),
            date_time: report.date_time_utc.clone(),
            distance: report.distance_km.map(|km| km.to_string()),
            location: report.location.clone(),
            total_birds: report.total_count.clone(),
        }
    }
}

/// Body of a delta report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaReportBody {
    /// New value of the watched field
    pub value: String,
}

impl From<&DeltaReport> for DeltaReportBody {
    fn from(delta: &DeltaReport) -> Self {
        Self {
            value: delta.value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initial_body_shape() {
        let report = NormalizedReport {
            url: "https://live.example.org/e/1".to_string(),
            title: Some("Derby".to_string()),
            date_time_utc: Some("13.11.2025 15:10:00".to_string()),
            distance_km: Some(412),
            location: None,
            total_count: Some("85".to_string()),
        };
        let value = serde_json::to_value(InitialReportBody::from(&report)).unwrap();
        assert_eq!(
            value,
            json!({
                "url": "https://live.example.org/e/1",
                "title": "Derby",
                "dateTime": "13.11.2025 15:10:00",
                "distance": "412",
                "location": null,
                "totalBirds": "85"
            })
        );
    }

    #[test]
    fn test_delta_body_shape() {
        let value = serde_json::to_value(DeltaReportBody::from(&DeltaReport::new("41/85"))).unwrap();
        assert_eq!(value, json!({ "value": "41/85" }));
    }
}
