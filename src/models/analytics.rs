//! Analytics summary returned by `GET /api/analytics`.

use serde::{Deserialize, Serialize};

/// Dashboard summary. Only the three incident counts are live; the remaining
/// figures are fixed placeholders kept for dashboard compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_incidents: i64,
    pub resolved_incidents: i64,
    pub active_incidents: i64,
    pub average_response_time: String,
    pub resource_utilization: i64,
    pub monthly_incidents: Vec<MonthlyIncidents>,
    pub incidents_by_type: Vec<IncidentTypeCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyIncidents {
    pub month: String,
    pub incidents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentTypeCount {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: i64,
}

/// Placeholder: not derived from stored data.
pub const PLACEHOLDER_AVERAGE_RESPONSE_TIME: &str = "18 minutes";

/// Placeholder: not derived from stored data.
pub const PLACEHOLDER_RESOURCE_UTILIZATION: i64 = 78;

/// Placeholder: not derived from stored data.
const PLACEHOLDER_MONTHLY: [(&str, i64); 6] = [
    ("Jan", 12),
    ("Feb", 8),
    ("Mar", 15),
    ("Apr", 22),
    ("May", 18),
    ("Jun", 25),
];

/// Placeholder: not derived from stored data.
const PLACEHOLDER_BY_TYPE: [(&str, i64); 5] = [
    ("Natural Disaster", 45),
    ("Fire", 32),
    ("Medical Emergency", 28),
    ("Accident", 25),
    ("Other", 26),
];

impl AnalyticsSummary {
    /// Build the summary from the live incident counts.
    pub fn from_counts(total_incidents: i64, resolved_incidents: i64) -> Self {
        Self {
            total_incidents,
            resolved_incidents,
            active_incidents: total_incidents - resolved_incidents,
            average_response_time: PLACEHOLDER_AVERAGE_RESPONSE_TIME.to_string(),
            resource_utilization: PLACEHOLDER_RESOURCE_UTILIZATION,
            monthly_incidents: PLACEHOLDER_MONTHLY
                .iter()
                .map(|(month, incidents)| MonthlyIncidents {
                    month: month.to_string(),
                    incidents: *incidents,
                })
                .collect(),
            incidents_by_type: PLACEHOLDER_BY_TYPE
                .iter()
                .map(|(kind, count)| IncidentTypeCount {
                    kind: kind.to_string(),
                    count: *count,
                })
                .collect(),
        }
    }
}
