//! Collection catalogue: storage names, URL segments and timestamp rules.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A schema-less record: a JSON object as submitted by the dashboard.
pub type Document = Map<String, Value>;

/// Field holding the public identifier in every returned document.
pub const ID_FIELD: &str = "id";

/// The independently addressed record sets held by the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Alerts,
    Resources,
    Incidents,
    Teams,
    EvacuationPlans,
    Messages,
    Users,
    Weather,
}

impl Collection {
    /// Collections exposing the full list/get/create/update/delete surface.
    pub const CRUD: [Collection; 5] = [
        Collection::Alerts,
        Collection::Resources,
        Collection::Incidents,
        Collection::Teams,
        Collection::EvacuationPlans,
    ];

    /// Name used in the `documents.collection` column.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Alerts => "alerts",
            Collection::Resources => "resources",
            Collection::Incidents => "incidents",
            Collection::Teams => "teams",
            Collection::EvacuationPlans => "evacuation_plans",
            Collection::Messages => "messages",
            Collection::Users => "users",
            Collection::Weather => "weather",
        }
    }

    /// URL segment under `/api`.
    pub fn segment(&self) -> &'static str {
        match self {
            Collection::EvacuationPlans => "evacuation-plans",
            other => other.name(),
        }
    }

    /// Human label for confirmation and not-found messages.
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Alerts => "Alert",
            Collection::Resources => "Resource",
            Collection::Incidents => "Incident",
            Collection::Teams => "Team",
            Collection::EvacuationPlans => "Evacuation plan",
            Collection::Messages => "Message",
            Collection::Users => "User",
            Collection::Weather => "Weather data",
        }
    }

    /// Fields stamped with the current time when a document is created.
    pub fn create_stamps(&self) -> &'static [&'static str] {
        match self {
            Collection::Alerts | Collection::Incidents => &["createdAt", "updatedAt"],
            Collection::EvacuationPlans => &["lastUpdated"],
            Collection::Messages => &["timestamp"],
            Collection::Users => &["createdAt", "lastActive"],
            Collection::Resources | Collection::Teams | Collection::Weather => &[],
        }
    }

    /// Fields stamped with the current time on every update.
    pub fn update_stamps(&self) -> &'static [&'static str] {
        match self {
            Collection::Alerts | Collection::Incidents => &["updatedAt"],
            Collection::EvacuationPlans => &["lastUpdated"],
            Collection::Users => &["lastActive"],
            _ => &[],
        }
    }

    /// Documented field set. Unknown fields are still accepted and stored.
    pub fn canonical_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Alerts => &[
                "title",
                "severity",
                "type",
                "location",
                "description",
                "status",
                "createdAt",
                "updatedAt",
            ],
            Collection::Resources => &["name", "type", "quantity", "available", "location", "status"],
            Collection::Incidents => &[
                "title",
                "type",
                "severity",
                "location",
                "coordinates",
                "description",
                "reportedBy",
                "status",
                "assignedTeam",
                "createdAt",
                "updatedAt",
            ],
            Collection::Teams => &[
                "name",
                "type",
                "leader",
                "members",
                "status",
                "location",
                "equipment",
                "contact",
            ],
            Collection::EvacuationPlans => &[
                "name",
                "area",
                "capacity",
                "shelters",
                "routes",
                "status",
                "lastUpdated",
            ],
            Collection::Messages => &[
                "from", "to", "subject", "content", "priority", "status", "timestamp",
            ],
            Collection::Users => &[
                "username",
                "password",
                "name",
                "role",
                "department",
                "contact",
                "createdAt",
                "lastActive",
            ],
            Collection::Weather => &[
                "location",
                "temperature",
                "humidity",
                "windSpeed",
                "visibility",
                "condition",
                "alerts",
                "forecast",
            ],
        }
    }

    /// Fields of `doc` outside the documented set, ignoring the identifier.
    pub fn unknown_fields<'a>(&self, doc: &'a Document) -> Vec<&'a str> {
        let known = self.canonical_fields();
        doc.keys()
            .map(String::as_str)
            .filter(|key| *key != ID_FIELD && !known.contains(key))
            .collect()
    }
}

/// Current UTC time as ISO-8601 with microseconds and a literal `Z`.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Stamp each field in `fields` with `now`, overwriting client-supplied values.
pub fn stamp(doc: &mut Document, fields: &[&str], now: &str) {
    for field in fields {
        doc.insert((*field).to_string(), Value::String(now.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_evacuation_plans_segment_differs_from_storage_name() {
        assert_eq!(Collection::EvacuationPlans.name(), "evacuation_plans");
        assert_eq!(Collection::EvacuationPlans.segment(), "evacuation-plans");
        assert_eq!(Collection::Alerts.segment(), "alerts");
    }

    #[test]
    fn test_stamp_overwrites_client_values() {
        let mut doc = json!({ "title": "Flood", "updatedAt": "1999-01-01T00:00:00Z" })
            .as_object()
            .cloned()
            .unwrap();

        stamp(
            &mut doc,
            Collection::Alerts.update_stamps(),
            "2024-12-15T10:30:00.000000Z",
        );

        assert_eq!(doc["updatedAt"], "2024-12-15T10:30:00.000000Z");
        assert_eq!(doc["title"], "Flood");
    }

    #[test]
    fn test_utc_timestamp_format() {
        let now = utc_timestamp();
        assert!(now.ends_with('Z'));
        assert_eq!(now.len(), "2024-12-15T10:30:00.000000Z".len());
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }

    #[test]
    fn test_unstamped_collections() {
        assert!(Collection::Resources.create_stamps().is_empty());
        assert!(Collection::Teams.update_stamps().is_empty());
        assert!(Collection::Messages.update_stamps().is_empty());
    }

    #[test]
    fn test_unknown_fields() {
        let doc = json!({ "id": "x", "name": "Boats", "colour": "red" })
            .as_object()
            .cloned()
            .unwrap();

        assert_eq!(Collection::Resources.unknown_fields(&doc), vec!["colour"]);
    }
}
