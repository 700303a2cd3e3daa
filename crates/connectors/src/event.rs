//! Event records returned by billing APIs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single event as returned by the events API
///
/// Only the fields the pipeline relies on are typed. Everything else
/// (`livemode`, `api_version`, `request`, ...) is kept in `extra` so the
/// raw event can be re-serialized without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier, used as the pagination cursor
    pub id: String,

    /// Event type, e.g. `customer.subscription.updated`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// Creation time (seconds since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,

    /// Wrapper around the affected object
    pub data: EventData,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `data` member of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// Snapshot of the object the event refers to
    pub object: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// The nested `data.object` payload
    pub fn payload(&self) -> &Value {
        &self.data.object
    }

    /// Consume the event, keeping only its payload
    pub fn into_payload(self) -> Value {
        self.data.object
    }
}

/// One page of the events listing
#[derive(Debug, Deserialize)]
pub(crate) struct EventPage {
    pub data: Vec<Event>,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_deserialize_keeps_extra_fields() {
        let event: Event = serde_json::from_value(json!({
            "id": "evt_1",
            "object": "event",
            "type": "customer.subscription.created",
            "created": 1688169600,
            "livemode": false,
            "data": {"object": {"id": "sub_1", "status": "active"}, "previous_attributes": {}}
        }))
        .unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type.as_deref(), Some("customer.subscription.created"));
        assert_eq!(event.created, Some(1688169600));
        assert_eq!(event.payload()["status"], "active");
        assert_eq!(event.extra["livemode"], false);
        assert!(event.data.extra.contains_key("previous_attributes"));
    }

    #[test]
    fn test_event_missing_id_is_rejected() {
        let result = serde_json::from_value::<Event>(json!({"data": {"object": {}}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_event_missing_object_is_rejected() {
        let result = serde_json::from_value::<Event>(json!({"id": "evt_1", "data": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_page_requires_has_more() {
        let result = serde_json::from_value::<EventPage>(json!({"data": []}));
        assert!(result.is_err());
    }
}
