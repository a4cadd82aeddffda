//! Webhook envelope and delta types.
//!
//! The provider delivers one `WebhookPayload` per HTTP request. Deltas are
//! listed in delivery order; each one names an event type of the form
//! `<resource>.<action>` and carries the provider's resource representation
//! opaquely in `data.object`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope received from the sync provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Event notifications in delivery order.
    pub deltas: Vec<WebhookDelta>,
}

/// One event notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelta {
    /// Provider-assigned unique event identifier.
    pub id: String,
    /// Event name of the form `<resource>.<action>`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// CloudEvents spec version, carried through for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specversion: Option<String>,
    /// Event source URI, carried through for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Event timestamp (ISO-8601), informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Event payload.
    pub data: DeltaData,
}

impl WebhookDelta {
    /// Parsed event kind for dispatch.
    pub fn kind(&self) -> DeltaKind {
        DeltaKind::parse(&self.event_type)
    }
}

/// Payload of one delta: the resource representation plus routing ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeltaData {
    /// Provider resource representation, passed through unmodified.
    #[serde(default)]
    pub object: Value,
    /// Account/connection the event belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_id: Option<String>,
    /// Provider application the grant lives under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
}

impl DeltaData {
    /// Resource id from the embedded object, when present.
    pub fn resource_id(&self) -> Option<&str> {
        self.object.get("id").and_then(Value::as_str)
    }
}

/// Lifecycle action for a cached resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Updated,
    Deleted,
}

/// Lifecycle action for a grant. Grants additionally expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantChange {
    Created,
    Updated,
    Deleted,
    Expired,
}

/// Known event types, parsed once from the wire `type` string.
///
/// Dispatch happens on these variants rather than by inspecting the string
/// at each call site. Anything not in the table maps to `Unknown`, which
/// the processor logs and counts as processed; new event types may arrive
/// before handler code ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// `calendar.*`: a calendar container changed.
    Calendar(Change),
    /// `event.*`: a calendar event changed.
    CalendarEvent(Change),
    /// `message.*` (and the older `email.*` names): a message changed.
    Message(Change),
    /// `contact.*`: a contact changed.
    Contact(Change),
    /// `grant.*`: the account connection itself changed.
    Grant(GrantChange),
    /// Anything the table does not know.
    Unknown,
}

impl DeltaKind {
    /// Map a wire event-type string to its variant.
    ///
    /// `email.*` names are aliases from before the provider renamed the
    /// family to `message.*`; both route to the message handler.
    pub fn parse(event_type: &str) -> Self {
        match event_type {
            "calendar.created" => DeltaKind::Calendar(Change::Created),
            "calendar.updated" => DeltaKind::Calendar(Change::Updated),
            "calendar.deleted" => DeltaKind::Calendar(Change::Deleted),

            "event.created" => DeltaKind::CalendarEvent(Change::Created),
            "event.updated" => DeltaKind::CalendarEvent(Change::Updated),
            "event.deleted" => DeltaKind::CalendarEvent(Change::Deleted),

            "message.created" | "email.created" => DeltaKind::Message(Change::Created),
            "message.updated" | "email.updated" => DeltaKind::Message(Change::Updated),
            "message.deleted" | "email.deleted" => DeltaKind::Message(Change::Deleted),

            "contact.created" => DeltaKind::Contact(Change::Created),
            "contact.updated" => DeltaKind::Contact(Change::Updated),
            "contact.deleted" => DeltaKind::Contact(Change::Deleted),

            "grant.created" => DeltaKind::Grant(GrantChange::Created),
            "grant.updated" => DeltaKind::Grant(GrantChange::Updated),
            "grant.deleted" => DeltaKind::Grant(GrantChange::Deleted),
            "grant.expired" => DeltaKind::Grant(GrantChange::Expired),

            _ => DeltaKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(
            DeltaKind::parse("calendar.deleted"),
            DeltaKind::Calendar(Change::Deleted)
        );
        assert_eq!(
            DeltaKind::parse("event.updated"),
            DeltaKind::CalendarEvent(Change::Updated)
        );
        assert_eq!(
            DeltaKind::parse("message.created"),
            DeltaKind::Message(Change::Created)
        );
        assert_eq!(
            DeltaKind::parse("contact.created"),
            DeltaKind::Contact(Change::Created)
        );
        assert_eq!(
            DeltaKind::parse("grant.expired"),
            DeltaKind::Grant(GrantChange::Expired)
        );
    }

    #[test]
    fn test_parse_email_aliases() {
        assert_eq!(
            DeltaKind::parse("email.created"),
            DeltaKind::Message(Change::Created)
        );
        assert_eq!(
            DeltaKind::parse("email.deleted"),
            DeltaKind::Message(Change::Deleted)
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(DeltaKind::parse("message.send_success"), DeltaKind::Unknown);
        assert_eq!(DeltaKind::parse("folder.created"), DeltaKind::Unknown);
        assert_eq!(DeltaKind::parse(""), DeltaKind::Unknown);
        assert_eq!(DeltaKind::parse("calendar"), DeltaKind::Unknown);
    }

    #[test]
    fn test_payload_deserialization() {
        let json = r#"{
            "deltas": [
                {
                    "id": "e1",
                    "type": "message.created",
                    "time": "2024-05-01T12:00:00Z",
                    "data": {
                        "object": {"id": "m1", "subject": "Hello"},
                        "grant_id": "g1"
                    }
                }
            ]
        }"#;

        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.deltas.len(), 1);

        let delta = &payload.deltas[0];
        assert_eq!(delta.id, "e1");
        assert_eq!(delta.kind(), DeltaKind::Message(Change::Created));
        assert_eq!(delta.data.grant_id.as_deref(), Some("g1"));
        assert_eq!(delta.data.resource_id(), Some("m1"));
    }

    #[test]
    fn test_payload_deserialization_minimal() {
        let json = r#"{"deltas": [{"id": "e1", "type": "grant.expired", "data": {}}]}"#;

        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        let delta = &payload.deltas[0];
        assert_eq!(delta.data.grant_id, None);
        assert_eq!(delta.data.resource_id(), None);
        assert!(delta.time.is_none());
    }

    #[test]
    fn test_payload_missing_deltas_rejected() {
        let result = serde_json::from_str::<WebhookPayload>(r#"{"events": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_resource_id_requires_string() {
        let data = DeltaData {
            object: json!({"id": 42}),
            grant_id: None,
            application_id: None,
        };
        assert_eq!(data.resource_id(), None);
    }
}
