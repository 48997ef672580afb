use chrono::{SecondsFormat, Utc};

/// Entity identifiers are client-generated strings (UUIDs in practice).
pub type EntityId = String;

/// Timestamps are ISO-8601 strings written by the client or the service,
/// never database-native temporal values.
pub type Timestamp = String;

/// Generate a fresh entity identifier.
pub fn new_entity_id() -> EntityId {
    uuid::Uuid::new_v4().to_string()
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn now_timestamp() -> Timestamp {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
