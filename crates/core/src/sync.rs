//! Wire format of the batch sync protocol.
//!
//! The client posts a JSON array of [`OperationDescriptor`]s; the server
//! answers with a [`BatchResponse`]. Descriptors are loosely typed on the
//! wire and are decoded into the closed [`EntityMutation`] variant before
//! anything touches a database.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entities::{EntityKind, EntityPayload};
use crate::error::CoreError;
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// SyncOp
// ---------------------------------------------------------------------------

/// Operation kind of a descriptor.
///
/// Unrecognised values are kept verbatim in [`SyncOp::Other`] so they can be
/// echoed back in the per-operation result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SyncOp {
    Put,
    Patch,
    Delete,
    Other(String),
}

impl SyncOp {
    pub fn as_str(&self) -> &str {
        match self {
            SyncOp::Put => "PUT",
            SyncOp::Patch => "PATCH",
            SyncOp::Delete => "DELETE",
            SyncOp::Other(raw) => raw,
        }
    }
}

impl From<String> for SyncOp {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PUT" => SyncOp::Put,
            "PATCH" => SyncOp::Patch,
            "DELETE" => SyncOp::Delete,
            _ => SyncOp::Other(raw),
        }
    }
}

impl From<SyncOp> for String {
    fn from(op: SyncOp) -> Self {
        match op {
            SyncOp::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OperationDescriptor
// ---------------------------------------------------------------------------

/// One element of an uploaded batch: `{op, type, id, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub op: SyncOp,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: EntityId,
    #[serde(default)]
    pub data: Option<Value>,
}

impl OperationDescriptor {
    /// Build a PUT or PATCH descriptor. The record `id` is merged into `data`.
    pub fn upsert(
        op: SyncOp,
        entity_type: impl Into<String>,
        id: impl Into<EntityId>,
        mut data: Map<String, Value>,
    ) -> Self {
        let id = id.into();
        data.insert("id".to_string(), Value::String(id.clone()));
        Self {
            op,
            entity_type: entity_type.into(),
            id,
            data: Some(Value::Object(data)),
        }
    }

    /// Build a DELETE descriptor (`data` is always null).
    pub fn delete(entity_type: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            op: SyncOp::Delete,
            entity_type: entity_type.into(),
            id: id.into(),
            data: None,
        }
    }

    /// Decode into a typed mutation.
    ///
    /// Returns `Ok(None)` when `type` names a table outside the RBAC schema;
    /// such descriptors are skipped rather than failed. PUT and PATCH decode
    /// identically into a full upsert. The descriptor `id` always wins over
    /// any `id` inside `data`.
    pub fn decode(&self) -> Result<Option<EntityMutation>, CoreError> {
        let Some(kind) = EntityKind::from_table(&self.entity_type) else {
            return Ok(None);
        };

        match &self.op {
            SyncOp::Put | SyncOp::Patch => {
                let mut fields = match &self.data {
                    Some(Value::Object(map)) => map.clone(),
                    Some(_) => {
                        return Err(CoreError::Validation(format!(
                            "{} payload for {kind} must be an object",
                            self.op
                        )))
                    }
                    None => {
                        return Err(CoreError::Validation(format!(
                            "{} for {kind} requires data",
                            self.op
                        )))
                    }
                };
                fields.insert("id".to_string(), Value::String(self.id.clone()));

                let payload = EntityPayload::from_value(kind, Value::Object(fields))
                    .map_err(|e| CoreError::Validation(format!("Invalid {kind} payload: {e}")))?;
                Ok(Some(EntityMutation::Upsert(payload)))
            }
            SyncOp::Delete => Ok(Some(EntityMutation::Delete {
                kind,
                id: self.id.clone(),
            })),
            SyncOp::Other(raw) => Err(CoreError::Validation(format!("Unknown operation: {raw}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// EntityMutation
// ---------------------------------------------------------------------------

/// A decoded, strongly-typed change to one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityMutation {
    /// Insert, or overwrite on conflict (last write wins).
    Upsert(EntityPayload),
    /// Delete by id. Deleting a missing id is not an error.
    Delete { kind: EntityKind, id: EntityId },
}

impl EntityMutation {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityMutation::Upsert(payload) => payload.kind(),
            EntityMutation::Delete { kind, .. } => *kind,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EntityMutation::Upsert(payload) => payload.id(),
            EntityMutation::Delete { id, .. } => id,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of one applied descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub operation: SyncOp,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: EntityId,
    pub success: bool,
    /// The resulting row; absent for a delete that matched nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn succeeded(descriptor: &OperationDescriptor, result: Option<Value>) -> Self {
        Self {
            operation: descriptor.op.clone(),
            entity_type: descriptor.entity_type.clone(),
            id: descriptor.id.clone(),
            success: true,
            result,
            error: None,
        }
    }

    pub fn failed(descriptor: &OperationDescriptor, error: impl Into<String>) -> Self {
        Self {
            operation: descriptor.op.clone(),
            entity_type: descriptor.entity_type.clone(),
            id: descriptor.id.clone(),
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Response body of the sync endpoint.
///
/// `success` only says the batch was received and iterated; callers must
/// inspect `results` for per-operation outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    /// Number of descriptors that were attempted (skipped ones excluded).
    pub processed: usize,
    pub results: Vec<OperationResult>,
}

impl BatchResponse {
    pub fn from_results(results: Vec<OperationResult>) -> Self {
        Self {
            success: true,
            processed: results.len(),
            results,
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = &OperationResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::entities::UserPayload;

    fn descriptor(value: Value) -> OperationDescriptor {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn unknown_op_is_preserved_verbatim() {
        let d = descriptor(json!({"op": "MERGE", "type": "users", "id": "u1", "data": null}));
        assert_eq!(d.op, SyncOp::Other("MERGE".into()));
        assert_eq!(serde_json::to_value(&d).unwrap()["op"], "MERGE");
    }

    #[test]
    fn put_and_patch_decode_to_the_same_upsert() {
        let data = json!({"name": "Ada", "email": "ada@example.com", "role_id": null});
        let put = descriptor(json!({"op": "PUT", "type": "users", "id": "u1", "data": data}));
        let patch = descriptor(json!({"op": "PATCH", "type": "users", "id": "u1", "data": data}));

        let expected = EntityMutation::Upsert(EntityPayload::User(UserPayload {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role_id: None,
            created_at: None,
            updated_at: None,
        }));
        assert_eq!(put.decode().unwrap(), Some(expected.clone()));
        assert_eq!(patch.decode().unwrap(), Some(expected));
    }

    #[test]
    fn descriptor_id_overrides_data_id() {
        let d = descriptor(json!({
            "op": "PUT", "type": "roles", "id": "r1",
            "data": {"id": "something-else", "name": "Admin"}
        }));
        let mutation = d.decode().unwrap().unwrap();
        assert_eq!(mutation.id(), "r1");
        assert_eq!(mutation.kind(), EntityKind::Role);
    }

    #[test]
    fn unknown_type_decodes_to_none() {
        let d = descriptor(json!({"op": "PUT", "type": "unknown_table", "id": "x", "data": {}}));
        assert_matches!(d.decode(), Ok(None));

        let d = descriptor(json!({"op": "BOGUS", "type": "unknown_table", "id": "x"}));
        assert_matches!(d.decode(), Ok(None));
    }

    #[test]
    fn delete_ignores_data() {
        let d = descriptor(json!({"op": "DELETE", "type": "role_permissions", "id": "rp1", "data": null}));
        assert_eq!(
            d.decode().unwrap(),
            Some(EntityMutation::Delete {
                kind: EntityKind::RolePermission,
                id: "rp1".into()
            })
        );
    }

    #[test]
    fn upsert_without_data_is_a_validation_error() {
        let d = descriptor(json!({"op": "PUT", "type": "permissions", "id": "p1", "data": null}));
        assert_matches!(d.decode(), Err(CoreError::Validation(msg)) if msg.contains("requires data"));
    }

    #[test]
    fn unknown_op_on_known_type_is_a_validation_error() {
        let d = descriptor(json!({"op": "MERGE", "type": "users", "id": "u1", "data": {}}));
        assert_matches!(d.decode(), Err(CoreError::Validation(msg)) if msg == "Unknown operation: MERGE");
    }

    #[test]
    fn upsert_builder_merges_id_into_data() {
        let mut data = Map::new();
        data.insert("name".into(), json!("Viewer"));
        let d = OperationDescriptor::upsert(SyncOp::Put, "roles", "r9", data);

        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "roles");
        assert_eq!(json["data"]["id"], "r9");
        assert_eq!(json["data"]["name"], "Viewer");
    }

    #[test]
    fn delete_builder_serializes_null_data() {
        let json = serde_json::to_value(OperationDescriptor::delete("users", "u1")).unwrap();
        assert_eq!(json["op"], "DELETE");
        assert!(json["data"].is_null());
    }

    #[test]
    fn batch_response_counts_and_omits_absent_fields() {
        let d = OperationDescriptor::delete("users", "u1");
        let response = BatchResponse::from_results(vec![
            OperationResult::succeeded(&d, None),
            OperationResult::failed(&d, "boom"),
        ]);

        assert_eq!(response.processed, 2);
        assert_eq!(response.succeeded_count(), 1);
        assert_eq!(response.failed().count(), 1);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["results"][0].get("result").is_none());
        assert!(json["results"][0].get("error").is_none());
        assert_eq!(json["results"][1]["error"], "boom");
        assert_eq!(json["results"][1]["operation"], "DELETE");
    }
}
