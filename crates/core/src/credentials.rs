//! Connection parameters handed to the local store at initialization.

use serde::{Deserialize, Serialize};

/// Response body of the credential endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCredentials {
    /// URL of the sync service the local store streams from.
    pub endpoint: String,
    /// Bearer token for that service.
    pub token: String,
    /// Identity the token was issued for. A fixed placeholder until real
    /// authentication exists.
    pub user_id: String,
}

/// Placeholder identity returned until credentials are issued per user.
pub const PLACEHOLDER_USER_ID: &str = "example-user-id";
