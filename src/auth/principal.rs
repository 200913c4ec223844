use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user, as reported by the session provider.
///
/// Only the fields the portal reads are kept; anything else the provider sends
/// is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Provider-side role claim, normally "authenticated"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}
