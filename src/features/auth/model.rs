use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Caller identity taken from a verified access token.
///
/// The token only proves *who* the caller is; the campus role is looked up
/// from the directory on each request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Session id of the hosted auth service, when present in the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AuthenticatedUser {
    #[cfg(test)]
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            email: None,
            session_id: None,
        }
    }
}
