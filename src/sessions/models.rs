// Session listing and revocation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::models::Session;

/// A still-valid login of the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    #[schema(example = "Mozilla/5.0")]
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// True for the session the request was authenticated with
    pub is_current: bool,
}

impl SessionResponse {
    pub fn from_session(session: Session, current_session_id: Uuid) -> Self {
        Self {
            is_current: session.id == current_session_id,
            id: session.id,
            user_agent: session.user_agent,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionList {
    pub sessions: Vec<SessionResponse>,
}

/// Result of revoking every other session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokedSessions {
    #[schema(example = 2)]
    pub deleted_sessions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_response_flags_current() {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_agent: "curl/8.0".to_string(),
            valid: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let current = SessionResponse::from_session(session.clone(), session.id);
        assert!(current.is_current);

        let other = SessionResponse::from_session(session, Uuid::new_v4());
        assert!(!other.is_current);

        let json = serde_json::to_value(&other).unwrap();
        assert_eq!(json["userAgent"], "curl/8.0");
        assert_eq!(json["isCurrent"], false);
        assert!(json.get("userId").is_none());
    }

    #[test]
    fn test_revoked_sessions_camel_case() {
        let json = serde_json::to_value(RevokedSessions { deleted_sessions: 3 }).unwrap();
        assert_eq!(json["deletedSessions"], 3);
    }
}
