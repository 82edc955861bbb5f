use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Access token payload.
///
/// All timestamps are Unix seconds. A token without `sub`, `iat` or `exp`
/// does not deserialize and is therefore rejected as invalid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Issued at
    pub iat: i64,

    /// Expiration time
    pub exp: i64,

    /// Unique token identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Build claims for `subject`, valid from `now` for `validity`.
    pub fn for_subject(subject: impl ToString, validity: Duration, now: DateTime<Utc>) -> Self {
        Self {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
        }
    }

    /// A token is still valid at exactly `exp`; it expires one second later.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
