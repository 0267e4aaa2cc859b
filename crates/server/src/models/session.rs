use base64::prelude::BASE64_URL_SAFE_NO_PAD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::UserId;

/// Contents of the signed session cookie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub user_id: UserId,
    /// Unix seconds.
    pub expires_at: i64,
}

impl SessionPayload {
    pub fn new(user_id: UserId, now: DateTime<Utc>, max_age: Duration) -> Self {
        Self {
            user_id,
            expires_at: (now + max_age).timestamp(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at
    }

    pub fn encode(&self) -> String {
        // serializing a struct of two integers cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        BASE64.encode(json)
    }

    pub fn decode(value: &str) -> Option<Self> {
        let json = BASE64.decode(value).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: UserId,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_survives_cookie_encoding() {
        let now = Utc::now();
        let payload = SessionPayload::new(12, now, Duration::days(30));
        assert_eq!(SessionPayload::decode(&payload.encode()), Some(payload.clone()));
        assert!(!payload.is_expired(now));
        assert!(payload.is_expired(now + Duration::days(30)));
    }

    #[test]
    fn garbage_does_not_decode() {
        assert_eq!(SessionPayload::decode("%%%"), None);
        assert_eq!(SessionPayload::decode(&BASE64.encode(b"{\"userId\":1}")), None);
    }
}
