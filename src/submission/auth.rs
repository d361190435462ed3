use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::utils::AUTH_TOKEN_TTL_SECS;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub uid: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints the short-lived HS256 token sent as the `auth` cookie
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign a fresh token for `user_id` (empty uid when absent)
    ///
    /// # Errors
    ///
    /// `FetchError::Submission` if encoding fails.
    pub fn sign(&self, user_id: Option<&str>) -> Result<String, FetchError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            uid: user_id.unwrap_or_default().to_string(),
            iat: now,
            exp: now + AUTH_TOKEN_TTL_SECS,
        };
        encode(&Header::default(), &claims, &self.key)
            .map_err(|e| FetchError::Submission(format!("Failed to sign auth token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn token_carries_uid_and_five_minute_expiry() {
        let token = TokenSigner::new("shared-secret")
            .sign(Some("user-42"))
            .expect("sign");
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"shared-secret"),
            &Validation::default(),
        )
        .expect("decode");

        assert_eq!(decoded.claims.uid, "user-42");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 300);
    }

    #[test]
    fn missing_user_gets_empty_uid() {
        let token = TokenSigner::new("s").sign(None).expect("sign");
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"s"),
            &Validation::default(),
        )
        .expect("decode");
        assert_eq!(decoded.claims.uid, "");
    }
}
