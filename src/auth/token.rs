use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::storage::{CredentialStore, ACCESS_KEY, REFRESH_KEY};
use crate::error::{AlacenaError, AlacenaResult};

/// Access and refresh token pair issued at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access: String,
    pub refresh: String,
}

impl Credential {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// Write both tokens to the store
    pub async fn save(&self, store: &dyn CredentialStore) -> AlacenaResult<()> {
        store.set(ACCESS_KEY, &self.access).await?;
        store.set(REFRESH_KEY, &self.refresh).await
    }

    /// Read both tokens; `None` unless both are present
    pub async fn load(store: &dyn CredentialStore) -> AlacenaResult<Option<Self>> {
        let access = store.get(ACCESS_KEY).await?;
        let refresh = store.get(REFRESH_KEY).await?;
        Ok(access.zip(refresh).map(|(access, refresh)| Self { access, refresh }))
    }
}

/// Claims we read from a token payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiry, Unix seconds
    pub exp: i64,
    #[serde(default)]
    pub sub: Option<String>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Decode the payload segment of a JWT-shaped token without verifying it
pub fn decode_claims(token: &str) -> AlacenaResult<TokenClaims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => {
            return Err(AlacenaError::token_decode(
                "expected three dot-separated segments",
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(AlacenaError::token_decode)?;
    serde_json::from_slice(&bytes).map_err(AlacenaError::token_decode)
}

/// Whether the token's `exp` is at or before `now`, at seconds resolution.
///
/// Malformed tokens are reported as [`AlacenaError::TokenDecode`].
pub fn token_expired(token: &str, now: DateTime<Utc>) -> AlacenaResult<bool> {
    let claims = decode_claims(token)?;
    Ok(claims.exp <= now.timestamp())
}

#[cfg(test)]
pub(crate) fn make_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::json!({ "exp": exp, "sub": "tester" }).to_string());
    format!("{header}.{payload}.signature")
}
