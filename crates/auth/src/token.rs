//! Token signing and verification

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Default token lifetime in seconds (2 hours)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 2 * 60 * 60;

/// Longest accepted token lifetime in seconds (365 days)
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The caller's userId
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// A freshly issued token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Issues and verifies tokens with one server-held secret
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, AuthError> {
        let secret = secret.as_ref().to_vec();
        if secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }
        if ttl < Duration::seconds(1) || ttl > Duration::seconds(MAX_TOKEN_TTL_SECS) {
            return Err(AuthError::InvalidTtl {
                max_secs: MAX_TOKEN_TTL_SECS,
            });
        }
        Ok(Self { secret, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AuthError::MissingSubject);
        }

        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::InvalidTtl {
                max_secs: MAX_TOKEN_TTL_SECS,
            })?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };

        let signing_input = format!("{}.{}", encode_json(&header)?, encode_json(&claims)?);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input)?.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{signing_input}.{signature}"),
            claims,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut parts = token.trim().split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(AuthError::Malformed("expected three segments".to_string())),
            };

        let header: Header = decode_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        self.mac(&format!("{header_b64}.{claims_b64}"))?
            .verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let claims: Claims = decode_json(claims_b64)?;
        if claims.sub.is_empty() {
            return Err(AuthError::MissingSubject);
        }
        if now.timestamp() >= claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self, input: &str) -> Result<HmacSha256, AuthError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::EmptySecret)?;
        mac.update(input.as_bytes());
        Ok(mac)
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value).map_err(|e| AuthError::Malformed(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::Malformed(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::Malformed(e.to_string()))
}
