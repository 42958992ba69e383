//! Cashout Auth
//!
//! Issues and verifies HS256 bearer tokens (`header.claims.signature`,
//! base64url without padding). The service only checks that a token is
//! unforged and unexpired; who the user is gets decided upstream.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, IssuedToken, TokenSigner, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
