//! Signed, expiring bearer tokens.
//!
//! Tokens are compact three-part JWTs carrying only the subject (user id)
//! and expiry. The signing secret and algorithm are process-wide and loaded
//! once at startup. There is no revocation list: a token stays valid for
//! its full lifetime regardless of password changes or account deletion.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::Error as JwtError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued for.
    pub sub: String,
    /// Absolute expiry, unix seconds. A token is valid strictly before it.
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    expiry: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, algorithm: Algorithm, expiry_minutes: i64) -> Self {
        let mut validation = Validation::new(algorithm);
        // Strict expiry: exp <= now must fail, no grace window.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            header: Header::new(algorithm),
            validation,
            expiry: Duration::minutes(expiry_minutes),
        }
    }

    /// Issue a token for `user_id` expiring `expiry` from now.
    pub fn issue(&self, user_id: &str) -> Result<String, JwtError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = Claims {
            sub: user_id.to_owned(),
            exp: (now + self.expiry).timestamp(),
        };
        encode(&self.header, &claims, &self.encoding_key)
    }

    /// Decode and validate a token. Fails on bad signature, wrong or `none`
    /// algorithm, malformed structure, or expiry at or before now.
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}
