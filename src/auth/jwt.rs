// JWT token creation and verification
// Access and refresh tokens share a signing key and differ by their `type` claim

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthError, TokenService};

/// Purpose of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (user_id)
/// * `exp` - Expiry time (seconds since epoch)
/// * `type` - `access` or `refresh`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User ID (subject)
    pub sub: Uuid,
    /// Expiry timestamp (seconds since epoch)
    pub exp: usize,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

/// HS256 [`TokenService`]
///
/// # Example
/// ```
/// use chrono::Duration;
/// use devcollab_api::auth::{JwtService, TokenKind, TokenService};
/// use uuid::Uuid;
///
/// let jwt = JwtService::new("your-secret-key", Duration::minutes(30), Duration::days(7));
/// let user_id = Uuid::new_v4();
///
/// let token = jwt.issue(user_id, TokenKind::Refresh).unwrap();
/// assert_eq!(jwt.decode(&token, TokenKind::Refresh).unwrap().sub, user_id);
/// assert!(jwt.decode(&token, TokenKind::Access).is_err());
/// ```
#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
            access_ttl,
            refresh_ttl,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

impl TokenService for JwtService {
    /// Creates a signed token for a user
    ///
    /// # Token Properties
    /// - Expires after the configured TTL for `kind`
    /// - Signed with HS256 algorithm
    /// - Contains user_id in 'sub' claim
    fn issue(&self, user_id: Uuid, kind: TokenKind) -> Result<String, AuthError> {
        let expiry = Utc::now() + self.ttl(kind);
        let claims = Claims {
            sub: user_id,
            exp: expiry.timestamp() as usize,
            kind,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)?;

        if claims.kind != expected {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}
