use crate::auth::claims::{Claims, Role};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

/// Token lifetime used when the configuration does not override it.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;
/// Longest token lifetime the service accepts (one year).
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;
/// Issuer stamped into every token.
pub const DEFAULT_ISSUER: &str = "quill-api";

/// Why a token was refused.
///
/// The HTTP layer collapses all of these into one 401; the distinction only
/// exists for callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    /// Signature mismatch, or a header naming a different algorithm.
    #[error("bad token signature")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("invalid token configuration: {0}")]
    Config(String),

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Issues and verifies HMAC-signed bearer tokens.
///
/// Holds the signing secret for the life of the process; nothing here is
/// mutated after construction, so one instance is shared across requests
/// behind an `Arc`.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl_secs: i64,
    issuer: String,
}

impl TokenService {
    /// Creates an HS256 token service.
    ///
    /// # Arguments
    /// * `secret` - Shared signing secret (must not be empty)
    /// * `issuer` - Value of the `iss` claim
    /// * `ttl_secs` - Token validity in seconds (1 up to [`MAX_TOKEN_TTL_SECS`])
    pub fn new(
        secret: &[u8],
        issuer: impl Into<String>,
        ttl_secs: i64,
    ) -> Result<Self, IssueError> {
        Self::with_algorithm(secret, issuer, ttl_secs, Algorithm::HS256)
    }

    /// Creates a token service signing with the given HMAC algorithm.
    pub fn with_algorithm(
        secret: &[u8],
        issuer: impl Into<String>,
        ttl_secs: i64,
        algorithm: Algorithm,
    ) -> Result<Self, IssueError> {
        if secret.is_empty() {
            return Err(IssueError::Config("signing secret is empty".to_string()));
        }
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl_secs) {
            return Err(IssueError::Config(format!(
                "token lifetime must be between 1s and {MAX_TOKEN_TTL_SECS}s, got {ttl_secs}s"
            )));
        }
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(IssueError::Config(format!(
                "{algorithm:?} is not a shared-secret algorithm"
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            ttl_secs,
            issuer: issuer.into(),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Builds the claims a token issued at `now` would carry.
    pub fn claims_at(
        &self,
        user_id: i64,
        email: &str,
        username: &str,
        role: Role,
        now: i64,
    ) -> Claims {
        Claims {
            user_id,
            email: email.to_string(),
            username: username.to_string(),
            role: Some(role.as_str().to_string()),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
            iss: self.issuer.clone(),
        }
    }

    /// Issues a token for a user, valid from now for the configured lifetime.
    pub fn issue(
        &self,
        user_id: i64,
        email: &str,
        username: &str,
        role: Role,
    ) -> Result<String, IssueError> {
        let claims = self.claims_at(user_id, email, username, role, Utc::now().timestamp());
        self.sign(&claims)
    }

    /// Signs arbitrary claims with the service key.
    pub fn sign(&self, claims: &Claims) -> Result<String, IssueError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| IssueError::Encoding(e.to_string()))
    }

    /// Verifies a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verifies signature, algorithm and expiry of `token` as of `now`.
    ///
    /// A token stays valid through the second named by `exp`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against the caller's clock, without leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| classify(token, e.kind()))?;

        if now > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn classify(token: &str, kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        // Header and payload are sound, so the undecodable part is the signature.
        ErrorKind::Base64(_) if signed_parts_decode(token) => TokenError::BadSignature,
        _ => TokenError::Malformed,
    }
}

/// Whether `token` has three segments and its header and payload are valid base64url.
fn signed_parts_decode(token: &str) -> bool {
    let mut segments = token.split('.');
    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(payload), Some(_), None) => {
            URL_SAFE_NO_PAD.decode(header).is_ok() && URL_SAFE_NO_PAD.decode(payload).is_ok()
        }
        _ => false,
    }
}
