use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Argon2id memory cost in KiB.
pub const MEMORY_COST_KIB: u32 = 19_456;
/// Argon2id iteration count.
pub const TIME_COST: u32 = 2;
/// Argon2id lanes.
pub const PARALLELISM: u32 = 1;

/// Argon2id hash under the work factor above whose secret is unknown.
const PLACEHOLDER_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$OQYH2TclDlY9146n8VxbjA$YVlFUo+j92UyLP0ONcgcRFvtamV99CxWuVI8MIFgMUY";

/// Errors raised by [`CredentialHasher`].
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The hasher itself failed (bad parameters, entropy source).
    #[error("failed to hash password: {0}")]
    Hashing(String),

    /// The stored value is not a PHC string.
    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    /// The stored value names an algorithm this hasher does not handle.
    #[error("unsupported password hash algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// One-way salted password hashing with a fixed Argon2id work factor.
///
/// Produces PHC-formatted strings (`$argon2id$v=19$m=19456,t=2,p=1$...`).
/// Verification honours the parameters embedded in the stored hash, so
/// hashes created under an older cost keep verifying.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new() -> Result<Self, HashError> {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
            .map_err(|e| HashError::Hashing(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes `secret` under a freshly generated salt.
    pub fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::Hashing(e.to_string()))
    }

    /// Checks `secret` against a stored hash.
    ///
    /// A wrong secret is `Ok(false)`; only a structurally bad `hashed` value
    /// is an error.
    pub fn verify(&self, secret: &str, hashed: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(hashed).map_err(|e| HashError::MalformedHash(e.to_string()))?;

        if Algorithm::try_from(parsed.algorithm).is_err() {
            return Err(HashError::UnsupportedAlgorithm(
                parsed.algorithm.as_str().to_string(),
            ));
        }

        match self.argon2.verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::MalformedHash(e.to_string())),
        }
    }

    /// Runs a full verification of `secret` against a placeholder hash.
    ///
    /// For callers with no stored hash to check (unknown account), so that
    /// rejecting them costs as much as rejecting a wrong password.
    pub fn dummy_verify(&self, secret: &str) {
        if let Err(e) = self.verify(secret, PLACEHOLDER_HASH) {
            tracing::error!(error = %e, "placeholder hash failed to verify");
        }
    }
}
