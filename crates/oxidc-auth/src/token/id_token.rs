//! OpenID Connect ID Token claim shaping.
//!
//! [`IdTokenClaims`] is serialized into a generic key/value map before
//! signing. Timestamps are emitted as double-precision floats because the
//! downstream JWT signing stack rejects integer types in numeric-date
//! fields. Empty fields scrub any same-named key a caller put into `extra`,
//! so reserved claim names can never leak through unless set explicitly.

use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

/// Claims of an OpenID Connect ID Token.
///
/// Empty strings and `None` instants mean "absent"; absent fields are
/// omitted from the shaped output. `jti` is the exception: a fresh UUID is
/// generated when it is empty.
#[derive(Debug, Clone, Default)]
pub struct IdTokenClaims {
    /// JWT ID. Generated when empty.
    pub jti: String,

    /// Issuer.
    pub issuer: String,

    /// Subject.
    pub subject: String,

    /// Audience; emitted even when empty.
    pub audience: Vec<String>,

    /// Nonce from the authorization request.
    pub nonce: String,

    /// Expiration time.
    pub expires_at: Option<OffsetDateTime>,

    /// Issued-at time.
    pub issued_at: Option<OffsetDateTime>,

    /// Time at which the end-user authorization was requested.
    pub requested_at: Option<OffsetDateTime>,

    /// Time of the end-user authentication.
    pub auth_time: Option<OffsetDateTime>,

    /// Access token hash (`at_hash`).
    pub access_token_hash: String,

    /// Authorization code hash (`c_hash`).
    pub code_hash: String,

    /// Authentication Context Class Reference (`acr`).
    pub authentication_context_class_reference: String,

    /// Authentication Methods Reference (`amr`).
    pub authentication_methods_reference: String,

    /// Caller-supplied extension claims.
    pub extra: Map<String, Value>,
}

impl IdTokenClaims {
    /// Shapes the claim set into a map suitable for JWT signing.
    ///
    /// The output starts from a deep copy of `extra`; each standard field
    /// then either overwrites its reserved key or deletes it when the field
    /// is absent.
    #[must_use]
    pub fn to_claims(&self) -> Map<String, Value> {
        let mut claims = self.extra.clone();

        set_string(&mut claims, "iss", &self.issuer);
        set_string(&mut claims, "sub", &self.subject);

        if self.jti.is_empty() {
            claims.insert("jti".to_string(), Value::from(Uuid::new_v4().to_string()));
        } else {
            claims.insert("jti".to_string(), Value::from(self.jti.clone()));
        }

        claims.insert("aud".to_string(), Value::from(self.audience.clone()));

        set_timestamp(&mut claims, "exp", self.expires_at);
        set_timestamp(&mut claims, "iat", self.issued_at);
        set_timestamp(&mut claims, "rat", self.requested_at);
        set_timestamp(&mut claims, "auth_time", self.auth_time);

        set_string(&mut claims, "nonce", &self.nonce);
        set_string(&mut claims, "at_hash", &self.access_token_hash);
        set_string(&mut claims, "c_hash", &self.code_hash);
        set_string(
            &mut claims,
            "acr",
            &self.authentication_context_class_reference,
        );
        set_string(
            &mut claims,
            "amr",
            &self.authentication_methods_reference,
        );

        claims
    }

    /// Inserts an extension claim.
    pub fn add(&mut self, key: impl Into<String>, value: Value) {
        self.extra.insert(key.into(), value);
    }

    /// Returns the value `key` would take in the shaped output.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.to_claims().get(key).cloned()
    }
}

fn set_string(claims: &mut Map<String, Value>, key: &str, value: &str) {
    if value.is_empty() {
        claims.remove(key);
    } else {
        claims.insert(key.to_string(), Value::from(value));
    }
}

/// Numeric dates are emitted as floats; downstream signing rejects integer
/// types in these fields.
fn set_timestamp(claims: &mut Map<String, Value>, key: &str, value: Option<OffsetDateTime>) {
    match value {
        Some(instant) => {
            claims.insert(
                key.to_string(),
                Value::from(instant.unix_timestamp() as f64),
            );
        }
        None => {
            claims.remove(key);
        }
    }
}
