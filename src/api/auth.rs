//! Credential verification for write endpoints.
//!
//! Flow Overview: parse the `Authorization: Basic` header, look up the
//! account by exact email match, and verify the secret against the stored
//! Argon2id hash. On success the request gets a [`Principal`] carrying only
//! the account id and email; the full record (hash included) never travels
//! with the request.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64ct::{Base64, Encoding};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::api::storage;

// Fixed Argon2id cost: 19 MiB memory, 2 iterations, 1 lane.
const ARGON2_M_COST: u32 = 19_456;
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

/// Authenticated identity attached to a request after verification.
///
/// Deliberately thin: handlers that need the rest of the record re-fetch it
/// through storage instead of carrying the hash around.
#[derive(Clone, Debug)]
pub struct Principal {
    pub id: i32,
    pub email: String,
}

impl Principal {
    /// Ownership check used on course mutation paths. Pure comparison, no
    /// side effects.
    #[must_use]
    pub(crate) fn owns(&self, course: &storage::CourseRow) -> bool {
        course.owner_id == self.id
    }
}

/// Credential failure kinds. Observably identical to the client (401 with a
/// generic body), distinguishable in logs.
#[derive(Debug)]
pub enum Denied {
    NoCredentials,
    UnknownPrincipal,
    BadSecret,
}

/// Verification outcome that is not a success.
#[derive(Debug)]
pub enum AuthError {
    Denied(Denied),
    Store(anyhow::Error),
}

/// Verify the request credentials and produce a principal.
///
/// # Errors
/// `AuthError::Denied` for the three credential failure kinds;
/// `AuthError::Store` when the account lookup itself fails.
pub async fn verify(headers: &HeaderMap, pool: &PgPool) -> Result<Principal, AuthError> {
    let Some((name, secret)) = parse_basic(headers) else {
        warn!("Credential header missing or malformed");
        return Err(AuthError::Denied(Denied::NoCredentials));
    };

    let record = storage::find_user_by_email(pool, &name)
        .await
        .map_err(AuthError::Store)?;

    let Some(record) = record else {
        warn!("Unknown account for username: {name}");
        return Err(AuthError::Denied(Denied::UnknownPrincipal));
    };

    if !password_matches(secret.expose_secret(), &record.password_hash) {
        warn!("Password mismatch for username: {name}");
        return Err(AuthError::Denied(Denied::BadSecret));
    }

    info!("Authentication successful for username: {name}");

    Ok(Principal {
        id: record.id,
        email: record.email_address,
    })
}

/// Hash a plaintext password for storage, using the pinned Argon2id cost.
///
/// # Errors
/// Returns an error if the hasher cannot be constructed or hashing fails.
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?
        .to_string();
    Ok(hash)
}

fn hasher() -> Result<Argon2<'static>> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
        .map_err(|err| anyhow!("invalid Argon2 params: {err}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Constant-structure comparison via the hash library. Never compares
/// strings directly.
fn password_matches(plaintext: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Decode `Authorization: Basic base64(name:secret)`.
///
/// Any shape problem (missing header, wrong scheme, bad base64, no colon)
/// collapses into `None`; the caller treats them all as missing credentials.
fn parse_basic(headers: &HeaderMap) -> Option<(String, SecretString)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = Base64::decode_vec(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (name, secret) = decoded.split_once(':')?;

    Some((name.to_string(), SecretString::from(secret.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(value).expect("header value"),
        );
        headers
    }

    fn basic(name: &str, secret: &str) -> String {
        format!("Basic {}", Base64::encode_string(format!("{name}:{secret}").as_bytes()))
    }

    #[test]
    fn parse_basic_round_trips_credentials() {
        let headers = headers_with_authorization(&basic("joe@smith.com", "joepassword"));
        let (name, secret) = parse_basic(&headers).expect("credentials");
        assert_eq!(name, "joe@smith.com");
        assert_eq!(secret.expose_secret(), "joepassword");
    }

    #[test]
    fn parse_basic_accepts_case_insensitive_scheme() {
        let encoded = Base64::encode_string(b"a@b.co:pw");
        let headers = headers_with_authorization(&format!("basic {encoded}"));
        assert!(parse_basic(&headers).is_some());
    }

    #[test]
    fn parse_basic_rejects_malformed_headers() {
        assert!(parse_basic(&HeaderMap::new()).is_none());
        assert!(parse_basic(&headers_with_authorization("Bearer token")).is_none());
        assert!(parse_basic(&headers_with_authorization("Basic !!!not-base64!!!")).is_none());

        // Valid base64, but no name:secret separator
        let encoded = Base64::encode_string(b"no-colon-here");
        assert!(parse_basic(&headers_with_authorization(&format!("Basic {encoded}"))).is_none());
    }

    #[test]
    fn secret_with_colons_is_preserved() {
        let headers = headers_with_authorization(&basic("a@b.co", "pa:ss:word"));
        let (_, secret) = parse_basic(&headers).expect("credentials");
        assert_eq!(secret.expose_secret(), "pa:ss:word");
    }

    #[test]
    fn hash_never_stores_plaintext() {
        let hash = hash_password("joepassword").expect("hash");
        assert_ne!(hash, "joepassword");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn hash_pins_explicit_cost() {
        let hash = hash_password("joepassword").expect("hash");
        assert!(hash.contains("m=19456,t=2,p=1"));
    }

    #[test]
    fn verify_accepts_exact_plaintext_only() {
        let hash = hash_password("joepassword").expect("hash");
        assert!(password_matches("joepassword", &hash));
        assert!(!password_matches("joepassword ", &hash));
        assert!(!password_matches("JOEPASSWORD", &hash));
        assert!(!password_matches("", &hash));
    }

    #[test]
    fn verify_rejects_garbage_stored_hash() {
        assert!(!password_matches("joepassword", "not-a-phc-string"));
    }

    #[test]
    fn principal_owns_matching_course_only() {
        let course = storage::CourseRow {
            id: 1,
            title: "Build a Basement Recording Studio".to_string(),
            description: "Improve acoustics with panels.".to_string(),
            estimated_time: None,
            materials_needed: None,
            owner_id: 7,
        };

        let owner = Principal {
            id: 7,
            email: "joe@smith.com".to_string(),
        };
        let other = Principal {
            id: 8,
            email: "sally@jones.com".to_string(),
        };

        assert!(owner.owns(&course));
        assert!(!other.owns(&course));
    }
}
