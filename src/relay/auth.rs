//! Shared-secret authentication for inbound relay requests.

use std::net::SocketAddr;

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use super::outcome::RelayOutcome;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The process-wide shared secret. Loaded once at startup and never logged.
#[derive(Clone)]
pub struct Credential {
    digest: [u8; 32],
}

impl Credential {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    /// Exact match against `candidate`.
    ///
    /// Both sides are hashed first and every digest byte is folded in, so
    /// the comparison time does not reveal how long a matching prefix was.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let other: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        self.digest
            .iter()
            .zip(other.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Check the `X-API-Key` header. A missing or non-UTF-8 header is a mismatch.
pub fn authorize(
    credential: &Credential,
    headers: &HeaderMap,
    peer: SocketAddr,
    correlation_id: &str,
) -> Result<(), RelayOutcome> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(value) if credential.matches(value) => Ok(()),
        _ => {
            tracing::warn!(
                correlation_id = %correlation_id,
                peer = %peer,
                header_present = presented.is_some(),
                "unauthorized relay attempt"
            );
            Err(RelayOutcome::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn accepts_exact_secret() {
        let credential = Credential::new("s3cret");
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, "s3cret".parse().unwrap());
        assert!(authorize(&credential, &headers, peer(), "cid").is_ok());
    }

    #[test]
    fn rejects_wrong_secret() {
        let credential = Credential::new("s3cret");
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, "s3cret ".parse().unwrap());
        assert_eq!(
            authorize(&credential, &headers, peer(), "cid"),
            Err(RelayOutcome::Unauthorized)
        );
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let credential = Credential::new("s3cret");
        assert_eq!(
            authorize(&credential, &HeaderMap::new(), peer(), "cid"),
            Err(RelayOutcome::Unauthorized)
        );
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let credential = Credential::new("Secret");
        assert!(!credential.matches("secret"));
        assert!(credential.matches("Secret"));
    }

    #[test]
    fn debug_never_prints_secret() {
        let credential = Credential::new("hunter2");
        assert!(!format!("{credential:?}").contains("hunter2"));
    }
}
