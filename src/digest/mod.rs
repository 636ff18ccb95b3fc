//! Server side of HTTP DIGEST authentication
//! ([RFC 7616](https://datatracker.ietf.org/doc/html/rfc7616)).
//!
//! The interesting part is replay protection. Every nonce handed out in a
//! challenge is remembered in a bounded [`NonceCache`], together with a
//! sliding window of the nonce counts (`nc`) the client already used. A
//! request that reuses a count, or jumps too far ahead, is rejected; a nonce
//! that expired or fell out of the cache gets a fresh challenge marked
//! `stale=true`, so that clients retry without prompting the user.
//!
//! Checking passwords is left to a [`DigestCredentials`] implementation.
//!
//! ```rust
//! use amaretti::digest::{
//!     Authentication, DigestAuthenticator, DigestConfig, DigestRequest, MapCredentials,
//! };
//!
//! let mut config = DigestConfig::default();
//! config.realm = "example".to_string();
//! let authenticator = DigestAuthenticator::from(config);
//!
//! let mut users = MapCredentials::new();
//! users.insert("alice", "secret");
//!
//! let request = DigestRequest {
//!     method: "GET",
//!     uri: "/private",
//!     scheme: "https",
//!     host: Some("example.com"),
//!     remote_addr: "192.0.2.1",
//! };
//!
//! // No `Authorization` header: ask for credentials.
//! let outcome = authenticator.authenticate(None, &request, &users);
//! assert_eq!(outcome, Authentication::Challenge { stale: false });
//!
//! // One `WWW-Authenticate` header per configured algorithm.
//! let challenges = authenticator.challenges(request.remote_addr, false);
//! assert_eq!(challenges.len(), 2);
//! assert!(challenges[0].starts_with("Digest realm=\"example\", qop=\"auth\", nonce=\""));
//! assert!(challenges[0].ends_with("algorithm=SHA-256"));
//! ```
mod authenticator;
mod authorization;
mod nonce;

pub use authenticator::{
    Authentication, DigestAuthenticator, DigestCredentials, DigestRequest, MapCredentials,
    Validation,
};
pub use authorization::{parse_authorization, DigestAuthorization, DigestError};
pub use nonce::{NonceCache, NonceInfo};

use sha2::Digest;

/// Hash algorithms for DIGEST authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub enum DigestAlgorithm {
    #[cfg_attr(feature = "serde", serde(rename = "MD5", alias = "md5"))]
    Md5,
    #[cfg_attr(feature = "serde", serde(rename = "SHA-256", alias = "sha-256"))]
    Sha256,
    #[cfg_attr(feature = "serde", serde(rename = "SHA-512-256", alias = "sha-512-256"))]
    Sha512_256,
}

impl DigestAlgorithm {
    /// The name used in the `algorithm` directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha512_256 => "SHA-512-256",
        }
    }

    /// Looks an algorithm up by name, ignoring ASCII case.
    ///
    /// The `-sess` variants are not supported.
    pub fn from_name(name: &str) -> Option<DigestAlgorithm> {
        [
            DigestAlgorithm::Md5,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha512_256,
        ]
        .into_iter()
        .find(|a| a.as_str().eq_ignore_ascii_case(name))
    }

    /// Lowercase hex digest of `data`.
    pub fn hash_hex(&self, data: &[u8]) -> String {
        match self {
            DigestAlgorithm::Md5 => hex::encode(md5::Md5::digest(data)),
            DigestAlgorithm::Sha256 => hex::encode(sha2::Sha256::digest(data)),
            DigestAlgorithm::Sha512_256 => hex::encode(sha2::Sha512_256::digest(data)),
        }
    }
}

/// Configuration for a [`DigestAuthenticator`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DigestConfig {
    /// The realm sent in challenges and expected back from clients.
    ///
    /// By default, `Authentication required`.
    pub realm: String,
    /// The secret mixed into every nonce. A random one is generated if absent,
    /// which means nonces don't survive a restart.
    pub private_key: Option<String>,
    /// The `opaque` value sent in challenges. Random if absent.
    pub opaque: Option<String>,
    /// How long, in seconds, a nonce is accepted after being issued.
    ///
    /// By default, 300.
    pub nonce_validity_secs: u64,
    /// How many nonce counts are tracked per nonce to detect replays.
    /// Clients may send requests out of order within this window.
    ///
    /// By default, 100.
    pub nonce_count_window_size: usize,
    /// The maximum number of nonces remembered at once.
    ///
    /// By default, 1000.
    pub nonce_cache_size: usize,
    /// Check that the `uri` directive matches the request line.
    ///
    /// By default, `true`.
    pub validate_uri: bool,
    /// The algorithms offered to clients, in order of preference.
    ///
    /// By default, SHA-256 then MD5.
    pub algorithms: Vec<DigestAlgorithm>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        DigestConfig {
            realm: "Authentication required".to_string(),
            private_key: None,
            opaque: None,
            nonce_validity_secs: 300,
            nonce_count_window_size: 100,
            nonce_cache_size: 1000,
            validate_uri: true,
            algorithms: vec![DigestAlgorithm::Sha256, DigestAlgorithm::Md5],
        }
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}
