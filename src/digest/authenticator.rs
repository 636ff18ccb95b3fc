use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, PoisonError};

use rand::RngCore;
use subtle::ConstantTimeEq;

use super::authorization::{parse_authorization, DigestAuthorization};
use super::nonce::{NonceCache, NonceInfo};
use super::{now_millis, DigestAlgorithm, DigestConfig};

/// The only `qop` this crate supports.
const QOP_AUTH: &str = "auth";

/// What a [`DigestAuthenticator`] needs to know about the request being
/// authenticated.
#[derive(Debug, Clone, Copy)]
pub struct DigestRequest<'r> {
    /// The request method, e.g. `GET`.
    pub method: &'r str,
    /// The request target as it appears on the request line, query included.
    pub uri: &'r str,
    /// `http` or `https`.
    pub scheme: &'r str,
    /// The `Host` header, if any.
    pub host: Option<&'r str>,
    /// The address of the client. Nonces are bound to it.
    pub remote_addr: &'r str,
}

/// The outcome of [`DigestAuthenticator::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// The nonce and nonce count are acceptable. The response still has to
    /// be checked against the user's credentials.
    Valid,
    /// The nonce was issued by this server but expired, or was evicted from
    /// the cache. The client should retry with a fresh one.
    Stale,
    /// The request must be rejected.
    Invalid,
}

/// The outcome of [`DigestAuthenticator::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    Authenticated { username: String },
    /// Respond with `401 Unauthorized` and the headers returned by
    /// [`DigestAuthenticator::challenges`], passing `stale` along.
    Challenge { stale: bool },
}

/// Where a [`DigestAuthenticator`] looks up users.
pub trait DigestCredentials {
    /// `H(username:realm:password)`, as lowercase hex, for `username`.
    ///
    /// Returns `None` if the user is unknown.
    fn ha1(&self, username: &str, realm: &str, algorithm: DigestAlgorithm) -> Option<String>;
}

/// Plain-text passwords, keyed by username.
#[derive(Clone, Default)]
pub struct MapCredentials {
    passwords: HashMap<String, String>,
}

impl MapCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user, replacing their password if they already exist.
    pub fn insert(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.passwords.insert(username.into(), password.into());
    }
}

impl Debug for MapCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapCredentials")
            .field("users", &self.passwords.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DigestCredentials for MapCredentials {
    fn ha1(&self, username: &str, realm: &str, algorithm: DigestAlgorithm) -> Option<String> {
        let password = self.passwords.get(username)?;
        Some(algorithm.hash_hex(format!("{username}:{realm}:{password}").as_bytes()))
    }
}

/// Issues DIGEST challenges and verifies the credentials sent back.
///
/// A nonce has the shape `{timestamp}:{hex(md5(remote_addr:timestamp:key))}`.
/// Timestamps are strictly increasing, so every nonce is unique even when
/// issued within the same millisecond.
///
/// Build one with [`DigestAuthenticator::from`] and share it across requests.
pub struct DigestAuthenticator {
    realm: String,
    key: String,
    opaque: String,
    validity_millis: i64,
    window_size: usize,
    validate_uri: bool,
    algorithms: Vec<DigestAlgorithm>,
    last_timestamp: Mutex<i64>,
    nonces: NonceCache,
}

impl Debug for DigestAuthenticator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestAuthenticator")
            .field("realm", &self.realm)
            .field("opaque", &self.opaque)
            .field("validity_millis", &self.validity_millis)
            .field("window_size", &self.window_size)
            .field("validate_uri", &self.validate_uri)
            .field("algorithms", &self.algorithms)
            .field("nonces", &self.nonces)
            .finish_non_exhaustive()
    }
}

impl From<DigestConfig> for DigestAuthenticator {
    fn from(config: DigestConfig) -> Self {
        let validity_millis =
            i64::try_from(config.nonce_validity_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        DigestAuthenticator {
            realm: config.realm,
            key: config.private_key.unwrap_or_else(random_hex),
            opaque: config.opaque.unwrap_or_else(random_hex),
            validity_millis,
            window_size: config.nonce_count_window_size,
            validate_uri: config.validate_uri,
            algorithms: config.algorithms,
            last_timestamp: Mutex::new(0),
            nonces: NonceCache::new(config.nonce_cache_size, validity_millis),
        }
    }
}

impl DigestAuthenticator {
    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn opaque(&self) -> &str {
        &self.opaque
    }

    /// The nonces issued so far that haven't been evicted or expired.
    pub fn nonces(&self) -> &NonceCache {
        &self.nonces
    }

    /// Issues a nonce for a client at `remote_addr` and caches it.
    pub fn generate_nonce(&self, remote_addr: &str) -> String {
        self.generate_nonce_at(remote_addr, now_millis())
    }

    pub(crate) fn generate_nonce_at(&self, remote_addr: &str, now: i64) -> String {
        let timestamp = {
            let mut last = self
                .last_timestamp
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *last = if now > *last { now } else { *last + 1 };
            *last
        };
        let nonce = format!("{timestamp}:{}", self.nonce_digest(remote_addr, timestamp));
        self.nonces.insert_at(
            nonce.clone(),
            NonceInfo::new(timestamp, self.window_size),
            now,
        );
        nonce
    }

    fn nonce_digest(&self, remote_addr: &str, timestamp: i64) -> String {
        DigestAlgorithm::Md5.hash_hex(format!("{remote_addr}:{timestamp}:{}", self.key).as_bytes())
    }

    /// The values of the `WWW-Authenticate` headers to send along with a
    /// `401 Unauthorized`, one per configured algorithm.
    ///
    /// A fresh nonce is issued and shared by all of them.
    pub fn challenges(&self, remote_addr: &str, stale: bool) -> Vec<String> {
        self.challenges_at(remote_addr, stale, now_millis())
    }

    pub(crate) fn challenges_at(&self, remote_addr: &str, stale: bool, now: i64) -> Vec<String> {
        let nonce = self.generate_nonce_at(remote_addr, now);
        let realm = quote(&self.realm);
        self.algorithms
            .iter()
            .map(|algorithm| {
                let mut challenge = format!(
                    "Digest realm={realm}, qop=\"{QOP_AUTH}\", nonce=\"{nonce}\", opaque=\"{}\"",
                    self.opaque
                );
                if stale {
                    challenge.push_str(", stale=true");
                }
                challenge.push_str(", algorithm=");
                challenge.push_str(algorithm.as_str());
                challenge
            })
            .collect()
    }

    /// Checks everything in `auth` except the response itself: the request
    /// target, realm, opaque value, nonce and nonce count.
    ///
    /// A valid nonce count is recorded, so validating the same request twice
    /// makes the second attempt [`Validation::Invalid`].
    pub fn validate(&self, auth: &DigestAuthorization, request: &DigestRequest<'_>) -> Validation {
        self.validate_at(auth, request, now_millis())
    }

    pub(crate) fn validate_at(
        &self,
        auth: &DigestAuthorization,
        request: &DigestRequest<'_>,
        now: i64,
    ) -> Validation {
        if self.validate_uri && !uri_matches(&auth.uri, request) {
            return Validation::Invalid;
        }
        if auth.realm != self.realm {
            return Validation::Invalid;
        }
        if auth.opaque.as_deref() != Some(self.opaque.as_str()) {
            return Validation::Invalid;
        }
        if self.algorithm(auth).is_none() {
            return Validation::Invalid;
        }

        let Some((timestamp, digest)) = auth.nonce.split_once(':') else {
            return Validation::Invalid;
        };
        let Ok(timestamp) = timestamp.parse::<i64>() else {
            return Validation::Invalid;
        };
        let mut stale = false;
        if now.saturating_sub(timestamp) > self.validity_millis {
            stale = true;
            self.nonces.remove(&auth.nonce);
        }
        let expected = self.nonce_digest(request.remote_addr, timestamp);
        if !bool::from(expected.as_bytes().ct_eq(digest.as_bytes())) {
            return Validation::Invalid;
        }

        match auth.qop.as_deref() {
            None => {
                if auth.cnonce.is_some() || auth.nc.is_some() {
                    return Validation::Invalid;
                }
            }
            Some(QOP_AUTH) => {
                let (Some(_), Some(nc)) = (&auth.cnonce, &auth.nc) else {
                    return Validation::Invalid;
                };
                // 8 digits, but some older clients send 6.
                if !(6..=8).contains(&nc.len()) || !nc.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Validation::Invalid;
                }
                let Ok(count) = i64::from_str_radix(nc, 16) else {
                    return Validation::Invalid;
                };
                match self.nonces.nonce_count_valid(&auth.nonce, count) {
                    None => stale = true,
                    Some(false) => return Validation::Invalid,
                    Some(true) => {}
                }
            }
            Some(_) => return Validation::Invalid,
        }

        if stale {
            Validation::Stale
        } else {
            Validation::Valid
        }
    }

    /// Authenticates a request given the value of its `Authorization` header.
    pub fn authenticate<C>(
        &self,
        authorization: Option<&str>,
        request: &DigestRequest<'_>,
        credentials: &C,
    ) -> Authentication
    where
        C: DigestCredentials + ?Sized,
    {
        self.authenticate_at(authorization, request, credentials, now_millis())
    }

    pub(crate) fn authenticate_at<C>(
        &self,
        authorization: Option<&str>,
        request: &DigestRequest<'_>,
        credentials: &C,
        now: i64,
    ) -> Authentication
    where
        C: DigestCredentials + ?Sized,
    {
        let Some(authorization) = authorization else {
            return Authentication::Challenge { stale: false };
        };
        let auth = match parse_authorization(authorization) {
            Ok(auth) => auth,
            Err(e) => {
                log::debug!("Ignoring the authorization header of a request: {e}");
                return Authentication::Challenge { stale: false };
            }
        };
        match self.validate_at(&auth, request, now) {
            Validation::Invalid => Authentication::Challenge { stale: false },
            Validation::Stale => Authentication::Challenge { stale: true },
            Validation::Valid => {
                if self.response_matches(&auth, request, credentials) {
                    Authentication::Authenticated {
                        username: auth.username,
                    }
                } else {
                    log::debug!("Wrong DIGEST response for user `{}`", auth.username);
                    Authentication::Challenge { stale: false }
                }
            }
        }
    }

    fn algorithm(&self, auth: &DigestAuthorization) -> Option<DigestAlgorithm> {
        let algorithm = match auth.algorithm.as_deref() {
            None => DigestAlgorithm::Md5,
            Some(name) => DigestAlgorithm::from_name(name)?,
        };
        self.algorithms.contains(&algorithm).then_some(algorithm)
    }

    fn response_matches<C>(
        &self,
        auth: &DigestAuthorization,
        request: &DigestRequest<'_>,
        credentials: &C,
    ) -> bool
    where
        C: DigestCredentials + ?Sized,
    {
        let Some(algorithm) = self.algorithm(auth) else {
            return false;
        };
        let Some(ha1) = credentials.ha1(&auth.username, &self.realm, algorithm) else {
            return false;
        };
        let expected = expected_response(algorithm, &ha1, auth, request.method);
        let received = auth.response.to_ascii_lowercase();
        expected.as_bytes().ct_eq(received.as_bytes()).into()
    }
}

/// `H(HA1:nonce[:nc:cnonce:qop]:HA2)` with `HA2 = H(method:uri)`.
fn expected_response(
    algorithm: DigestAlgorithm,
    ha1: &str,
    auth: &DigestAuthorization,
    method: &str,
) -> String {
    let ha2 = algorithm.hash_hex(format!("{method}:{}", auth.uri).as_bytes());
    let data = match (&auth.qop, &auth.nc, &auth.cnonce) {
        (Some(qop), Some(nc), Some(cnonce)) => {
            format!("{ha1}:{}:{nc}:{cnonce}:{qop}:{ha2}", auth.nonce)
        }
        _ => format!("{ha1}:{}:{ha2}", auth.nonce),
    };
    algorithm.hash_hex(data.as_bytes())
}

/// Some clients send an absolute URI in the `uri` directive while using a
/// relative one on the request line.
fn uri_matches(uri: &str, request: &DigestRequest<'_>) -> bool {
    if uri == request.uri {
        return true;
    }
    match request.host {
        Some(host) if !request.uri.starts_with(request.scheme) => uri
            .strip_prefix(request.scheme)
            .and_then(|rest| rest.strip_prefix("://"))
            .and_then(|rest| rest.strip_prefix(host))
            .is_some_and(|rest| rest == request.uri),
        _ => false,
    }
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn random_hex() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
