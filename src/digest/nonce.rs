use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Evicting live nonces is only reported once per five minutes.
const EVICTION_WARNING_SUPPRESSION_MILLIS: i64 = 5 * 60 * 1000;

/// Replay protection state of a single nonce.
///
/// The nonce counts a client may use form a sliding window of
/// `window_size` values, centred on the number of requests seen so far.
/// Each count is accepted once; counts that fall behind the window are
/// rejected, and so are counts too far ahead of it.
///
/// ```rust
/// use amaretti::digest::NonceInfo;
///
/// let mut info = NonceInfo::new(0, 4);
/// assert!(info.nonce_count_valid(1));
/// assert!(!info.nonce_count_valid(1));
/// assert!(info.nonce_count_valid(2));
/// assert!(!info.nonce_count_valid(10));
/// ```
#[derive(Debug, Clone)]
pub struct NonceInfo {
    timestamp: i64,
    seen: Vec<bool>,
    offset: i64,
    count: i64,
}

impl NonceInfo {
    /// State for a nonce issued at `timestamp` (milliseconds since the epoch).
    ///
    /// A `window_size` of zero is treated as one.
    pub fn new(timestamp: i64, window_size: usize) -> Self {
        let window_size = window_size.max(1);
        NonceInfo {
            timestamp,
            seen: vec![false; window_size],
            offset: (window_size / 2) as i64,
            count: 0,
        }
    }

    /// When the nonce was issued, in milliseconds since the epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Records `nonce_count`, returning `false` if it was already used or is
    /// outside of the window.
    pub fn nonce_count_valid(&mut self, nonce_count: i64) -> bool {
        let window = self.seen.len() as i64;
        let lowest = self.count - self.offset;
        if nonce_count <= lowest || nonce_count > lowest + window {
            return false;
        }
        let check = (nonce_count + self.offset).rem_euclid(window) as usize;
        if self.seen[check] {
            return false;
        }
        self.seen[check] = true;
        self.count += 1;
        // The count that just left the window shares its slot with the one
        // that just entered it.
        let entered = self.count.rem_euclid(window) as usize;
        self.seen[entered] = false;
        true
    }
}

/// The nonces handed out by a [`DigestAuthenticator`], oldest first.
///
/// Once the cache holds `capacity` nonces, inserting evicts the oldest one.
/// Evicting a nonce that is still within its validity period means that a
/// replay of it would go unnoticed, so it's logged as a warning.
///
/// [`DigestAuthenticator`]: crate::digest::DigestAuthenticator
#[derive(Debug)]
pub struct NonceCache {
    capacity: usize,
    validity_millis: i64,
    state: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    nonces: HashMap<String, NonceInfo>,
    /// Insertion order of the keys of `nonces`.
    order: VecDeque<String>,
    /// No eviction warning is logged before this time.
    quiet_until: i64,
}

impl NonceCache {
    /// Creates an empty cache holding at most `capacity` nonces, each valid for
    /// `validity_millis` after it was issued.
    pub fn new(capacity: usize, validity_millis: i64) -> Self {
        NonceCache {
            capacity,
            validity_millis,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The number of cached nonces.
    pub fn len(&self) -> usize {
        self.lock().nonces.len()
    }

    /// Returns `true` if no nonce is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `nonce` is cached.
    pub fn contains(&self, nonce: &str) -> bool {
        self.lock().nonces.contains_key(nonce)
    }

    /// Caches `nonce`, evicting the oldest nonces if the cache is full.
    pub fn insert(&self, nonce: String, info: NonceInfo) {
        self.insert_at(nonce, info, super::now_millis());
    }

    pub(crate) fn insert_at(&self, nonce: String, info: NonceInfo, now: i64) {
        let mut state = self.lock();
        if state.nonces.insert(nonce.clone(), info).is_none() {
            state.order.push_back(nonce);
        }
        while state.nonces.len() > self.capacity {
            let Some(eldest) = state.order.pop_front() else {
                break;
            };
            let Some(evicted) = state.nonces.remove(&eldest) else {
                continue;
            };
            if state.quiet_until < now && now - evicted.timestamp() < self.validity_millis {
                log::warn!(
                    "A valid nonce was removed from the cache to make room for a new one. \
                     This exposes it to replay attacks: increase the nonce cache size or \
                     reduce the nonce validity. This warning is suppressed for 5 minutes."
                );
                state.quiet_until = now + EVICTION_WARNING_SUPPRESSION_MILLIS;
            }
        }
    }

    /// Forgets `nonce`. Returns `true` if it was cached.
    pub fn remove(&self, nonce: &str) -> bool {
        let mut state = self.lock();
        let removed = state.nonces.remove(nonce).is_some();
        if removed {
            state.order.retain(|k| k != nonce);
        }
        removed
    }

    /// Records `nonce_count` against `nonce`.
    ///
    /// Returns `None` if `nonce` is not cached, otherwise the outcome of
    /// [`NonceInfo::nonce_count_valid`].
    pub fn nonce_count_valid(&self, nonce: &str, nonce_count: i64) -> Option<bool> {
        self.lock()
            .nonces
            .get_mut(nonce)
            .map(|info| info.nonce_count_valid(nonce_count))
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
