use crate::ServerCookie;

/// A reusable collection of the [`ServerCookie`]s attached to a request.
///
/// The collection keeps a logical cookie count separate from the number of
/// records it has allocated. [`ServerCookies::recycle()`] resets the count to
/// zero and clears the records in place; the next request reuses them.
///
/// A collection belongs to one request at a time: every mutating method takes
/// `&mut self` and no locking is performed.
///
/// # Limits
///
/// An optional limit caps the number of cookies a single request may carry.
/// Going over it is a hard error, not a silent truncation.
///
/// ```rust
/// use amaretti::ServerCookies;
///
/// let mut cookies = ServerCookies::new(4);
/// cookies.set_limit(Some(1));
/// assert!(cookies.add_cookie().is_ok());
/// assert!(cookies.add_cookie().is_err());
///
/// cookies.recycle();
/// assert_eq!(cookies.cookie_count(), 0);
/// assert!(cookies.add_cookie().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServerCookies {
    /// Invariant: `count <= cookies.len()`. Records past `count` are free.
    cookies: Vec<ServerCookie>,
    count: usize,
    limit: Option<usize>,
}

impl ServerCookies {
    /// Creates an empty collection with room for `initial_size` cookies.
    pub fn new(initial_size: usize) -> ServerCookies {
        ServerCookies {
            cookies: Vec::with_capacity(initial_size),
            count: 0,
            limit: None,
        }
    }

    /// Returns a cleared record for a new cookie.
    ///
    /// The record is either recycled from a previous request or freshly
    /// allocated. When the backing storage is full it doubles in size, without
    /// going past the limit.
    ///
    /// # Errors
    ///
    /// Fails if the collection already holds as many cookies as its limit.
    pub fn add_cookie(&mut self) -> Result<&mut ServerCookie, CookieLimitError> {
        if let Some(limit) = self.limit {
            if self.count >= limit {
                return Err(CookieLimitError { limit });
            }
        }

        if self.count == self.cookies.len() {
            if self.cookies.len() == self.cookies.capacity() {
                let doubled = (self.count * 2).max(1);
                let target = match self.limit {
                    Some(limit) => doubled.min(limit),
                    None => doubled,
                };
                self.cookies.reserve_exact(target - self.cookies.len());
            }
            self.cookies.push(ServerCookie::default());
        }

        let cookie = &mut self.cookies[self.count];
        cookie.recycle();
        self.count += 1;
        Ok(cookie)
    }

    /// Returns the cookie at `index`, in the order cookies were parsed.
    #[inline]
    pub fn cookie(&self, index: usize) -> Option<&ServerCookie> {
        self.cookies[..self.count].get(index)
    }

    pub(crate) fn cookie_mut(&mut self, index: usize) -> Option<&mut ServerCookie> {
        self.cookies[..self.count].get_mut(index)
    }

    /// The number of cookies currently held.
    #[inline]
    pub fn cookie_count(&self) -> usize {
        self.count
    }

    /// Returns `true` if the collection holds no cookies.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The number of records allocated, live or recycled.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cookies.capacity()
    }

    /// Returns the first cookie named `name`.
    pub fn find(&self, name: &str) -> Option<&ServerCookie> {
        self.iter().find(|c| c.name() == name)
    }

    /// Iterates over the cookies, in the order they were parsed.
    pub fn iter(&self) -> std::slice::Iter<'_, ServerCookie> {
        self.cookies[..self.count].iter()
    }

    /// The maximum number of cookies, if any.
    #[inline]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Sets the maximum number of cookies. `None` removes the limit.
    ///
    /// If the limit is lower than the current capacity, the spare records
    /// are released.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        if let Some(limit) = limit {
            if limit < self.cookies.capacity() {
                self.cookies.truncate(limit.max(self.count));
                self.cookies.shrink_to(limit.max(self.count));
            }
        }
    }

    /// Clears every live cookie and sets the count back to zero.
    ///
    /// No memory is released.
    pub fn recycle(&mut self) {
        for cookie in &mut self.cookies[..self.count] {
            cookie.recycle();
        }
        self.count = 0;
    }
}

impl<'a> IntoIterator for &'a ServerCookies {
    type Item = &'a ServerCookie;
    type IntoIter = std::slice::Iter<'a, ServerCookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The error returned by [`ServerCookies::add_cookie()`] once the collection
/// is at its limit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("The maximum number of cookies ({limit}) allowed in a request has been exceeded")]
pub struct CookieLimitError {
    limit: usize,
}

impl CookieLimitError {
    /// The limit that was exceeded.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::ServerCookies;
    use crate::Charset;
    use googletest::prelude::*;

    fn add(cookies: &mut ServerCookies, name: &str, value: &str) {
        let c = cookies.add_cookie().unwrap();
        c.set_name(name.as_bytes(), Charset::Utf8);
        c.set_value(value.as_bytes(), Charset::Utf8);
    }

    #[test]
    fn grows_by_doubling() {
        let mut cookies = ServerCookies::new(1);
        add(&mut cookies, "a", "1");
        add(&mut cookies, "b", "2");
        assert!(cookies.capacity() >= 2);
        add(&mut cookies, "c", "3");
        assert!(cookies.capacity() >= 4);
        assert_eq!(cookies.cookie_count(), 3);
        let names: Vec<_> = cookies.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn zero_initial_size() {
        let mut cookies = ServerCookies::new(0);
        add(&mut cookies, "a", "1");
        assert_eq!(cookies.cookie(0).unwrap().value(), "1");
    }

    #[test]
    fn growth_is_capped_at_limit() {
        let mut cookies = ServerCookies::new(2);
        cookies.set_limit(Some(3));
        add(&mut cookies, "a", "1");
        add(&mut cookies, "b", "2");
        add(&mut cookies, "c", "3");
        assert_eq!(cookies.capacity(), 3);
        let err = cookies.add_cookie().unwrap_err();
        assert_eq!(err.limit(), 3);
        assert_that!(
            err.to_string(),
            eq("The maximum number of cookies (3) allowed in a request has been exceeded")
        );
        assert_eq!(cookies.cookie_count(), 3);
    }

    #[test]
    fn lowering_the_limit_releases_spare_records() {
        let mut cookies = ServerCookies::new(8);
        cookies.set_limit(Some(2));
        assert_eq!(cookies.capacity(), 2);

        let mut cookies = ServerCookies::new(8);
        add(&mut cookies, "a", "1");
        add(&mut cookies, "b", "2");
        add(&mut cookies, "c", "3");
        cookies.set_limit(Some(1));
        // Live cookies are never dropped.
        assert_eq!(cookies.capacity(), 3);
        assert_eq!(cookies.cookie_count(), 3);
        assert_eq!(cookies.find("c").unwrap().value(), "3");
    }

    #[test]
    fn recycle_does_not_leak_previous_values() {
        let mut cookies = ServerCookies::new(4);
        add(&mut cookies, "first", "value");
        {
            let c = cookies.add_cookie().unwrap();
            c.set_name(b"second", Charset::Utf8);
            c.set_path(b"/secret", Charset::Utf8);
            c.set_version(1);
        }
        let capacity = cookies.capacity();

        cookies.recycle();
        assert_eq!(cookies.cookie_count(), 0);
        assert!(cookies.is_empty());
        assert!(cookies.cookie(0).is_none());
        assert_eq!(cookies.capacity(), capacity);

        add(&mut cookies, "x", "y");
        let c = cookies.add_cookie().unwrap();
        assert_eq!(c.name(), "");
        assert_eq!(c.value(), "");
        assert_eq!(c.path(), None);
        assert_eq!(c.version(), 0);
    }

    #[test]
    fn find_returns_first_match() {
        let mut cookies = ServerCookies::new(4);
        add(&mut cookies, "a", "1");
        add(&mut cookies, "a", "2");
        assert_eq!(cookies.find("a").map(|c| c.value()), Some("1"));
        assert!(cookies.find("b").is_none());
    }
}
