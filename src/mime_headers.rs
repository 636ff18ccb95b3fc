//! An ordered, recyclable multi-map of raw request headers.
//!
//! [`MimeHeaders`] is what the cookie processors read `Cookie` headers from.
//! It keeps headers in the order they were received, allows repeated names
//! and matches names case-insensitively.
use std::fmt;

#[derive(Debug, Clone, Default)]
struct MimeHeaderField {
    name: Vec<u8>,
    value: Vec<u8>,
}

impl MimeHeaderField {
    fn recycle(&mut self) {
        self.name.clear();
        self.value.clear();
    }
}

/// The headers of a request, as raw bytes.
///
/// ```rust
/// use amaretti::MimeHeaders;
///
/// let mut headers = MimeHeaders::new();
/// headers.add_value("Cookie", b"a=1").unwrap();
/// headers.add_value("Host", b"example.com").unwrap();
/// headers.add_value("cookie", b"b=2").unwrap();
///
/// let first = headers.find_header("COOKIE", 0).unwrap();
/// assert_eq!(headers.value(first), Some(&b"a=1"[..]));
/// let second = headers.find_header("cookie", first + 1).unwrap();
/// assert_eq!(headers.value(second), Some(&b"b=2"[..]));
/// assert_eq!(headers.find_header("cookie", second + 1), None);
/// ```
#[derive(Clone, Default)]
pub struct MimeHeaders {
    /// Invariant: `count <= headers.len()`. Fields past `count` are free.
    headers: Vec<MimeHeaderField>,
    count: usize,
    limit: Option<usize>,
}

impl MimeHeaders {
    /// Creates an empty header map without a limit.
    pub fn new() -> MimeHeaders {
        Default::default()
    }

    /// Creates an empty header map accepting at most `limit` headers.
    pub fn with_limit(limit: usize) -> MimeHeaders {
        MimeHeaders {
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// Sets the maximum number of headers. `None` removes the limit.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
    }

    /// The number of headers.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if there are no headers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Appends a header, keeping any existing header with the same name.
    ///
    /// # Errors
    ///
    /// Fails if the map already holds as many headers as its limit.
    pub fn add_value(&mut self, name: &str, value: &[u8]) -> Result<(), HeaderLimitError> {
        if let Some(limit) = self.limit {
            if self.count >= limit {
                return Err(HeaderLimitError { limit });
            }
        }
        if self.count == self.headers.len() {
            self.headers.push(MimeHeaderField::default());
        }
        let field = &mut self.headers[self.count];
        field.recycle();
        field.name.extend_from_slice(name.as_bytes());
        field.value.extend_from_slice(value);
        self.count += 1;
        Ok(())
    }

    /// Replaces every header named `name` with a single header.
    pub fn set_value(&mut self, name: &str, value: &[u8]) -> Result<(), HeaderLimitError> {
        self.remove_header(name);
        self.add_value(name, value)
    }

    /// Index of the first header named `name` at or after `from`.
    pub fn find_header(&self, name: &str, from: usize) -> Option<usize> {
        (from..self.count).find(|&i| self.headers[i].name.eq_ignore_ascii_case(name.as_bytes()))
    }

    /// The value of the first header named `name`.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.find_header(name, 0).and_then(|i| self.value(i))
    }

    /// The values of every header named `name`, in order.
    pub fn values<'h, 'n>(&'h self, name: &'n str) -> HeaderValues<'h, 'n> {
        HeaderValues {
            headers: self,
            name,
            next: 0,
        }
    }

    /// The name of the header at `index`.
    pub fn name(&self, index: usize) -> Option<&[u8]> {
        self.headers[..self.count].get(index).map(|h| h.name.as_slice())
    }

    /// The value of the header at `index`.
    pub fn value(&self, index: usize) -> Option<&[u8]> {
        self.headers[..self.count].get(index).map(|h| h.value.as_slice())
    }

    /// Removes every header named `name`, preserving the order of the others.
    pub fn remove_header(&mut self, name: &str) {
        let mut i = 0;
        while i < self.count {
            if self.headers[i].name.eq_ignore_ascii_case(name.as_bytes()) {
                // Move the removed field past the live ones so that its
                // buffers are reused.
                self.headers[i..self.count].rotate_left(1);
                self.count -= 1;
                self.headers[self.count].recycle();
            } else {
                i += 1;
            }
        }
    }

    /// Clears every header, keeping the allocated buffers.
    pub fn recycle(&mut self) {
        for field in &mut self.headers[..self.count] {
            field.recycle();
        }
        self.count = 0;
    }
}

impl fmt::Debug for MimeHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.headers[..self.count].iter().map(|h| {
                (
                    String::from_utf8_lossy(&h.name),
                    String::from_utf8_lossy(&h.value),
                )
            }))
            .finish()
    }
}

/// Iterator over the values of every header with a given name.
///
/// This struct is created by [`MimeHeaders::values()`].
pub struct HeaderValues<'h, 'n> {
    headers: &'h MimeHeaders,
    name: &'n str,
    next: usize,
}

impl<'h, 'n> Iterator for HeaderValues<'h, 'n> {
    type Item = &'h [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.headers.find_header(self.name, self.next)?;
        self.next = index + 1;
        self.headers.value(index)
    }
}

impl std::iter::FusedIterator for HeaderValues<'_, '_> {}

/// The error returned by [`MimeHeaders::add_value()`] once the map is at its
/// limit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("The maximum number of request headers ({limit}) has been exceeded")]
pub struct HeaderLimitError {
    limit: usize,
}

impl HeaderLimitError {
    /// The limit that was exceeded.
    pub fn limit(&self) -> usize {
        self.limit
    }
}
