use crate::Charset;
use std::fmt;

/// A cookie received from the client in a `Cookie` request header.
///
/// `ServerCookie`s live inside a [`ServerCookies`] collection and are reused
/// across requests: [`ServerCookies::recycle()`] clears their fields but keeps
/// the buffers around, so a warmed-up collection parses cookies without
/// allocating.
///
/// ```rust
/// use amaretti::{Processor, ProcessorConfig, ServerCookies};
///
/// let processor: Processor = ProcessorConfig::default().into();
/// let mut cookies = ServerCookies::new(4);
/// processor.parse_header_value(b"theme=dark", &mut cookies).unwrap();
///
/// let cookie = cookies.cookie(0).unwrap();
/// assert_eq!(cookie.name(), "theme");
/// assert_eq!(cookie.value(), "dark");
/// assert_eq!(cookie.version(), 0);
/// assert_eq!(cookie.path(), None);
/// ```
///
/// [`ServerCookies`]: crate::ServerCookies
/// [`ServerCookies::recycle()`]: crate::ServerCookies::recycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerCookie {
    name: String,
    value: String,
    path: String,
    domain: String,
    comment: String,
    version: u8,
}

impl ServerCookie {
    /// Returns the name of this cookie.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of this cookie, with any surrounding quotes removed.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the path set with a `$Path` pseudo-attribute, if any.
    #[inline]
    pub fn path(&self) -> Option<&str> {
        non_empty(&self.path)
    }

    /// Returns the domain set with a `$Domain` pseudo-attribute, if any.
    #[inline]
    pub fn domain(&self) -> Option<&str> {
        non_empty(&self.domain)
    }

    /// Returns the comment attached to this cookie, if any.
    #[inline]
    pub fn comment(&self) -> Option<&str> {
        non_empty(&self.comment)
    }

    /// `0` for Netscape-style cookies, `1` after a leading `$Version=1`.
    #[inline]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Sets the comment of this cookie.
    pub fn set_comment(&mut self, comment: &str) {
        self.comment.clear();
        self.comment.push_str(comment);
    }

    /// Clears every field, keeping the allocated buffers.
    pub fn recycle(&mut self) {
        self.name.clear();
        self.value.clear();
        self.path.clear();
        self.domain.clear();
        self.comment.clear();
        self.version = 0;
    }

    pub(crate) fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    pub(crate) fn set_name(&mut self, bytes: &[u8], charset: Charset) {
        self.name.clear();
        charset.decode_into(bytes, &mut self.name);
    }

    pub(crate) fn set_value(&mut self, bytes: &[u8], charset: Charset) {
        self.value.clear();
        charset.decode_into(bytes, &mut self.value);
    }

    pub(crate) fn set_path(&mut self, bytes: &[u8], charset: Charset) {
        self.path.clear();
        charset.decode_into(bytes, &mut self.path);
    }

    pub(crate) fn set_domain(&mut self, bytes: &[u8], charset: Charset) {
        self.domain.clear();
        charset.decode_into(bytes, &mut self.domain);
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

impl fmt::Display for ServerCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::ServerCookie;
    use crate::Charset;

    #[test]
    fn recycle_clears_but_keeps_capacity() {
        let mut c = ServerCookie::default();
        c.set_name(b"session", Charset::Utf8);
        c.set_value(b"a-fairly-long-session-identifier", Charset::Utf8);
        c.set_path(b"/app", Charset::Utf8);
        c.set_domain(b"example.com", Charset::Utf8);
        c.set_comment("hello");
        c.set_version(1);
        let capacity = c.value.capacity();

        c.recycle();
        assert_eq!(c, ServerCookie::default());
        assert_eq!(c.value.capacity(), capacity);
        assert_eq!(c.path(), None);
        assert_eq!(c.domain(), None);
        assert_eq!(c.comment(), None);
    }

    #[test]
    fn display() {
        let mut c = ServerCookie::default();
        c.set_name(b"a", Charset::Iso8859_1);
        c.set_value(b"b", Charset::Iso8859_1);
        assert_eq!(c.to_string(), "a=b");
    }
}
