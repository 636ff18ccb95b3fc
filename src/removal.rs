use crate::ResponseCookie;
use std::borrow::Cow;

#[derive(Debug, Clone)]
/// A [`ResponseCookie`] that, when sent to the client,
/// removes the cookie with the same name, path and domain from the client's machine, if it exists.
///
/// It is sent as an empty value with `Max-Age=0`, which processors pair with an
/// `Expires` date in the distant past for clients that ignore `Max-Age`.
///
/// ```rust
/// use amaretti::{Processor, ProcessorConfig, RemovalCookie, ResponseCookie};
///
/// let processor: Processor = ProcessorConfig::default().into();
/// let removal: ResponseCookie = RemovalCookie::new("session").set_path("/").into();
/// assert_eq!(
///     processor.generate_header(&removal).unwrap(),
///     "session=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:10 GMT; Path=/"
/// );
/// ```
pub struct RemovalCookie<'c> {
    pub(crate) name: Cow<'c, str>,
    pub(crate) domain: Option<Cow<'c, str>>,
    pub(crate) path: Option<Cow<'c, str>>,
}

impl<'c> RemovalCookie<'c> {
    /// Creates a new [`RemovalCookie`] for the cookie named `name`.
    pub fn new<N>(name: N) -> Self
    where
        N: Into<Cow<'c, str>>,
    {
        Self {
            name: name.into(),
            domain: None,
            path: None,
        }
    }

    /// Returns the name of the cookie to remove.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Returns the `Path` of the cookie to remove, if one was specified.
    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the `Domain` of the cookie to remove, if one was specified,
    /// without a leading `.`.
    #[inline]
    pub fn domain(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(|domain| domain.strip_prefix('.').unwrap_or(domain))
    }

    /// Sets the path of the cookie to remove. It must match the path the
    /// cookie was set with.
    pub fn set_path<P: Into<Cow<'c, str>>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the domain of the cookie to remove. It must match the domain the
    /// cookie was set with.
    pub fn set_domain<D: Into<Cow<'c, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Converts `self` into a `RemovalCookie` with a `'static` lifetime.
    pub fn into_owned(self) -> RemovalCookie<'static> {
        let to_owned = |s: Cow<'c, str>| -> Cow<'static, str> { Cow::Owned(s.into_owned()) };
        RemovalCookie {
            name: to_owned(self.name),
            domain: self.domain.map(to_owned),
            path: self.path.map(to_owned),
        }
    }
}

impl<'c> From<RemovalCookie<'c>> for ResponseCookie<'c> {
    fn from(value: RemovalCookie<'c>) -> Self {
        let mut c = ResponseCookie::new(value.name, "");
        if let Some(domain) = value.domain {
            c = c.set_domain(domain);
        }
        if let Some(path) = value.path {
            c = c.set_path(path);
        }
        c.set_max_age(time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::RemovalCookie;
    use crate::ResponseCookie;

    #[test]
    fn keeps_identity() {
        let removal = RemovalCookie::new("id")
            .set_domain(".example.com")
            .set_path("/a")
            .into_owned();
        assert_eq!(removal.name(), "id");
        assert_eq!(removal.domain(), Some("example.com"));
        let cookie: ResponseCookie = removal.into();
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/a"));
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
