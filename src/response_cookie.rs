use crate::{RemovalCookie, SameSite};
use std::borrow::Cow;
use time::Duration;

/// A cookie set by a server in an HTTP response using the `Set-Cookie` header.
///
/// A `ResponseCookie` only describes the cookie: turning it into a header value
/// is the job of a [`Processor`], which validates every component against the
/// rules of its cookie dialect.
///
/// ## Constructing a `ResponseCookie`
///
/// To construct a cookie with only a name/value, use [`ResponseCookie::new()`]:
///
/// ```rust
/// use amaretti::{Processor, ProcessorConfig, ResponseCookie};
///
/// let processor: Processor = ProcessorConfig::default().into();
/// let cookie = ResponseCookie::new("name", "value");
/// assert_eq!(processor.generate_header(&cookie).unwrap(), "name=value");
/// ```
///
/// ## Building a `ResponseCookie`
///
/// To construct more elaborate cookies, use `ResponseCookie`'s `set_*` methods.
///
/// ```rust
/// use amaretti::ResponseCookie;
///
/// let cookie = ResponseCookie::new("name", "value")
///     .set_domain("www.rust-lang.org")
///     .set_path("/")
///     .set_secure(true)
///     .set_http_only(true);
/// ```
///
/// [`Processor`]: crate::Processor
#[derive(Debug, Clone)]
pub struct ResponseCookie<'c> {
    /// The cookie's name.
    pub(crate) name: Cow<'c, str>,
    /// The cookie's value.
    pub(crate) value: Cow<'c, str>,
    /// The cookie's maximum age, if any.
    pub(crate) max_age: Option<Duration>,
    /// The cookie's domain, if any.
    pub(crate) domain: Option<Cow<'c, str>>,
    /// The cookie's path domain, if any.
    pub(crate) path: Option<Cow<'c, str>>,
    /// The cookie's comment, if any. Only the legacy dialect sends it.
    pub(crate) comment: Option<Cow<'c, str>>,
    /// `0` for Netscape cookies, `1` for RFC 2109 cookies.
    pub(crate) version: u8,
    /// Whether this cookie was marked Secure.
    pub(crate) secure: Option<bool>,
    /// Whether this cookie was marked HttpOnly.
    pub(crate) http_only: Option<bool>,
    /// The draft `SameSite` attribute.
    pub(crate) same_site: Option<SameSite>,
    /// The draft `Partitioned` attribute.
    pub(crate) partitioned: Option<bool>,
    /// Any other attribute, in insertion order.
    pub(crate) attributes: Vec<(Cow<'c, str>, Cow<'c, str>)>,
}

impl<'c> ResponseCookie<'c> {
    /// Creates a new [`ResponseCookie`] with the given name and value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::ResponseCookie;
    ///
    /// let cookie = ResponseCookie::new("name", "value");
    /// assert_eq!(cookie.name_value(), ("name", "value"));
    ///
    /// // This is equivalent to `from` with a `(name, value)` tuple:
    /// let cookie = ResponseCookie::from(("name", "value"));
    /// assert_eq!(cookie.name_value(), ("name", "value"));
    /// ```
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<Cow<'c, str>>,
        V: Into<Cow<'c, str>>,
    {
        ResponseCookie {
            name: name.into(),
            value: value.into(),
            max_age: None,
            domain: None,
            path: None,
            comment: None,
            version: 0,
            secure: None,
            http_only: None,
            same_site: None,
            partitioned: None,
            attributes: Vec::new(),
        }
    }

    /// Converts `self` into a [`ResponseCookie`] with a static lifetime with as few
    /// allocations as possible.
    pub fn into_owned(self) -> ResponseCookie<'static> {
        let to_owned = |s: Cow<'c, str>| -> Cow<'static, str> { Cow::Owned(s.into_owned()) };
        ResponseCookie {
            name: to_owned(self.name),
            value: to_owned(self.value),
            max_age: self.max_age,
            domain: self.domain.map(to_owned),
            path: self.path.map(to_owned),
            comment: self.comment.map(to_owned),
            version: self.version,
            secure: self.secure,
            http_only: self.http_only,
            same_site: self.same_site,
            partitioned: self.partitioned,
            attributes: self
                .attributes
                .into_iter()
                .map(|(k, v)| (to_owned(k), to_owned(v)))
                .collect(),
        }
    }

    /// Returns the name of `self`.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Returns the value of `self`.
    ///
    /// Surrounding quotes are part of the value.
    #[inline]
    pub fn value(&self) -> &str {
        self.value.as_ref()
    }

    /// Returns the name and value of `self` as a tuple of `(name, value)`.
    #[inline]
    pub fn name_value(&self) -> (&str, &str) {
        (self.name(), self.value())
    }

    /// Returns whether this cookie was marked `HttpOnly` or not. Returns
    /// `Some(true)` when the cookie was explicitly set as `HttpOnly`,
    /// `Some(false)` when `http_only` was manually set to `false`,
    /// and `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// use amaretti::ResponseCookie;
    ///
    /// let mut c = ResponseCookie::new("name", "value");
    /// assert_eq!(c.http_only(), None);
    ///
    /// c = c.set_http_only(false);
    /// assert_eq!(c.http_only(), Some(false));
    ///
    /// c = c.set_http_only(true);
    /// assert_eq!(c.http_only(), Some(true));
    /// ```
    #[inline]
    pub fn http_only(&self) -> Option<bool> {
        self.http_only
    }

    /// Returns whether this cookie was marked `Secure` or not.
    #[inline]
    pub fn secure(&self) -> Option<bool> {
        self.secure
    }

    /// Returns the `SameSite` attribute of this cookie if one was specified.
    ///
    /// When `None`, the processor's default applies.
    #[inline]
    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site
    }

    /// Returns whether this cookie was marked `Partitioned` or not.
    ///
    /// `None` means that the processor's default applies.
    ///
    /// **Note:** This cookie attribute is an [HTTP draft]! Its meaning and
    /// definition are not standardized and therefore subject to change.
    ///
    /// [HTTP draft]: https://datatracker.ietf.org/doc/draft-cutler-httpbis-partitioned-cookies/
    #[inline]
    pub fn partitioned(&self) -> Option<bool> {
        self.partitioned
    }

    /// Returns the specified max-age of the cookie if one was specified.
    ///
    /// # Example
    ///
    /// ```
    /// use amaretti::{ResponseCookie, time::Duration};
    ///
    /// let mut c = ResponseCookie::new("name", "value");
    /// assert_eq!(c.max_age(), None);
    ///
    /// c = c.set_max_age(Duration::hours(1));
    /// assert_eq!(c.max_age().map(|age| age.whole_hours()), Some(1));
    /// ```
    #[inline]
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Returns the `Path` of the cookie if one was specified.
    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the `Domain` of the cookie if one was specified.
    ///
    /// If the `Domain` starts with a leading `.`, the leading `.` is stripped.
    ///
    /// # Example
    ///
    /// ```
    /// use amaretti::ResponseCookie;
    ///
    /// let mut c = ResponseCookie::new("name", "value");
    /// assert_eq!(c.domain(), None);
    ///
    /// c = c.set_domain("crates.io");
    /// assert_eq!(c.domain(), Some("crates.io"));
    ///
    /// c = c.set_domain(".crates.io");
    /// assert_eq!(c.domain(), Some("crates.io"));
    ///
    /// c = c.unset_domain();
    /// assert_eq!(c.domain(), None);
    /// ```
    #[inline]
    pub fn domain(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(|domain| domain.strip_prefix('.').unwrap_or(domain))
    }

    /// Returns the comment of the cookie if one was specified.
    #[inline]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the version of the cookie: `0` (the default) or `1`.
    #[inline]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the value of the attribute named `name`, ignoring ASCII case.
    ///
    /// Only attributes set with [`ResponseCookie::set_attribute()`] are
    /// considered.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_ref())
    }

    /// Iterates over the attributes set with [`ResponseCookie::set_attribute()`].
    pub fn attributes(&self) -> Attributes<'_, 'c> {
        Attributes {
            iter: self.attributes.iter(),
        }
    }

    /// Sets the name of `self` to `name`.
    pub fn set_name<N: Into<Cow<'c, str>>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the value of `self` to `value`.
    pub fn set_value<V: Into<Cow<'c, str>>>(mut self, value: V) -> Self {
        self.value = value.into();
        self
    }

    /// Sets the value of `http_only` in `self` to `value`.  If `value` is
    /// `None`, the field is unset.
    #[inline]
    pub fn set_http_only<T: Into<Option<bool>>>(mut self, value: T) -> Self {
        self.http_only = value.into();
        self
    }

    /// Sets the value of `secure` in `self` to `value`. If `value` is `None`,
    /// the field is unset.
    #[inline]
    pub fn set_secure<T: Into<Option<bool>>>(mut self, value: T) -> Self {
        self.secure = value.into();
        self
    }

    /// Sets the value of `same_site` in `self` to `value`. If `value` is
    /// `None`, the processor's default is used.
    ///
    /// # Example
    ///
    /// ```
    /// use amaretti::{Processor, ProcessorConfig, ResponseCookie, SameSite};
    ///
    /// let mut config = ProcessorConfig::default();
    /// config.same_site = Some(SameSite::Lax);
    /// let processor: Processor = config.into();
    ///
    /// let c = ResponseCookie::new("name", "value");
    /// assert_eq!(processor.generate_header(&c).unwrap(), "name=value; SameSite=Lax");
    ///
    /// let c = c.set_same_site(SameSite::Strict);
    /// assert_eq!(processor.generate_header(&c).unwrap(), "name=value; SameSite=Strict");
    /// ```
    #[inline]
    pub fn set_same_site<T: Into<Option<SameSite>>>(mut self, value: T) -> Self {
        self.same_site = value.into();
        self
    }

    /// Sets the value of `partitioned` in `self` to `value`. If `value` is
    /// `None`, the processor's default is used.
    #[inline]
    pub fn set_partitioned<T: Into<Option<bool>>>(mut self, value: T) -> Self {
        self.partitioned = value.into();
        self
    }

    /// Sets the value of `max_age` in `self` to `value`. If `value` is `None`,
    /// the field is unset and the cookie lasts for the browser session.
    ///
    /// A negative `value` is treated like `None`. A zero `value` asks the
    /// client to delete the cookie right away.
    #[inline]
    pub fn set_max_age<D: Into<Option<Duration>>>(mut self, value: D) -> Self {
        self.max_age = value.into();
        self
    }

    /// Sets the `path` of `self` to `path`.
    pub fn set_path<P: Into<Cow<'c, str>>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Unsets the `path` of `self`.
    pub fn unset_path(mut self) -> Self {
        self.path = None;
        self
    }

    /// Sets the `domain` of `self` to `domain`.
    pub fn set_domain<D: Into<Cow<'c, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Unsets the `domain` of `self`.
    pub fn unset_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    /// Sets the `comment` of `self`. A comment forces the legacy dialect to
    /// send a version 1 cookie; the RFC 6265 dialect ignores it.
    pub fn set_comment<C: Into<Cow<'c, str>>>(mut self, comment: C) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the version of `self`. Anything above `1` is treated as `1`.
    pub fn set_version(mut self, version: u8) -> Self {
        self.version = version.min(1);
        self
    }

    /// Sets a generic attribute, replacing any attribute with the same name
    /// (ignoring ASCII case). An empty `value` renders as a bare attribute name.
    ///
    /// # Example
    ///
    /// ```
    /// use amaretti::{Processor, ProcessorConfig, ResponseCookie};
    ///
    /// let processor: Processor = ProcessorConfig::default().into();
    /// let c = ResponseCookie::new("name", "value")
    ///     .set_attribute("Priority", "High")
    ///     .set_attribute("Flagged", "");
    /// assert_eq!(
    ///     processor.generate_header(&c).unwrap(),
    ///     "name=value; Priority=High; Flagged"
    /// );
    /// ```
    pub fn set_attribute<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<Cow<'c, str>>,
        V: Into<Cow<'c, str>>,
    {
        let name = name.into();
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    /// Removes the generic attribute named `name`, ignoring ASCII case.
    pub fn unset_attribute(mut self, name: &str) -> Self {
        self.attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self
    }

    /// Makes `self` a "permanent" cookie by extending its max age 20 years
    /// into the future.
    pub fn make_permanent(self) -> Self {
        self.set_max_age(Duration::days(365 * 20))
    }

    /// Make `self` a "removal" cookie: an empty value with a zero max age.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::ResponseCookie;
    /// use amaretti::time::Duration;
    ///
    /// let c = ResponseCookie::new("foo", "bar").set_path("/app");
    /// let raw: ResponseCookie = c.into_removal().into();
    /// assert_eq!(raw.value(), "");
    /// assert_eq!(raw.path(), Some("/app"));
    /// assert_eq!(raw.max_age(), Some(Duration::ZERO));
    /// ```
    pub fn into_removal(self) -> RemovalCookie<'c> {
        let mut c = RemovalCookie::new(self.name);
        if let Some(path) = self.path {
            c = c.set_path(path);
        }
        if let Some(domain) = self.domain {
            c = c.set_domain(domain);
        }
        c
    }
}

/// Iterator over the generic attributes of a [`ResponseCookie`].
///
/// This struct is created by [`ResponseCookie::attributes()`].
pub struct Attributes<'a, 'c> {
    iter: std::slice::Iter<'a, (Cow<'c, str>, Cow<'c, str>)>,
}

impl<'a, 'c> Iterator for Attributes<'a, 'c> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl ExactSizeIterator for Attributes<'_, '_> {}

impl<'a, 'b> PartialEq<ResponseCookie<'b>> for ResponseCookie<'a> {
    fn eq(&self, other: &ResponseCookie<'b>) -> bool {
        let so_far_so_good = self.name() == other.name()
            && self.value() == other.value()
            && self.http_only() == other.http_only()
            && self.secure() == other.secure()
            && self.same_site() == other.same_site()
            && self.partitioned() == other.partitioned()
            && self.max_age() == other.max_age()
            && self.comment() == other.comment()
            && self.version() == other.version()
            && self.attributes().eq(other.attributes());

        if !so_far_so_good {
            return false;
        }

        match (self.path(), other.path()) {
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => {}
            (None, None) => {}
            _ => return false,
        };

        match (self.domain(), other.domain()) {
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => {}
            (None, None) => {}
            _ => return false,
        };

        true
    }
}

impl<'a, N, V> From<(N, V)> for ResponseCookie<'a>
where
    N: Into<Cow<'a, str>>,
    V: Into<Cow<'a, str>>,
{
    fn from((name, value): (N, V)) -> Self {
        ResponseCookie::new(name, value)
    }
}

impl<'a> AsRef<ResponseCookie<'a>> for ResponseCookie<'a> {
    fn as_ref(&self) -> &ResponseCookie<'a> {
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::{ResponseCookie, SameSite};
    use time::Duration;

    #[test]
    fn attributes_replace_case_insensitively() {
        let c = ResponseCookie::new("a", "b")
            .set_attribute("Priority", "Low")
            .set_attribute("priority", "High")
            .set_attribute("Other", "x");
        assert_eq!(c.attribute("PRIORITY"), Some("High"));
        let attributes: Vec<_> = c.attributes().collect();
        assert_eq!(attributes, [("Priority", "High"), ("Other", "x")]);

        let c = c.unset_attribute("other");
        assert_eq!(c.attribute("Other"), None);
    }

    #[test]
    fn equality_ignores_path_and_domain_case() {
        let a = ResponseCookie::new("a", "b")
            .set_path("/App")
            .set_domain(".Example.com");
        let b = ResponseCookie::new("a", "b")
            .set_path("/app")
            .set_domain("example.com");
        assert_eq!(a, b);
        assert_ne!(a, b.clone().set_same_site(SameSite::Lax));
        assert_ne!(a, b.set_max_age(Duration::seconds(1)));
    }

    #[test]
    fn into_owned_keeps_everything() {
        let name = String::from("n");
        let c = ResponseCookie::new(name.as_str(), "v")
            .set_comment("c")
            .set_version(3)
            .set_attribute("k", "v");
        let owned: ResponseCookie<'static> = c.clone().into_owned();
        assert_eq!(owned, c);
        assert_eq!(owned.version(), 1);
    }
}
