use crate::config::CookieDialect;
use crate::legacy::LegacyCookieProcessor;
use crate::rfc6265::Rfc6265CookieProcessor;
use crate::server_cookies::CookieLimitError;
use crate::table::is_token;
use crate::user_data_log::UserDataLog;
use crate::{Charset, MimeHeaders, ProcessorConfig, ResponseCookie, SameSite, ServerCookies};
use std::sync::Arc;

/// The behaviour shared by the two cookie dialects: turning `Cookie` request
/// headers into [`ServerCookie`]s and [`ResponseCookie`]s into `Set-Cookie`
/// header values.
///
/// [`ServerCookie`]: crate::ServerCookie
pub trait CookieProcessor {
    /// The character set cookie names and values are decoded with.
    fn charset(&self) -> Charset;

    /// Parses the value of a single `Cookie` header, appending every cookie
    /// found to `cookies`.
    ///
    /// Malformed cookies are logged and skipped.
    ///
    /// # Errors
    ///
    /// Fails if `cookies` reaches its limit. The cookies parsed up to that
    /// point are kept.
    fn parse_header_value(&self, value: &[u8], cookies: &mut ServerCookies)
        -> Result<(), ParseError>;

    /// Parses every `Cookie` header in `headers`, in order.
    ///
    /// # Errors
    ///
    /// Fails if `cookies` reaches its limit.
    fn parse_cookie_header(
        &self,
        headers: &MimeHeaders,
        cookies: &mut ServerCookies,
    ) -> Result<(), ParseError> {
        for value in headers.values("Cookie") {
            self.parse_header_value(value, cookies)?;
        }
        Ok(())
    }

    /// Builds the value of the `Set-Cookie` header for `cookie`.
    ///
    /// # Errors
    ///
    /// Fails if a component of `cookie` can't be sent in this dialect.
    fn generate_header(&self, cookie: &ResponseCookie<'_>) -> Result<String, GenerateError>;
}

/// Parses `Cookie` headers and generates `Set-Cookie` headers according to
/// one of the two supported cookie dialects.
///
/// # Creating a `Processor`
///
/// A processor is created from a [`ProcessorConfig`] using the [`From`] trait.
/// The dialect is picked once, at construction time.
///
/// ```rust
/// use amaretti::{MimeHeaders, Processor, ProcessorConfig, ServerCookies};
///
/// let processor: Processor = ProcessorConfig::default().into();
///
/// let mut headers = MimeHeaders::new();
/// headers.add_value("Cookie", b"a=b; c=d").unwrap();
/// headers.add_value("Cookie", b"e=f").unwrap();
///
/// let mut cookies = ServerCookies::new(4);
/// processor.parse_cookie_header(&headers, &mut cookies).unwrap();
/// let pairs: Vec<_> = cookies.iter().map(|c| (c.name(), c.value())).collect();
/// assert_eq!(pairs, [("a", "b"), ("c", "d"), ("e", "f")]);
/// ```
///
/// A `Processor` is cheap to clone and can be shared between threads.
#[derive(Debug, Clone)]
pub enum Processor {
    /// Netscape and RFC 2109 cookies.
    Legacy(LegacyCookieProcessor),
    /// RFC 6265 cookies.
    Rfc6265(Rfc6265CookieProcessor),
}

impl From<ProcessorConfig> for Processor {
    fn from(value: ProcessorConfig) -> Self {
        let log = Arc::new(UserDataLog::new(value.user_data_log));
        let defaults = AttributeDefaults {
            same_site: value.same_site,
            partitioned: value.partitioned,
        };
        match value.dialect {
            CookieDialect::Legacy => {
                Processor::Legacy(LegacyCookieProcessor::new(value.legacy, defaults, log))
            }
            CookieDialect::Rfc6265 => {
                Processor::Rfc6265(Rfc6265CookieProcessor::new(defaults, log))
            }
        }
    }
}

impl Processor {
    /// The dialect this processor speaks.
    pub fn dialect(&self) -> CookieDialect {
        match self {
            Processor::Legacy(_) => CookieDialect::Legacy,
            Processor::Rfc6265(_) => CookieDialect::Rfc6265,
        }
    }

    /// See [`CookieProcessor::charset`].
    pub fn charset(&self) -> Charset {
        match self {
            Processor::Legacy(p) => p.charset(),
            Processor::Rfc6265(p) => p.charset(),
        }
    }

    /// See [`CookieProcessor::parse_header_value`].
    pub fn parse_header_value(
        &self,
        value: &[u8],
        cookies: &mut ServerCookies,
    ) -> Result<(), ParseError> {
        match self {
            Processor::Legacy(p) => p.parse_header_value(value, cookies),
            Processor::Rfc6265(p) => p.parse_header_value(value, cookies),
        }
    }

    /// See [`CookieProcessor::parse_cookie_header`].
    pub fn parse_cookie_header(
        &self,
        headers: &MimeHeaders,
        cookies: &mut ServerCookies,
    ) -> Result<(), ParseError> {
        match self {
            Processor::Legacy(p) => p.parse_cookie_header(headers, cookies),
            Processor::Rfc6265(p) => p.parse_cookie_header(headers, cookies),
        }
    }

    /// See [`CookieProcessor::generate_header`].
    pub fn generate_header(&self, cookie: &ResponseCookie<'_>) -> Result<String, GenerateError> {
        match self {
            Processor::Legacy(p) => p.generate_header(cookie),
            Processor::Rfc6265(p) => p.generate_header(cookie),
        }
    }
}

impl CookieProcessor for Processor {
    fn charset(&self) -> Charset {
        Processor::charset(self)
    }

    fn parse_header_value(
        &self,
        value: &[u8],
        cookies: &mut ServerCookies,
    ) -> Result<(), ParseError> {
        Processor::parse_header_value(self, value, cookies)
    }

    fn parse_cookie_header(
        &self,
        headers: &MimeHeaders,
        cookies: &mut ServerCookies,
    ) -> Result<(), ParseError> {
        Processor::parse_cookie_header(self, headers, cookies)
    }

    fn generate_header(&self, cookie: &ResponseCookie<'_>) -> Result<String, GenerateError> {
        Processor::generate_header(self, cookie)
    }
}

/// Processor-wide values for the attributes a cookie can override.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AttributeDefaults {
    pub(crate) same_site: Option<SameSite>,
    pub(crate) partitioned: bool,
}

impl AttributeDefaults {
    /// Appends `SameSite` and `Partitioned`, per-cookie values first.
    pub(crate) fn write(&self, cookie: &ResponseCookie<'_>, header: &mut String) {
        if let Some(same_site) = cookie.same_site().or(self.same_site) {
            header.push_str("; SameSite=");
            header.push_str(same_site.as_str());
        }
        if cookie.partitioned().unwrap_or(self.partitioned) {
            header.push_str("; Partitioned");
        }
    }
}

/// Checks a generic attribute: the name must be a token and the value
/// printable ASCII without `;`.
pub(crate) fn validate_attribute(
    cookie: &ResponseCookie<'_>,
    name: &str,
    value: &str,
) -> Result<(), GenerateError> {
    if !is_token(name) {
        return Err(GenerateError::InvalidAttributeName {
            name: cookie.name().to_string(),
            attribute: name.to_string(),
        });
    }
    if let Some(character) = value.chars().find(|&c| !(' '..='~').contains(&c) || c == ';') {
        return Err(GenerateError::InvalidAttributeValue {
            name: cookie.name().to_string(),
            attribute: name.to_string(),
            character,
        });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned when parsing `Cookie` headers.
pub enum ParseError {
    #[error(transparent)]
    TooManyCookies(#[from] CookieLimitError),
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned when a [`ResponseCookie`] can't be turned into a
/// `Set-Cookie` header.
///
/// Every variant carries the name of the offending cookie.
pub enum GenerateError {
    #[error("The cookie name [{name}] is not a valid token")]
    InvalidName { name: String },
    #[error("An invalid character [{character:?}] was present in the value of the cookie [{name}]")]
    InvalidValue { name: String, character: char },
    #[error("An invalid domain [{domain}] was specified for the cookie [{name}]")]
    InvalidDomain { name: String, domain: String },
    #[error("An invalid path [{path}] was specified for the cookie [{name}]")]
    InvalidPath { name: String, path: String },
    #[error("An invalid attribute name [{attribute}] was specified for the cookie [{name}]")]
    InvalidAttributeName { name: String, attribute: String },
    #[error("An invalid character [{character:?}] was present in the value of the attribute [{attribute}] of the cookie [{name}]")]
    InvalidAttributeValue {
        name: String,
        attribute: String,
        character: char,
    },
    #[error("The {component} of the cookie [{name}] contains the character [{character:?}], which can't be sent")]
    InvalidCharacter {
        name: String,
        component: &'static str,
        character: char,
    },
    #[error("Failed to format the expiry date of the cookie [{name}]")]
    Date {
        name: String,
        #[source]
        source: time::error::Format,
    },
}
