//! The [RFC 6265](https://www.rfc-editor.org/rfc/rfc6265) cookie dialect.
use crate::dates::DateFormat;
use crate::processor::{
    validate_attribute, AttributeDefaults, CookieProcessor, GenerateError, ParseError,
};
use crate::scanner::{ByteCursor, SkipResult};
use crate::table::{is, is_token, C_DOMAIN};
use crate::user_data_log::UserDataLog;
use crate::{Charset, ResponseCookie, ServerCookies};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// Cookie processor for the flat `name=value` grammar of RFC 6265.
///
/// Parsing is lenient: a cookie that doesn't follow the grammar is logged and
/// skipped, and the rest of the header is still processed. Generation is
/// strict: anything the grammar doesn't allow is rejected with a
/// [`GenerateError`].
///
/// ```rust
/// use amaretti::{Processor, ProcessorConfig, ResponseCookie, ServerCookies};
/// use amaretti::time::Duration;
///
/// let processor: Processor = ProcessorConfig::default().into();
///
/// let mut cookies = ServerCookies::new(4);
/// processor
///     .parse_header_value(br#"theme="dark"; bad=a\b; lang=en"#, &mut cookies)
///     .unwrap();
/// let pairs: Vec<_> = cookies.iter().map(|c| (c.name(), c.value())).collect();
/// assert_eq!(pairs, [("theme", "dark"), ("lang", "en")]);
///
/// let cookie = ResponseCookie::new("session", "a;b");
/// assert!(processor.generate_header(&cookie).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Rfc6265CookieProcessor {
    defaults: AttributeDefaults,
    log: Arc<UserDataLog>,
}

impl Rfc6265CookieProcessor {
    pub(crate) fn new(defaults: AttributeDefaults, log: Arc<UserDataLog>) -> Self {
        Rfc6265CookieProcessor { defaults, log }
    }

    pub(crate) fn generate_header_at(
        &self,
        cookie: &ResponseCookie<'_>,
        now: OffsetDateTime,
    ) -> Result<String, GenerateError> {
        let name = cookie.name();
        if !is_token(name) {
            return Err(GenerateError::InvalidName {
                name: name.to_string(),
            });
        }

        let mut header = String::with_capacity(64);
        header.push_str(name);
        header.push('=');
        let value = cookie.value();
        if !value.is_empty() {
            validate_cookie_value(cookie)?;
            header.push_str(value);
        }

        // Max-Age is preferred, Expires is there for clients that don't know it.
        if let Some(max_age) = cookie.max_age().filter(|age| !age.is_negative()) {
            let seconds = max_age.whole_seconds();
            header.push_str("; Max-Age=");
            header.push_str(&seconds.to_string());
            header.push_str("; Expires=");
            let expires = DateFormat::ImfFixdate
                .expires(now, Duration::seconds(seconds))
                .map_err(|source| GenerateError::Date {
                    name: name.to_string(),
                    source,
                })?;
            header.push_str(&expires);
        }

        if let Some(domain) = cookie.domain().filter(|d| !d.is_empty()) {
            validate_domain(cookie, domain)?;
            header.push_str("; Domain=");
            header.push_str(domain);
        }

        if let Some(path) = cookie.path().filter(|p| !p.is_empty()) {
            if path.chars().any(|c| !(' '..='~').contains(&c) || c == ';') {
                return Err(GenerateError::InvalidPath {
                    name: name.to_string(),
                    path: path.to_string(),
                });
            }
            header.push_str("; Path=");
            header.push_str(path);
        }

        if cookie.secure() == Some(true) {
            header.push_str("; Secure");
        }
        if cookie.http_only() == Some(true) {
            header.push_str("; HttpOnly");
        }
        self.defaults.write(cookie, &mut header);

        for (attribute, value) in cookie.attributes() {
            validate_attribute(cookie, attribute, value)?;
            header.push_str("; ");
            header.push_str(attribute);
            if !value.is_empty() {
                header.push('=');
                header.push_str(value);
            }
        }

        Ok(header)
    }

    fn log_invalid_cookie(&self, fragment: &[u8]) {
        self.log.log(format_args!(
            "A cookie header was received [{}] that contained an invalid cookie. \
             That cookie will be ignored.",
            String::from_utf8_lossy(fragment)
        ));
    }
}

impl CookieProcessor for Rfc6265CookieProcessor {
    fn charset(&self) -> Charset {
        Charset::Utf8
    }

    fn parse_header_value(
        &self,
        value: &[u8],
        cookies: &mut ServerCookies,
    ) -> Result<(), ParseError> {
        log::trace!(
            "Parsing cookie header [{}]",
            String::from_utf8_lossy(value)
        );
        let charset = self.charset();
        let mut cursor = ByteCursor::new(value);
        loop {
            cursor.skip_lws();
            let start = cursor.position();
            let name = cursor.read_token();
            cursor.skip_lws();

            let mut cookie_value: &[u8] = b"";
            if cursor.skip_byte(b'=') == SkipResult::Found {
                cursor.skip_lws();
                match cursor.read_cookie_value_rfc6265() {
                    Some(v) => cookie_value = v,
                    None => {
                        cursor.skip_until_semicolon();
                        self.log_invalid_cookie(cursor.since(start));
                        continue;
                    }
                }
                cursor.skip_lws();
            }

            let more = match cursor.skip_byte(b';') {
                SkipResult::Found => true,
                SkipResult::NotFound => {
                    cursor.skip_until_semicolon();
                    self.log_invalid_cookie(cursor.since(start));
                    continue;
                }
                SkipResult::Eof => false,
            };

            if !name.is_empty() {
                let cookie = cookies.add_cookie()?;
                cookie.set_name(name, charset);
                cookie.set_value(cookie_value, charset);
            }

            if !more {
                return Ok(());
            }
        }
    }

    fn generate_header(&self, cookie: &ResponseCookie<'_>) -> Result<String, GenerateError> {
        self.generate_header_at(cookie, OffsetDateTime::now_utc())
    }
}

/// ```text
/// cookie-value = *cookie-octet / ( DQUOTE *cookie-octet DQUOTE )
/// ```
///
/// Non-ASCII characters are let through.
fn validate_cookie_value(cookie: &ResponseCookie<'_>) -> Result<(), GenerateError> {
    let value = cookie.value();
    let inner = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner,
        None => value,
    };
    match inner
        .chars()
        .find(|&c| c < '!' || matches!(c, '"' | ',' | ';' | '\\' | '\x7f'))
    {
        Some(character) => Err(GenerateError::InvalidValue {
            name: cookie.name().to_string(),
            character,
        }),
        None => Ok(()),
    }
}

/// Letters, digits, `.` and `-`, with every label starting and ending with a
/// letter or a digit.
fn validate_domain(cookie: &ResponseCookie<'_>, domain: &str) -> Result<(), GenerateError> {
    let bytes = domain.as_bytes();
    let mut prev: Option<u8> = None;
    let mut valid = true;
    for &cur in bytes {
        if !is(cur, C_DOMAIN) {
            valid = false;
        } else if matches!(prev, None | Some(b'.')) && matches!(cur, b'.' | b'-') {
            valid = false;
        } else if prev == Some(b'-') && cur == b'.' {
            valid = false;
        }
        if !valid {
            break;
        }
        prev = Some(cur);
    }
    if valid && matches!(prev, Some(b'.' | b'-')) {
        valid = false;
    }
    if valid {
        Ok(())
    } else {
        Err(GenerateError::InvalidDomain {
            name: cookie.name().to_string(),
            domain: domain.to_string(),
        })
    }
}
