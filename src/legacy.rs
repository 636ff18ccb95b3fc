//! The Netscape (version 0) and RFC 2109 (version 1) cookie dialect.
use crate::config::LegacyConfig;
use crate::dates::DateFormat;
use crate::processor::{
    validate_attribute, AttributeDefaults, CookieProcessor, GenerateError, ParseError,
};
use crate::scanner::{
    is_v0_separator, is_whitespace, quoted_value_end, unescape_double_quotes, Separators,
};
use crate::table::is_token;
use crate::user_data_log::UserDataLog;
use crate::{Charset, ResponseCookie, ServerCookies};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// Cookie processor for the pre-RFC 6265 cookie dialects.
///
/// On the way in it understands the `$Version`, `$Path` and `$Domain`
/// pseudo-attributes of RFC 2109. On the way out, cookies whose components
/// need quoting are upgraded to version 1.
///
/// ```rust
/// use amaretti::config::CookieDialect;
/// use amaretti::{Processor, ProcessorConfig, ResponseCookie, ServerCookies};
///
/// let mut config = ProcessorConfig::default();
/// config.dialect = CookieDialect::Legacy;
/// let processor: Processor = config.into();
///
/// let mut cookies = ServerCookies::new(4);
/// processor
///     .parse_header_value(br#"$Version=1; foo="bar"; $Path=/x"#, &mut cookies)
///     .unwrap();
/// let foo = cookies.find("foo").unwrap();
/// assert_eq!(foo.value(), "bar");
/// assert_eq!(foo.path(), Some("/x"));
/// assert_eq!(foo.version(), 1);
///
/// let cookie = ResponseCookie::new("a", "b;c");
/// assert_eq!(processor.generate_header(&cookie).unwrap(), "a=\"b;c\"; Version=1");
/// ```
#[derive(Debug, Clone)]
pub struct LegacyCookieProcessor {
    config: LegacyConfig,
    separators: Separators,
    defaults: AttributeDefaults,
    log: Arc<UserDataLog>,
}

impl LegacyCookieProcessor {
    pub(crate) fn new(
        config: LegacyConfig,
        defaults: AttributeDefaults,
        log: Arc<UserDataLog>,
    ) -> Self {
        LegacyCookieProcessor {
            config,
            separators: Separators {
                allow_http_separators_in_v0: config.allow_http_separators_in_v0,
                forward_slash_is_separator: config.forward_slash_is_separator,
                allow_equals_in_value: config.allow_equals_in_value,
            },
            defaults,
            log,
        }
    }

    /// The options this processor was built with.
    pub fn config(&self) -> &LegacyConfig {
        &self.config
    }

    fn skippable(&self, b: u8) -> bool {
        (self.separators.is_http_separator(b) && !self.config.allow_http_separators_in_v0)
            || is_v0_separator(b)
            || is_whitespace(b)
    }

    fn can_start_value(&self, b: u8, version: u8) -> bool {
        (version == 0 && self.config.allow_http_separators_in_v0 && !is_v0_separator(b))
            || !self.separators.is_http_separator(b)
            || b == b'='
    }

    fn process_cookie_header(
        &self,
        bytes: &[u8],
        cookies: &mut ServerCookies,
    ) -> Result<(), ParseError> {
        let charset = self.charset();
        let end = bytes.len();
        let mut pos = 0;
        let mut version = 0;
        // Index of the cookie that `$Path` and `$Domain` apply to.
        let mut current: Option<usize> = None;
        let mut scratch = Vec::new();

        while pos < end {
            while pos < end && self.skippable(bytes[pos]) {
                pos += 1;
            }
            if pos >= end {
                return Ok(());
            }

            let is_special = bytes[pos] == b'$';
            if is_special {
                pos += 1;
            }

            let name_start = pos;
            let name_end = self.separators.token_end(bytes, pos, version, true);
            pos = name_end;
            pos = skip_whitespace(bytes, pos);

            let mut value: Option<(usize, usize)> = None;
            let mut is_quoted = false;
            // A trailing `=` makes a name-only cookie.
            if pos + 1 < end && bytes[pos] == b'=' {
                pos = skip_whitespace(bytes, pos + 1);
                if pos >= end {
                    return Ok(());
                }
                match bytes[pos] {
                    b'"' => {
                        is_quoted = true;
                        let value_start = pos + 1;
                        let value_end = quoted_value_end(bytes, value_start);
                        pos = value_end;
                        // Unterminated quoted value.
                        if pos >= end {
                            return Ok(());
                        }
                        value = Some((value_start, value_end));
                    }
                    b';' | b',' => {}
                    b if self.can_start_value(b, version) => {
                        let value_end = self.separators.token_end(bytes, pos, version, false);
                        if value_end > pos {
                            value = Some((pos, value_end));
                        }
                        pos = value_end;
                    }
                    _ => {
                        let start = pos;
                        while pos < end && bytes[pos] != b';' && bytes[pos] != b',' {
                            pos += 1;
                        }
                        self.log.log(format_args!(
                            "A cookie header was received with a value [{}] that is neither a token \
                             nor a quoted string. That cookie will be ignored.",
                            String::from_utf8_lossy(&bytes[start..pos])
                        ));
                        pos += 1;
                        current = None;
                        continue;
                    }
                }
            } else {
                pos = name_end;
            }

            pos = skip_whitespace(bytes, pos);
            while pos < end {
                let b = bytes[pos];
                pos += 1;
                if b == b';' || b == b',' {
                    break;
                }
            }

            let name = &bytes[name_start..name_end];
            let value_bytes = value.map_or(&b""[..], |(start, end)| &bytes[start..end]);

            if is_special {
                if name == b"Version" && current.is_none() {
                    if value_bytes == b"1" {
                        version = 1;
                    }
                    continue;
                }
                let Some(cookie) = current.and_then(|i| cookies.cookie_mut(i)) else {
                    continue;
                };
                match name {
                    b"Domain" => cookie.set_domain(value_bytes, charset),
                    b"Path" => cookie.set_path(value_bytes, charset),
                    b"Port" | b"CommentURL" => {}
                    _ => self.log.log(format_args!(
                        "A cookie header was received with the unknown special attribute [${}]. \
                         It will be ignored.",
                        String::from_utf8_lossy(name)
                    )),
                }
                continue;
            }

            if (value.is_none() && !self.config.allow_name_only) || name.is_empty() {
                continue;
            }
            let cookie = cookies.add_cookie()?;
            cookie.set_version(version);
            cookie.set_name(name, charset);
            if is_quoted && value_bytes.contains(&b'\\') {
                scratch.clear();
                unescape_double_quotes(value_bytes, &mut scratch);
                cookie.set_value(&scratch, charset);
            } else {
                cookie.set_value(value_bytes, charset);
            }
            current = Some(cookies.cookie_count() - 1);
        }
        Ok(())
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

        let value = cookie.value();
        let domain = cookie.domain.as_deref();
        let path = cookie.path();
        let comment = cookie.comment();

        // Version 1 is sent first, so everything that may require it is
        // looked at upfront. This also rejects control characters.
        let mut upgrade = comment.is_some();
        for (component, text) in [
            ("value", Some(value)),
            ("path", path),
            ("domain", domain),
            ("comment", comment),
        ] {
            if let Some(text) = text {
                let needs_quotes =
                    self.needs_quotes(text, 0)
                        .map_err(|character| GenerateError::InvalidCharacter {
                            name: name.to_string(),
                            component,
                            character,
                        })?;
                upgrade |= needs_quotes;
            }
        }
        let version = if upgrade { 1 } else { cookie.version() };

        let mut header = String::with_capacity(64);
        header.push_str(name);
        header.push('=');
        self.maybe_quote(&mut header, value, version);

        if version == 1 {
            header.push_str("; Version=1");
            if let Some(comment) = comment {
                header.push_str("; Comment=");
                self.maybe_quote(&mut header, comment, version);
            }
        }

        if let Some(domain) = domain {
            header.push_str("; Domain=");
            self.maybe_quote(&mut header, domain, version);
        }

        if let Some(max_age) = cookie.max_age().filter(|age| !age.is_negative()) {
            let seconds = max_age.whole_seconds();
            if version > 0 {
                header.push_str("; Max-Age=");
                header.push_str(&seconds.to_string());
            }
            // Older clients only understand Expires, even on version 1 cookies.
            if version == 0 || self.config.always_add_expires {
                header.push_str("; Expires=");
                let expires = DateFormat::Netscape
                    .expires(now, Duration::seconds(seconds))
                    .map_err(|source| GenerateError::Date {
                        name: name.to_string(),
                        source,
                    })?;
                header.push_str(&expires);
            }
        }

        if let Some(path) = path {
            header.push_str("; Path=");
            self.maybe_quote(&mut header, path, version);
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

    fn allowed_without_quotes(&self, c: char) -> bool {
        if !(' '..='~').contains(&c) {
            return false;
        }
        let b = c as u8;
        if self.config.allow_http_separators_in_v0 {
            !matches!(b, b',' | b';' | b' ' | b'"' | b'\\')
        } else {
            !self.separators.is_http_separator(b)
        }
    }

    /// Whether `value` must be sent as a quoted string. An already quoted
    /// value is judged by its content.
    ///
    /// Returns the first character that can't be sent at all as an error.
    fn needs_quotes(&self, value: &str, version: u8) -> Result<bool, char> {
        let inner = already_quoted(value).unwrap_or(value);
        let mut needs_quotes = false;
        for c in inner.chars() {
            if (c < ' ' && c != '\t') || c >= '\x7f' {
                return Err(c);
            }
            needs_quotes |= match version {
                0 => !self.allowed_without_quotes(c),
                _ => self.separators.is_http_separator(c as u8),
            };
        }
        Ok(needs_quotes)
    }

    fn maybe_quote(&self, header: &mut String, value: &str, version: u8) {
        if value.is_empty() {
            header.push_str("\"\"");
        } else if let Some(inner) = already_quoted(value) {
            header.push('"');
            escape_double_quotes(header, inner);
            header.push('"');
        } else if self.needs_quotes(value, version).unwrap_or(true) {
            header.push('"');
            escape_double_quotes(header, value);
            header.push('"');
        } else {
            header.push_str(value);
        }
    }
}

impl CookieProcessor for LegacyCookieProcessor {
    fn charset(&self) -> Charset {
        Charset::Iso8859_1
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
        self.process_cookie_header(value, cookies)
    }

    fn generate_header(&self, cookie: &ResponseCookie<'_>) -> Result<String, GenerateError> {
        self.generate_header_at(cookie, OffsetDateTime::now_utc())
    }
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && is_whitespace(bytes[pos]) {
        pos += 1;
    }
    pos
}

fn already_quoted(value: &str) -> Option<&str> {
    if value.len() >= 2 {
        value.strip_prefix('"')?.strip_suffix('"')
    } else {
        None
    }
}

fn escape_double_quotes(header: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => header.push_str("\\\\"),
            '"' => header.push_str("\\\""),
            c => header.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UserDataLogConfig, UserDataLogMode};
    use crate::SameSite;
    use googletest::prelude::*;
    use time::macros::datetime;

    fn processor_with(config: LegacyConfig) -> LegacyCookieProcessor {
        LegacyCookieProcessor::new(
            config,
            AttributeDefaults::default(),
            Arc::new(UserDataLog::new(UserDataLogConfig {
                mode: UserDataLogMode::None,
                suppression_secs: 0,
            })),
        )
    }

    fn processor() -> LegacyCookieProcessor {
        processor_with(LegacyConfig::default())
    }

    fn now() -> OffsetDateTime {
        datetime!(2015-10-21 07:28:00 UTC)
    }

    /// `(name, value, path, domain, version)`
    type Expected = (&'static str, &'static str, Option<&'static str>, Option<&'static str>, u8);

    macro_rules! cookies {
        () => {
            Vec::<Expected>::new()
        };
        ($($name:expr => $value:expr),+ $(,)?) => {
            vec![$(($name, $value, None, None, 0)),+]
        };
    }

    #[track_caller]
    fn check_case(processor: &LegacyCookieProcessor, header: &str, expected: Vec<Expected>) {
        let mut cookies = ServerCookies::new(4);
        processor
            .parse_header_value(header.as_bytes(), &mut cookies)
            .unwrap();
        let actual: Vec<Expected> = cookies
            .iter()
            .map(|c| {
                (
                    leak(c.name()),
                    leak(c.value()),
                    c.path().map(leak),
                    c.domain().map(leak),
                    c.version(),
                )
            })
            .collect();
        assert_eq!(actual, expected, "Header: {header:?}");
    }

    fn leak(s: &str) -> &'static str {
        Box::leak(s.to_string().into_boxed_str())
    }

    #[test]
    fn parse_v0() {
        let p = processor();
        let cases = [
            ("", cookies![]),
            (" ; ,", cookies![]),
            ("a=b; c=d", cookies!["a" => "b", "c" => "d"]),
            ("a=b, c=d", cookies!["a" => "b", "c" => "d"]),
            ("  a = b  ;c=d  ", cookies!["a" => "b", "c" => "d"]),
            ("a=\"b c\"; d=e", cookies!["a" => "b c", "d" => "e"]),
            (r#"a="b\"c""#, cookies!["a" => "b\"c"]),
            ("a=\"\"", cookies!["a" => ""]),
            ("a=/path", cookies!["a" => "/path"]),
            // Name-only cookies are dropped by default.
            ("a; b=c", cookies!["b" => "c"]),
            ("a=; b=c", cookies!["b" => "c"]),
            ("b=c; a=", cookies!["b" => "c"]),
            // Invalid value start.
            ("a=(b); c=d", cookies!["c" => "d"]),
            ("a==b; c=d", cookies!["c" => "d"]),
            // Unterminated quote stops parsing.
            ("a=b; c=\"d", cookies!["a" => "b"]),
        ];
        for (header, expected) in cases {
            check_case(&p, header, expected);
        }
    }

    #[test]
    fn parse_decodes_latin1() {
        let mut cookies = ServerCookies::new(1);
        processor()
            .parse_header_value(b"a=caf\xe9", &mut cookies)
            .unwrap();
        assert_that!(cookies.find("a").map(|c| c.value()), some(eq("caf\u{e9}")));
    }

    #[test]
    fn parse_special_attributes() {
        let p = processor();
        check_case(
            &p,
            r#"$Version=1; foo="bar"; $Path=/x"#,
            vec![("foo", "bar", Some("/x"), None, 1)],
        );
        check_case(
            &p,
            r#"$Version="1"; a=b; $Domain=example.com; $Path="/"; $Port="80"; c=d"#,
            vec![
                ("a", "b", Some("/"), Some("example.com"), 1),
                ("c", "d", None, None, 1),
            ],
        );
        // `$Version` after a cookie and attributes before any cookie are ignored.
        check_case(
            &p,
            "$Path=/; a=b; $Version=1; $Unknown=x; c=d",
            vec![("a", "b", None, None, 0), ("c", "d", None, None, 0)],
        );
        check_case(&p, "$Version=2; a=b", vec![("a", "b", None, None, 0)]);
        check_case(&p, "$Version; a=b", vec![("a", "b", None, None, 0)]);
        // An invalid cookie detaches the pseudo-attributes that follow it.
        check_case(
            &p,
            "a=b; c=(d); $Path=/x",
            vec![("a", "b", None, None, 0)],
        );
    }

    #[test]
    fn parse_with_options() {
        let name_only = processor_with(LegacyConfig {
            allow_name_only: true,
            ..Default::default()
        });
        check_case(&name_only, "a; b=; c=d; e", cookies!["a" => "", "b" => "", "c" => "d", "e" => ""]);

        let equals = processor_with(LegacyConfig {
            allow_equals_in_value: true,
            ..Default::default()
        });
        check_case(&equals, "a=b=c; d==", cookies!["a" => "b=c", "d" => "="]);

        let seps = processor_with(LegacyConfig {
            allow_http_separators_in_v0: true,
            ..Default::default()
        });
        check_case(&seps, "a=(b)@c; d=e", cookies!["a" => "(b)@c", "d" => "e"]);

        let slash = processor_with(LegacyConfig {
            forward_slash_is_separator: true,
            ..Default::default()
        });
        check_case(&slash, "a=/x; b=c", cookies!["b" => "c"]);
        check_case(&slash, "a=\"/x\"", cookies!["a" => "/x"]);
    }

    #[test]
    fn parse_respects_limit() {
        let p = processor();
        let mut cookies = ServerCookies::new(1);
        cookies.set_limit(Some(2));
        let err = p
            .parse_header_value(b"a=1; b=2; c=3", &mut cookies)
            .unwrap_err();
        assert_that!(err, displays_as(contains_substring("(2)")));
        assert_that!(cookies.cookie_count(), eq(2));
    }

    #[test]
    fn generate_v0() {
        let p = processor();
        let header = |c: ResponseCookie<'static>| p.generate_header_at(&c, now()).unwrap();

        assert_that!(header(ResponseCookie::new("a", "b")), eq("a=b"));
        assert_that!(header(ResponseCookie::new("a", "")), eq("a=\"\""));
        assert_that!(
            header(
                ResponseCookie::new("a", "b")
                    .set_domain(".example.com")
                    .set_path("/app")
                    .set_max_age(Duration::hours(1))
                    .set_secure(true)
                    .set_http_only(true)
            ),
            eq("a=b; Domain=.example.com; Expires=Wed, 21-Oct-2015 08:28:00 GMT; \
                Path=/app; Secure; HttpOnly")
        );
        assert_that!(
            header(ResponseCookie::new("a", "").set_max_age(Duration::ZERO)),
            eq("a=\"\"; Expires=Thu, 01-Jan-1970 00:00:10 GMT")
        );
    }

    #[test]
    fn generate_upgrades_to_v1() {
        let p = processor();
        let header = |c: ResponseCookie<'static>| p.generate_header_at(&c, now()).unwrap();

        assert_that!(header(ResponseCookie::new("a", "b;c")), eq("a=\"b;c\"; Version=1"));
        assert_that!(
            header(ResponseCookie::new("a", "say \"hi\"")),
            eq(r#"a="say \"hi\""; Version=1"#)
        );
        assert_that!(
            header(ResponseCookie::new("a", "\"b c\"")),
            eq("a=\"b c\"; Version=1")
        );
        assert_that!(
            header(
                ResponseCookie::new("a", "b")
                    .set_comment("hello world")
                    .set_max_age(Duration::hours(1))
            ),
            eq("a=b; Version=1; Comment=\"hello world\"; Max-Age=3600; \
                Expires=Wed, 21-Oct-2015 08:28:00 GMT")
        );
        assert_that!(
            header(ResponseCookie::new("a", "b").set_version(1).set_path("/a b")),
            eq("a=b; Version=1; Path=\"/a b\"")
        );
    }

    #[test]
    fn generate_without_expires_for_v1() {
        let p = processor_with(LegacyConfig {
            always_add_expires: false,
            ..Default::default()
        });
        let cookie = ResponseCookie::new("a", "b")
            .set_version(1)
            .set_max_age(Duration::seconds(60));
        assert_that!(
            p.generate_header_at(&cookie, now()).unwrap(),
            eq("a=b; Version=1; Max-Age=60")
        );
    }

    #[test]
    fn generate_forward_slash() {
        let p = processor_with(LegacyConfig {
            forward_slash_is_separator: true,
            ..Default::default()
        });
        let cookie = ResponseCookie::new("a", "b").set_path("/app");
        assert_that!(
            p.generate_header_at(&cookie, now()).unwrap(),
            eq("a=b; Version=1; Path=\"/app\"")
        );
    }

    #[test]
    fn generate_attributes_and_defaults() {
        let p = LegacyCookieProcessor::new(
            LegacyConfig::default(),
            AttributeDefaults {
                same_site: Some(SameSite::Strict),
                partitioned: false,
            },
            processor().log,
        );
        let cookie = ResponseCookie::new("a", "b")
            .set_partitioned(true)
            .set_attribute("Priority", "Low");
        assert_that!(
            p.generate_header_at(&cookie, now()).unwrap(),
            eq("a=b; SameSite=Strict; Partitioned; Priority=Low")
        );
    }

    #[test]
    fn generate_rejects() {
        let p = processor();
        assert!(matches!(
            p.generate_header_at(&ResponseCookie::new("a;b", "c"), now()),
            Err(GenerateError::InvalidName { .. })
        ));
        assert!(matches!(
            p.generate_header_at(&ResponseCookie::new("a", "b\nc"), now()),
            Err(GenerateError::InvalidCharacter { component: "value", character: '\n', .. })
        ));
        assert!(matches!(
            p.generate_header_at(&ResponseCookie::new("a", "b").set_path("/\u{e9}"), now()),
            Err(GenerateError::InvalidCharacter { component: "path", .. })
        ));
        assert!(matches!(
            p.generate_header_at(&ResponseCookie::new("a", "caf\u{e9}"), now()),
            Err(GenerateError::InvalidCharacter { component: "value", character: '\u{e9}', .. })
        ));
    }

    #[test]
    fn generated_value_parses_back() {
        let p = processor();
        for value in ["plain", "b;c", "say \"hi\"", "x\\y", "\\\"", ""] {
            let header = p
                .generate_header_at(&ResponseCookie::new("a", value), now())
                .unwrap();
            let pair = header.split("; Version=1").next().unwrap();
            let mut cookies = ServerCookies::new(1);
            p.parse_header_value(pair.as_bytes(), &mut cookies).unwrap();
            assert_that!(cookies.find("a").map(|c| c.value()), some(eq(value)));
        }
    }
}
