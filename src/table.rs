//! Byte-class lookup table used by the cookie scanners and validators.
//!
//! Classes come from
//! [RFC 7230 section 3.2.6](https://datatracker.ietf.org/doc/html/rfc7230#section-3.2.6),
//! [RFC 2616 section 2.2](https://datatracker.ietf.org/doc/html/rfc2616#section-2.2) and
//! [RFC 6265 section 4.1.1](https://www.rfc-editor.org/rfc/rfc6265#section-4.1.1).

pub(crate) const C_TCHAR: u16 = 1;
pub(crate) const C_HTTP_SEPARATOR: u16 = 1 << 1;
pub(crate) const C_V0_SEPARATOR: u16 = 1 << 2;
pub(crate) const C_COOKIE_OCTET: u16 = 1 << 3;
pub(crate) const C_WHITESPACE: u16 = 1 << 4;
pub(crate) const C_DOMAIN: u16 = 1 << 5;
pub(crate) const C_CONTROL: u16 = 1 << 6;
pub(crate) const C_LWS: u16 = 1 << 7;

static TABLE: [u16; 256] = build_table();

#[inline]
pub(crate) fn char_classes(b: u8) -> u16 {
    TABLE[usize::from(b)]
}

#[inline]
pub(crate) fn is(b: u8, class: u16) -> bool {
    char_classes(b) & class != 0
}

/// Returns `true` if every byte of `s` is a `tchar` and `s` is not empty.
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| is(b, C_TCHAR))
}

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        let mut classes = 0;
        if is_tchar(b) {
            classes |= C_TCHAR;
        }
        if is_http_separator(b) {
            classes |= C_HTTP_SEPARATOR;
        }
        if matches!(b, b',' | b';' | b' ' | b'\t') {
            classes |= C_V0_SEPARATOR;
        }
        if is_cookie_octet(b) {
            classes |= C_COOKIE_OCTET;
        }
        if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0c) {
            classes |= C_WHITESPACE;
        }
        if matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-') {
            classes |= C_DOMAIN;
        }
        if (b < 0x20 && b != b'\t') || b == 0x7f {
            classes |= C_CONTROL;
        }
        if matches!(b, b' ' | b'\t') {
            classes |= C_LWS;
        }
        table[i] = classes;
        i += 1;
    }
    table
}

/// ```text
/// tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." /
///         "^" / "_" / "`" / "|" / "~" / DIGIT / ALPHA
/// ```
const fn is_tchar(b: u8) -> bool {
    matches!(b,
        b'!'
        | b'#'
        | b'$'
        | b'%'
        | b'&'
        | b'\''
        | b'*'
        | b'+'
        | b'-'
        | b'.'
        | b'^'
        | b'_'
        | b'`'
        | b'|'
        | b'~'
        | b'0'..=b'9'
        | b'a'..=b'z'
        | b'A'..=b'Z')
}

/// ```text
/// separators = "(" | ")" | "<" | ">" | "@" | "," | ";" | ":" | "\" | <">
///            | "/" | "[" | "]" | "?" | "=" | "{" | "}" | SP | HT
/// ```
///
/// `/` is left out: whether it separates is a processor setting.
const fn is_http_separator(b: u8) -> bool {
    matches!(
        b,
        b'\t'
            | b' '
            | b'"'
            | b'('
            | b')'
            | b','
            | b':'
            | b';'
            | b'<'
            | b'='
            | b'>'
            | b'?'
            | b'@'
            | b'['
            | b'\\'
            | b']'
            | b'{'
            | b'}'
    )
}

/// ```text
/// cookie-octet = %x21 / %x23-2B / %x2D-3A / %x3C-5B / %x5D-7E
/// ```
const fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table() {
        assert!(is(b'a', C_TCHAR));
        assert!(is(b'$', C_TCHAR));
        assert!(!is(b'=', C_TCHAR));
        assert!(!is(0x80, C_TCHAR));

        assert!(is(b'=', C_HTTP_SEPARATOR));
        assert!(!is(b'/', C_HTTP_SEPARATOR));
        assert!(is(b',', C_V0_SEPARATOR));
        assert!(!is(b'=', C_V0_SEPARATOR));

        assert!(is(b'/', C_COOKIE_OCTET));
        assert!(!is(b';', C_COOKIE_OCTET));
        assert!(!is(b'"', C_COOKIE_OCTET));
        assert!(!is(b'\\', C_COOKIE_OCTET));
        assert!(!is(b' ', C_COOKIE_OCTET));

        assert!(is(0x0c, C_WHITESPACE));
        assert!(!is(0x0c, C_LWS));
        assert!(is(0x00, C_CONTROL));
        assert!(is(0x7f, C_CONTROL));
        assert!(!is(b'\t', C_CONTROL));
    }

    #[test]
    fn tokens() {
        assert!(is_token("JSESSIONID"));
        assert!(is_token("$Version"));
        assert!(!is_token(""));
        assert!(!is_token("a b"));
        assert!(!is_token("a=b"));
        assert!(!is_token("caf\u{e9}"));
    }
}
