//! Single-pass byte scanners shared by the cookie dialects.
//!
//! Nothing in here allocates or fails: every function returns positions or
//! sub-slices of the input, and malformed input is reported to the caller as
//! "stop here" rather than as an error.
use crate::table::{
    is, C_CONTROL, C_COOKIE_OCTET, C_HTTP_SEPARATOR, C_LWS, C_TCHAR, C_V0_SEPARATOR, C_WHITESPACE,
};

/// Outcome of [`ByteCursor::skip_byte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkipResult {
    Found,
    NotFound,
    Eof,
}

/// A forward-only read position over a header value.
#[derive(Debug, Clone)]
pub(crate) struct ByteCursor<'h> {
    bytes: &'h [u8],
    pos: usize,
}

impl<'h> ByteCursor<'h> {
    pub(crate) fn new(bytes: &'h [u8]) -> Self {
        ByteCursor { bytes, pos: 0 }
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// The bytes between `start` and the current position.
    pub(crate) fn since(&self, start: usize) -> &'h [u8] {
        &self.bytes[start.min(self.pos)..self.pos]
    }

    /// Skips spaces and horizontal tabs.
    pub(crate) fn skip_lws(&mut self) {
        while self.pos < self.bytes.len() && is(self.bytes[self.pos], C_LWS) {
            self.pos += 1;
        }
    }

    pub(crate) fn skip_byte(&mut self, target: u8) -> SkipResult {
        match self.bytes.get(self.pos) {
            None => SkipResult::Eof,
            Some(&b) if b == target => {
                self.pos += 1;
                SkipResult::Found
            }
            Some(_) => SkipResult::NotFound,
        }
    }

    /// Advances past the next `;`, or to the end of input.
    pub(crate) fn skip_until_semicolon(&mut self) {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            self.pos += 1;
            if b == b';' {
                break;
            }
        }
    }

    /// Reads a (possibly empty) run of `tchar`s.
    pub(crate) fn read_token(&mut self) -> &'h [u8] {
        let start = self.pos;
        while self.pos < self.bytes.len() && is(self.bytes[self.pos], C_TCHAR) {
            self.pos += 1;
        }
        &self.bytes[start..self.pos]
    }

    /// Reads an RFC 6265 `cookie-value`, stripping a surrounding pair of quotes.
    ///
    /// ```text
    /// cookie-value = *cookie-octet / ( DQUOTE *cookie-octet DQUOTE )
    /// ```
    ///
    /// Bytes outside of ASCII are accepted, to let UTF-8 values through.
    ///
    /// Returns `None` when a byte that can't be part of a cookie value is found
    /// before a delimiter. The cursor is then left on the offending byte.
    pub(crate) fn read_cookie_value_rfc6265(&mut self) -> Option<&'h [u8]> {
        let quoted = self.skip_byte(b'"') == SkipResult::Found;
        let start = self.pos;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if is(b, C_COOKIE_OCTET) || !b.is_ascii() {
                self.pos += 1;
            } else if matches!(b, b';' | b' ' | b'\t') {
                if quoted {
                    // The closing quote is missing.
                    return None;
                }
                return Some(&self.bytes[start..self.pos]);
            } else if quoted && b == b'"' {
                let value = &self.bytes[start..self.pos];
                self.pos += 1;
                return Some(value);
            } else {
                return None;
            }
        }
        if quoted {
            None
        } else {
            Some(&self.bytes[start..self.pos])
        }
    }
}

/// The separator rules of the legacy (Netscape v0 / RFC 2109) dialect.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Separators {
    pub(crate) allow_http_separators_in_v0: bool,
    pub(crate) forward_slash_is_separator: bool,
    pub(crate) allow_equals_in_value: bool,
}

impl Separators {
    /// RFC 2616 separators, `/` depending on configuration.
    ///
    /// Control bytes are treated as separators so that they always terminate a
    /// token.
    #[inline]
    pub(crate) fn is_http_separator(&self, b: u8) -> bool {
        is(b, C_HTTP_SEPARATOR | C_CONTROL) || (b == b'/' && self.forward_slash_is_separator)
    }

    /// Position of the first byte at or after `start` that ends a legacy
    /// cookie name (`is_name`) or value.
    pub(crate) fn token_end(&self, bytes: &[u8], start: usize, version: u8, is_name: bool) -> usize {
        let mut pos = start;
        while pos < bytes.len() {
            let b = bytes[pos];
            let in_token = !self.is_http_separator(b)
                || (version == 0
                    && self.allow_http_separators_in_v0
                    && b != b'='
                    && !is_v0_separator(b)
                    && !is(b, C_CONTROL))
                || (!is_name && b == b'=' && self.allow_equals_in_value);
            if !in_token {
                break;
            }
            pos += 1;
        }
        pos
    }
}

#[inline]
pub(crate) fn is_v0_separator(b: u8) -> bool {
    is(b, C_V0_SEPARATOR)
}

#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    is(b, C_WHITESPACE)
}

/// Position of the closing quote of a quoted value whose content starts at
/// `start`, honoring `\` escapes. Returns `bytes.len()` if there is none.
pub(crate) fn quoted_value_end(bytes: &[u8], start: usize) -> usize {
    let end = bytes.len();
    let mut pos = start;
    while pos < end {
        if bytes[pos] == b'"' {
            return pos;
        } else if bytes[pos] == b'\\' && pos < end - 1 {
            pos += 2;
        } else {
            pos += 1;
        }
    }
    end
}

/// Copies `src` into `dst`, dropping the `\` in front of every escaped byte.
///
/// A trailing `\` is kept as is.
pub(crate) fn unescape_double_quotes(src: &[u8], dst: &mut Vec<u8>) {
    let mut i = 0;
    while i < src.len() {
        if src[i] == b'\\' && i + 1 < src.len() {
            i += 1;
        }
        dst.push(src[i]);
        i += 1;
    }
}
