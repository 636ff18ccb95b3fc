use std::fmt;

/// The character set used to turn raw `Cookie` header bytes into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    /// Every byte maps to the Unicode code point with the same value.
    Iso8859_1,
    /// Invalid sequences are replaced with `U+FFFD`.
    Utf8,
}

impl Charset {
    /// Appends the decoded form of `bytes` to `out`, reusing its allocation.
    pub fn decode_into(&self, bytes: &[u8], out: &mut String) {
        match self {
            Charset::Iso8859_1 => out.extend(bytes.iter().map(|&b| char::from(b))),
            Charset::Utf8 => out.push_str(&String::from_utf8_lossy(bytes)),
        }
    }

    /// The IANA name of this character set.
    pub fn as_str(&self) -> &'static str {
        match self {
            Charset::Iso8859_1 => "ISO-8859-1",
            Charset::Utf8 => "UTF-8",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
