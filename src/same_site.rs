//! The `SameSite` cookie attribute.

use std::fmt;
use std::str::FromStr;

/// The value of a `SameSite` attribute in a `Set-Cookie` header.
///
/// Browsers use it to decide whether a cookie goes along with cross-site
/// requests:
///
/// - `Strict`: never;
/// - `Lax`: only for top-level navigations using safe methods, like `GET`;
/// - `None`: always, but only if the cookie is also `Secure`.
///
/// Both dialects emit it the same way, after `HttpOnly`. A processor can add
/// one to every cookie it generates through [`ProcessorConfig::same_site`];
/// [`ResponseCookie::set_same_site()`] overrides it for a single cookie.
/// Nothing here adds `Secure` on your behalf when the value is `None`.
///
/// [`ResponseCookie::set_same_site()`]: crate::ResponseCookie::set_same_site()
/// [`ProcessorConfig::same_site`]: crate::ProcessorConfig::same_site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SameSite {
    #[cfg_attr(feature = "serde", serde(alias = "strict"))]
    Strict,
    #[cfg_attr(feature = "serde", serde(alias = "lax"))]
    Lax,
    #[cfg_attr(feature = "serde", serde(alias = "none"))]
    None,
}

impl SameSite {
    /// Returns `true` for `SameSite::Strict`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::SameSite;
    ///
    /// assert!(SameSite::Strict.is_strict());
    /// assert!(!SameSite::Lax.is_strict());
    /// ```
    #[inline]
    pub fn is_strict(&self) -> bool {
        *self == SameSite::Strict
    }

    /// Returns `true` for `SameSite::Lax`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::SameSite;
    ///
    /// let configured: SameSite = "lax".parse().unwrap();
    /// assert!(configured.is_lax());
    /// assert!(!configured.is_none());
    /// ```
    #[inline]
    pub fn is_lax(&self) -> bool {
        *self == SameSite::Lax
    }

    /// Returns `true` for `SameSite::None`.
    ///
    /// Not to be confused with [`Option::is_none`]: a cookie without the
    /// attribute has no `SameSite` value at all.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::{ResponseCookie, SameSite};
    ///
    /// let cookie = ResponseCookie::new("embed", "1").set_same_site(SameSite::None);
    /// assert!(cookie.same_site().is_some_and(|s| s.is_none()));
    /// assert!(ResponseCookie::new("plain", "1").same_site().is_none());
    /// ```
    #[inline]
    pub fn is_none(&self) -> bool {
        *self == SameSite::None
    }

    /// The attribute value, as written in a `Set-Cookie` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SameSite {
    type Err = InvalidSameSiteError;

    /// Parses a `SameSite` value, ignoring ASCII case.
    ///
    /// ```rust
    /// use amaretti::SameSite;
    ///
    /// assert_eq!("lax".parse::<SameSite>().unwrap(), SameSite::Lax);
    /// assert_eq!("STRICT".parse::<SameSite>().unwrap(), SameSite::Strict);
    /// assert!("sometimes".parse::<SameSite>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [SameSite::Strict, SameSite::Lax, SameSite::None]
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvalidSameSiteError {
                value: s.to_string(),
            })
    }
}

/// The error returned when parsing an unknown `SameSite` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{value}` is not a valid SameSite value: expected `Strict`, `Lax` or `None`")]
pub struct InvalidSameSiteError {
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[test]
    fn display_matches_parse() {
        for same_site in [SameSite::Strict, SameSite::Lax, SameSite::None] {
            let parsed: SameSite = same_site.to_string().parse().unwrap();
            assert_that!(parsed, eq(same_site));
        }
    }

    #[test]
    fn unknown_values_are_rejected() {
        let err = " lax".parse::<SameSite>().unwrap_err();
        assert_that!(
            err.to_string(),
            eq("` lax` is not a valid SameSite value: expected `Strict`, `Lax` or `None`")
        );
        assert!("".parse::<SameSite>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_either_case() {
        let parsed: Vec<SameSite> = serde_json::from_str(r#"["Strict", "lax", "none"]"#).unwrap();
        assert_that!(
            parsed,
            elements_are![eq(SameSite::Strict), eq(SameSite::Lax), eq(SameSite::None)]
        );
    }
}
