//! Configuration for a [`Processor`].
//!
//! Check out the [`ProcessorConfig`] struct for more information.
//!
//! [`Processor`]: crate::Processor
use crate::SameSite;

pub use crate::user_data_log::{UserDataLogConfig, UserDataLogMode};

/// `ProcessorConfig` specifies which cookie dialect the server speaks and
/// how lenient it is with the cookies it receives.
///
/// Check out the documentation for the fields of this struct for more information.
///
/// # [`Processor`]
///
/// To action the rules specified in this struct, you must convert it into a [`Processor`]:
///
/// ```rust
/// use amaretti::{Processor, ProcessorConfig, SameSite};
/// use amaretti::config::CookieDialect;
///
/// let mut config = ProcessorConfig::default();
/// config.dialect = CookieDialect::Legacy;
/// config.legacy.allow_name_only = true;
/// config.same_site = Some(SameSite::Lax);
/// let processor: Processor = config.into();
/// ```
///
/// [`Processor`]: crate::Processor
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProcessorConfig {
    /// The rules used to parse `Cookie` headers and generate `Set-Cookie`
    /// headers.
    ///
    /// By default, [`CookieDialect::Rfc6265`].
    pub dialect: CookieDialect,
    /// Knobs that only apply to the [`CookieDialect::Legacy`] dialect.
    pub legacy: LegacyConfig,
    /// The `SameSite` attribute added to every outgoing cookie that doesn't
    /// specify its own.
    ///
    /// By default, `None`: no attribute is added.
    pub same_site: Option<SameSite>,
    /// If `true`, every outgoing cookie that doesn't opt out is marked
    /// `Partitioned`.
    ///
    /// By default, this field is `false`.
    pub partitioned: bool,
    /// How problems with the cookies sent by clients are logged.
    pub user_data_log: UserDataLogConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            dialect: CookieDialect::Rfc6265,
            legacy: LegacyConfig::default(),
            same_site: None,
            partitioned: false,
            user_data_log: UserDataLogConfig::default(),
        }
    }
}

/// The two cookie dialects a [`Processor`] can speak.
///
/// [`Processor`]: crate::Processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CookieDialect {
    /// Netscape (version 0) and RFC 2109 (version 1) cookies, with
    /// `$Version`, `$Path` and `$Domain` pseudo-attributes.
    ///
    /// Cookie headers are decoded as ISO-8859-1.
    Legacy,
    /// The flat `name=value` grammar of [RFC 6265](https://www.rfc-editor.org/rfc/rfc6265).
    ///
    /// Lenient when parsing, strict when generating.
    /// Cookie headers are decoded as UTF-8.
    #[default]
    Rfc6265,
}

/// Options of the [`CookieDialect::Legacy`] dialect.
///
/// The defaults follow RFC 2109 closely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LegacyConfig {
    /// Accept `=` inside unquoted cookie values (`a=b=c` is `a` → `b=c`).
    ///
    /// Defaults to `false`.
    pub allow_equals_in_value: bool,
    /// Keep cookies that have a name but no value.
    ///
    /// Defaults to `false`.
    pub allow_name_only: bool,
    /// Only the `,`, `;` and whitespace separators end the value of a
    /// version 0 cookie, rather than the full set of HTTP separators.
    ///
    /// Defaults to `false`.
    pub allow_http_separators_in_v0: bool,
    /// Treat `/` as a separator. Values that contain it are quoted on the
    /// way out, which upgrades the cookie to version 1, and an unquoted
    /// `$Path=/app` is rejected on the way in.
    ///
    /// Defaults to `false`.
    pub forward_slash_is_separator: bool,
    /// Send `Expires` alongside `Max-Age` for version 1 cookies too.
    ///
    /// Defaults to `true`.
    pub always_add_expires: bool,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        LegacyConfig {
            allow_equals_in_value: false,
            allow_name_only: false,
            allow_http_separators_in_v0: false,
            forward_slash_is_separator: false,
            always_add_expires: true,
        }
    }
}
