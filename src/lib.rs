//! Server-side HTTP cookie handling, in the two dialects browsers and
//! legacy clients actually speak.
//!
//! # Overview
//!
//! `amaretti` parses the `Cookie` headers of incoming requests and generates
//! the `Set-Cookie` headers of outgoing responses.
//!
//! It has support for:
//!
//! - Parsing cookies into a recyclable collection, via [`ServerCookies`]
//! - Building cookies for outgoing responses, via [`ResponseCookie`]
//! - Two dialects, picked through [`ProcessorConfig`]: the legacy
//!   Netscape/RFC 2109 rules (with `$Version`, `$Path` and `$Domain`) and
//!   RFC 6265
//! - Server-side DIGEST authentication with replay protection, in the
//!   [`digest`] module (behind the `digest` feature, enabled by default)
//!
//! In particular:
//!
//! - Parsing is lenient: a malformed cookie is logged and skipped, the rest of
//!   the header is still processed
//! - Generating is strict: a cookie that can't be represented in the chosen
//!   dialect is rejected rather than silently mangled
//! - A [`ServerCookies`] collection keeps its buffers across requests, so a
//!   warmed-up server parses cookies without allocating
//!
//! # Non-goals
//!
//! `amaretti` doesn't handle cookies on the client side: it never parses
//! `Set-Cookie` headers, and it doesn't keep a cookie jar.
//!
//! # Quickstart
//!
//! ## Incoming cookies
//!
//! ```rust
//! use amaretti::{MimeHeaders, Processor, ProcessorConfig, ServerCookies};
//!
//! // Start by creating a `Processor` from a `ProcessorConfig`.
//! // It determines the dialect used to parse and generate cookies.
//! let processor: Processor = ProcessorConfig::default().into();
//!
//! // Cookies are parsed into a `ServerCookies` collection, which can be reused
//! // across requests.
//! let mut cookies = ServerCookies::new(4);
//!
//! let mut headers = MimeHeaders::new();
//! headers.add_value("Cookie", b"session=abc; theme=\"dark\"").unwrap();
//! processor.parse_cookie_header(&headers, &mut cookies).unwrap();
//!
//! assert_eq!(cookies.cookie_count(), 2);
//! assert_eq!(cookies.find("theme").unwrap().value(), "dark");
//!
//! // Once the request is done, clear the collection for the next one.
//! cookies.recycle();
//! assert!(cookies.is_empty());
//! ```
//!
//! ## Outgoing cookies
//!
//! ```rust
//! use amaretti::{Processor, ProcessorConfig, RemovalCookie, ResponseCookie};
//!
//! let processor: Processor = ProcessorConfig::default().into();
//!
//! let cookie = ResponseCookie::new("session", "abc")
//!     .set_path("/")
//!     .set_http_only(true);
//! assert_eq!(
//!     processor.generate_header(&cookie).unwrap(),
//!     "session=abc; Path=/; HttpOnly"
//! );
//!
//! // A removal cookie has an empty value and expires immediately.
//! let removal: ResponseCookie = RemovalCookie::new("session").into();
//! assert_eq!(
//!     processor.generate_header(&removal).unwrap(),
//!     "session=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:10 GMT"
//! );
//! ```
//!
//! # Logging
//!
//! Problems with the cookies sent by clients are reported through the
//! [`log`](https://docs.rs/log) facade. How loudly, and how often, is
//! controlled by [`config::UserDataLogConfig`].
//!
//! [`digest`]: crate::digest

mod charset;
pub mod config;
mod dates;
#[cfg(feature = "digest")]
pub mod digest;
mod legacy;
mod mime_headers;
mod processor;
mod removal;
mod response_cookie;
mod rfc6265;
mod same_site;
mod scanner;
mod server_cookie;
mod server_cookies;
mod table;
mod user_data_log;

pub use charset::Charset;
pub use config::ProcessorConfig;
pub use legacy::LegacyCookieProcessor;
pub use mime_headers::{HeaderValues, MimeHeaders};
pub use processor::{CookieProcessor, Processor};
pub use removal::RemovalCookie;
pub use response_cookie::{Attributes, ResponseCookie};
pub use rfc6265::Rfc6265CookieProcessor;
pub use same_site::SameSite;
pub use server_cookie::ServerCookie;
pub use server_cookies::ServerCookies;
pub use time;

/// Errors that can occur when using `amaretti`.
pub mod errors {
    #[cfg(feature = "digest")]
    pub use crate::digest::DigestError;
    pub use crate::mime_headers::HeaderLimitError;
    pub use crate::processor::{GenerateError, ParseError};
    pub use crate::same_site::InvalidSameSiteError;
    pub use crate::server_cookies::CookieLimitError;
}
