//! `Expires` attribute values.
use time::format_description::FormatItem;
use time::macros::{datetime, format_description};
use time::{Duration, OffsetDateTime};

/// `Wdy, DD Mon YYYY HH:MM:SS GMT`, from
/// [RFC 7231 section 7.1.1.1](https://datatracker.ietf.org/doc/html/rfc7231#section-7.1.1.1).
static IMF_FIXDATE: &[FormatItem<'_>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// `Wdy, DD-Mon-YYYY HH:MM:SS GMT`, the original Netscape cookie format.
static NETSCAPE: &[FormatItem<'_>] = format_description!(
    "[weekday repr:short], [day]-[month repr:short]-[year] [hour]:[minute]:[second] GMT"
);

/// RFC 6265 requires dates not to exceed 9999 years.
const MAX_DATETIME: OffsetDateTime = datetime!(9999-12-31 23:59:59 UTC);

/// Ten seconds after the epoch: a date every client treats as "already expired".
const ANCIENT: OffsetDateTime = datetime!(1970-01-01 00:00:10 UTC);

/// The `Expires` format used by a cookie processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateFormat {
    ImfFixdate,
    Netscape,
}

impl DateFormat {
    /// The sentinel date sent for cookies that must expire immediately.
    pub(crate) fn ancient_date(self) -> &'static str {
        match self {
            DateFormat::ImfFixdate => "Thu, 01 Jan 1970 00:00:10 GMT",
            DateFormat::Netscape => "Thu, 01-Jan-1970 00:00:10 GMT",
        }
    }

    /// The `Expires` value matching a `Max-Age` of `max_age`, counted from `now`.
    ///
    /// A zero `max_age` maps to [`DateFormat::ancient_date`].
    pub(crate) fn expires(
        self,
        now: OffsetDateTime,
        max_age: Duration,
    ) -> Result<String, time::error::Format> {
        if max_age.is_zero() {
            return Ok(self.ancient_date().to_string());
        }
        let expires = now
            .checked_add(max_age)
            .map_or(MAX_DATETIME, |t| t.min(MAX_DATETIME))
            .max(ANCIENT);
        self.format(expires)
    }

    fn format(self, time: OffsetDateTime) -> Result<String, time::error::Format> {
        let time = time.to_offset(time::UtcOffset::UTC);
        match self {
            DateFormat::ImfFixdate => time.format(&IMF_FIXDATE),
            DateFormat::Netscape => time.format(&NETSCAPE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancient_dates_match_their_format() {
        assert_eq!(
            DateFormat::ImfFixdate.format(ANCIENT).unwrap(),
            DateFormat::ImfFixdate.ancient_date()
        );
        assert_eq!(
            DateFormat::Netscape.format(ANCIENT).unwrap(),
            DateFormat::Netscape.ancient_date()
        );
    }

    #[test]
    fn expires_from_max_age() {
        let now = datetime!(2015-10-21 07:28:00 UTC);
        assert_eq!(
            DateFormat::ImfFixdate
                .expires(now, Duration::hours(1))
                .unwrap(),
            "Wed, 21 Oct 2015 08:28:00 GMT"
        );
        assert_eq!(
            DateFormat::Netscape.expires(now, Duration::hours(1)).unwrap(),
            "Wed, 21-Oct-2015 08:28:00 GMT"
        );
        assert_eq!(
            DateFormat::ImfFixdate.expires(now, Duration::ZERO).unwrap(),
            "Thu, 01 Jan 1970 00:00:10 GMT"
        );
    }

    #[test]
    fn expires_is_clamped() {
        let now = datetime!(2015-10-21 07:28:00 UTC);
        assert_eq!(
            DateFormat::ImfFixdate.expires(now, Duration::MAX).unwrap(),
            "Fri, 31 Dec 9999 23:59:59 GMT"
        );
        assert_eq!(
            DateFormat::ImfFixdate
                .expires(now, Duration::days(365 * 9000))
                .unwrap(),
            "Fri, 31 Dec 9999 23:59:59 GMT"
        );
    }
}
