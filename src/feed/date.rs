//! Publish date normalization.
//!
//! RSS feeds encode `pubDate` in many slightly different ways. A raw date is
//! tried against a fixed, ordered list of layouts and the first match wins.
//! Anything else (including the empty string) resolves to the current time,
//! and the result records that it is a fallback so the caller can report it.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc, Weekday};

/// A known publish date layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `Mon, 02 Jan 2006 15:04:05 -0700`
    Rfc1123Z,
    /// `Mon, 02 Jan 2006 15:04:05 MST`
    Rfc1123,
    /// `02 Jan 06 15:04 -0700`
    Rfc822Z,
    /// `02 Jan 06 15:04 MST`
    Rfc822,
    /// `2006-01-02T15:04:05Z07:00`
    Iso8601,
    /// `2006-01-02T15:04:05.000Z07:00`
    Iso8601Fractional,
    /// `Mon, 2 Jan 2006 15:04:05 -0700`
    RssUnpaddedDay,
    /// `2 Jan 2006 15:04:05 -0700`
    RssNoWeekday,
}

/// Layouts in the order they are attempted.
pub const LAYOUTS: [DateLayout; 8] = [
    DateLayout::Rfc1123Z,
    DateLayout::Rfc1123,
    DateLayout::Rfc822Z,
    DateLayout::Rfc822,
    DateLayout::Iso8601,
    DateLayout::Iso8601Fractional,
    DateLayout::RssUnpaddedDay,
    DateLayout::RssNoWeekday,
];

impl DateLayout {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            DateLayout::Rfc1123Z => "RFC1123Z",
            DateLayout::Rfc1123 => "RFC1123",
            DateLayout::Rfc822Z => "RFC822Z",
            DateLayout::Rfc822 => "RFC822",
            DateLayout::Iso8601 => "ISO8601",
            DateLayout::Iso8601Fractional => "ISO8601 (fractional)",
            DateLayout::RssUnpaddedDay => "RSS (unpadded day)",
            DateLayout::RssNoWeekday => "RSS (no weekday)",
        }
    }

    /// Try to parse `s` with this layout.
    pub fn parse(&self, s: &str) -> Option<DateTime<Utc>> {
        let parsed = match self {
            DateLayout::Rfc1123Z => {
                let rest = strip_weekday(s)?;
                require_padded_day(rest)?;
                DateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S %z").ok()?
            }
            DateLayout::Rfc1123 => {
                let rest = strip_weekday(s)?;
                require_padded_day(rest)?;
                parse_with_zone_name(rest, "%d %b %Y %H:%M:%S")?
            }
            DateLayout::Rfc822Z => {
                require_padded_day(s)?;
                DateTime::parse_from_str(s, "%d %b %y %H:%M %z").ok()?
            }
            DateLayout::Rfc822 => {
                require_padded_day(s)?;
                parse_with_zone_name(s, "%d %b %y %H:%M")?
            }
            DateLayout::Iso8601 => {
                if !is_iso_shape(s) || s.contains('.') {
                    return None;
                }
                DateTime::parse_from_rfc3339(s).ok()?
            }
            DateLayout::Iso8601Fractional => {
                if !is_iso_shape(s) || !s.contains('.') {
                    return None;
                }
                DateTime::parse_from_rfc3339(s).ok()?
            }
            DateLayout::RssUnpaddedDay => {
                let rest = strip_weekday(s)?;
                DateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S %z").ok()?
            }
            DateLayout::RssNoWeekday => DateTime::parse_from_str(s, "%d %b %Y %H:%M:%S %z").ok()?,
        };
        Some(parsed.with_timezone(&Utc))
    }
}

/// A normalized publish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishedAt {
    instant: DateTime<Utc>,
    layout: Option<DateLayout>,
}

impl PublishedAt {
    /// The absolute time.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// The layout that matched, or `None` on fallback.
    pub fn layout(&self) -> Option<DateLayout> {
        self.layout
    }

    /// Whether the source date was unusable and the current time was used.
    pub fn is_fallback(&self) -> bool {
        self.layout.is_none()
    }
}

/// Parse a raw date against the known layouts, without fallback.
pub fn parse_published_at(raw: &str) -> Option<(DateTime<Utc>, DateLayout)> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(s).map(|dt| (dt, *layout)))
}

/// Normalize a raw publish date.
///
/// Never fails: an empty or unrecognized string yields the current time with
/// [`PublishedAt::is_fallback`] set.
pub fn normalize(raw: &str) -> PublishedAt {
    match parse_published_at(raw) {
        Some((instant, layout)) => PublishedAt {
            instant,
            layout: Some(layout),
        },
        None => PublishedAt {
            instant: Utc::now(),
            layout: None,
        },
    }
}

/// Strip a leading `Mon, ` and return the rest.
///
/// The weekday must be a valid three-letter name. It is not checked against
/// the date.
fn strip_weekday(s: &str) -> Option<&str> {
    let (day, rest) = s.split_once(", ")?;
    if day.len() != 3 || Weekday::from_str(day).is_err() {
        return None;
    }
    Some(rest)
}

fn require_padded_day(s: &str) -> Option<()> {
    let day = s.split(' ').next()?;
    if day.len() == 2 && day.bytes().all(|b| b.is_ascii_digit()) {
        Some(())
    } else {
        None
    }
}

fn is_iso_shape(s: &str) -> bool {
    s.as_bytes().get(10) == Some(&b'T')
}

/// Parse `<datetime> <ZONE>` where ZONE is an alphabetic abbreviation.
fn parse_with_zone_name(s: &str, format: &str) -> Option<DateTime<FixedOffset>> {
    let (body, zone) = s.rsplit_once(' ')?;
    let offset = zone_offset(zone)?;
    let naive = NaiveDateTime::parse_from_str(body, format).ok()?;
    offset.from_local_datetime(&naive).single()
}

/// Offset for an RFC 822 zone name.
///
/// Unknown alphabetic abbreviations are read as UTC.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    if zone.is_empty() || zone.len() > 5 || !zone.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let hours = match zone {
        "UT" | "UTC" | "GMT" | "Z" => 0,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ => 0,
    };
    FixedOffset::east_opt(hours * 3600)
}
