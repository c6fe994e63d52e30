//! Conversion of NTP timestamps to calendar time
//!
//! NTP counts seconds from 1900-01-01 in an unsigned 32-bit field that wraps
//! on 2036-02-07. Values with the top bit clear are read as belonging to the
//! second era, which keeps decoding correct until 2104.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};

use crate::core::{Error, Result};
use crate::protocol::NtpTimestamp;

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970)
pub const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

const ERA_SECONDS: i64 = 1 << 32;

/// Converts the whole seconds of `ts` to seconds since the Unix epoch
pub fn unix_seconds(ts: &NtpTimestamp) -> i64 {
    let mut seconds = i64::from(ts.seconds);
    if ts.seconds & 0x8000_0000 == 0 {
        seconds += ERA_SECONDS;
    }
    seconds - NTP_UNIX_OFFSET
}

/// Converts a seconds field as found on the wire
pub fn unix_seconds_from_be(field: [u8; 4]) -> i64 {
    unix_seconds(&NtpTimestamp::new(u32::from_be_bytes(field), 0))
}

/// The fractional part of `ts` in nanoseconds
pub fn fraction_nanos(ts: &NtpTimestamp) -> u32 {
    ((u64::from(ts.fraction) * 1_000_000_000) >> 32) as u32
}

/// Converts `ts` to a UTC date and time
pub fn to_datetime(ts: &NtpTimestamp) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(unix_seconds(ts), fraction_nanos(ts))
        .single()
        .ok_or_else(|| Error::malformed(format!("timestamp {:?} is out of range", ts)))
}

/// Output style for a decoded timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeFormat {
    /// `Mon Jan  1 00:00:00 2024` in local time
    #[default]
    Ctime,
    /// RFC 3339 in UTC
    Rfc3339,
    /// Unix seconds with nanoseconds
    Unix,
}

impl FromStr for TimeFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ctime" => Ok(TimeFormat::Ctime),
            "rfc3339" => Ok(TimeFormat::Rfc3339),
            "unix" => Ok(TimeFormat::Unix),
            other => Err(Error::config(format!(
                "unknown time format {:?} (expected ctime, rfc3339 or unix)",
                other
            ))),
        }
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeFormat::Ctime => "ctime",
            TimeFormat::Rfc3339 => "rfc3339",
            TimeFormat::Unix => "unix",
        };
        f.write_str(name)
    }
}

/// Formats a date the way C's `ctime` does, without the trailing newline
pub fn format_ctime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    dt.format("%a %b %e %H:%M:%S %Y").to_string()
}

/// Renders `ts` as a single line of text
pub fn render(ts: &NtpTimestamp, format: TimeFormat) -> Result<String> {
    let dt = to_datetime(ts)?;
    Ok(match format {
        TimeFormat::Ctime => format_ctime(&dt.with_timezone(&Local)),
        TimeFormat::Rfc3339 => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        TimeFormat::Unix => format!("{}.{:09}", unix_seconds(ts), fraction_nanos(ts)),
    })
}
