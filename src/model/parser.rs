// File: ./src/model/parser.rs
// Date and time-of-day text -> local calendar values
use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// The two date shapes the retrieval layer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `YYYY-MM-DD`
    Iso,
    /// `DD/MM/YYYY`
    DayMonthYear,
}

impl DateFormat {
    /// Picks the shape from the separator alone. No locale guessing.
    pub fn detect(text: &str) -> Option<Self> {
        let dashes = text.matches('-').count();
        let slashes = text.matches('/').count();
        match (dashes, slashes) {
            (2, 0) => Some(DateFormat::Iso),
            (0, 2) => Some(DateFormat::DayMonthYear),
            _ => None,
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            DateFormat::Iso => "%Y-%m-%d",
            DateFormat::DayMonthYear => "%d/%m/%Y",
        }
    }

    /// Byte offsets of the two separators in the zero-padded, 10-byte form.
    fn separators(self) -> (usize, usize, u8) {
        match self {
            DateFormat::Iso => (4, 7, b'-'),
            DateFormat::DayMonthYear => (2, 5, b'/'),
        }
    }

    /// Exactly `DDDD-DD-DD` or `DD/DD/DDDD`. chrono alone also accepts unpadded fields.
    fn matches_shape(self, text: &str) -> bool {
        let (first, second, sep) = self.separators();
        text.len() == 10
            && text.bytes().enumerate().all(|(i, b)| {
                if i == first || i == second {
                    b == sep
                } else {
                    b.is_ascii_digit()
                }
            })
    }
}

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY` as a plain calendar date.
pub fn parse_local_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    let format = DateFormat::detect(trimmed)
        .filter(|f| f.matches_shape(trimmed))
        .ok_or_else(|| Error::unsupported("date", text))?;

    NaiveDate::parse_from_str(trimmed, format.pattern()).map_err(|_| Error::unsupported("date", text))
}

/// `HH:MM` or `HH:MM:SS`. Seconds default to zero.
pub fn parse_time_of_day(text: &str) -> Result<NaiveTime> {
    let trimmed = text.trim();
    let pattern = match trimmed.matches(':').count() {
        1 => "%H:%M",
        2 => "%H:%M:%S",
        _ => return Err(Error::unsupported("time", text)),
    };
    NaiveTime::parse_from_str(trimmed, pattern).map_err(|_| Error::unsupported("time", text))
}

/// Local wall-clock instant. No offset is attached, so the host timezone never shifts the date.
pub fn combine_local(date: NaiveDate, time_text: &str) -> Result<NaiveDateTime> {
    Ok(date.and_time(parse_time_of_day(time_text)?))
}

pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
