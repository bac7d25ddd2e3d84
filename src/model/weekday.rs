// File: ./src/model/weekday.rs
// Weekday column -> ISO weekday code (Monday = 1 .. Sunday = 7)
use crate::model::item::WeekdaySpec;
use chrono::Weekday;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

const SPANISH_NAMES: [(&str, u8); 14] = [
    ("lunes", 1),
    ("lun", 1),
    ("martes", 2),
    ("mar", 2),
    ("miercoles", 3),
    ("mie", 3),
    ("jueves", 4),
    ("jue", 4),
    ("viernes", 5),
    ("vie", 5),
    ("sabado", 6),
    ("sab", 6),
    ("domingo", 7),
    ("dom", 7),
];

/// ISO weekday, always within 1..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IsoWeekday(u8);

impl IsoWeekday {
    pub fn new(code: u8) -> Option<Self> {
        (1..=7).contains(&code).then_some(Self(code))
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn to_chrono(self) -> Weekday {
        match self.0 {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum UnresolvedWeekday {
    Missing,
    Empty,
    OutOfRange(i64),
    UnknownName(String),
    /// Neither a number nor text, e.g. `true` or `2.5`.
    NotAWeekday(Value),
}

impl fmt::Display for UnresolvedWeekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no weekday given"),
            Self::Empty => write!(f, "weekday is blank"),
            Self::OutOfRange(n) => write!(f, "weekday number {} is outside 0-7", n),
            Self::UnknownName(s) => write!(f, "unknown weekday name {:?}", s),
            Self::NotAWeekday(v) => write!(f, "weekday value {} is not a day", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeekdayResolution {
    Resolved(IsoWeekday),
    Unresolved(UnresolvedWeekday),
}

impl WeekdayResolution {
    pub fn code(&self) -> Option<u8> {
        match self {
            Self::Resolved(w) => Some(w.code()),
            Self::Unresolved(_) => None,
        }
    }
}

pub fn resolve_weekday(spec: Option<&WeekdaySpec>) -> WeekdayResolution {
    match spec {
        None => WeekdayResolution::Unresolved(UnresolvedWeekday::Missing),
        Some(WeekdaySpec::Number(n)) => resolve_number(*n),
        Some(WeekdaySpec::Text(s)) => resolve_text(s),
        Some(WeekdaySpec::Other(v)) => {
            WeekdayResolution::Unresolved(UnresolvedWeekday::NotAWeekday(v.clone()))
        }
    }
}

fn resolve_number(n: i64) -> WeekdayResolution {
    // Sunday arrives as 0 from JS-style day numbering
    let code = if n == 0 { 7 } else { n };
    match u8::try_from(code).ok().and_then(IsoWeekday::new) {
        Some(w) => WeekdayResolution::Resolved(w),
        None => WeekdayResolution::Unresolved(UnresolvedWeekday::OutOfRange(n)),
    }
}

fn resolve_text(raw: &str) -> WeekdayResolution {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return WeekdayResolution::Unresolved(UnresolvedWeekday::Empty);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return resolve_number(n);
    }
    // "3.0" from a float column
    if let Ok(f) = trimmed.parse::<f64>()
        && f.is_finite()
        && f.fract() == 0.0
        && f.abs() <= i64::MAX as f64
    {
        return resolve_number(f as i64);
    }

    let key = fold_diacritics(&trimmed.to_lowercase());
    SPANISH_NAMES
        .iter()
        .find(|(name, _)| *name == key)
        .and_then(|(_, code)| IsoWeekday::new(*code))
        .map(WeekdayResolution::Resolved)
        .unwrap_or_else(|| WeekdayResolution::Unresolved(UnresolvedWeekday::UnknownName(raw.to_string())))
}

/// Strips the accents that occur in Spanish text (precomposed or combining).
fn fold_diacritics(s: &str) -> String {
    s.chars()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
