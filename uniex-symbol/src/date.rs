use crate::error::SymbolError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Derivative expiry date encodings observed across exchange identifiers.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `260327` - unified expiry form.
    Yymmdd,
    /// `27MAR26` - Deribit-style, always a two digit day.
    Ddmmmyy,
    /// `20260327`.
    Yyyymmdd,
}

impl DateFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::Yymmdd => "yymmdd",
            DateFormat::Ddmmmyy => "ddmmmyy",
            DateFormat::Yyyymmdd => "yyyymmdd",
        }
    }
}

impl Display for DateFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Frozen month-name table used by the `ddmmmyy` encoding.
const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Two-digit year pivot: `26` -> `2026`, `99` -> `1999`.
const CENTURY_PIVOT: u16 = 70;

/// Date components shared by every [`DateFormat`]. Year is held as two digits.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct DateParts {
    yy: u16,
    mm: u8,
    dd: u8,
}

/// Convert an expiry date between two [`DateFormat`] encodings.
///
/// Conversion is involutive for every format pair: converting there and back yields the
/// original input.
pub fn convert_date(date: &str, from: DateFormat, to: DateFormat) -> Result<String, SymbolError> {
    let parts = split_date(date, from)?;
    Ok(format_date(parts, to))
}

fn invalid(date: &str, format: DateFormat) -> SymbolError {
    SymbolError::InvalidDate {
        date: date.to_string(),
        format: format.as_str(),
    }
}

fn split_date(date: &str, format: DateFormat) -> Result<DateParts, SymbolError> {
    let err = || invalid(date, format);

    let parts = match format {
        DateFormat::Yymmdd => {
            if date.len() != 6 || !date.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(err());
            }
            DateParts {
                yy: date[0..2].parse().map_err(|_| err())?,
                mm: date[2..4].parse().map_err(|_| err())?,
                dd: date[4..6].parse().map_err(|_| err())?,
            }
        }
        DateFormat::Yyyymmdd => {
            if date.len() != 8 || !date.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(err());
            }
            let year = date[0..4].parse::<u16>().map_err(|_| err())?;
            DateParts {
                yy: year % 100,
                mm: date[4..6].parse().map_err(|_| err())?,
                dd: date[6..8].parse().map_err(|_| err())?,
            }
        }
        DateFormat::Ddmmmyy => {
            // Lenient on a single digit day when parsing, strict two digits when formatting.
            let (day, rest) = match date.len() {
                7 => (&date[0..2], &date[2..]),
                6 => (&date[0..1], &date[1..]),
                _ => return Err(err()),
            };
            let month_name = rest[0..3].to_ascii_uppercase();
            let month_index = MONTHS
                .iter()
                .position(|month| *month == month_name)
                .ok_or_else(err)?;
            DateParts {
                yy: rest[3..5].parse().map_err(|_| err())?,
                mm: month_index as u8 + 1,
                dd: day.parse().map_err(|_| err())?,
            }
        }
    };

    if parts.mm == 0 || parts.mm > 12 || parts.dd == 0 || parts.dd > 31 {
        return Err(err());
    }

    Ok(parts)
}

fn format_date(parts: DateParts, format: DateFormat) -> String {
    match format {
        DateFormat::Yymmdd => format!("{:02}{:02}{:02}", parts.yy, parts.mm, parts.dd),
        DateFormat::Yyyymmdd => {
            let century = if parts.yy < CENTURY_PIVOT { 2000 } else { 1900 };
            format!(
                "{:04}{:02}{:02}",
                century + parts.yy,
                parts.mm,
                parts.dd
            )
        }
        DateFormat::Ddmmmyy => format!(
            "{:02}{}{:02}",
            parts.dd,
            MONTHS[parts.mm as usize - 1],
            parts.yy
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_date_literal_cases() {
        assert_eq!(
            convert_date("260112", DateFormat::Yymmdd, DateFormat::Ddmmmyy).unwrap(),
            "12JAN26"
        );
        assert_eq!(
            convert_date("27MAR26", DateFormat::Ddmmmyy, DateFormat::Yymmdd).unwrap(),
            "260327"
        );
        assert_eq!(
            convert_date("260327", DateFormat::Yymmdd, DateFormat::Yyyymmdd).unwrap(),
            "20260327"
        );
        assert_eq!(
            convert_date("990101", DateFormat::Yymmdd, DateFormat::Yyyymmdd).unwrap(),
            "19990101"
        );
    }

    #[test]
    fn test_convert_date_involutive_pairs() {
        let formats = [DateFormat::Yymmdd, DateFormat::Ddmmmyy, DateFormat::Yyyymmdd];
        let dates = [
            ("260327", DateFormat::Yymmdd),
            ("041231", DateFormat::Yymmdd),
            ("12JAN26", DateFormat::Ddmmmyy),
            ("01FEB99", DateFormat::Ddmmmyy),
            ("20260327", DateFormat::Yyyymmdd),
        ];

        for (date, native) in dates {
            for target in formats {
                let there = convert_date(date, native, target).unwrap();
                let back = convert_date(&there, target, native).unwrap();
                assert_eq!(back, date, "{native} -> {target} -> {native} for {date}");
            }
        }
    }

    #[test]
    fn test_convert_date_single_digit_day_is_lenient() {
        assert_eq!(
            convert_date("4APR25", DateFormat::Ddmmmyy, DateFormat::Yymmdd).unwrap(),
            "250404"
        );
    }

    #[test]
    fn test_convert_date_rejects_malformed_input() {
        assert!(convert_date("26032", DateFormat::Yymmdd, DateFormat::Ddmmmyy).is_err());
        assert!(convert_date("271326", DateFormat::Yymmdd, DateFormat::Ddmmmyy).is_err());
        assert!(convert_date("12XXX26", DateFormat::Ddmmmyy, DateFormat::Yymmdd).is_err());
        assert!(convert_date("abcdef", DateFormat::Yymmdd, DateFormat::Yyyymmdd).is_err());
        assert!(convert_date("260100", DateFormat::Yymmdd, DateFormat::Ddmmmyy).is_err());
    }
}
