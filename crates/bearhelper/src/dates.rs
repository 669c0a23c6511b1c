//! Date formatting with user-facing Unicode patterns (`yyyy-MM-dd`, `EEEE, MMM d, yyyy`, ...).
//!
//! Patterns are translated once into chrono format strings. Every note title,
//! placeholder, and daily link uses the same [`DateFormat`], which is owned by
//! the helper context instead of being read from global state.

use chrono::{Days, NaiveDate, NaiveTime};

use crate::error::{HelperError, HelperResult};

pub const DEFAULT_DATE_PATTERN: &str = "yyyy-MM-dd";

/// Sentinel stored in settings when the user picked a custom pattern.
pub const CUSTOM_DATE_PATTERN: &str = "custom date format";

/// Patterns offered by the settings editor.
pub const STANDARD_DATE_PATTERNS: [&str; 6] = [
    "yyyy-MM-dd",
    "dd/MM/yyyy",
    "MM-dd-yyyy",
    "EEEE, MMM d, yyyy",
    "MMMM d, yyyy",
    "MMM d, yyyy",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
    strftime: String,
}

impl DateFormat {
    pub fn new(pattern: &str) -> HelperResult<Self> {
        if pattern.trim().is_empty() {
            return Err(HelperError::InvalidInput("date pattern is empty".to_string()));
        }
        let strftime = translate_pattern(pattern)?;
        Ok(Self {
            pattern: pattern.to_string(),
            strftime,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, date: NaiveDate) -> String {
        // Formatting through a datetime keeps time fields in custom patterns from failing.
        date.and_time(NaiveTime::MIN)
            .format(&self.strftime)
            .to_string()
    }

    pub fn parse(&self, text: &str) -> HelperResult<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), &self.strftime).map_err(|error| {
            HelperError::InvalidInput(format!(
                "'{text}' does not match date pattern '{}': {error}",
                self.pattern
            ))
        })
    }

    /// Formats `anchor` shifted by `days` calendar days.
    pub fn format_offset(&self, anchor: NaiveDate, days: i64) -> Option<String> {
        shift_days(anchor, days).map(|date| self.format(date))
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_PATTERN.to_string(),
            strftime: "%Y-%m-%d".to_string(),
        }
    }
}

/// Calendar-aware day arithmetic. `None` when the result leaves chrono's range.
pub fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

fn translate_pattern(pattern: &str) -> HelperResult<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut index = 0;

    while index < chars.len() {
        let current = chars[index];

        if current == '\'' {
            // '' is an escaped quote, otherwise a quoted literal runs to the next quote.
            if chars.get(index + 1) == Some(&'\'') {
                out.push('\'');
                index += 2;
                continue;
            }
            index += 1;
            while index < chars.len() {
                if chars[index] == '\'' {
                    if chars.get(index + 1) == Some(&'\'') {
                        out.push('\'');
                        index += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[index]);
                index += 1;
            }
            index += 1;
            continue;
        }

        if current.is_ascii_alphabetic() {
            let mut count = 1;
            while chars.get(index + count) == Some(&current) {
                count += 1;
            }
            out.push_str(chrono_field(current, count).ok_or_else(|| {
                HelperError::InvalidInput(format!(
                    "unsupported date pattern field '{}' in '{pattern}'",
                    current.to_string().repeat(count)
                ))
            })?);
            index += count;
            continue;
        }

        push_literal(&mut out, current);
        index += 1;
    }

    Ok(out)
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '%' {
        out.push_str("%%");
    } else {
        out.push(ch);
    }
}

fn chrono_field(letter: char, count: usize) -> Option<&'static str> {
    let field = match (letter, count) {
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M' | 'L', 1) => "%-m",
        ('M' | 'L', 2) => "%m",
        ('M' | 'L', 3) => "%b",
        ('M' | 'L', _) => "%B",
        ('d', 1) => "%-d",
        ('d', 2) => "%d",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('H', 1) => "%-H",
        ('H', 2) => "%H",
        ('h', 1) => "%-I",
        ('h', 2) => "%I",
        ('m', 1) => "%-M",
        ('m', 2) => "%M",
        ('s', 1) => "%-S",
        ('s', 2) => "%S",
        ('a', 1) => "%p",
        _ => return None,
    };
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn default_pattern_formats_iso() {
        let format = DateFormat::default();
        assert_eq!(format.format(date(2024, 3, 7)), "2024-03-07");
        assert_eq!(format, DateFormat::new(DEFAULT_DATE_PATTERN).expect("pattern"));
    }

    #[test]
    fn standard_patterns_round_trip() {
        let day = date(2024, 1, 31);
        for pattern in STANDARD_DATE_PATTERNS {
            let format = DateFormat::new(pattern).expect("pattern");
            let text = format.format(day);
            assert_eq!(format.parse(&text).expect("parse"), day, "pattern {pattern}");
        }
    }

    #[test]
    fn long_pattern_renders_names() {
        let format = DateFormat::new("EEEE, MMM d, yyyy").expect("pattern");
        assert_eq!(format.format(date(2024, 1, 31)), "Wednesday, Jan 31, 2024");
        let format = DateFormat::new("MMMM d, yyyy").expect("pattern");
        assert_eq!(format.format(date(2024, 2, 5)), "February 5, 2024");
    }

    #[test]
    fn quoted_literals_and_percent_are_kept() {
        let format = DateFormat::new("'Week of' yyyy.MM.dd '100%'").expect("pattern");
        assert_eq!(format.format(date(2024, 6, 1)), "Week of 2024.06.01 100%");
    }

    #[test]
    fn unsupported_field_is_rejected() {
        let err = DateFormat::new("yyyy-QQ").expect_err("Q is unsupported");
        assert!(matches!(err, HelperError::InvalidInput(_)));
        assert!(DateFormat::new("  ").is_err());
    }

    #[test]
    fn parse_rejects_mismatched_text() {
        let format = DateFormat::default();
        assert!(format.parse("31/01/2024").is_err());
        assert!(format.parse("not a date").is_err());
    }

    #[test]
    fn shift_days_rolls_months_and_years() {
        assert_eq!(shift_days(date(2024, 1, 31), 1), Some(date(2024, 2, 1)));
        assert_eq!(shift_days(date(2024, 2, 28), 1), Some(date(2024, 2, 29)));
        assert_eq!(shift_days(date(2024, 1, 1), -1), Some(date(2023, 12, 31)));
        assert_eq!(shift_days(date(2023, 12, 31), 366), Some(date(2024, 12, 31)));
        assert_eq!(shift_days(date(2024, 5, 5), 0), Some(date(2024, 5, 5)));
        assert_eq!(shift_days(NaiveDate::MAX, 1), None);
    }
}
