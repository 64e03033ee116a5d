//! Typed value readers which are layered on top of the string and number readers

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::*;

/// Number of fraction digits which can be represented with nanosecond precision
const MAX_FRACTION_DIGITS: usize = 9;

// Implementation with typed number readers
impl<S: CharSource> JsonStreamReader<S> {
    fn read_number_parsed<T: FromStr>(&mut self) -> Result<T, ReaderError> {
        let start = self.read_number_to_buf()?;
        let text = self.value_buf();
        text.parse().map_err(|_| ReaderError::MalformedNumber {
            text: text.to_owned(),
            position: start,
        })
    }

    /// Consumes a JSON number as `i64`
    ///
    /// Fails with [`ReaderError::MalformedNumber`] if the number has a fraction or exponent
    /// part, or if it does not fit into an `i64`.
    pub fn read_i64(&mut self) -> Result<i64, ReaderError> {
        self.read_number_parsed()
    }

    /// Consumes a JSON number as `u64`
    ///
    /// Fails with [`ReaderError::MalformedNumber`] if the number is negative, has a fraction
    /// or exponent part, or does not fit into a `u64`. Negative zero such as `-0` is read
    /// as `0`.
    pub fn read_u64(&mut self) -> Result<u64, ReaderError> {
        let start = self.read_number_to_buf()?;
        let text = self.value_buf();
        let unsigned = match text.strip_prefix('-') {
            Some(digits) if digits.bytes().all(|b| b == b'0') => digits,
            _ => text,
        };
        unsigned.parse().map_err(|_| ReaderError::MalformedNumber {
            text: text.to_owned(),
            position: start,
        })
    }

    /// Consumes a JSON number as `f64`
    ///
    /// The number is rounded to the nearest representable value. Numbers whose magnitude is
    /// too large for an `f64`, such as `1e400`, cause a [`ReaderError::MalformedNumber`].
    pub fn read_double(&mut self) -> Result<f64, ReaderError> {
        let start = self.read_number_to_buf()?;
        let text = self.value_buf();
        match f64::from_str(text) {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ReaderError::MalformedNumber {
                text: text.to_owned(),
                position: start,
            }),
        }
    }

    /// Consumes a JSON number as [`Decimal`]
    ///
    /// Exponent notation such as `1.5e3` is supported. Fraction digits beyond the precision
    /// of `Decimal` are rounded, regardless of whether the number uses exponent notation, so
    /// `1e-30` is read as zero. Numbers which exceed the range of `Decimal` cause a
    /// [`ReaderError::MalformedNumber`].
    ///
    /// # Examples
    /// ```
    /// # use pulson::reader::*;
    /// # use rust_decimal::Decimal;
    /// let mut json_reader = JsonStreamReader::from_text("[0.1, 2.5E-1]");
    /// let values = json_reader.read_array(|json_reader| json_reader.read_decimal())?;
    /// assert_eq!(vec![Decimal::new(1, 1), Decimal::new(25, 2)], values);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_decimal(&mut self) -> Result<Decimal, ReaderError> {
        let start = self.read_number_to_buf()?;
        let text = self.value_buf();
        let result = if text.contains(['e', 'E']) {
            expand_exponent(text).and_then(|plain| Decimal::from_str(&plain).ok())
        } else {
            Decimal::from_str(text).ok()
        };
        result.ok_or_else(|| ReaderError::MalformedNumber {
            text: text.to_owned(),
            position: start,
        })
    }
}

/// Largest distance of the decimal point from the significant digits for which exponent
/// notation is expanded; beyond that the value is either zero or out of `Decimal` range
const MAX_EXPANDED_EXPONENT: i64 = 40;

/// Rewrites a valid JSON number in exponent notation as plain decimal text
///
/// Returns `None` if the value is too large for a `Decimal`.
fn expand_exponent(text: &str) -> Option<String> {
    let (mantissa, exponent) = text.split_once(['e', 'E'])?;
    let exponent = exponent.strip_prefix('+').unwrap_or(exponent);
    // Saturate so that absurdly long exponents are still classified as too large or zero
    let exponent = exponent.parse::<i64>().unwrap_or(if exponent.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    });

    let (negative, mantissa) = match mantissa.strip_prefix('-') {
        Some(mantissa) => (true, mantissa),
        None => (false, mantissa),
    };
    let (int_digits, frac_digits) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{int_digits}{frac_digits}");
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Some("0".to_owned());
    }
    let leading_zeros = (digits.len() - significant.len()) as i64;
    // Position of the decimal point relative to the start of `significant`
    let point = (int_digits.len() as i64 - leading_zeros).saturating_add(exponent);

    if point > MAX_EXPANDED_EXPONENT {
        return None;
    }
    if point < -MAX_EXPANDED_EXPONENT {
        return Some("0".to_owned());
    }

    let mut plain = String::with_capacity(significant.len() + MAX_EXPANDED_EXPONENT as usize);
    if negative {
        plain.push('-');
    }
    let significant_len = significant.len() as i64;
    if point <= 0 {
        plain.push_str("0.");
        plain.push_str(&"0".repeat(-point as usize));
        plain.push_str(significant);
    } else if point >= significant_len {
        plain.push_str(significant);
        plain.push_str(&"0".repeat((point - significant_len) as usize));
    } else {
        let (int_part, frac_part) = significant.split_at(point as usize);
        plain.push_str(int_part);
        plain.push('.');
        plain.push_str(frac_part);
    }
    Some(plain)
}

/// Whether `text` is a GUID in the form `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`
fn is_canonical_guid(text: &str) -> bool {
    text.len() == 36
        && text.bytes().enumerate().all(|(index, b)| match index {
            8 | 13 | 18 | 23 => b == b'-',
            _ => b.is_ascii_hexdigit(),
        })
}

// Implementation with readers for values encoded as JSON strings
impl<S: CharSource> JsonStreamReader<S> {
    /// Consumes a JSON string containing a GUID
    ///
    /// Only the canonical hyphenated form `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` of hex digits
    /// is supported, in lower or upper case; other forms, for example with braces, cause a
    /// [`ReaderError::MalformedGuid`].
    pub fn read_guid(&mut self) -> Result<Uuid, ReaderError> {
        let start = self.read_string_to_buf()?;
        let text = self.value_buf();
        let malformed = || ReaderError::MalformedGuid {
            text: text.to_owned(),
            position: start,
        };

        if !is_canonical_guid(text) {
            return Err(malformed());
        }
        Uuid::parse_str(text).map_err(|_| malformed())
    }

    /// Consumes a JSON string containing an ISO 8601 date and time
    ///
    /// The expected format is `YYYY-MM-DDTHH:MM:SS[.fraction]`. If the value has a UTC offset,
    /// either `Z` or numeric such as `+02:00`, it is converted to UTC and the offset is
    /// discarded; use [`read_datetime_offset`](Self::read_datetime_offset) to preserve it.
    ///
    /// # Examples
    /// ```
    /// # use pulson::reader::*;
    /// let mut json_reader = JsonStreamReader::from_text(r#""2024-03-01T12:30:00+02:00""#);
    /// let datetime = json_reader.read_datetime()?;
    /// assert_eq!("2024-03-01 10:30:00", datetime.to_string());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_datetime(&mut self) -> Result<NaiveDateTime, ReaderError> {
        let start = self.read_string_to_buf()?;
        let text = self.value_buf();
        NaiveDateTime::from_str(text)
            .or_else(|_| DateTime::parse_from_rfc3339(text).map(|datetime| datetime.naive_utc()))
            .map_err(|_| ReaderError::MalformedTemporalValue {
                text: text.to_owned(),
                position: start,
            })
    }

    /// Consumes a JSON string containing an RFC 3339 date and time with UTC offset
    pub fn read_datetime_offset(&mut self) -> Result<DateTime<FixedOffset>, ReaderError> {
        let start = self.read_string_to_buf()?;
        let text = self.value_buf();
        DateTime::parse_from_rfc3339(text).map_err(|_| ReaderError::MalformedTemporalValue {
            text: text.to_owned(),
            position: start,
        })
    }

    /// Consumes a JSON string containing a duration
    ///
    /// Two formats are supported:
    /// - `[-][d.]hh:mm:ss[.fraction]`, for example `1.02:03:04.5` for 1 day, 2 hours,
    ///   3 minutes and 4.5 seconds
    /// - ISO 8601 `[-]P[nD][T[nH][nM][n[.fraction]S]]`, for example `P1DT2H3M4.5S`; years
    ///   and months are not supported because their length varies
    ///
    /// The fraction may have at most 9 digits (nanosecond precision).
    pub fn read_duration(&mut self) -> Result<TimeDelta, ReaderError> {
        let start = self.read_string_to_buf()?;
        let text = self.value_buf();
        parse_duration(text).ok_or_else(|| ReaderError::MalformedTemporalValue {
            text: text.to_owned(),
            position: start,
        })
    }
}

// Implementation with nullable variants of the scalar readers
impl<S: CharSource> JsonStreamReader<S> {
    duplicate::duplicate! {
        [
            nullable_method         method                  value_type                  doc_text;
            [read_nullable_string]  [read_string]           [String]                    ["Nullable variant of [`read_string`](Self::read_string)"];
            [read_nullable_number_text] [read_number_text]  [String]                    ["Nullable variant of [`read_number_text`](Self::read_number_text)"];
            [read_nullable_bool]    [read_bool]             [bool]                      ["Nullable variant of [`read_bool`](Self::read_bool)"];
            [read_nullable_i64]     [read_i64]              [i64]                       ["Nullable variant of [`read_i64`](Self::read_i64)"];
            [read_nullable_u64]     [read_u64]              [u64]                       ["Nullable variant of [`read_u64`](Self::read_u64)"];
            [read_nullable_double]  [read_double]           [f64]                       ["Nullable variant of [`read_double`](Self::read_double)"];
            [read_nullable_decimal] [read_decimal]          [Decimal]                   ["Nullable variant of [`read_decimal`](Self::read_decimal)"];
            [read_nullable_guid]    [read_guid]             [Uuid]                      ["Nullable variant of [`read_guid`](Self::read_guid)"];
            [read_nullable_datetime] [read_datetime]        [NaiveDateTime]             ["Nullable variant of [`read_datetime`](Self::read_datetime)"];
            [read_nullable_datetime_offset] [read_datetime_offset] [DateTime<FixedOffset>] ["Nullable variant of [`read_datetime_offset`](Self::read_datetime_offset)"];
            [read_nullable_duration] [read_duration]        [TimeDelta]                 ["Nullable variant of [`read_duration`](Self::read_duration)"];
        ]
        #[doc = doc_text]
        ///
        /// Returns `None` if the next value is JSON null.
        pub fn nullable_method(&mut self) -> Result<Option<value_type>, ReaderError> {
            self.read_nullable(Self::method)
        }
    }
}

fn strip_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

/// Parses a non-empty sequence of ASCII digits
fn parse_digits(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Parses a component of a `hh:mm:ss` time, consisting of 1 or 2 digits
fn parse_time_component(text: &str, max: i64) -> Option<i64> {
    if text.len() > 2 {
        return None;
    }
    parse_digits(text).filter(|value| *value <= max)
}

/// Parses the digits of a decimal fraction as nanoseconds
fn parse_fraction_nanos(text: &str) -> Option<i64> {
    if text.len() > MAX_FRACTION_DIGITS {
        return None;
    }
    let value = parse_digits(text)?;
    Some(value * 10_i64.pow((MAX_FRACTION_DIGITS - text.len()) as u32))
}

/// Parses `seconds[.fraction]` as whole seconds and nanoseconds
fn parse_seconds(text: &str) -> Option<(&str, i64)> {
    match text.split_once('.') {
        Some((seconds, fraction)) => Some((seconds, parse_fraction_nanos(fraction)?)),
        None => Some((text, 0)),
    }
}

fn parse_duration(text: &str) -> Option<TimeDelta> {
    let (negative, unsigned) = strip_sign(text);
    let duration = if unsigned.starts_with('P') {
        parse_iso_duration(unsigned)?
    } else {
        parse_clock_duration(unsigned)?
    };
    Some(if negative { -duration } else { duration })
}

/// Parses `[d.]hh:mm:ss[.fraction]`
fn parse_clock_duration(text: &str) -> Option<TimeDelta> {
    let mut parts = text.split(':');
    let (days_hours, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (days, hours) = match days_hours.split_once('.') {
        Some((days, hours)) => (parse_digits(days)?, hours),
        None => (0, days_hours),
    };
    let hours = parse_time_component(hours, 23)?;
    let minutes = parse_time_component(minutes, 59)?;
    let (seconds, nanos) = parse_seconds(seconds)?;
    let seconds = parse_time_component(seconds, 59)?;

    TimeDelta::try_days(days)?
        .checked_add(&TimeDelta::try_hours(hours)?)?
        .checked_add(&TimeDelta::try_minutes(minutes)?)?
        .checked_add(&TimeDelta::try_seconds(seconds)?)?
        .checked_add(&TimeDelta::nanoseconds(nanos))
}

/// Parses `P[nD][T[nH][nM][n[.fraction]S]]`
fn parse_iso_duration(text: &str) -> Option<TimeDelta> {
    let text = text.strip_prefix('P')?;
    let (date_part, time_part) = match text.split_once('T') {
        Some((date_part, time_part)) => (date_part, Some(time_part)),
        None => (text, None),
    };

    let mut duration = TimeDelta::zero();
    let mut has_component = false;

    if !date_part.is_empty() {
        duration = TimeDelta::try_days(parse_digits(date_part.strip_suffix('D')?)?)?;
        has_component = true;
    }

    if let Some(mut time_part) = time_part {
        // `T` must be followed by at least one component
        if time_part.is_empty() {
            return None;
        }

        let units: [(char, fn(i64) -> Option<TimeDelta>); 2] =
            [('H', TimeDelta::try_hours), ('M', TimeDelta::try_minutes)];
        for (designator, to_delta) in units {
            if let Some((value, rest)) = time_part.split_once(designator) {
                duration = duration.checked_add(&to_delta(parse_digits(value)?)?)?;
                time_part = rest;
                has_component = true;
            }
        }

        if !time_part.is_empty() {
            let (seconds, nanos) = parse_seconds(time_part.strip_suffix('S')?)?;
            duration = duration
                .checked_add(&TimeDelta::try_seconds(parse_digits(seconds)?)?)?
                .checked_add(&TimeDelta::nanoseconds(nanos))?;
            has_component = true;
        }
    }

    if has_component {
        Some(duration)
    } else {
        None
    }
}
