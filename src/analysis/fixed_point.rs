//! Scaled-integer arithmetic for averages and variations
//!
//! Magnitudes are kept in hundredths (`2.00` is stored as `200`) and
//! variations in hundredths of a percent (`+50.00%` is stored as `5000`).
//! All divisions truncate toward zero, so the values displayed in a report
//! are exactly the values compared against thresholds.

use crate::error::ParseFixedPointError;
use std::fmt;
use std::str::FromStr;

/// A non-integral magnitude scaled by 100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FixedPoint(i64);

impl FixedPoint {
    /// Scale applied to the underlying integer
    pub const SCALE: i64 = 100;

    pub const ZERO: FixedPoint = FixedPoint(0);

    /// Wrap an already scaled value
    pub const fn from_scaled(scaled: i64) -> Self {
        Self(scaled)
    }

    /// Scale a plain count
    pub fn from_count(count: u64) -> Self {
        Self(to_i64(i128::from(count) * i128::from(Self::SCALE)))
    }

    /// Arithmetic mean of `count` values summing to `sum`
    ///
    /// Returns `None` for an empty set instead of dividing by zero.
    pub fn mean(sum: u64, count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let scaled_sum = i128::from(sum) * i128::from(Self::SCALE);
        let count = i128::try_from(count).ok()?;
        Some(Self(to_i64(scaled_sum / count)))
    }

    /// The scaled integer
    pub const fn scaled(self) -> i64 {
        self.0
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}", sign, Hundredths(self.0.unsigned_abs()))
    }
}

impl FromStr for FixedPoint {
    type Err = ParseFixedPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let value =
            parse_hundredths(digits).ok_or_else(|| ParseFixedPointError(s.to_string()))?;
        Ok(Self(if negative { -value } else { value }))
    }
}

/// A signed percentage scaled by 100
///
/// Equivalently, the relative change scaled by 10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Variation(i64);

impl Variation {
    /// Scale applied to the relative change (`1.0` is `10000`)
    pub const SCALE: i64 = 10_000;

    /// `+100.00%`, used when the baseline is zero and the value grew
    pub const FULL_INCREASE: Variation = Variation(Self::SCALE);

    pub const ZERO: Variation = Variation(0);

    pub const fn from_scaled(scaled: i64) -> Self {
        Self(scaled)
    }

    pub const fn scaled(self) -> i64 {
        self.0
    }

    /// Whether this variation is above a threshold expressed in whole percent
    pub fn exceeds(self, max_percent: i64) -> bool {
        self.0 > max_percent.saturating_mul(100)
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        write!(f, "{}{}%", sign, Hundredths(self.0.unsigned_abs()))
    }
}

impl FromStr for Variation {
    type Err = ParseFixedPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseFixedPointError(s.to_string());
        let body = s.strip_suffix('%').unwrap_or(s);
        let (negative, digits) = if let Some(rest) = body.strip_prefix('-') {
            (true, rest)
        } else {
            (false, body.strip_prefix('+').unwrap_or(body))
        };
        let value = parse_hundredths(digits).ok_or_else(invalid)?;
        Ok(Self(if negative { -value } else { value }))
    }
}

/// Renders an unsigned scaled value as `<int>.<2 digits>`
struct Hundredths(u64);

impl fmt::Display for Hundredths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Parse `<digits>[.<1-2 digits>]` into hundredths
fn parse_hundredths(s: &str) -> Option<i64> {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (s, ""),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if frac_part.len() > 2 || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.contains('.') && frac_part.is_empty() {
        return None;
    }

    let int_value: i64 = int_part.parse().ok()?;
    let frac_value: i64 = match frac_part.len() {
        0 => 0,
        1 => frac_part.parse::<i64>().ok()? * 10,
        _ => frac_part.parse().ok()?,
    };
    int_value.checked_mul(100)?.checked_add(frac_value)
}

fn to_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}
