use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Microseconds per second; the unit every frame duration in the pipeline is expressed in.
pub const MICROS_PER_SECOND: i64 = 1_000_000;

/// A rational number as used for container time bases and frame rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: i64,
    pub den: i64,
}

impl Rational {
    /// The microsecond time base (1 / 1_000_000).
    pub const MICROSECONDS: Rational = Rational {
        num: 1,
        den: MICROS_PER_SECOND,
    };

    pub const fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// A rational is usable as a time base or rate only when both parts are positive.
    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }

    pub fn invert(&self) -> Rational {
        Rational::new(self.den, self.num)
    }

    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }

    /// Convert `value` expressed in units of `from` into units of `to`,
    /// rounding to the nearest integer with halves away from zero.
    ///
    /// Returns `None` when either time base is degenerate.
    pub fn rescale(value: i64, from: Rational, to: Rational) -> Option<i64> {
        if !from.is_valid() || !to.is_valid() {
            return None;
        }
        let numerator = value as i128 * from.num as i128 * to.den as i128;
        let denominator = from.den as i128 * to.num as i128;
        let half = denominator / 2;
        let rounded = if numerator >= 0 {
            (numerator + half) / denominator
        } else {
            (numerator - half) / denominator
        };
        i64::try_from(rounded).ok()
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rational '{0}'")]
pub struct ParseRationalError(String);

impl FromStr for Rational {
    type Err = ParseRationalError;

    /// Parses `"30000/1001"` style fractions as well as plain integers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseRationalError(s.to_string());
        match s.split_once('/') {
            Some((num, den)) => Ok(Rational::new(
                num.trim().parse().map_err(|_| err())?,
                den.trim().parse().map_err(|_| err())?,
            )),
            None => Ok(Rational::new(s.parse().map_err(|_| err())?, 1)),
        }
    }
}

/// A playback position, displayed as `HH:MM:SS.mmm`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Timestamp {
    seconds: f64,
}

impl Timestamp {
    pub fn from_seconds(s: f64) -> Self {
        Self {
            seconds: s.max(0.0),
        }
    }

    pub fn from_micros(us: i64) -> Self {
        Self::from_seconds(us as f64 / MICROS_PER_SECOND as f64)
    }

    pub fn zero() -> Self {
        Self { seconds: 0.0 }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::zero()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = (self.seconds * 1000.0 + 0.5) as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let secs = (total_ms % 60_000) / 1_000;
        let ms = total_ms % 1_000;
        write!(f, "{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_stream_ticks_to_micros() {
        // 512 ticks at 1/15360 is one frame of 30 fps video
        let us = Rational::rescale(512, Rational::new(1, 15360), Rational::MICROSECONDS);
        assert_eq!(us, Some(33_333));
    }

    #[test]
    fn test_rescale_rounds_half_away_from_zero() {
        assert_eq!(Rational::rescale(1, Rational::new(1, 2), Rational::new(1, 1)), Some(1));
        assert_eq!(Rational::rescale(-1, Rational::new(1, 2), Rational::new(1, 1)), Some(-1));
        assert_eq!(Rational::rescale(-512, Rational::new(1, 15360), Rational::MICROSECONDS), Some(-33_333));
    }

    #[test]
    fn test_rescale_rejects_degenerate_bases() {
        assert_eq!(Rational::rescale(5, Rational::new(0, 1), Rational::MICROSECONDS), None);
        assert_eq!(Rational::rescale(5, Rational::new(1, 0), Rational::MICROSECONDS), None);
    }

    #[test]
    fn test_parse_rational() {
        assert_eq!("30/1".parse::<Rational>().unwrap(), Rational::new(30, 1));
        assert_eq!("30000/1001".parse::<Rational>().unwrap(), Rational::new(30000, 1001));
        assert_eq!("25".parse::<Rational>().unwrap(), Rational::new(25, 1));
        assert!("abc".parse::<Rational>().is_err());
        assert!("30/x".parse::<Rational>().is_err());
    }

    #[test]
    fn test_rational_as_f64() {
        assert!((Rational::new(24000, 1001).as_f64() - 23.976).abs() < 0.001);
        assert_eq!(Rational::new(1, 0).as_f64(), 0.0);
    }

    #[test]
    fn test_timestamp_display() {
        let ts = Timestamp::from_seconds(3661.5);
        assert_eq!(format!("{}", ts), "01:01:01.500");
        assert_eq!(format!("{}", Timestamp::from_micros(33_333)), "00:00:00.033");
    }
}
