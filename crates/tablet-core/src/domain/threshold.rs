//! The pressure threshold that derives the synthetic touch state.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a pressure threshold is not a positive integer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("pressure threshold must be a positive integer, got {0}")]
    NotPositive(i32),
    #[error("pressure threshold is not a number: '{0}'")]
    NotANumber(String),
}

/// Pressure above which the pen is reported as touching the surface.
///
/// Always strictly positive.  The comparison is strict: a pressure equal to
/// the threshold is *not* a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressureThreshold(i32);

impl PressureThreshold {
    /// Threshold used when the operator does not configure one.
    pub const DEFAULT: i32 = 20;

    /// Creates a threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError::NotPositive`] for zero or negative values.
    pub fn new(value: i32) -> Result<Self, ThresholdError> {
        if value <= 0 {
            return Err(ThresholdError::NotPositive(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> i32 {
        self.0
    }

    /// Returns `true` if `pressure` counts as the tool touching the surface.
    pub fn is_touch(&self, pressure: i32) -> bool {
        pressure > self.0
    }
}

impl Default for PressureThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for PressureThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PressureThreshold {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i32 = s
            .trim()
            .parse()
            .map_err(|_| ThresholdError::NotANumber(s.to_string()))?;
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_rejected() {
        assert_eq!(PressureThreshold::new(0), Err(ThresholdError::NotPositive(0)));
    }

    #[test]
    fn test_negative_is_rejected() {
        assert!(PressureThreshold::new(-5).is_err());
    }

    #[test]
    fn test_equal_pressure_is_not_touch() {
        let t = PressureThreshold::new(40).unwrap();
        assert!(!t.is_touch(40));
        assert!(t.is_touch(41));
    }

    #[test]
    fn test_from_str_parses_and_validates() {
        assert_eq!("35".parse::<PressureThreshold>().unwrap().get(), 35);
        assert!("0".parse::<PressureThreshold>().is_err());
        assert!(matches!(
            "abc".parse::<PressureThreshold>(),
            Err(ThresholdError::NotANumber(_))
        ));
    }

    #[test]
    fn test_default_is_twenty() {
        assert_eq!(PressureThreshold::default().get(), 20);
    }
}
