//! Validated numeric primitives shared by the coordinate system and settings.

use std::fmt;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is zero when non-zero required
    Zero,
    /// Value is negative when positive required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Zero => write!(f, "value is zero"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Check that a value is finite.
#[inline]
pub fn finite(val: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else {
        Ok(val)
    }
}

/// Output units per document unit along one axis.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct UnitScale(f64);

impl UnitScale {
    /// One centimetre, the default unit.
    pub const CM: UnitScale = UnitScale(50.0);

    /// Create a scale with validation (rejects NaN, infinite, zero, negative)
    pub fn try_new(scale: f64) -> Result<Self, NumericError> {
        let scale = finite(scale)?;
        if scale == 0.0 {
            Err(NumericError::Zero)
        } else if scale < 0.0 {
            Err(NumericError::Negative)
        } else {
            Ok(UnitScale(scale))
        }
    }

    #[inline]
    pub fn raw(self) -> f64 {
        self.0
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        UnitScale::CM
    }
}

impl fmt::Display for UnitScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round to two decimals, the precision of output coordinates.
#[inline]
pub fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_rejects_nan_and_infinity() {
        assert_eq!(finite(f64::NAN), Err(NumericError::NaN));
        assert_eq!(finite(f64::INFINITY), Err(NumericError::Infinite));
        assert_eq!(finite(f64::NEG_INFINITY), Err(NumericError::Infinite));
        assert_eq!(finite(-2.5), Ok(-2.5));
    }

    #[test]
    fn unit_scale_try_new_valid() {
        assert_eq!(UnitScale::try_new(50.0).map(UnitScale::raw), Ok(50.0));
        assert!(UnitScale::try_new(0.001).is_ok());
    }

    #[test]
    fn unit_scale_rejects_zero_and_negative() {
        assert_eq!(UnitScale::try_new(0.0), Err(NumericError::Zero));
        assert_eq!(UnitScale::try_new(-1.0), Err(NumericError::Negative));
    }

    #[test]
    fn unit_scale_rejects_non_finite() {
        assert_eq!(UnitScale::try_new(f64::NAN), Err(NumericError::NaN));
        assert_eq!(UnitScale::try_new(f64::INFINITY), Err(NumericError::Infinite));
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(437.5), 437.5);
        assert_eq!(round2(-0.004), -0.0);
    }
}
