//! Heart rate zones as a percentage of maximum heart rate

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum heart rate assumed when the athlete's age is unknown
pub const DEFAULT_MAX_HEART_RATE: u16 = 190;

/// Errors that can occur during zone calculations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ZoneError {
    #[error("Invalid athlete age: {0}")]
    InvalidAge(u8),
}

/// Five-zone model on percentage of maximum heart rate
///
/// - Z1: < 60% (Recovery)
/// - Z2: 60-69% (Easy)
/// - Z3: 70-79% (Aerobic)
/// - Z4: 80-89% (Threshold)
/// - Z5: 90%+ (Maximum)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeartRateZone {
    Recovery,
    Easy,
    Aerobic,
    Threshold,
    Maximum,
}

impl HeartRateZone {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            HeartRateZone::Maximum
        } else if percentage >= 80.0 {
            HeartRateZone::Threshold
        } else if percentage >= 70.0 {
            HeartRateZone::Aerobic
        } else if percentage >= 60.0 {
            HeartRateZone::Easy
        } else {
            HeartRateZone::Recovery
        }
    }

    /// Zone number, 1 to 5
    pub fn number(&self) -> u8 {
        match self {
            HeartRateZone::Recovery => 1,
            HeartRateZone::Easy => 2,
            HeartRateZone::Aerobic => 3,
            HeartRateZone::Threshold => 4,
            HeartRateZone::Maximum => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HeartRateZone::Recovery => "Recovery",
            HeartRateZone::Easy => "Easy",
            HeartRateZone::Aerobic => "Aerobic",
            HeartRateZone::Threshold => "Threshold",
            HeartRateZone::Maximum => "Maximum",
        }
    }
}

impl fmt::Display for HeartRateZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zone {} ({})", self.number(), self.name())
    }
}

/// Zone calculation utilities
pub struct ZoneCalculator;

impl ZoneCalculator {
    /// 220 minus age, or [`DEFAULT_MAX_HEART_RATE`] without an age
    pub fn estimate_max_heart_rate(age: Option<u8>) -> Result<u16, ZoneError> {
        match age {
            None => Ok(DEFAULT_MAX_HEART_RATE),
            Some(age) if (1..120).contains(&age) => Ok(220 - u16::from(age)),
            Some(age) => Err(ZoneError::InvalidAge(age)),
        }
    }

    /// Heart rate as a percentage of max; zero when max is not positive
    pub fn hr_percentage(hr: f64, max_hr: f64) -> f64 {
        if max_hr > 0.0 {
            hr / max_hr * 100.0
        } else {
            0.0
        }
    }

    /// Determine which heart rate zone a given HR falls into
    pub fn heart_rate_zone(hr: f64, max_hr: f64) -> HeartRateZone {
        HeartRateZone::from_percentage(Self::hr_percentage(hr, max_hr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_boundaries() {
        assert_eq!(ZoneCalculator::heart_rate_zone(171.0, 190.0), HeartRateZone::Maximum);
        assert_eq!(ZoneCalculator::heart_rate_zone(152.0, 190.0), HeartRateZone::Threshold);
        assert_eq!(ZoneCalculator::heart_rate_zone(151.0, 190.0), HeartRateZone::Aerobic);
        assert_eq!(ZoneCalculator::heart_rate_zone(133.0, 190.0), HeartRateZone::Aerobic);
        assert_eq!(ZoneCalculator::heart_rate_zone(114.0, 190.0), HeartRateZone::Easy);
        assert_eq!(ZoneCalculator::heart_rate_zone(100.0, 190.0), HeartRateZone::Recovery);
    }

    #[test]
    fn test_zero_max_heart_rate_is_recovery() {
        assert_eq!(ZoneCalculator::hr_percentage(150.0, 0.0), 0.0);
        assert_eq!(ZoneCalculator::heart_rate_zone(150.0, 0.0), HeartRateZone::Recovery);
    }

    #[test]
    fn test_zone_labels() {
        assert_eq!(HeartRateZone::Maximum.to_string(), "Zone 5 (Maximum)");
        assert_eq!(HeartRateZone::Recovery.to_string(), "Zone 1 (Recovery)");
    }

    #[test]
    fn test_estimate_max_heart_rate() {
        assert_eq!(ZoneCalculator::estimate_max_heart_rate(None), Ok(190));
        assert_eq!(ZoneCalculator::estimate_max_heart_rate(Some(40)), Ok(180));
        assert_eq!(
            ZoneCalculator::estimate_max_heart_rate(Some(0)),
            Err(ZoneError::InvalidAge(0))
        );
        assert!(ZoneCalculator::estimate_max_heart_rate(Some(200)).is_err());
    }
}
