use serde::{Deserialize, Serialize};

/// Battery charge report.
///
/// Publishers disagree on units for `percentage`: some send a fraction
/// in `0.0..=1.0`, others whole percent. [`BatteryState::display_percent`]
/// normalizes both to whole percent for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryState {
    pub percentage: f64,
}

impl BatteryState {
    pub fn new(percentage: f64) -> Self {
        Self { percentage }
    }

    /// Whole-percent charge. Values at or below 1.0 are read as a
    /// fraction and scaled by 100 before rounding.
    pub fn display_percent(&self) -> i64 {
        let raw = if self.percentage <= 1.0 {
            self.percentage * 100.0
        } else {
            self.percentage
        };
        raw.round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_scaled() {
        assert_eq!(BatteryState::new(0.87).display_percent(), 87);
        assert_eq!(BatteryState::new(0.005).display_percent(), 1);
    }

    #[test]
    fn test_percent_passthrough() {
        assert_eq!(BatteryState::new(55.4).display_percent(), 55);
        assert_eq!(BatteryState::new(100.0).display_percent(), 100);
    }

    #[test]
    fn test_unit_boundary_reads_as_fraction() {
        assert_eq!(BatteryState::new(1.0).display_percent(), 100);
        assert_eq!(BatteryState::new(0.0).display_percent(), 0);
    }
}
