use std::fmt;

use anyhow::anyhow;
use serde::Serialize;

/// Discrete 0-4 intensity bucket for a day's revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Level(u8);

impl Level {
    pub const NONE: Level = Level(0);
    pub const MAX: Level = Level(4);

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn all() -> [Level; 5] {
        [Level(0), Level(1), Level(2), Level(3), Level(4)]
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ascending revenue boundaries for levels 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub level1: f64,
    pub level2: f64,
    pub level3: f64,
    pub level4: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            level1: 50.0,
            level2: 150.0,
            level3: 300.0,
            level4: 600.0,
        }
    }
}

impl Thresholds {
    pub fn new(level1: f64, level2: f64, level3: f64, level4: f64) -> anyhow::Result<Self> {
        let values = [level1, level2, level3, level4];
        if values.iter().any(|value| !value.is_finite() || *value <= 0.0) {
            return Err(anyhow!(
                "revenue thresholds must be positive numbers, got {values:?}"
            ));
        }
        if values.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(anyhow!(
                "revenue thresholds must be strictly ascending, got {values:?}"
            ));
        }

        Ok(Self {
            level1,
            level2,
            level3,
            level4,
        })
    }

    /// Amounts at or above `level3` all land in level 4. `level4` is validated
    /// and exported with the thresholds but never moves a bucket boundary.
    pub fn classify(&self, amount: f64) -> Level {
        if amount == 0.0 {
            Level(0)
        } else if amount < self.level1 {
            Level(1)
        } else if amount < self.level2 {
            Level(2)
        } else if amount < self.level3 {
            Level(3)
        } else {
            Level(4)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, Thresholds};

    #[test]
    fn classifies_documented_examples() {
        let thresholds = Thresholds::new(50.0, 150.0, 300.0, 600.0).expect("valid thresholds");

        assert_eq!(thresholds.classify(0.0), Level(0));
        assert_eq!(thresholds.classify(49.99), Level(1));
        assert_eq!(thresholds.classify(50.0), Level(2));
        assert_eq!(thresholds.classify(150.0), Level(3));
        assert_eq!(thresholds.classify(300.0), Level(4));
        assert_eq!(thresholds.classify(599.99), Level(4));
        assert_eq!(thresholds.classify(10_000.0), Level(4));
    }

    #[test]
    fn classification_is_monotonic_and_steps_at_boundaries() {
        let thresholds = Thresholds::default();
        let mut previous = Level::NONE;
        let mut amount = 0.0;
        while amount <= 1_000.0 {
            let level = thresholds.classify(amount);
            assert!(level >= previous, "level dropped at {amount}");
            previous = level;
            amount += 0.25;
        }

        let eps = 1e-6;
        for boundary in [thresholds.level1, thresholds.level2, thresholds.level3] {
            assert!(thresholds.classify(boundary - eps) < thresholds.classify(boundary));
        }
        assert_eq!(thresholds.classify(thresholds.level4), Level::MAX);
    }

    #[test]
    fn rejects_unordered_or_non_positive_thresholds() {
        assert!(Thresholds::new(50.0, 50.0, 300.0, 600.0).is_err());
        assert!(Thresholds::new(150.0, 50.0, 300.0, 600.0).is_err());
        assert!(Thresholds::new(0.0, 50.0, 300.0, 600.0).is_err());
        assert!(Thresholds::new(1.0, 2.0, 3.0, f64::NAN).is_err());
    }
}
