/// Debounces altitude readings: reports stable once the same altitude has
/// been decoded `threshold` times in a row.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StabilityFilter {
    previous_altitude: Option<i32>,
    same_altitude_count: u8,
}

impl StabilityFilter {
    pub const fn new() -> Self {
        Self {
            previous_altitude: None,
            same_altitude_count: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feeds a freshly decoded altitude. A threshold below 2 disables the
    /// filter: nothing is recorded and the result is always `false`.
    pub fn update(&mut self, altitude: i32, threshold: u8) -> bool {
        if threshold < 2 {
            return false;
        }
        let mut stable = false;
        if self.previous_altitude == Some(altitude) {
            self.same_altitude_count = self.same_altitude_count.saturating_add(1);
            stable = self.same_altitude_count >= threshold - 1;
        } else {
            self.same_altitude_count = 0;
        }
        self.previous_altitude = Some(altitude);
        stable
    }

    pub fn count(&self) -> u8 {
        self.same_altitude_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_on_third_identical_reading() {
        let mut filter = StabilityFilter::new();
        assert!(!filter.update(123, 3));
        assert!(!filter.update(123, 3));
        assert!(filter.update(123, 3));
        // stays stable while the altitude holds
        assert!(filter.update(123, 3));
    }

    #[test]
    fn change_restarts_the_count() {
        let mut filter = StabilityFilter::new();
        assert!(!filter.update(100, 3));
        assert!(!filter.update(100, 3));
        assert!(!filter.update(101, 3));
        assert_eq!(filter.count(), 0);
        assert!(!filter.update(101, 3));
        assert!(filter.update(101, 3));
    }

    #[test]
    fn first_reading_never_matches() {
        // a reset filter has no previous altitude, even for 0 m
        let mut filter = StabilityFilter::new();
        assert!(!filter.update(0, 2));
        assert!(filter.update(0, 2));
    }

    #[test]
    fn low_threshold_disables() {
        let mut filter = StabilityFilter::new();
        for _ in 0..5 {
            assert!(!filter.update(7, 1));
            assert!(!filter.update(7, 0));
        }
        assert_eq!(filter, StabilityFilter::new());
    }

    #[test]
    fn reset_forgets_history() {
        let mut filter = StabilityFilter::new();
        filter.update(5, 2);
        filter.update(5, 2);
        filter.reset();
        assert!(!filter.update(5, 2));
    }

    #[test]
    fn count_saturates() {
        let mut filter = StabilityFilter::new();
        for _ in 0..300 {
            filter.update(1, 255);
        }
        assert_eq!(filter.count(), u8::MAX);
        assert!(filter.update(1, 255));
    }
}
