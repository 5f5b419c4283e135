//! Reveal cadence for the streaming phase.

use std::time::Duration;

use super::timing::Timing;

/// Interval between unit reveals so that `units` fill the streaming window.
///
/// Truncated to whole milliseconds (never below one), so `interval * units`
/// stays within the window whenever the window has a millisecond per unit.
/// Returns `None` for an empty summary; there is nothing to tick and the
/// step counts as fully revealed as soon as streaming starts.
pub fn unit_interval(timing: &Timing, units: usize) -> Option<Duration> {
    if units == 0 {
        return None;
    }

    let millis = timing.streaming_window().as_millis() / units as u128;
    let millis = u64::try_from(millis).unwrap_or(u64::MAX).max(1);
    Some(Duration::from_millis(millis))
}

/// True once every unit is visible
pub fn is_fully_revealed(revealed: usize, units: usize) -> bool {
    revealed >= units
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_for_six_words() {
        let interval = unit_interval(&Timing::default(), 6).unwrap();
        assert_eq!(interval, Duration::from_millis(333));
        assert!(interval * 6 <= Duration::from_millis(2000));
    }

    #[test]
    fn test_interval_truncates_to_whole_millis() {
        let timing = Timing::from_millis(5000, 3000, 100).unwrap();
        assert_eq!(unit_interval(&timing, 7), Some(Duration::from_millis(285)));
        assert_eq!(unit_interval(&timing, 3), Some(Duration::from_millis(666)));
    }

    #[test]
    fn test_interval_never_below_one_milli() {
        let timing = Timing::from_millis(5000, 4998, 100).unwrap();
        assert_eq!(unit_interval(&timing, 5), Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_interval_for_five_items() {
        assert_eq!(
            unit_interval(&Timing::default(), 5),
            Some(Duration::from_millis(400))
        );
    }

    #[test]
    fn test_zero_units_needs_no_ticking() {
        assert_eq!(unit_interval(&Timing::default(), 0), None);
        assert!(is_fully_revealed(0, 0));
    }

    #[test]
    fn test_fully_revealed() {
        assert!(!is_fully_revealed(4, 5));
        assert!(is_fully_revealed(5, 5));
    }
}
