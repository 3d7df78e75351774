//! Points to level.

use crate::rules::POINTS_PER_LEVEL;
use crate::Points;

/// `floor(points / 200) + 1`. Level 1 is the floor and there is no cap.
pub fn level_for_points(points: Points) -> u64 {
    points / POINTS_PER_LEVEL + 1
}

/// Points still needed to reach the next level.
pub fn points_to_next_level(points: Points) -> Points {
    POINTS_PER_LEVEL - points % POINTS_PER_LEVEL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(199), 1);
        assert_eq!(level_for_points(200), 2);
        assert_eq!(level_for_points(650), 4);
    }

    #[test]
    fn test_points_to_next_level() {
        assert_eq!(points_to_next_level(0), 200);
        assert_eq!(points_to_next_level(650), 150);
        assert_eq!(points_to_next_level(400), 200);
    }

    #[test]
    fn test_no_overflow_at_max() {
        assert_eq!(level_for_points(Points::MAX), Points::MAX / POINTS_PER_LEVEL + 1);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_level_is_monotonic(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_for_points(lo) <= level_for_points(hi));
        }

        #[test]
        fn prop_level_matches_formula(points in 0u64..10_000_000) {
            prop_assert_eq!(level_for_points(points), points / 200 + 1);
            prop_assert!(level_for_points(points) >= 1);
        }
    }
}
