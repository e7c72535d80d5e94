//! Property tests over the streak arithmetic: arbitrary day-offset
//! sequences must never violate the streak invariants.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use tutorwise_analytics::db::operations::streaks::LearningStreak;
use tutorwise_analytics::services::streak::advance;

fn apply_sequence(offsets: &[i64]) -> LearningStreak {
    let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut state: Option<LearningStreak> = None;

    for &offset in offsets {
        let day = epoch + Duration::days(offset);
        if let Some(update) = advance(state.as_ref(), day) {
            state = Some(LearningStreak {
                user_id: "u1".into(),
                current_streak: update.current_streak,
                longest_streak: update.longest_streak,
                last_study_date: Some(day),
            });
        }
    }

    state.unwrap_or_else(|| LearningStreak::empty("u1"))
}

proptest! {
    #[test]
    fn longest_never_below_current(offsets in prop::collection::vec(0i64..400, 1..60)) {
        let streak = apply_sequence(&offsets);
        prop_assert!(streak.longest_streak >= streak.current_streak);
        prop_assert!(streak.current_streak >= 1);
    }

    #[test]
    fn same_day_repeat_never_changes_current(offsets in prop::collection::vec(0i64..400, 1..40)) {
        let mut doubled = Vec::with_capacity(offsets.len() * 2);
        for &offset in &offsets {
            doubled.push(offset);
            doubled.push(offset);
        }
        prop_assert_eq!(
            apply_sequence(&doubled).current_streak,
            apply_sequence(&offsets).current_streak
        );
    }

    #[test]
    fn consecutive_run_counts_every_day(len in 1i64..50) {
        let offsets: Vec<i64> = (0..len).collect();
        let streak = apply_sequence(&offsets);
        prop_assert_eq!(streak.current_streak as i64, len);
        prop_assert_eq!(streak.longest_streak as i64, len);
    }

    #[test]
    fn gap_always_resets_to_one(start in 0i64..50, run in 1i64..20, gap in 2i64..30) {
        let mut offsets: Vec<i64> = (start..start + run).collect();
        offsets.push(start + run - 1 + gap);
        let streak = apply_sequence(&offsets);
        prop_assert_eq!(streak.current_streak, 1);
        prop_assert_eq!(streak.longest_streak as i64, run);
    }
}
