use chrono::NaiveDate;

use crate::db::operations::streaks::{self, LearningStreak};
use crate::db::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakAdvance {
    pub current_streak: i32,
    pub longest_streak: i32,
}

/// Day-granularity streak arithmetic. Returns `None` when the activity must
/// not change the row: a repeat on the same calendar day, or a backdated
/// event (negative gap, clock skew) which is ignored rather than allowed to
/// decrement or re-advance the streak.
pub fn advance(existing: Option<&LearningStreak>, activity_date: NaiveDate) -> Option<StreakAdvance> {
    let Some(streak) = existing else {
        return Some(StreakAdvance {
            current_streak: 1,
            longest_streak: 1,
        });
    };

    let Some(last) = streak.last_study_date else {
        // Row created before any activity was recorded.
        return Some(StreakAdvance {
            current_streak: 1,
            longest_streak: streak.longest_streak.max(1),
        });
    };

    let days_since_last = (activity_date - last).num_days();

    let current = match days_since_last {
        0 => return None,
        d if d < 0 => return None,
        1 => streak.current_streak + 1,
        _ => 1,
    };

    Some(StreakAdvance {
        current_streak: current,
        longest_streak: streak.longest_streak.max(current),
    })
}

/// Advances or initializes the user's streak for one calendar day of
/// activity. The read-modify-write holds a row lock for the duration of the
/// transaction, so concurrent submissions for the same user serialize.
pub async fn record_activity(
    db: &Database,
    user_id: &str,
    activity_date: NaiveDate,
) -> Result<LearningStreak, sqlx::Error> {
    let mut tx = db.pool().begin().await?;

    let existing = streaks::get_streak_for_update(&mut *tx, user_id).await?;

    let updated = match advance(existing.as_ref(), activity_date) {
        None => {
            tx.commit().await?;
            // Same-day or backdated repeat leaves the row untouched.
            return Ok(existing.unwrap_or_else(|| LearningStreak::empty(user_id)));
        }
        Some(update) => LearningStreak {
            user_id: user_id.to_string(),
            current_streak: update.current_streak,
            longest_streak: update.longest_streak,
            last_study_date: Some(activity_date),
        },
    };

    streaks::upsert_streak(&mut *tx, &updated).await?;
    tx.commit().await?;

    tracing::debug!(
        user_id,
        current = updated.current_streak,
        longest = updated.longest_streak,
        "streak advanced"
    );

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn streak(current: i32, longest: i32, last: &str) -> LearningStreak {
        LearningStreak {
            user_id: "u1".into(),
            current_streak: current,
            longest_streak: longest,
            last_study_date: Some(day(last)),
        }
    }

    #[test]
    fn first_activity_creates_streak_of_one() {
        let update = advance(None, day("2024-03-01")).unwrap();
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.longest_streak, 1);
    }

    #[test]
    fn same_day_repeat_is_a_noop() {
        let existing = streak(3, 5, "2024-03-01");
        assert_eq!(advance(Some(&existing), day("2024-03-01")), None);
    }

    #[test]
    fn consecutive_day_increments() {
        let existing = streak(3, 5, "2024-03-01");
        let update = advance(Some(&existing), day("2024-03-02")).unwrap();
        assert_eq!(update.current_streak, 4);
        assert_eq!(update.longest_streak, 5);
    }

    #[test]
    fn new_longest_is_tracked() {
        let existing = streak(5, 5, "2024-03-01");
        let update = advance(Some(&existing), day("2024-03-02")).unwrap();
        assert_eq!(update.current_streak, 6);
        assert_eq!(update.longest_streak, 6);
    }

    #[test]
    fn gap_resets_to_one_not_zero() {
        let existing = streak(7, 9, "2024-03-01");
        let update = advance(Some(&existing), day("2024-03-06")).unwrap();
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.longest_streak, 9);
    }

    #[test]
    fn backdated_activity_is_ignored() {
        let existing = streak(4, 4, "2024-03-10");
        assert_eq!(advance(Some(&existing), day("2024-03-08")), None);
    }

    #[test]
    fn three_consecutive_days_yield_three() {
        let mut state: Option<LearningStreak> = None;
        for d in ["2024-03-01", "2024-03-02", "2024-03-03"] {
            let update = advance(state.as_ref(), day(d)).unwrap();
            state = Some(LearningStreak {
                user_id: "u1".into(),
                current_streak: update.current_streak,
                longest_streak: update.longest_streak,
                last_study_date: Some(day(d)),
            });
        }
        assert_eq!(state.unwrap().current_streak, 3);
    }

    #[test]
    fn row_without_last_date_starts_fresh() {
        let existing = LearningStreak::empty("u1");
        let update = advance(Some(&existing), day("2024-03-01")).unwrap();
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.longest_streak, 1);
    }
}
