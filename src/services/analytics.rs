use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::db::operations::events::{self, AttemptActivityRow, SessionActivityRow};
use crate::db::operations::metrics;
use crate::db::operations::streaks::{self, LearningStreak};
use crate::db::operations::subjects;
use crate::db::Database;
use crate::services::recommendation;

const WEEK_DAYS: i64 = 7;
const MAX_INSIGHTS: usize = 4;
const MAX_POOLED_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    pub streak: StreakSummary,
    pub totals: OverallTotals,
    pub weekly: Vec<DailyRollup>,
    pub subjects: Vec<SubjectRollup>,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_study_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallTotals {
    pub average_score: f64,
    pub total_quizzes: i64,
    pub total_study_time_minutes: i64,
    pub total_xp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRollup {
    pub date: NaiveDate,
    pub study_time_minutes: i64,
    pub quizzes: i64,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRollup {
    pub subject_id: String,
    pub subject_name: String,
    pub average_score: f64,
    pub total_quizzes: i32,
    pub total_study_time_minutes: i32,
    pub weak_areas: Vec<String>,
    pub strong_areas: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Achievement,
    Improvement,
    Strength,
    Weakness,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DayActivity {
    pub study_seconds: i64,
    pub quizzes: i64,
    pub score_sum: f64,
}

/// Composes the full derived read-model for one user. Never fails for
/// missing derived state; only a data-store error propagates.
pub async fn get_snapshot(db: &Database, user_id: &str) -> Result<AnalyticsSnapshot, sqlx::Error> {
    let now = Utc::now();
    let today = now.date_naive();

    let streak = streaks::get_streak(db, user_id)
        .await?
        .unwrap_or_else(|| LearningStreak::empty(user_id));

    let totals_row = events::get_user_totals(db, user_id).await?;
    let totals = OverallTotals {
        average_score: totals_row.average_score,
        total_quizzes: totals_row.total_quizzes,
        total_study_time_minutes: (totals_row.total_study_seconds as f64 / 60.0).round() as i64,
        total_xp: totals_row.total_xp,
    };

    let window_start = (today - Duration::days(WEEK_DAYS - 1))
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();
    let sessions = events::get_sessions_since(db, user_id, window_start).await?;
    let attempts = events::get_user_attempts_since(db, user_id, window_start).await?;
    let weekly = fill_week(today, &collect_day_activity(&sessions, &attempts));

    let metric_rows = metrics::list_performance_metrics(db, user_id).await?;
    let subject_ids: Vec<String> = metric_rows.iter().map(|m| m.subject_id.clone()).collect();
    let names = subjects::get_subject_names(db, &subject_ids).await?;

    let subject_rollups = metric_rows
        .iter()
        .map(|m| SubjectRollup {
            subject_id: m.subject_id.clone(),
            subject_name: names
                .get(&m.subject_id)
                .cloned()
                .unwrap_or_else(|| m.subject_id.clone()),
            average_score: m.average_score,
            total_quizzes: m.total_quizzes,
            total_study_time_minutes: m.total_study_time_minutes,
            weak_areas: m.weak_areas.clone(),
            strong_areas: m.strong_areas.clone(),
        })
        .collect();

    let insights = build_insights(
        streak.current_streak,
        totals.average_score,
        totals.total_quizzes,
        totals.total_study_time_minutes,
    );

    let mut recommendations: Vec<String> = metric_rows
        .iter()
        .flat_map(|m| m.recommendations.iter().cloned())
        .take(MAX_POOLED_RECOMMENDATIONS)
        .collect();
    if recommendations.is_empty() {
        recommendations = recommendation::fallback_recommendations();
    }

    Ok(AnalyticsSnapshot {
        user_id: user_id.to_string(),
        generated_at: now,
        streak: StreakSummary {
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            last_study_date: streak.last_study_date,
        },
        totals,
        weekly,
        subjects: subject_rollups,
        insights,
        recommendations,
    })
}

pub fn collect_day_activity(
    sessions: &[SessionActivityRow],
    attempts: &[AttemptActivityRow],
) -> HashMap<NaiveDate, DayActivity> {
    let mut days: HashMap<NaiveDate, DayActivity> = HashMap::new();

    for session in sessions {
        let entry = days.entry(session.completed_at.date_naive()).or_default();
        entry.study_seconds += session.duration_seconds;
    }

    for attempt in attempts {
        let entry = days.entry(attempt.completed_at.date_naive()).or_default();
        entry.quizzes += 1;
        entry.score_sum += attempt.score;
    }

    days
}

/// Always exactly seven entries, chronological, ending today; days without
/// activity are zero-filled.
pub fn fill_week(today: NaiveDate, days: &HashMap<NaiveDate, DayActivity>) -> Vec<DailyRollup> {
    (0..WEEK_DAYS)
        .map(|offset| {
            let date = today - Duration::days(WEEK_DAYS - 1 - offset);
            let activity = days.get(&date).copied().unwrap_or_default();
            DailyRollup {
                date,
                study_time_minutes: (activity.study_seconds as f64 / 60.0).round() as i64,
                quizzes: activity.quizzes,
                average_score: if activity.quizzes > 0 {
                    activity.score_sum / activity.quizzes as f64
                } else {
                    0.0
                },
            }
        })
        .collect()
}

/// Fixed-threshold qualitative insights, at most four, in rule order. The
/// streak rules are mutually exclusive, as are the score rules.
pub fn build_insights(
    current_streak: i32,
    average_score: f64,
    total_quizzes: i64,
    total_minutes: i64,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    if current_streak >= 7 {
        insights.push(Insight {
            kind: InsightKind::Achievement,
            title: "Consistency champion".into(),
            message: format!(
                "You have studied {current_streak} days in a row. Keep the momentum going!"
            ),
        });
    } else if current_streak >= 3 {
        insights.push(Insight {
            kind: InsightKind::Improvement,
            title: "Building momentum".into(),
            message: format!(
                "A {current_streak}-day streak so far. Reach 7 days to earn consistency champion."
            ),
        });
    }

    if total_quizzes > 0 {
        if average_score >= 85.0 {
            insights.push(Insight {
                kind: InsightKind::Strength,
                title: "Excellent scores".into(),
                message: format!("Your overall quiz average is {average_score:.1}."),
            });
        } else if average_score >= 70.0 {
            insights.push(Insight {
                kind: InsightKind::Improvement,
                title: "Solid progress".into(),
                message: format!(
                    "Your quiz average of {average_score:.1} is solid. Push toward 85 for mastery."
                ),
            });
        } else {
            insights.push(Insight {
                kind: InsightKind::Weakness,
                title: "Room to grow".into(),
                message: format!(
                    "Your quiz average is {average_score:.1}. Revisit your weak areas to improve."
                ),
            });
        }
    }

    if total_minutes > 60 {
        insights.push(Insight {
            kind: InsightKind::Achievement,
            title: "Dedicated learner".into(),
            message: format!("You have logged {total_minutes} minutes of study time."),
        });
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn empty_week_is_seven_zero_entries_ending_today() {
        let today = day("2024-03-10");
        let week = fill_week(today, &HashMap::new());

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day("2024-03-04"));
        assert_eq!(week[6].date, today);
        for entry in &week {
            assert_eq!(entry.study_time_minutes, 0);
            assert_eq!(entry.quizzes, 0);
            assert_eq!(entry.average_score, 0.0);
        }
    }

    #[test]
    fn week_entries_are_consecutive() {
        let week = fill_week(day("2024-03-10"), &HashMap::new());
        for pair in week.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
    }

    #[test]
    fn sparse_activity_lands_on_the_right_day() {
        let mut days = HashMap::new();
        days.insert(
            day("2024-03-08"),
            DayActivity {
                study_seconds: 600,
                quizzes: 2,
                score_sum: 150.0,
            },
        );
        let week = fill_week(day("2024-03-10"), &days);

        let entry = week.iter().find(|e| e.date == day("2024-03-08")).unwrap();
        assert_eq!(entry.study_time_minutes, 10);
        assert_eq!(entry.quizzes, 2);
        assert_eq!(entry.average_score, 75.0);
        assert_eq!(week.iter().filter(|e| e.quizzes > 0).count(), 1);
    }

    #[test]
    fn long_streak_is_an_achievement() {
        let insights = build_insights(7, 0.0, 0, 0);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Achievement);
    }

    #[test]
    fn short_streak_is_improvement_only() {
        let insights = build_insights(3, 0.0, 0, 0);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Improvement);
    }

    #[test]
    fn score_insights_are_mutually_exclusive() {
        let strength = build_insights(0, 90.0, 5, 0);
        assert_eq!(strength.len(), 1);
        assert_eq!(strength[0].kind, InsightKind::Strength);

        let improvement = build_insights(0, 75.0, 5, 0);
        assert_eq!(improvement[0].kind, InsightKind::Improvement);

        let weakness = build_insights(0, 50.0, 5, 0);
        assert_eq!(weakness[0].kind, InsightKind::Weakness);
    }

    #[test]
    fn no_score_insight_without_attempts() {
        assert!(build_insights(0, 0.0, 0, 0).is_empty());
    }

    #[test]
    fn an_hour_of_study_is_an_achievement() {
        let insights = build_insights(0, 0.0, 0, 61);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Achievement);

        assert!(build_insights(0, 0.0, 0, 60).is_empty());
    }

    #[test]
    fn insights_cap_at_four() {
        let insights = build_insights(10, 90.0, 20, 120);
        assert!(insights.len() <= 4);
        assert_eq!(insights.len(), 3);
    }
}
