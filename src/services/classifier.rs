use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::db::operations::events::{Difficulty, QuizAttemptRow};

pub const WINDOW_DAYS: i64 = 30;
pub const WINDOW_ATTEMPTS: usize = 10;
const MAX_AREAS: usize = 3;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaClassification {
    pub weak: Vec<String>,
    pub strong: Vec<String>,
}

/// Selects the classification window: the most recent 10 attempts inside the
/// trailing 30 days. Input must already be ordered newest first.
pub fn recent_window(attempts: &[QuizAttemptRow], now: DateTime<Utc>) -> Vec<QuizAttemptRow> {
    let cutoff = now - Duration::days(WINDOW_DAYS);
    attempts
        .iter()
        .filter(|a| a.completed_at >= cutoff)
        .take(WINDOW_ATTEMPTS)
        .cloned()
        .collect()
}

/// Threshold heuristic over the attempt window. Deduplicates labels keeping
/// recency order and caps each list at three entries. Easy attempts never
/// produce a strong-area label, no matter the score.
pub fn classify(window: &[QuizAttemptRow]) -> AreaClassification {
    let mut result = AreaClassification::default();

    for attempt in window {
        if let Some(label) = weak_label(attempt) {
            push_unique(&mut result.weak, label);
        }
        if let Some(label) = strong_label(attempt) {
            push_unique(&mut result.strong, label);
        }
    }

    result
}

fn weak_label(attempt: &QuizAttemptRow) -> Option<String> {
    match attempt.difficulty {
        Difficulty::Hard if attempt.score < 60.0 => {
            Some(format!("Complex {} problems", attempt.quiz_type))
        }
        Difficulty::Medium if attempt.score < 70.0 => {
            Some(format!("Intermediate {} concepts", attempt.quiz_type))
        }
        Difficulty::Easy if attempt.score < 80.0 => {
            Some(format!("Basic {} fundamentals", attempt.quiz_type))
        }
        _ => None,
    }
}

fn strong_label(attempt: &QuizAttemptRow) -> Option<String> {
    if attempt.score < 85.0 {
        return None;
    }
    match attempt.difficulty {
        Difficulty::Hard => Some(format!("Advanced {} mastery", attempt.quiz_type)),
        Difficulty::Medium => Some(format!("Strong {} understanding", attempt.quiz_type)),
        Difficulty::Easy => None,
    }
}

fn push_unique(labels: &mut Vec<String>, label: String) {
    if labels.len() < MAX_AREAS && !labels.contains(&label) {
        labels.push(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(difficulty: Difficulty, quiz_type: &str, score: f64, days_ago: i64) -> QuizAttemptRow {
        QuizAttemptRow {
            difficulty,
            quiz_type: quiz_type.to_string(),
            score,
            completed_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn hard_low_score_is_weak() {
        let result = classify(&[attempt(Difficulty::Hard, "Algebra", 55.0, 1)]);
        assert_eq!(result.weak, vec!["Complex Algebra problems"]);
        assert!(result.strong.is_empty());
    }

    #[test]
    fn medium_and_easy_thresholds() {
        let result = classify(&[
            attempt(Difficulty::Medium, "Geometry", 69.0, 1),
            attempt(Difficulty::Easy, "Fractions", 79.0, 2),
        ]);
        assert_eq!(
            result.weak,
            vec![
                "Intermediate Geometry concepts",
                "Basic Fractions fundamentals"
            ]
        );
    }

    #[test]
    fn easy_high_score_yields_no_strong_label() {
        // The easy/strong asymmetry is intentional; keep this pinned.
        let result = classify(&[attempt(Difficulty::Easy, "Algebra", 85.0, 1)]);
        assert!(result.strong.is_empty());
        assert!(result.weak.is_empty());
    }

    #[test]
    fn hard_and_medium_high_scores_are_strong() {
        let result = classify(&[
            attempt(Difficulty::Hard, "Algebra", 92.0, 1),
            attempt(Difficulty::Medium, "Geometry", 85.0, 2),
        ]);
        assert_eq!(
            result.strong,
            vec!["Advanced Algebra mastery", "Strong Geometry understanding"]
        );
    }

    #[test]
    fn duplicate_labels_are_removed_keeping_recency_order() {
        let result = classify(&[
            attempt(Difficulty::Hard, "Algebra", 40.0, 1),
            attempt(Difficulty::Hard, "Algebra", 50.0, 2),
            attempt(Difficulty::Medium, "Geometry", 60.0, 3),
        ]);
        assert_eq!(
            result.weak,
            vec!["Complex Algebra problems", "Intermediate Geometry concepts"]
        );
    }

    #[test]
    fn weak_list_caps_at_three() {
        let result = classify(&[
            attempt(Difficulty::Hard, "A", 10.0, 1),
            attempt(Difficulty::Hard, "B", 10.0, 2),
            attempt(Difficulty::Hard, "C", 10.0, 3),
            attempt(Difficulty::Hard, "D", 10.0, 4),
        ]);
        assert_eq!(result.weak.len(), 3);
        assert_eq!(result.weak[0], "Complex A problems");
    }

    #[test]
    fn window_caps_at_ten_recent_attempts() {
        let attempts: Vec<_> = (0..15)
            .map(|i| attempt(Difficulty::Hard, "X", 50.0, i))
            .collect();
        let window = recent_window(&attempts, Utc::now());
        assert_eq!(window.len(), WINDOW_ATTEMPTS);
    }

    #[test]
    fn window_excludes_attempts_older_than_thirty_days() {
        let attempts = vec![
            attempt(Difficulty::Hard, "X", 50.0, 2),
            attempt(Difficulty::Hard, "Y", 50.0, 45),
        ];
        let window = recent_window(&attempts, Utc::now());
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].quiz_type, "X");
    }
}
