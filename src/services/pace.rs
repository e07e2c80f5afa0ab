//! Real-time pace feedback for a single page.
//!
//! Pure classification: observed page time against the user's personal
//! average, adjusted for document difficulty. No side effects, safe to call
//! on every feedback request.

use serde::{Deserialize, Serialize};

/// Half the width of the "perfect" window around the adjusted average.
const PERFECT_WINDOW_SECONDS: f64 = 15.0;
const FAST_THRESHOLD_SECONDS: f64 = -30.0;
const SLOW_THRESHOLD_SECONDS: f64 = 60.0;

/// Below this activity level the message gains a focus reminder.
const LOW_ACTIVITY_LEVEL: f64 = 0.6;
/// Below this, very slow readers also get a Pomodoro suggestion.
const POMODORO_ACTIVITY_LEVEL: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceBucket {
    Perfect,
    Fast,
    Good,
    Slow,
    VerySlow,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaceFeedback {
    pub feedback_type: PaceBucket,
    pub message: String,
    pub encouragement_level: i32, // 1..=5
    pub suggestions: Vec<String>,
}

/// Classify a page reading time into a feedback bucket.
///
/// The buckets partition the diff axis with no gaps or overlaps:
/// `|diff| <= 15` perfect, `diff < -30` fast, `diff < -15` good,
/// `diff <= 60` slow, otherwise very slow.
pub fn classify(
    current_page_seconds: f64,
    personal_avg: f64,
    document_difficulty: i32,
    activity_level: f64,
) -> PaceFeedback {
    let difficulty = document_difficulty.clamp(1, 5) as f64;
    let adjusted_avg = personal_avg * (difficulty / 3.0);
    let diff = current_page_seconds - adjusted_avg;

    let (bucket, base_message, mut encouragement) = if diff.abs() <= PERFECT_WINDOW_SECONDS {
        (
            PaceBucket::Perfect,
            "Right on pace. Keep it up!",
            5,
        )
    } else if diff < FAST_THRESHOLD_SECONDS {
        (
            PaceBucket::Fast,
            "You are flying through this page. Make sure the details stick.",
            4,
        )
    } else if diff < -PERFECT_WINDOW_SECONDS {
        (
            PaceBucket::Good,
            "Nice pace, slightly ahead of your average.",
            4,
        )
    } else if diff <= SLOW_THRESHOLD_SECONDS {
        (
            PaceBucket::Slow,
            "A little slower than usual. This page may be denser.",
            3,
        )
    } else {
        (
            PaceBucket::VerySlow,
            "This page is taking a while. A short break might help.",
            2,
        )
    };

    let mut suggestions = suggestions_for(bucket);
    if bucket == PaceBucket::VerySlow && activity_level < POMODORO_ACTIVITY_LEVEL {
        suggestions.push("Try a 25-minute Pomodoro sprint with a 5-minute break".to_string());
    }

    let mut message = base_message.to_string();
    if activity_level < LOW_ACTIVITY_LEVEL {
        message.push_str(" Try to keep the document in focus while reading.");
        encouragement = (encouragement - 1).max(1);
    }

    PaceFeedback {
        feedback_type: bucket,
        message,
        encouragement_level: encouragement,
        suggestions,
    }
}

fn suggestions_for(bucket: PaceBucket) -> Vec<String> {
    let items: &[&str] = match bucket {
        PaceBucket::Perfect => &["Keep the current rhythm", "Note down anything that felt unclear"],
        PaceBucket::Fast => &[
            "Skim back over the key points",
            "Slow down on formulas and figures",
            "Quiz yourself on what you just read",
        ],
        PaceBucket::Good => &["Stay with this rhythm", "Take short notes as you go"],
        PaceBucket::Slow => &[
            "Break the page into smaller chunks",
            "Summarize each paragraph in one line",
        ],
        PaceBucket::VerySlow => &[
            "Re-read the previous page for context",
            "Mark difficult sections and come back later",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_for_diff(diff: f64) -> PaceBucket {
        // personal_avg 300 at difficulty 3 keeps adjusted_avg at 300
        classify(300.0 + diff, 300.0, 3, 1.0).feedback_type
    }

    #[test]
    fn buckets_partition_the_diff_axis() {
        assert_eq!(bucket_for_diff(-31.0), PaceBucket::Fast);
        assert_eq!(bucket_for_diff(-30.0), PaceBucket::Good);
        assert_eq!(bucket_for_diff(-16.0), PaceBucket::Good);
        assert_eq!(bucket_for_diff(-15.0), PaceBucket::Perfect);
        assert_eq!(bucket_for_diff(0.0), PaceBucket::Perfect);
        assert_eq!(bucket_for_diff(15.0), PaceBucket::Perfect);
        assert_eq!(bucket_for_diff(16.0), PaceBucket::Slow);
        assert_eq!(bucket_for_diff(60.0), PaceBucket::Slow);
        assert_eq!(bucket_for_diff(61.0), PaceBucket::VerySlow);
    }

    #[test]
    fn every_diff_maps_to_exactly_one_bucket() {
        let mut diff = -200.0;
        while diff <= 200.0 {
            // classify is total; this is just a no-panic sweep
            let feedback = classify(300.0 + diff, 300.0, 3, 1.0);
            assert!((1..=5).contains(&feedback.encouragement_level));
            diff += 0.5;
        }
    }

    #[test]
    fn average_reader_on_average_page_is_perfect() {
        let feedback = classify(125.0, 120.0, 3, 1.0);
        assert_eq!(feedback.feedback_type, PaceBucket::Perfect);
        assert_eq!(feedback.encouragement_level, 5);
    }

    #[test]
    fn difficulty_scales_the_expected_time() {
        // 200s on a difficulty-5 page with a 120s average: adjusted avg is
        // 200, so this is perfect, not slow.
        let feedback = classify(200.0, 120.0, 5, 1.0);
        assert_eq!(feedback.feedback_type, PaceBucket::Perfect);
    }

    #[test]
    fn low_activity_drops_encouragement_and_adds_reminder() {
        let feedback = classify(125.0, 120.0, 3, 0.3);
        assert_eq!(feedback.encouragement_level, 4);
        assert!(feedback.message.contains("focus"));
    }

    #[test]
    fn encouragement_never_drops_below_one() {
        let feedback = classify(1000.0, 120.0, 3, 0.0);
        assert_eq!(feedback.feedback_type, PaceBucket::VerySlow);
        assert_eq!(feedback.encouragement_level, 1);
    }

    #[test]
    fn very_slow_with_low_activity_suggests_pomodoro() {
        let feedback = classify(1000.0, 120.0, 3, 0.5);
        assert!(feedback.suggestions.iter().any(|s| s.contains("Pomodoro")));

        let engaged = classify(1000.0, 120.0, 3, 0.9);
        assert!(!engaged.suggestions.iter().any(|s| s.contains("Pomodoro")));
    }

    #[test]
    fn suggestion_lists_stay_small() {
        for diff in [-50.0, -20.0, 0.0, 30.0, 100.0] {
            let feedback = classify(300.0 + diff, 300.0, 3, 0.0);
            assert!(feedback.suggestions.len() <= 3);
        }
    }
}
