//! Focus scoring from session distraction telemetry.
//!
//! Each distraction signal carries its own penalty cap so no single metric
//! can zero the score on its own; the engagement bonus cap sits below every
//! penalty cap so sustained pings cannot offset heavy distraction.

use serde::Serialize;

use crate::models::study_session;

pub const MIN_FOCUS_SCORE: f64 = 0.1;

const TAB_SWITCH_PENALTY: f64 = 0.05;
const TAB_SWITCH_CAP: f64 = 0.30;
const MINIMIZE_PENALTY: f64 = 0.08;
const MINIMIZE_CAP: f64 = 0.20;
const INACTIVITY_PENALTY: f64 = 0.06;
const INACTIVITY_CAP: f64 = 0.25;
const FOCUS_EVENT_BONUS: f64 = 0.01;
const FOCUS_EVENT_CAP: f64 = 0.10;

#[derive(Debug, Default, Clone, Copy)]
pub struct ActivitySignals {
    pub tab_switches: i32,
    pub app_minimized_count: i32,
    pub inactivity_periods: i32,
    pub focus_events: i32,
}

impl ActivitySignals {
    pub fn from_session(session: &study_session::Model) -> Self {
        Self {
            tab_switches: session.tab_switches,
            app_minimized_count: session.app_minimized_count,
            inactivity_periods: session.inactivity_periods,
            focus_events: session.focus_events,
        }
    }
}

/// Score a session's attentiveness into [0.1, 1.0].
///
/// A session with no elapsed time has produced no evidence of distraction
/// yet and scores 1.0. Called on every activity ping, not only at session
/// end, so clients can render the score live.
pub fn focus_score(duration_seconds: i64, signals: &ActivitySignals) -> f64 {
    if duration_seconds <= 0 {
        return 1.0;
    }

    let mut score = 1.0;
    score -= (signals.tab_switches.max(0) as f64 * TAB_SWITCH_PENALTY).min(TAB_SWITCH_CAP);
    score -= (signals.app_minimized_count.max(0) as f64 * MINIMIZE_PENALTY).min(MINIMIZE_CAP);
    score -= (signals.inactivity_periods.max(0) as f64 * INACTIVITY_PENALTY).min(INACTIVITY_CAP);
    score += (signals.focus_events.max(0) as f64 * FOCUS_EVENT_BONUS).min(FOCUS_EVENT_CAP);

    score.clamp(MIN_FOCUS_SCORE, 1.0)
}

#[derive(Debug, Serialize)]
pub struct PerformanceSummary {
    pub focus_score: f64,
    pub active_ratio: f64,
    pub pages_per_hour: f64,
    pub rating: &'static str,
}

/// Session-level performance summary for the end-of-session response.
pub fn summarize(session: &study_session::Model) -> PerformanceSummary {
    let total = session.total_duration_seconds.max(0) as f64;
    let active_ratio = if total > 0.0 {
        (session.active_reading_seconds as f64 / total).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let pages_per_hour = if session.active_reading_seconds > 0 {
        session.pages_covered as f64 * 3600.0 / session.active_reading_seconds as f64
    } else {
        0.0
    };
    let rating = match session.focus_score {
        s if s >= 0.9 => "excellent",
        s if s >= 0.75 => "good",
        s if s >= 0.5 => "fair",
        _ => "poor",
    };

    PerformanceSummary {
        focus_score: session.focus_score,
        active_ratio,
        pages_per_hour,
        rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_scores_full() {
        let signals = ActivitySignals {
            tab_switches: 50,
            app_minimized_count: 50,
            inactivity_periods: 50,
            focus_events: 0,
        };
        assert_eq!(focus_score(0, &signals), 1.0);
    }

    #[test]
    fn clean_session_scores_full() {
        assert_eq!(focus_score(1800, &ActivitySignals::default()), 1.0);
    }

    #[test]
    fn score_stays_within_bounds() {
        for tabs in [0, 1, 7, 100] {
            for mins in [0, 3, 100] {
                for gaps in [0, 5, 100] {
                    for pings in [0, 4, 100] {
                        let signals = ActivitySignals {
                            tab_switches: tabs,
                            app_minimized_count: mins,
                            inactivity_periods: gaps,
                            focus_events: pings,
                        };
                        let score = focus_score(600, &signals);
                        assert!((MIN_FOCUS_SCORE..=1.0).contains(&score));
                    }
                }
            }
        }
    }

    #[test]
    fn each_penalty_is_capped() {
        // 100 tab switches cost 0.30, not 5.0
        let signals = ActivitySignals {
            tab_switches: 100,
            ..Default::default()
        };
        assert!((focus_score(600, &signals) - 0.70).abs() < 1e-9);
    }

    #[test]
    fn combined_distraction_approaches_the_floor() {
        let signals = ActivitySignals {
            tab_switches: 10,
            app_minimized_count: 10,
            inactivity_periods: 10,
            focus_events: 0,
        };
        // 1.0 - 0.30 - 0.20 - 0.25 = 0.25
        assert!((focus_score(600, &signals) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn bonus_cannot_offset_heavy_distraction() {
        let distracted = ActivitySignals {
            tab_switches: 10,
            app_minimized_count: 10,
            inactivity_periods: 10,
            focus_events: 1000,
        };
        // Bonus caps at 0.10, well below the combined penalties.
        assert!((focus_score(600, &distracted) - 0.35).abs() < 1e-9);
    }
}
