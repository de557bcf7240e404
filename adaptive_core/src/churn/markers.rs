//! Behavioural markers derived from the behaviour window.

use chrono::{DateTime, Duration, Utc};
use player_model::{ActionType, BehaviorLogEntry};
use serde::{Deserialize, Serialize};

/// Trend markers, each in [0, 1] where higher means more disengaged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ChurnMarkers {
    /// Relative drop in session length, later sessions vs earlier.
    pub session_length_decline: f32,
    /// Drop in success rate, later actions vs earlier.
    pub success_decline: f32,
    /// Rise in reported error rate, later actions vs earlier.
    pub error_increase: f32,
    /// Relative growth of the gap between session starts.
    pub login_frequency_decline: f32,
}

impl ChurnMarkers {
    /// Copy with every marker clamped to [0, 1]; NaN becomes 0.
    pub fn clamped(&self) -> Self {
        let c = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            session_length_decline: c(self.session_length_decline),
            success_decline: c(self.success_decline),
            error_increase: c(self.error_increase),
            login_frequency_decline: c(self.login_frequency_decline),
        }
    }
}

/// Markers plus the engagement score derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub markers: ChurnMarkers,
    /// 1.0 = fully engaged, 0.0 = every marker saturated.
    pub engagement_score: f32,
    pub sessions: usize,
    pub entries: usize,
}

/// A run of activity within the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Session {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub actions: usize,
    /// Ended by an explicit session-end marker.
    pub closed: bool,
}

impl Session {
    fn open(at: DateTime<Utc>) -> Self {
        Self {
            start: at,
            end: at,
            actions: 0,
            closed: false,
        }
    }

    pub fn length_secs(&self) -> f32 {
        seconds_between(self.start, self.end)
    }
}

/// Split entries into sessions at session-start markers and idle gaps
/// longer than `max_gap`. A session-end marker closes the current session.
pub fn split_sessions<'a>(
    entries: impl IntoIterator<Item = &'a BehaviorLogEntry>,
    max_gap: Duration,
) -> Vec<Session> {
    let mut sessions: Vec<Session> = Vec::new();
    let mut current: Option<Session> = None;

    for entry in entries {
        let starts_new = match &current {
            None => true,
            Some(session) => {
                session.closed
                    || entry.action_type == ActionType::SessionStart
                    || entry.timestamp - session.end > max_gap
            }
        };

        if starts_new {
            if let Some(done) = current.take() {
                sessions.push(done);
            }
            current = Some(Session::open(entry.timestamp));
        }

        if let Some(session) = current.as_mut() {
            session.end = entry.timestamp;
            if !entry.action_type.is_session_marker() {
                session.actions += 1;
            }
            if entry.action_type == ActionType::SessionEnd {
                session.closed = true;
            }
        }
    }

    if let Some(done) = current {
        sessions.push(done);
    }
    sessions
}

/// Means of the earlier and later halves, if each half has `min_per_half` values.
pub fn split_means(values: &[f32], min_per_half: usize) -> Option<(f32, f32)> {
    let half = values.len() / 2;
    if half == 0 || half < min_per_half {
        return None;
    }
    let early = &values[..half];
    let late = &values[values.len() - half..];
    Some((mean(early), mean(late)))
}

/// Derive all four markers from the window.
pub fn derive_markers(
    entries: &[BehaviorLogEntry],
    max_gap: Duration,
    min_per_half: usize,
) -> (ChurnMarkers, usize) {
    let sessions = split_sessions(entries, max_gap);

    // The trailing session is still running unless explicitly closed.
    let finished: Vec<f32> = sessions
        .iter()
        .enumerate()
        .filter(|(i, s)| s.closed || *i + 1 < sessions.len())
        .map(|(_, s)| s.length_secs())
        .collect();
    let session_length_decline = split_means(&finished, min_per_half)
        .map(|(early, late)| relative_drop(early, late))
        .unwrap_or(0.0);

    let outcomes: Vec<f32> = entries
        .iter()
        .filter_map(|e| e.succeeded)
        .map(|s| if s { 1.0 } else { 0.0 })
        .collect();
    let success_decline = split_means(&outcomes, min_per_half)
        .map(|(early, late)| early - late)
        .unwrap_or(0.0);

    let errors: Vec<f32> = entries.iter().filter_map(|e| e.error_rate).collect();
    let error_increase = split_means(&errors, min_per_half)
        .map(|(early, late)| late - early)
        .unwrap_or(0.0);

    let gaps: Vec<f32> = sessions
        .windows(2)
        .map(|pair| seconds_between(pair[0].start, pair[1].start))
        .collect();
    let login_frequency_decline = split_means(&gaps, min_per_half)
        .map(|(early, late)| relative_drop(late, early))
        .unwrap_or(0.0);

    let markers = ChurnMarkers {
        session_length_decline,
        success_decline,
        error_increase,
        login_frequency_decline,
    }
    .clamped();

    (markers, sessions.len())
}

/// `(from - to) / from`, or 0.0 when `from` is not positive.
fn relative_drop(from: f32, to: f32) -> f32 {
    if from > 0.0 {
        (from - to) / from
    } else {
        0.0
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f32 {
    (to - from).num_milliseconds() as f32 / 1000.0
}
