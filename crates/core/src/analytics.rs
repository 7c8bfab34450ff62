//! Typed widget analytics events and the pure aggregations behind the
//! dashboard charts.
//!
//! Raw rows carry a free-form `type` string plus a JSON `metadata` object.
//! They are parsed into [`EventKind`] once, so the aggregation code below
//! can match exhaustively instead of probing maps.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, Weekday};
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

pub const TOUR_STARTED: &str = "tour_started";
pub const TOUR_COMPLETED: &str = "tour_completed";
pub const TOUR_SKIPPED: &str = "tour_skipped";
pub const STEP_VIEWED: &str = "step_viewed";
pub const STEP_COMPLETED: &str = "step_completed";
pub const STEP_SKIPPED: &str = "step_skipped";

/// All event type strings the widget may send.
pub const VALID_EVENT_TYPES: &[&str] = &[
    TOUR_STARTED,
    TOUR_COMPLETED,
    TOUR_SKIPPED,
    STEP_VIEWED,
    STEP_COMPLETED,
    STEP_SKIPPED,
];

/// Metadata key holding the zero-based step index.
pub const STEP_INDEX_KEY: &str = "stepIndex";

/// Largest accepted `stepIndex`; its step number still fits a step order.
pub const MAX_STEP_INDEX: u32 = i32::MAX as u32 - 1;

/// Number of step columns the step charts show.
pub const STEP_CHART_LIMIT: usize = 5;

/// Shown by the step performance chart before a tenant has any steps.
pub const SAMPLE_STEP_PERFORMANCE: [(i32, f64); 5] =
    [(1, 95.0), (2, 94.0), (3, 94.0), (4, 93.0), (5, 75.0)];

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// What happened, with the step index attached where one is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    TourStarted,
    TourCompleted,
    TourSkipped,
    StepViewed { step_index: u32 },
    StepCompleted { step_index: u32 },
    StepSkipped { step_index: u32 },
}

impl EventKind {
    /// Parse a raw `(type, metadata)` pair.
    ///
    /// Step events require a non-negative integer `stepIndex` in `metadata`,
    /// no larger than [`MAX_STEP_INDEX`].
    pub fn parse(event_type: &str, metadata: &serde_json::Value) -> Result<Self, CoreError> {
        let step_index = || -> Result<u32, CoreError> {
            metadata
                .get(STEP_INDEX_KEY)
                .and_then(serde_json::Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .filter(|&v| v <= MAX_STEP_INDEX)
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "Event '{event_type}' requires a non-negative integer metadata.{STEP_INDEX_KEY}"
                    ))
                })
        };

        match event_type {
            TOUR_STARTED => Ok(EventKind::TourStarted),
            TOUR_COMPLETED => Ok(EventKind::TourCompleted),
            TOUR_SKIPPED => Ok(EventKind::TourSkipped),
            STEP_VIEWED => Ok(EventKind::StepViewed { step_index: step_index()? }),
            STEP_COMPLETED => Ok(EventKind::StepCompleted { step_index: step_index()? }),
            STEP_SKIPPED => Ok(EventKind::StepSkipped { step_index: step_index()? }),
            other => Err(CoreError::Validation(format!(
                "Invalid event type '{other}'. Must be one of: {VALID_EVENT_TYPES:?}"
            ))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::TourStarted => TOUR_STARTED,
            EventKind::TourCompleted => TOUR_COMPLETED,
            EventKind::TourSkipped => TOUR_SKIPPED,
            EventKind::StepViewed { .. } => STEP_VIEWED,
            EventKind::StepCompleted { .. } => STEP_COMPLETED,
            EventKind::StepSkipped { .. } => STEP_SKIPPED,
        }
    }

    /// One-based step number for step events.
    pub const fn step_number(self) -> Option<u32> {
        match self {
            EventKind::StepViewed { step_index }
            | EventKind::StepCompleted { step_index }
            | EventKind::StepSkipped { step_index } => step_index.checked_add(1),
            EventKind::TourStarted | EventKind::TourCompleted | EventKind::TourSkipped => None,
        }
    }
}

/// A parsed analytics event.
#[derive(Debug, Clone, PartialEq)]
pub struct TourEvent {
    pub tour_id: DbId,
    pub session_id: String,
    pub kind: EventKind,
    pub occurred_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Aggregation outputs
// ---------------------------------------------------------------------------

/// Average completion rate for one step position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepPerformance {
    pub step_number: i32,
    pub completion_rate: f64,
}

/// Tour starts on one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyViews {
    pub day: String,
    pub views: u64,
}

/// Event counts for one step position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StepFunnel {
    pub step_number: u32,
    pub views: u64,
    pub completions: u64,
    pub skips: u64,
}

impl StepFunnel {
    /// Views plus completions; what the step views chart plots.
    pub fn engagement(&self) -> u64 {
        self.views + self.completions
    }

    /// `skips / (skips + views)` as a whole percentage, 0 with no traffic.
    pub fn skip_rate(&self) -> u32 {
        let total = self.skips + self.views;
        if total == 0 {
            return 0;
        }
        (self.skips as f64 / total as f64 * 100.0).round() as u32
    }
}

/// Top-line engagement numbers for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngagementMetrics {
    pub total_views: u64,
    pub completion_rate: u32,
    pub avg_time_spent: String,
}

impl Default for EngagementMetrics {
    fn default() -> Self {
        Self {
            total_views: 0,
            completion_rate: 0,
            avg_time_spent: format_duration(Duration::zero()),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Average completion rate per step position, ascending by position.
///
/// Falls back to [`SAMPLE_STEP_PERFORMANCE`] when there are no steps.
pub fn average_step_performance(steps: &[(i32, f64)]) -> Vec<StepPerformance> {
    if steps.is_empty() {
        return sample_step_performance();
    }

    let mut buckets: BTreeMap<i32, (f64, u32)> = BTreeMap::new();
    for &(order, rate) in steps {
        let entry = buckets.entry(order).or_insert((0.0, 0));
        entry.0 += rate;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(step_number, (sum, n))| StepPerformance {
            step_number,
            completion_rate: round2(sum / f64::from(n)),
        })
        .collect()
}

pub fn sample_step_performance() -> Vec<StepPerformance> {
    SAMPLE_STEP_PERFORMANCE
        .iter()
        .map(|&(step_number, completion_rate)| StepPerformance {
            step_number,
            completion_rate,
        })
        .collect()
}

const WEEK_MONDAY_FIRST: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Tour starts during the seven days before `now`, bucketed by weekday
/// (UTC) and listed Monday first.
pub fn weekly_views(events: &[TourEvent], now: Timestamp) -> Vec<DailyViews> {
    let since = now - Duration::days(7);
    let mut counts: HashMap<Weekday, u64> = HashMap::new();

    for event in events {
        if event.kind == EventKind::TourStarted
            && event.occurred_at >= since
            && event.occurred_at <= now
        {
            *counts.entry(event.occurred_at.weekday()).or_default() += 1;
        }
    }

    WEEK_MONDAY_FIRST
        .iter()
        .map(|day| DailyViews {
            day: day.to_string(),
            views: counts.get(day).copied().unwrap_or(0),
        })
        .collect()
}

/// Per-step event counts for steps `1..=step_count`.
pub fn step_funnel(events: &[TourEvent], step_count: usize) -> Vec<StepFunnel> {
    let mut funnel: Vec<StepFunnel> = (1..)
        .take(step_count)
        .map(|step_number| StepFunnel {
            step_number,
            ..StepFunnel::default()
        })
        .collect();

    for event in events {
        let Some(number) = event.kind.step_number() else {
            continue;
        };
        let Some(slot) = (number as usize)
            .checked_sub(1)
            .and_then(|i| funnel.get_mut(i))
        else {
            continue;
        };
        match event.kind {
            EventKind::StepViewed { .. } => slot.views += 1,
            EventKind::StepCompleted { .. } => slot.completions += 1,
            EventKind::StepSkipped { .. } => slot.skips += 1,
            EventKind::TourStarted | EventKind::TourCompleted | EventKind::TourSkipped => {}
        }
    }

    funnel
}

/// Start count, completion percentage and mean session length.
///
/// Session length is measured from the first `tour_started` to the last
/// `tour_completed` of a session; sessions missing either are ignored.
pub fn engagement_metrics(events: &[TourEvent]) -> EngagementMetrics {
    let mut started = 0u64;
    let mut completed = 0u64;
    let mut sessions: HashMap<(DbId, &str), (Option<Timestamp>, Option<Timestamp>)> =
        HashMap::new();

    for event in events {
        let key = (event.tour_id, event.session_id.as_str());
        match event.kind {
            EventKind::TourStarted => {
                started += 1;
                let span = sessions.entry(key).or_default();
                span.0 = Some(span.0.map_or(event.occurred_at, |t| t.min(event.occurred_at)));
            }
            EventKind::TourCompleted => {
                completed += 1;
                let span = sessions.entry(key).or_default();
                span.1 = Some(span.1.map_or(event.occurred_at, |t| t.max(event.occurred_at)));
            }
            _ => {}
        }
    }

    let durations: Vec<Duration> = sessions
        .values()
        .filter_map(|span| match span {
            (Some(start), Some(end)) if end >= start => Some(*end - *start),
            _ => None,
        })
        .collect();

    let average = if durations.is_empty() {
        Duration::zero()
    } else {
        let total_secs: i64 = durations.iter().map(Duration::num_seconds).sum();
        Duration::seconds(total_secs / durations.len() as i64)
    };

    let completion_rate = if started == 0 {
        0
    } else {
        (completed as f64 / started as f64 * 100.0).round() as u32
    };

    EngagementMetrics {
        total_views: started,
        completion_rate,
        avg_time_spent: format_duration(average),
    }
}

/// Format a duration as `"{m}m {s}s"`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{}m {}s", secs / 60, secs % 60)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
