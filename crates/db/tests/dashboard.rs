//! Integration tests for `DashboardService` and `WidgetService` against the
//! in-memory store.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use serde_json::json;
use tourflow_core::analytics::SAMPLE_STEP_PERFORMANCE;
use tourflow_core::error::CoreError;
use tourflow_core::tour::TourStatus;
use tourflow_core::types::Timestamp;
use tourflow_db::dashboard::{DashboardService, RECENT_TOURS_LIMIT};
use tourflow_db::lifecycle::TourLifecycle;
use tourflow_db::models::analytics::CreateAnalyticsEvent;
use tourflow_db::models::profile::UpsertProfile;
use tourflow_db::models::step::CreateStep;
use tourflow_db::models::tour::{CreateTour, Tour};
use tourflow_db::store::{MemoryTourStore, StoreOp, TourStore};
use tourflow_db::widget::WidgetService;
use tourflow_db::DbError;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    store: Arc<MemoryTourStore>,
    tours: TourLifecycle,
    dashboard: DashboardService,
    widget: WidgetService,
}

fn setup() -> Fixture {
    let store = Arc::new(MemoryTourStore::new());
    Fixture {
        tours: TourLifecycle::new(store.clone()),
        dashboard: DashboardService::new(store.clone()),
        widget: WidgetService::new(store.clone()),
        store,
    }
}

async fn create_tour(fx: &Fixture, owner: Uuid, steps: usize, status: TourStatus) -> Tour {
    let input = CreateTour {
        title: "Checkout walkthrough".to_string(),
        description: "Shows the checkout flow".to_string(),
        status: Some(status),
        steps: (1..=steps)
            .map(|i| CreateStep {
                title: format!("Step {i}"),
                description: format!("Body {i}"),
            })
            .collect(),
    };
    fx.tours.create_tour(owner, &input).await.unwrap()
}

/// Wednesday 2024-01-10 12:00 UTC.
fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
}

fn at(day: u32, hour: u32, minute: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
}

async fn seed(
    fx: &Fixture,
    tour_id: i64,
    session: &str,
    kind: &str,
    step: Option<u32>,
    when: Timestamp,
) {
    let metadata = match step {
        Some(index) => json!({ "stepIndex": index }),
        None => json!({}),
    };
    fx.store
        .seed_event(tour_id, session, kind, metadata, when)
        .await;
}

// ---------------------------------------------------------------------------
// Stats and recent tours
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stats_counts_tours_steps_and_users() {
    let fx = setup();
    let owner = Uuid::new_v4();
    create_tour(&fx, owner, 5, TourStatus::Active).await;
    create_tour(&fx, owner, 6, TourStatus::Inactive).await;
    create_tour(&fx, Uuid::new_v4(), 7, TourStatus::Active).await;
    fx.store
        .upsert_profile(&UpsertProfile {
            id: owner,
            email: Some("owner@example.com".to_string()),
            display_name: None,
        })
        .await
        .unwrap();

    let stats = fx.dashboard.stats(owner).await;
    assert_eq!(stats.total_tours, 2);
    assert_eq!(stats.active_tours, 1);
    assert_eq!(stats.total_steps, 11);
    assert_eq!(stats.total_users, 1);
}

#[tokio::test]
async fn recent_tours_returns_newest_three() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let mut created = Vec::new();
    for steps in 5..=8 {
        created.push(create_tour(&fx, owner, steps, TourStatus::Inactive).await);
    }

    let recent = fx.dashboard.recent_tours(owner, RECENT_TOURS_LIMIT).await;
    let ids: Vec<i64> = recent.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![created[3].id, created[2].id, created[1].id]);
    assert_eq!(recent[0].total_steps, 8);
}

// ---------------------------------------------------------------------------
// Step performance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn step_performance_without_tours_is_sample_series() {
    let fx = setup();
    let perf = fx.dashboard.average_step_performance(Uuid::new_v4()).await;
    let rates: Vec<f64> = perf.iter().map(|p| p.completion_rate).collect();
    let sample: Vec<f64> = SAMPLE_STEP_PERFORMANCE.iter().map(|&(_, r)| r).collect();
    assert_eq!(rates, sample);
}

#[tokio::test]
async fn step_performance_averages_per_position() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let a = create_tour(&fx, owner, 2, TourStatus::Active).await;
    let b = create_tour(&fx, owner, 1, TourStatus::Active).await;
    let a_steps = fx.tours.list_steps(a.id, owner).await.unwrap();
    let b_steps = fx.tours.list_steps(b.id, owner).await.unwrap();
    fx.tours
        .set_completion_rate(a_steps[0].id, a.id, owner, 90.0)
        .await
        .unwrap();
    fx.tours
        .set_completion_rate(a_steps[1].id, a.id, owner, 50.0)
        .await
        .unwrap();
    fx.tours
        .set_completion_rate(b_steps[0].id, b.id, owner, 70.5)
        .await
        .unwrap();

    let perf = fx.dashboard.average_step_performance(owner).await;
    assert_eq!(perf.len(), 2);
    assert_eq!(perf[0].step_number, 1);
    assert_eq!(perf[0].completion_rate, 80.25);
    assert_eq!(perf[1].completion_rate, 50.0);
}

// ---------------------------------------------------------------------------
// Event aggregations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn weekly_views_empty_without_tours() {
    let fx = setup();
    assert!(fx.dashboard.weekly_views(Uuid::new_v4(), now()).await.is_empty());
}

#[tokio::test]
async fn weekly_views_buckets_recent_starts_monday_first() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let tour = create_tour(&fx, owner, 5, TourStatus::Active).await;
    // Mon 8th twice, Tue 9th once, Dec 30th is outside the window.
    seed(&fx, tour.id, "a", "tour_started", None, at(8, 9, 0)).await;
    seed(&fx, tour.id, "b", "tour_started", None, at(8, 10, 0)).await;
    seed(&fx, tour.id, "c", "tour_started", None, at(9, 10, 0)).await;
    seed(&fx, tour.id, "c", "tour_completed", None, at(9, 11, 0)).await;
    fx.store
        .seed_event(
            tour.id,
            "old",
            "tour_started",
            json!({}),
            Utc.with_ymd_and_hms(2023, 12, 30, 9, 0, 0).unwrap(),
        )
        .await;

    let week = fx.dashboard.weekly_views(owner, now()).await;
    assert_eq!(week.len(), 7);
    assert_eq!(week[0].day, "Mon");
    assert_eq!(week[0].views, 2);
    assert_eq!(week[1].views, 1);
    assert_eq!(week.iter().map(|d| d.views).sum::<u64>(), 3);
}

#[tokio::test]
async fn step_funnel_is_capped_at_five_steps() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let tour = create_tour(&fx, owner, 7, TourStatus::Active).await;
    seed(&fx, tour.id, "s", "step_viewed", Some(0), at(9, 9, 0)).await;
    seed(&fx, tour.id, "s", "step_viewed", Some(0), at(9, 9, 1)).await;
    seed(&fx, tour.id, "s", "step_viewed", Some(0), at(9, 9, 2)).await;
    seed(&fx, tour.id, "s", "step_skipped", Some(0), at(9, 9, 3)).await;
    seed(&fx, tour.id, "s", "step_completed", Some(1), at(9, 9, 4)).await;
    seed(&fx, tour.id, "s", "step_viewed", Some(6), at(9, 9, 5)).await;
    // No stepIndex: dropped.
    seed(&fx, tour.id, "s", "step_viewed", None, at(9, 9, 6)).await;

    let funnel = fx.dashboard.step_funnel(owner).await;
    assert_eq!(funnel.len(), 5);
    assert_eq!(funnel[0].views, 3);
    assert_eq!(funnel[0].skips, 1);
    assert_eq!(funnel[0].skip_rate(), 25);
    assert_eq!(funnel[1].completions, 1);
    assert_eq!(funnel[1].engagement(), 1);
    assert_eq!(funnel[4].views, 0);
}

#[tokio::test]
async fn step_funnel_follows_largest_tour_when_short() {
    let fx = setup();
    let owner = Uuid::new_v4();
    create_tour(&fx, owner, 2, TourStatus::Active).await;
    create_tour(&fx, owner, 3, TourStatus::Active).await;

    let funnel = fx.dashboard.step_funnel(owner).await;
    let numbers: Vec<u32> = funnel.iter().map(|f| f.step_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn metrics_measure_completed_sessions() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let tour = create_tour(&fx, owner, 5, TourStatus::Active).await;
    seed(&fx, tour.id, "a", "tour_started", None, at(9, 10, 0)).await;
    seed(&fx, tour.id, "a", "tour_completed", None, at(9, 10, 2)).await;
    seed(&fx, tour.id, "b", "tour_started", None, at(9, 11, 0)).await;
    seed(&fx, tour.id, "b", "tour_completed", None, at(9, 11, 4)).await;
    seed(&fx, tour.id, "c", "tour_started", None, at(9, 12, 0)).await;
    seed(&fx, tour.id, "d", "tour_started", None, at(9, 13, 0)).await;

    let metrics = fx.dashboard.metrics(owner).await;
    assert_eq!(metrics.total_views, 4);
    assert_eq!(metrics.completion_rate, 50);
    assert_eq!(metrics.avg_time_spent, "3m 0s");
}

#[tokio::test]
async fn status_breakdown_counts_both_states() {
    let fx = setup();
    let owner = Uuid::new_v4();
    assert!(fx.dashboard.tour_status_breakdown(owner).await.is_empty());

    create_tour(&fx, owner, 5, TourStatus::Active).await;
    create_tour(&fx, owner, 5, TourStatus::Inactive).await;
    create_tour(&fx, owner, 5, TourStatus::Inactive).await;

    let breakdown = fx.dashboard.tour_status_breakdown(owner).await;
    assert_eq!(breakdown.len(), 2);
    assert_eq!((breakdown[0].name, breakdown[0].value), ("active", 1));
    assert_eq!((breakdown[1].name, breakdown[1].value), ("inactive", 2));
}

#[tokio::test]
async fn aggregations_fall_back_to_defaults_on_store_failure() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let tour = create_tour(&fx, owner, 5, TourStatus::Active).await;
    seed(&fx, tour.id, "a", "tour_started", None, at(9, 10, 0)).await;

    fx.store.fail(StoreOp::ListTours);
    fx.store.fail(StoreOp::TourTotals);
    fx.store.fail(StoreOp::ListEvents);

    let stats = fx.dashboard.stats(owner).await;
    assert_eq!(stats.total_tours, 0);
    assert!(fx.dashboard.recent_tours(owner, 3).await.is_empty());
    assert_eq!(fx.dashboard.average_step_performance(owner).await.len(), 5);
    assert!(fx.dashboard.weekly_views(owner, now()).await.is_empty());
    assert!(fx.dashboard.step_funnel(owner).await.is_empty());
    assert!(fx.dashboard.tour_status_breakdown(owner).await.is_empty());

    let metrics = fx.dashboard.metrics(owner).await;
    assert_eq!(metrics.total_views, 0);
    assert_eq!(metrics.avg_time_spent, "0m 0s");
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

fn event(kind: &str, metadata: serde_json::Value) -> CreateAnalyticsEvent {
    CreateAnalyticsEvent {
        session_id: "sess-1".to_string(),
        event_type: kind.to_string(),
        metadata,
    }
}

#[tokio::test]
async fn widget_serves_active_tour_steps_in_order() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let tour = create_tour(&fx, owner, 5, TourStatus::Active).await;

    let payload = fx.widget.widget_tour(tour.id).await.unwrap();
    assert_eq!(payload.tour_id, tour.id);
    let orders: Vec<i32> = payload.steps.iter().map(|s| s.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    assert_eq!(payload.steps[0].content, "Body 1");
}

#[tokio::test]
async fn widget_hides_inactive_tour() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let tour = create_tour(&fx, owner, 5, TourStatus::Inactive).await;

    assert_matches!(
        fx.widget.widget_tour(tour.id).await,
        Err(DbError::Core(CoreError::NotFound { entity: "Tour", .. }))
    );
}

#[tokio::test]
async fn widget_records_valid_events_only() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let tour = create_tour(&fx, owner, 5, TourStatus::Active).await;

    let row = fx
        .widget
        .record_event(tour.id, &event("step_viewed", json!({ "stepIndex": 2 })))
        .await
        .unwrap();
    assert_eq!(row.event_type, "step_viewed");

    assert_matches!(
        fx.widget
            .record_event(tour.id, &event("step_viewed", json!({})))
            .await,
        Err(DbError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        fx.widget
            .record_event(tour.id, &event("page_loaded", json!({})))
            .await,
        Err(DbError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        fx.widget
            .record_event(9_999, &event("tour_started", json!({})))
            .await,
        Err(DbError::Core(CoreError::NotFound { .. }))
    );

    let mut blank = event("tour_started", json!({}));
    blank.session_id = "  ".to_string();
    assert_matches!(
        fx.widget.record_event(tour.id, &blank).await,
        Err(DbError::Core(CoreError::Validation(_)))
    );
}

#[tokio::test]
async fn deleting_tour_drops_its_events() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let tour = create_tour(&fx, owner, 5, TourStatus::Active).await;
    seed(&fx, tour.id, "a", "tour_started", None, at(9, 10, 0)).await;

    fx.tours.delete_tour(tour.id, owner).await.unwrap();

    let events = fx
        .store
        .list_events(&[tour.id], &["tour_started"], None)
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn out_of_range_step_index_is_rejected_and_never_breaks_the_funnel() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let tour = create_tour(&fx, owner, 1, TourStatus::Active).await;

    assert_matches!(
        fx.widget
            .record_event(tour.id, &event("step_viewed", json!({ "stepIndex": u32::MAX })))
            .await,
        Err(DbError::Core(CoreError::Validation(_)))
    );

    // Rows written before the bound existed still aggregate.
    seed(&fx, tour.id, "s", "step_viewed", Some(u32::MAX), at(9, 9, 0)).await;
    seed(&fx, tour.id, "s", "step_viewed", Some(0), at(9, 9, 1)).await;

    let funnel = fx.dashboard.step_funnel(owner).await;
    assert_eq!(funnel.len(), 1);
    assert_eq!(funnel[0].views, 1);
}

#[tokio::test]
async fn widget_rejects_non_object_metadata() {
    let fx = setup();
    let owner = Uuid::new_v4();
    let tour = create_tour(&fx, owner, 5, TourStatus::Active).await;

    for metadata in [json!(5), json!("x"), json!([1, 2]), serde_json::Value::Null] {
        assert_matches!(
            fx.widget
                .record_event(tour.id, &event("tour_started", metadata))
                .await,
            Err(DbError::Core(CoreError::Validation(_)))
        );
    }
    assert!(fx
        .store
        .list_events(&[tour.id], &["tour_started"], None)
        .await
        .unwrap()
        .is_empty());
}
