use std::sync::Arc;

use tourflow_db::dashboard::DashboardService;
use tourflow_db::lifecycle::TourLifecycle;
use tourflow_db::store::TourStore;
use tourflow_db::widget::WidgetService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the services share one `Arc<dyn TourStore>`.
#[derive(Clone)]
pub struct AppState {
    /// The backing store (Postgres in production, in-memory in tests).
    pub store: Arc<dyn TourStore>,
    /// Tour and step mutations.
    pub tours: TourLifecycle,
    /// Dashboard and analytics reads.
    pub dashboard: DashboardService,
    /// Public widget reads and event ingest.
    pub widget: WidgetService,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn TourStore>, config: ServerConfig) -> Self {
        Self {
            tours: TourLifecycle::new(Arc::clone(&store)),
            dashboard: DashboardService::new(Arc::clone(&store)),
            widget: WidgetService::new(Arc::clone(&store)),
            store,
            config: Arc::new(config),
        }
    }
}
