pub mod alerts;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod faultlog;
pub mod feeds;
pub mod layout;
pub mod models;
pub mod notifications;
pub mod permissions;
pub mod pipeline;
pub mod session;

pub use crate::alerts::{AlertEngine, AlertStore, SuppressionPolicy};
pub use crate::config::DashboardConfig;
pub use crate::dashboard::DashboardCore;
pub use crate::errors::{AppError, AppResult};
pub use crate::faultlog::FaultLog;
pub use crate::feeds::{FeedState, FeedWidget, MetricFeed, Refetch, ScriptedFeed};
pub use crate::layout::{LayoutSnapshot, LayoutStore};
pub use crate::models::{
    AlertCondition, AlertConfig, AlertConfigPayload, AlertDomain, AlertEvent, Capability,
    MetricObservation, Notification, OperatorProfile, Role, Severity, WidgetClass,
    WidgetPlacement, WidgetSpec,
};
pub use crate::notifications::NotificationQueue;
pub use crate::pipeline::gates::AuthFallback;
pub use crate::pipeline::{
    GovernedWidget, LayerKind, ViewBody, Widget, WidgetView, DATA_WIDGET_STACK,
    SIMPLE_WIDGET_STACK,
};
pub use crate::session::{AuthSyncChannel, SessionManager};

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub fn init_telemetry(data_dir: &Path, default_filter: &str) -> AppResult<()> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "opsdeck.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}
