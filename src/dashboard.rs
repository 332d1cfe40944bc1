use crate::alerts::{AlertEngine, AlertStore};
use crate::config::{self, DashboardConfig};
use crate::errors::AppResult;
use crate::faultlog::FaultLog;
use crate::feeds::{FeedState, FeedWidget, MetricFeed};
use crate::layout::{LayoutSnapshot, LayoutStore};
use crate::models::{
    AlertConfig, AlertConfigPayload, AlertEvent, AlertDomain, FaultRecord, MetricObservation,
    Notification, OperatorProfile, Role, Severity, WidgetPlacement, WidgetSpec,
};
use crate::notifications::NotificationQueue;
use crate::pipeline::{self, ComposeContext, GovernedWidget, Widget};
use crate::session::{AuthSyncChannel, SessionManager};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

const NOTIFICATION_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Process-lifetime facade over the dashboard subsystems: session, layout,
/// notifications, alerts, fault log, and the composition pipeline.
#[derive(Clone)]
pub struct DashboardCore {
    config: DashboardConfig,
    session: SessionManager,
    sync: AuthSyncChannel,
    layout: LayoutStore,
    notifications: NotificationQueue,
    alerts: AlertStore,
    engine: Arc<AlertEngine>,
    fault_log: FaultLog,
}

impl DashboardCore {
    pub fn new(data_dir: impl AsRef<Path>) -> AppResult<Self> {
        let config = config::load(data_dir.as_ref())?;
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: DashboardConfig) -> Self {
        let sync = AuthSyncChannel::new();
        let session = SessionManager::new(sync.clone());
        let notifications = NotificationQueue::with_limits(
            crate::notifications::NOTIFICATION_TTL_MS,
            config.notification_bound,
        );
        let alerts = AlertStore::new(config.alert_history_cap);
        let engine = Arc::new(AlertEngine::new(config.suppression));

        Self {
            config,
            session,
            sync,
            layout: LayoutStore::new(),
            notifications,
            alerts,
            engine,
            fault_log: FaultLog::new(),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn sync_channel(&self) -> &AuthSyncChannel {
        &self.sync
    }

    /// Background upkeep: cross-tab logout observation plus periodic expiry
    /// of stale notifications.
    pub fn start_maintenance(&self) -> Vec<JoinHandle<()>> {
        let session_listener = self.session.attach_sync();

        let notifications = self.notifications.clone();
        let sweeper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(NOTIFICATION_SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let swept = notifications.sweep_expired();
                if swept > 0 {
                    tracing::debug!(swept, "expired notifications removed");
                }
            }
        });

        vec![session_listener, sweeper]
    }

    // ─── Session ─────────────────────────────────────────────────────────

    pub fn login(&self, profile: OperatorProfile) {
        self.session.login(profile);
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn role(&self) -> Option<Role> {
        self.session.role()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    // ─── Composition ─────────────────────────────────────────────────────

    pub fn compose_widget(
        &self,
        spec: &WidgetSpec,
        base: Box<dyn Widget>,
        feed: Option<Arc<dyn MetricFeed>>,
    ) -> AppResult<GovernedWidget> {
        let ctx = ComposeContext {
            session: self.session.clone(),
            layout: self.layout.clone(),
            fault_log: self.fault_log.clone(),
            auth_fallback: self.config.auth_fallback.clone(),
        };
        pipeline::compose(spec, base, feed, &ctx)
    }

    /// Data widget over a feed: the feed renders the base view and also
    /// drives the refresh layer.
    pub fn compose_data_widget(
        &self,
        spec: &WidgetSpec,
        feed: Arc<dyn MetricFeed>,
    ) -> AppResult<GovernedWidget> {
        let base = Box::new(FeedWidget::new(spec.id.clone(), feed.clone()));
        self.compose_widget(spec, base, Some(feed))
    }

    // ─── Alert evaluation ────────────────────────────────────────────────

    /// Entry point for every successful observation batch: evaluates the
    /// active configs, records triggered events newest-first, and raises one
    /// warning notification per event.
    pub fn ingest_observations(
        &self,
        domain: AlertDomain,
        observations: &[MetricObservation],
    ) -> Vec<AlertEvent> {
        let configs = self.alerts.configs();
        let events = self.engine.evaluate(&configs, domain, observations);
        for event in &events {
            self.notifications.push(event.message.clone(), Severity::Warning);
            self.alerts.record_event(event.clone());
        }
        if !events.is_empty() {
            tracing::info!(
                domain = domain.as_str(),
                count = events.len(),
                "alert conditions triggered"
            );
        }
        events
    }

    /// Feed status transitions surface as notifications; an error status is
    /// widget-local and never counts as a fault.
    pub fn report_feed_status(&self, widget_name: &str, state: &FeedState) {
        match state {
            FeedState::Error { .. } => {
                self.notifications.push(
                    format!("Failed to load {widget_name} data"),
                    Severity::Error,
                );
            }
            FeedState::Success { .. } => {
                self.notifications
                    .push(format!("{widget_name} updated"), Severity::Success);
            }
            FeedState::Idle | FeedState::Loading => {}
        }
    }

    // ─── Layout ──────────────────────────────────────────────────────────

    pub fn layout_snapshot(&self) -> LayoutSnapshot {
        self.layout.snapshot()
    }

    pub fn set_layout(&self, widgets: Vec<WidgetPlacement>) -> LayoutSnapshot {
        self.layout.set_layout(widgets)
    }

    pub fn toggle_widget_visibility(&self, widget_id: &str) -> LayoutSnapshot {
        self.layout.toggle_visibility(widget_id)
    }

    pub fn set_refresh_interval(&self, widget_id: &str, interval_ms: u64) -> LayoutSnapshot {
        self.layout.set_refresh_interval(widget_id, interval_ms)
    }

    pub fn swap_widgets(&self, from_id: &str, to_id: &str) -> LayoutSnapshot {
        self.layout.swap(from_id, to_id)
    }

    pub fn reset_layout_to_default(&self) -> LayoutSnapshot {
        self.layout.reset_to_default()
    }

    pub fn layout(&self) -> &LayoutStore {
        &self.layout
    }

    // ─── Alerts ──────────────────────────────────────────────────────────

    pub fn add_alert_config(&self, payload: AlertConfigPayload) -> AlertConfig {
        self.alerts.add_config(payload)
    }

    pub fn remove_alert_config(&self, id: &str) {
        self.alerts.remove_config(id);
    }

    pub fn clear_alert_configs(&self) {
        self.alerts.clear_configs();
    }

    pub fn alert_configs(&self) -> Vec<AlertConfig> {
        self.alerts.configs()
    }

    pub fn alert_history(&self) -> Vec<AlertEvent> {
        self.alerts.history()
    }

    pub fn clear_alert_history(&self) {
        self.alerts.clear_history();
    }

    // ─── Notifications ───────────────────────────────────────────────────

    pub fn push_notification(&self, message: impl Into<String>, severity: Severity) -> Notification {
        self.notifications.push(message, severity)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.active()
    }

    pub fn dismiss_notification(&self, id: &str) {
        self.notifications.dismiss(id);
    }

    pub fn clear_notifications(&self) {
        self.notifications.clear();
    }

    // ─── Fault log ───────────────────────────────────────────────────────

    pub fn fault_records(&self) -> Vec<FaultRecord> {
        self.fault_log.records()
    }

    pub fn clear_fault_records(&self) {
        self.fault_log.clear();
    }
}
