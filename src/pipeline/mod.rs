pub mod boundary;
pub mod drag;
pub mod gates;
pub mod refresh;

use crate::errors::{AppError, AppResult};
use crate::faultlog::FaultLog;
use crate::feeds::MetricFeed;
use crate::layout::LayoutStore;
use crate::models::{WidgetClass, WidgetSpec};
use crate::pipeline::boundary::{CrashIsolationLayer, FallibleBoundary, WidgetFault};
use crate::pipeline::drag::{DragController, DragHandleLayer};
use crate::pipeline::gates::{AuthFallback, AuthGate, PermissionGate};
use crate::pipeline::refresh::{RefreshDriver, RefreshLayer};
use crate::session::SessionManager;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// The widget-shaped interface every layer takes and returns. Layers wrap an
/// inner widget and forward `mount`/`unmount` through the stack.
pub trait Widget: Send + Sync {
    fn widget_id(&self) -> &str;
    fn render(&self) -> AppResult<WidgetView>;
    fn mount(&self) {}
    fn unmount(&self) {}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetView {
    pub widget_id: String,
    pub body: ViewBody,
    pub drag_handle: bool,
}

impl WidgetView {
    pub fn new(widget_id: impl Into<String>, body: ViewBody) -> Self {
        Self {
            widget_id: widget_id.into(),
            body,
            drag_handle: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ViewBody {
    Content { data: serde_json::Value },
    Loading,
    /// Role absent: render nothing, not the denial placeholder.
    Empty,
    Unauthenticated,
    RedirectToLogin { target: String },
    PermissionDenied,
    Faulted { message: String, retry_token: u64 },
    FeedFailure { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    AuthGate,
    PermissionGate,
    CrashIsolation,
    PeriodicRefresh,
    DragHandle,
}

/// Outer-to-inner decorator order. First element wraps everything else;
/// composition folds over this list right-to-left.
pub const DATA_WIDGET_STACK: [LayerKind; 5] = [
    LayerKind::AuthGate,
    LayerKind::PermissionGate,
    LayerKind::CrashIsolation,
    LayerKind::PeriodicRefresh,
    LayerKind::DragHandle,
];

/// Simple widgets manage their own fetch lifecycle; no refresh layer.
pub const SIMPLE_WIDGET_STACK: [LayerKind; 4] = [
    LayerKind::AuthGate,
    LayerKind::PermissionGate,
    LayerKind::CrashIsolation,
    LayerKind::DragHandle,
];

pub fn stack_for(class: WidgetClass) -> &'static [LayerKind] {
    match class {
        WidgetClass::Simple => &SIMPLE_WIDGET_STACK,
        WidgetClass::Data => &DATA_WIDGET_STACK,
    }
}

/// Shared collaborators the layers close over at composition time.
#[derive(Clone)]
pub struct ComposeContext {
    pub session: SessionManager,
    pub layout: LayoutStore,
    pub fault_log: FaultLog,
    pub auth_fallback: AuthFallback,
}

/// Applies the class-appropriate decorator stack around `base`, innermost
/// last. Data widgets must come with a feed for the refresh layer.
pub fn compose(
    spec: &WidgetSpec,
    base: Box<dyn Widget>,
    feed: Option<Arc<dyn MetricFeed>>,
    ctx: &ComposeContext,
) -> AppResult<GovernedWidget> {
    let boundary = Arc::new(Mutex::new(FallibleBoundary::new()));
    let drag = Arc::new(DragController::new(spec.id.clone(), ctx.layout.clone()));
    let mut refresh = None;

    let mut widget = base;
    for layer in stack_for(spec.class).iter().rev() {
        widget = match layer {
            LayerKind::DragHandle => Box::new(DragHandleLayer::new(widget, drag.clone())),
            LayerKind::PeriodicRefresh => {
                let feed = feed.clone().ok_or_else(|| {
                    AppError::Config(format!("data widget '{}' composed without a feed", spec.id))
                })?;
                let driver = Arc::new(RefreshDriver::for_feed(
                    spec.id.clone(),
                    ctx.layout.clone(),
                    feed,
                ));
                refresh = Some(driver.clone());
                Box::new(RefreshLayer::new(widget, driver))
            }
            LayerKind::CrashIsolation => {
                let fault_sink = match spec.class {
                    WidgetClass::Data => Some(ctx.fault_log.clone()),
                    WidgetClass::Simple => None,
                };
                Box::new(CrashIsolationLayer::new(
                    widget,
                    spec.name.clone(),
                    boundary.clone(),
                    fault_sink,
                ))
            }
            LayerKind::PermissionGate => Box::new(PermissionGate::new(
                widget,
                ctx.session.clone(),
                spec.required_capability,
            )),
            LayerKind::AuthGate => Box::new(AuthGate::new(
                widget,
                ctx.session.clone(),
                ctx.auth_fallback.clone(),
            )),
        };
    }

    Ok(GovernedWidget {
        widget_id: spec.id.clone(),
        outer: widget,
        boundary,
        refresh,
        drag,
        layout: ctx.layout.clone(),
    })
}

/// A widget after the full decorator stack is applied. Not a stored entity;
/// its id keys placement and refresh-interval lookups.
pub struct GovernedWidget {
    widget_id: String,
    outer: Box<dyn Widget>,
    boundary: Arc<Mutex<FallibleBoundary>>,
    refresh: Option<Arc<RefreshDriver>>,
    drag: Arc<DragController>,
    layout: LayoutStore,
}

impl GovernedWidget {
    pub fn widget_id(&self) -> &str {
        &self.widget_id
    }

    /// Always yields a renderable view; nothing escapes past the stack.
    pub fn render(&self) -> WidgetView {
        match self.outer.render() {
            Ok(view) => view,
            Err(error) => WidgetView::new(
                self.widget_id.clone(),
                ViewBody::Faulted {
                    message: error.to_string(),
                    retry_token: self.retry_token(),
                },
            ),
        }
    }

    pub fn mount(&self) {
        self.outer.mount();
    }

    pub fn unmount(&self) {
        self.outer.unmount();
    }

    /// User-initiated: clears fault state so the next render re-attempts the
    /// wrapped subtree from scratch.
    pub fn retry(&self) -> u64 {
        self.lock_boundary().retry()
    }

    pub fn last_fault(&self) -> Option<WidgetFault> {
        self.lock_boundary().last_fault().cloned()
    }

    pub fn retry_token(&self) -> u64 {
        self.lock_boundary().retry_token()
    }

    /// Updates the stored interval and tears down/restarts the running timer
    /// so the new period takes effect immediately.
    pub fn set_refresh_interval(&self, interval_ms: u64) {
        self.layout.set_refresh_interval(&self.widget_id, interval_ms);
        if let Some(driver) = &self.refresh {
            driver.restart();
        }
    }

    pub fn begin_drag(&self, x: f64, y: f64) {
        self.drag.begin(x, y);
    }

    pub fn track_drag(&self, x: f64, y: f64) {
        self.drag.track(x, y);
    }

    /// Commits at most one swap against the layout store; a release with no
    /// active drag is a no-op.
    pub fn release_drag(&self) -> Option<(String, String)> {
        self.drag.release()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    fn lock_boundary(&self) -> std::sync::MutexGuard<'_, FallibleBoundary> {
        self.boundary.lock().expect("crash isolation boundary lock")
    }
}
