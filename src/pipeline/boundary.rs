use crate::errors::AppResult;
use crate::faultlog::FaultLog;
use crate::pipeline::{ViewBody, Widget, WidgetView};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetFault {
    pub message: String,
    pub stack: Option<String>,
}

/// Runs a fallible producer, captures the first fault, and holds it until a
/// user-initiated retry bumps the token and re-attempts from scratch.
#[derive(Debug, Default)]
pub struct FallibleBoundary {
    last_fault: Option<WidgetFault>,
    retry_token: u64,
}

impl FallibleBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// While a fault is held the producer is not re-invoked; callers keep
    /// getting the same fault until `retry` clears it.
    pub fn run<T>(&mut self, producer: impl FnOnce() -> AppResult<T>) -> Result<T, WidgetFault> {
        if let Some(fault) = &self.last_fault {
            return Err(fault.clone());
        }

        match catch_unwind(AssertUnwindSafe(producer)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(self.capture(WidgetFault {
                message: error.to_string(),
                stack: None,
            })),
            Err(panic) => Err(self.capture(WidgetFault {
                message: panic_message(&panic),
                stack: None,
            })),
        }
    }

    pub fn retry(&mut self) -> u64 {
        self.last_fault = None;
        self.retry_token += 1;
        self.retry_token
    }

    pub fn last_fault(&self) -> Option<&WidgetFault> {
        self.last_fault.as_ref()
    }

    pub fn retry_token(&self) -> u64 {
        self.retry_token
    }

    fn capture(&mut self, fault: WidgetFault) -> WidgetFault {
        self.last_fault = Some(fault.clone());
        fault
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "widget fault".to_string()
    }
}

/// Failure boundary layer: a fault in the wrapped subtree is contained here
/// and rendered as a fallback with a retry affordance. Data widgets also
/// report each fresh fault to the shared fault log.
pub struct CrashIsolationLayer {
    inner: Box<dyn Widget>,
    widget_name: String,
    boundary: Arc<Mutex<FallibleBoundary>>,
    fault_sink: Option<FaultLog>,
}

impl CrashIsolationLayer {
    pub fn new(
        inner: Box<dyn Widget>,
        widget_name: String,
        boundary: Arc<Mutex<FallibleBoundary>>,
        fault_sink: Option<FaultLog>,
    ) -> Self {
        Self {
            inner,
            widget_name,
            boundary,
            fault_sink,
        }
    }
}

impl Widget for CrashIsolationLayer {
    fn widget_id(&self) -> &str {
        self.inner.widget_id()
    }

    fn render(&self) -> AppResult<WidgetView> {
        let mut boundary = self.boundary.lock().expect("crash isolation boundary lock");
        let fresh = boundary.last_fault().is_none();

        match boundary.run(|| self.inner.render()) {
            Ok(view) => Ok(view),
            Err(fault) => {
                if fresh {
                    tracing::error!(
                        widget = %self.widget_name,
                        message = %fault.message,
                        "widget fault contained"
                    );
                    if let Some(sink) = &self.fault_sink {
                        sink.record(&self.widget_name, &fault.message, fault.stack.clone());
                    }
                }
                Ok(WidgetView::new(
                    self.inner.widget_id(),
                    ViewBody::Faulted {
                        message: fault.message,
                        retry_token: boundary.retry_token(),
                    },
                ))
            }
        }
    }

    fn mount(&self) {
        self.inner.mount();
    }

    fn unmount(&self) {
        self.inner.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::{CrashIsolationLayer, FallibleBoundary};
    use crate::errors::AppError;
    use crate::faultlog::FaultLog;
    use crate::pipeline::{ViewBody, Widget, WidgetView};
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    struct FlakyWidget {
        should_panic: Arc<AtomicBool>,
        render_calls: Arc<AtomicU64>,
    }

    impl Widget for FlakyWidget {
        fn widget_id(&self) -> &str {
            "crypto"
        }

        fn render(&self) -> crate::errors::AppResult<WidgetView> {
            self.render_calls.fetch_add(1, Ordering::SeqCst);
            if self.should_panic.load(Ordering::SeqCst) {
                panic!("price feed exploded");
            }
            Ok(WidgetView::new(
                "crypto",
                ViewBody::Content {
                    data: serde_json::json!({ "price": 101.0 }),
                },
            ))
        }
    }

    fn isolated(
        should_panic: Arc<AtomicBool>,
        render_calls: Arc<AtomicU64>,
        sink: Option<FaultLog>,
    ) -> (CrashIsolationLayer, Arc<Mutex<FallibleBoundary>>) {
        let boundary = Arc::new(Mutex::new(FallibleBoundary::new()));
        let layer = CrashIsolationLayer::new(
            Box::new(FlakyWidget {
                should_panic,
                render_calls,
            }),
            "CryptoWidget".to_string(),
            boundary.clone(),
            sink,
        );
        (layer, boundary)
    }

    #[test]
    fn panic_is_contained_and_fallback_rendered() {
        let should_panic = Arc::new(AtomicBool::new(true));
        let calls = Arc::new(AtomicU64::new(0));
        let (layer, _) = isolated(should_panic, calls.clone(), None);

        let view = layer.render().unwrap();
        match view.body {
            ViewBody::Faulted { message, .. } => assert_eq!(message, "price feed exploded"),
            other => panic!("expected fallback, got {other:?}"),
        }

        // Held fault: further renders do not re-invoke the producer.
        let _ = layer.render().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retry_with_fault_removed_restores_the_widget() {
        let should_panic = Arc::new(AtomicBool::new(true));
        let calls = Arc::new(AtomicU64::new(0));
        let (layer, boundary) = isolated(should_panic.clone(), calls, None);

        assert!(matches!(layer.render().unwrap().body, ViewBody::Faulted { .. }));

        should_panic.store(false, Ordering::SeqCst);
        let token = boundary.lock().unwrap().retry();
        assert_eq!(token, 1);

        assert!(matches!(layer.render().unwrap().body, ViewBody::Content { .. }));
    }

    #[test]
    fn fresh_faults_are_reported_to_the_sink_once() {
        let should_panic = Arc::new(AtomicBool::new(true));
        let calls = Arc::new(AtomicU64::new(0));
        let sink = FaultLog::new();
        let (layer, _) = isolated(should_panic, calls, Some(sink.clone()));

        let _ = layer.render().unwrap();
        let _ = layer.render().unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].widget_name, "CryptoWidget");
        assert_eq!(records[0].message, "price feed exploded");
    }

    #[test]
    fn explicit_error_results_are_faults_too() {
        struct FailingWidget;

        impl Widget for FailingWidget {
            fn widget_id(&self) -> &str {
                "posts"
            }

            fn render(&self) -> crate::errors::AppResult<WidgetView> {
                Err(AppError::Internal("render pipeline broke".to_string()))
            }
        }

        let mut boundary = FallibleBoundary::new();
        let result = boundary.run(|| FailingWidget.render());
        let fault = result.unwrap_err();
        assert!(fault.message.contains("render pipeline broke"));
        assert!(boundary.last_fault().is_some());
    }
}
