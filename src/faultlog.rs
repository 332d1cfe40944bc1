use crate::models::FaultRecord;
use chrono::Utc;
use std::sync::{Arc, Mutex};

/// Shared sink for widget faults captured by crash isolation. The read path
/// feeds an operator-facing error view.
#[derive(Clone, Default)]
pub struct FaultLog {
    inner: Arc<Mutex<Vec<FaultRecord>>>,
}

impl FaultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        widget_name: impl Into<String>,
        message: impl Into<String>,
        stack: Option<String>,
    ) -> FaultRecord {
        let record = FaultRecord {
            widget_name: widget_name.into(),
            message: message.into(),
            stack,
            timestamp: Utc::now(),
        };
        let mut records = self.lock();
        records.push(record.clone());
        tracing::warn!(
            widget = %record.widget_name,
            message = %record.message,
            "widget fault recorded"
        );
        record
    }

    pub fn records(&self) -> Vec<FaultRecord> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<FaultRecord>> {
        self.inner.lock().expect("fault log lock")
    }
}
