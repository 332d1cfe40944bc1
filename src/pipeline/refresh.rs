use crate::errors::AppResult;
use crate::feeds::{MetricFeed, Refetch};
use crate::layout::LayoutStore;
use crate::pipeline::{Widget, WidgetView};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

/// Owns one repeating timer per mounted widget instance. The timer reads the
/// configured interval at spawn time; `restart` applies interval changes.
pub struct RefreshDriver {
    widget_id: String,
    layout: LayoutStore,
    source: Arc<dyn Refetch>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshDriver {
    pub fn new(widget_id: String, layout: LayoutStore, source: Arc<dyn Refetch>) -> Self {
        Self {
            widget_id,
            layout,
            source,
            task: Mutex::new(None),
        }
    }

    /// Narrows a full feed to the refetch-only view the driver depends on.
    pub fn for_feed(widget_id: String, layout: LayoutStore, feed: Arc<dyn MetricFeed>) -> Self {
        struct FeedSource(Arc<dyn MetricFeed>);

        impl Refetch for FeedSource {
            fn refetch(&self) {
                self.0.refetch();
            }
        }

        Self::new(widget_id, layout, Arc::new(FeedSource(feed)))
    }

    /// Idempotent: a second start while running is ignored.
    pub fn start(&self) {
        let mut task = self.lock_task();
        if task.is_some() {
            return;
        }

        let period = Duration::from_millis(self.layout.refresh_interval(&self.widget_id));
        let source = self.source.clone();
        let widget_id = self.widget_id.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracing::debug!(widget = %widget_id, "refresh tick");
                source.refetch();
            }
        });
        *task = Some(handle);
    }

    /// Cancellation-safe teardown: the aborted task cannot fire again.
    pub fn stop(&self) {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
        }
    }

    pub fn restart(&self) {
        self.stop();
        self.start();
    }

    pub fn is_running(&self) -> bool {
        self.lock_task().is_some()
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().expect("refresh driver task lock")
    }
}

impl Drop for RefreshDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Pass-through render layer that ties the driver to the widget lifecycle.
pub struct RefreshLayer {
    inner: Box<dyn Widget>,
    driver: Arc<RefreshDriver>,
}

impl RefreshLayer {
    pub fn new(inner: Box<dyn Widget>, driver: Arc<RefreshDriver>) -> Self {
        Self { inner, driver }
    }
}

impl Widget for RefreshLayer {
    fn widget_id(&self) -> &str {
        self.inner.widget_id()
    }

    fn render(&self) -> AppResult<WidgetView> {
        self.inner.render()
    }

    fn mount(&self) {
        self.driver.start();
        self.inner.mount();
    }

    fn unmount(&self) {
        self.driver.stop();
        self.inner.unmount();
    }
}
