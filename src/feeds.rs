use crate::errors::AppResult;
use crate::models::{now_ms, AlertDomain, MetricObservation};
use crate::pipeline::{ViewBody, Widget, WidgetView};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// The one thing the periodic refresh layer needs from a data source.
pub trait Refetch: Send + Sync {
    fn refetch(&self);
}

/// Canonical shape of a feed query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum FeedState {
    Idle,
    Loading,
    Success {
        data: Vec<MetricObservation>,
        fetched_at: i64,
    },
    Error {
        error: String,
        retry_count: u32,
    },
}

/// External data feed boundary: the pipeline needs `refetch`, the alert
/// engine needs the success payload, widgets render from `state`.
pub trait MetricFeed: Refetch {
    fn domain(&self) -> AlertDomain;
    fn state(&self) -> FeedState;
}

type BatchHook = Box<dyn Fn(&[MetricObservation]) + Send + Sync>;

/// In-memory feed that steps through a scripted sequence of states, one per
/// `refetch`. Used by tests and demo wiring in place of a network client.
pub struct ScriptedFeed {
    domain: AlertDomain,
    script: Mutex<VecDeque<FeedState>>,
    current: Mutex<FeedState>,
    refetch_count: Mutex<u64>,
    on_success: Mutex<Option<BatchHook>>,
}

impl ScriptedFeed {
    pub fn new(domain: AlertDomain) -> Self {
        Self {
            domain,
            script: Mutex::new(VecDeque::new()),
            current: Mutex::new(FeedState::Idle),
            refetch_count: Mutex::new(0),
            on_success: Mutex::new(None),
        }
    }

    pub fn push_state(&self, state: FeedState) {
        self.script.lock().expect("feed script lock").push_back(state);
    }

    pub fn push_success(&self, observations: Vec<MetricObservation>) {
        self.push_state(FeedState::Success {
            data: observations,
            fetched_at: now_ms(),
        });
    }

    /// Hook invoked with every successful batch; this is how a composed
    /// dashboard routes fresh observations into alert evaluation.
    pub fn set_on_success(&self, hook: impl Fn(&[MetricObservation]) + Send + Sync + 'static) {
        *self.on_success.lock().expect("feed hook lock") = Some(Box::new(hook));
    }

    pub fn refetch_count(&self) -> u64 {
        *self.refetch_count.lock().expect("feed counter lock")
    }
}

impl Refetch for ScriptedFeed {
    fn refetch(&self) {
        *self.refetch_count.lock().expect("feed counter lock") += 1;

        let next = self.script.lock().expect("feed script lock").pop_front();
        let Some(state) = next else {
            return;
        };

        if let FeedState::Success { data, .. } = &state {
            if let Some(hook) = self.on_success.lock().expect("feed hook lock").as_ref() {
                hook(data);
            }
        }
        *self.current.lock().expect("feed state lock") = state;
    }
}

impl MetricFeed for ScriptedFeed {
    fn domain(&self) -> AlertDomain {
        self.domain
    }

    fn state(&self) -> FeedState {
        self.current.lock().expect("feed state lock").clone()
    }
}

/// Base widget over a feed. Every feed status maps to a dedicated view; a
/// feed error stays widget-local and never trips crash isolation.
pub struct FeedWidget {
    widget_id: String,
    feed: Arc<dyn MetricFeed>,
}

impl FeedWidget {
    pub fn new(widget_id: impl Into<String>, feed: Arc<dyn MetricFeed>) -> Self {
        Self {
            widget_id: widget_id.into(),
            feed,
        }
    }
}

impl Widget for FeedWidget {
    fn widget_id(&self) -> &str {
        &self.widget_id
    }

    fn render(&self) -> AppResult<WidgetView> {
        let body = match self.feed.state() {
            FeedState::Idle | FeedState::Loading => ViewBody::Loading,
            FeedState::Error { error, .. } => ViewBody::FeedFailure { message: error },
            FeedState::Success { data, fetched_at } => ViewBody::Content {
                data: serde_json::json!({
                    "observations": data,
                    "fetchedAt": fetched_at,
                }),
            },
        };
        Ok(WidgetView::new(self.widget_id.clone(), body))
    }
}
