use crate::models::{
    now_ms, AlertCondition, AlertConfig, AlertConfigPayload, AlertEvent, AlertDomain,
    MetricObservation,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const DEFAULT_HISTORY_CAP: usize = 500;

/// Re-trigger policy for a condition that stays true across batches. The
/// default is continuous alerting: no hold-off window at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SuppressionPolicy {
    #[default]
    None,
    Holdoff {
        window_ms: i64,
    },
}

/// Strict threshold test; an exact-equal value never triggers.
pub fn check_threshold(config: &AlertConfig, value: f64) -> bool {
    match config.condition {
        AlertCondition::Below => value < config.threshold,
        AlertCondition::Above => value > config.threshold,
    }
}

fn alert_message(config: &AlertConfig, observation: &MetricObservation) -> String {
    let comparison = match config.condition {
        AlertCondition::Above => ">",
        AlertCondition::Below => "<",
    };
    format!(
        "{} is {} threshold: {:.2} {} {}",
        observation.subject,
        config.condition.as_str(),
        observation.value,
        comparison,
        config.threshold
    )
}

/// Data-driven threshold evaluation. Runs on every successful observation
/// batch; one event per triggering (config, subject, batch) combination.
pub struct AlertEngine {
    suppression: SuppressionPolicy,
    last_triggered: Mutex<HashMap<(String, String), i64>>,
}

impl AlertEngine {
    pub fn new(suppression: SuppressionPolicy) -> Self {
        Self {
            suppression,
            last_triggered: Mutex::new(HashMap::new()),
        }
    }

    pub fn evaluate(
        &self,
        configs: &[AlertConfig],
        domain: AlertDomain,
        observations: &[MetricObservation],
    ) -> Vec<AlertEvent> {
        self.evaluate_at(configs, domain, observations, now_ms())
    }

    fn evaluate_at(
        &self,
        configs: &[AlertConfig],
        domain: AlertDomain,
        observations: &[MetricObservation],
        now: i64,
    ) -> Vec<AlertEvent> {
        let active: Vec<&AlertConfig> =
            configs.iter().filter(|config| config.domain == domain).collect();

        let mut events = Vec::new();
        for observation in observations {
            for &config in &active {
                if !config.target.eq_ignore_ascii_case(&observation.subject) {
                    continue;
                }
                if !check_threshold(config, observation.value) {
                    continue;
                }
                if self.suppressed(config, observation, now) {
                    continue;
                }

                events.push(AlertEvent {
                    id: format!("{}-{}-{}", config.id, observation.subject, now),
                    alert_config_id: config.id.clone(),
                    message: alert_message(config, observation),
                    timestamp: now,
                });
            }
        }
        events
    }

    fn suppressed(
        &self,
        config: &AlertConfig,
        observation: &MetricObservation,
        now: i64,
    ) -> bool {
        let SuppressionPolicy::Holdoff { window_ms } = self.suppression else {
            return false;
        };

        let key = (config.id.clone(), observation.subject.to_ascii_lowercase());
        let mut last = self.last_triggered.lock().expect("alert holdoff lock");
        match last.get(&key) {
            Some(&previous) if now - previous < window_ms => true,
            _ => {
                last.insert(key, now);
                false
            }
        }
    }
}

#[derive(Default)]
struct AlertState {
    configs: Vec<AlertConfig>,
    history: VecDeque<AlertEvent>,
}

/// Alert configurations plus the capped, newest-first event history.
#[derive(Clone)]
pub struct AlertStore {
    inner: Arc<Mutex<AlertState>>,
    history_cap: usize,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl AlertStore {
    pub fn new(history_cap: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AlertState::default())),
            history_cap: history_cap.max(1),
        }
    }

    pub fn add_config(&self, payload: AlertConfigPayload) -> AlertConfig {
        let config = AlertConfig {
            id: Uuid::new_v4().to_string(),
            domain: payload.domain,
            metric: payload.metric,
            condition: payload.condition,
            threshold: payload.threshold,
            target: payload.target,
        };
        self.lock().configs.push(config.clone());
        config
    }

    /// Unknown ids are ignored.
    pub fn remove_config(&self, id: &str) {
        self.lock().configs.retain(|config| config.id != id);
    }

    pub fn clear_configs(&self) {
        self.lock().configs.clear();
    }

    pub fn configs(&self) -> Vec<AlertConfig> {
        self.lock().configs.clone()
    }

    /// Newest at the head; the oldest entries fall off past the cap.
    pub fn record_event(&self, event: AlertEvent) {
        let mut state = self.lock();
        state.history.push_front(event);
        state.history.truncate(self.history_cap);
    }

    pub fn history(&self) -> Vec<AlertEvent> {
        self.lock().history.iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AlertState> {
        self.inner.lock().expect("alert store lock")
    }
}

#[cfg(test)]
mod tests {
    use super::{check_threshold, AlertEngine, AlertStore, SuppressionPolicy};
    use crate::models::{
        AlertCondition, AlertConfig, AlertConfigPayload, AlertDomain, AlertEvent,
        MetricObservation,
    };

    fn config(condition: AlertCondition, threshold: f64, target: &str) -> AlertConfig {
        AlertConfig {
            id: "cfg-1".to_string(),
            domain: AlertDomain::Market,
            metric: "price".to_string(),
            condition,
            threshold,
            target: target.to_string(),
        }
    }

    fn observation(subject: &str, value: f64) -> MetricObservation {
        MetricObservation {
            subject: subject.to_string(),
            value,
        }
    }

    #[test]
    fn below_threshold_requires_strict_crossing() {
        let engine = AlertEngine::new(SuppressionPolicy::None);
        let configs = [config(AlertCondition::Below, 60_000.0, "BTC")];

        let hits = |value: f64| {
            engine
                .evaluate(&configs, AlertDomain::Market, &[observation("BTC", value)])
                .len()
        };

        assert_eq!(hits(59_000.0), 1);
        assert_eq!(hits(60_000.0), 0);
        assert_eq!(hits(60_001.0), 0);
    }

    #[test]
    fn above_retriggers_on_every_batch_without_suppression() {
        let engine = AlertEngine::new(SuppressionPolicy::None);
        let configs = [config(AlertCondition::Above, 100.0, "BTC")];
        let batch = [observation("BTC", 101.0)];

        let first = engine.evaluate(&configs, AlertDomain::Market, &batch);
        let second = engine.evaluate(&configs, AlertDomain::Market, &batch);
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn holdoff_window_suppresses_inside_and_releases_after() {
        let engine = AlertEngine::new(SuppressionPolicy::Holdoff { window_ms: 10_000 });
        let configs = [config(AlertCondition::Above, 100.0, "BTC")];
        let batch = [observation("BTC", 101.0)];

        let t0 = 1_700_000_000_000_i64;
        assert_eq!(engine.evaluate_at(&configs, AlertDomain::Market, &batch, t0).len(), 1);
        assert_eq!(
            engine.evaluate_at(&configs, AlertDomain::Market, &batch, t0 + 1_000).len(),
            0
        );
        assert_eq!(
            engine.evaluate_at(&configs, AlertDomain::Market, &batch, t0 + 10_001).len(),
            1
        );
    }

    #[test]
    fn target_match_is_case_insensitive() {
        let engine = AlertEngine::new(SuppressionPolicy::None);
        let configs = [config(AlertCondition::Above, 100.0, "btc")];
        let events = engine.evaluate(&configs, AlertDomain::Market, &[observation("BTC", 101.0)]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn other_domains_are_filtered_out() {
        let engine = AlertEngine::new(SuppressionPolicy::None);
        let configs = [config(AlertCondition::Above, 100.0, "BTC")];
        let events = engine.evaluate(&configs, AlertDomain::Weather, &[observation("BTC", 101.0)]);
        assert!(events.is_empty());
    }

    #[test]
    fn duplicate_configs_evaluate_independently() {
        let engine = AlertEngine::new(SuppressionPolicy::None);
        let mut duplicate = config(AlertCondition::Above, 100.0, "BTC");
        duplicate.id = "cfg-2".to_string();
        let configs = [config(AlertCondition::Above, 100.0, "BTC"), duplicate];

        let events = engine.evaluate(&configs, AlertDomain::Market, &[observation("BTC", 101.0)]);
        assert_eq!(events.len(), 2);
        assert_ne!(events[0].alert_config_id, events[1].alert_config_id);
    }

    #[test]
    fn message_embeds_subject_value_condition_and_threshold() {
        let engine = AlertEngine::new(SuppressionPolicy::None);
        let configs = [config(AlertCondition::Above, 100.0, "BTC")];
        let events = engine.evaluate(&configs, AlertDomain::Market, &[observation("BTC", 101.0)]);
        assert_eq!(events[0].message, "BTC is above threshold: 101.00 > 100");
    }

    #[test]
    fn equality_never_triggers_either_direction() {
        let above = config(AlertCondition::Above, 50.0, "ETH");
        let below = config(AlertCondition::Below, 50.0, "ETH");
        assert!(!check_threshold(&above, 50.0));
        assert!(!check_threshold(&below, 50.0));
    }

    #[test]
    fn history_is_newest_first_and_capped() {
        let store = AlertStore::new(3);
        for index in 0..5 {
            store.record_event(AlertEvent {
                id: format!("evt-{index}"),
                alert_config_id: "cfg-1".to_string(),
                message: format!("event {index}"),
                timestamp: index,
            });
        }

        let history = store.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].id, "evt-4");
        assert_eq!(history[2].id, "evt-2");
    }

    #[test]
    fn config_removal_tolerates_unknown_ids() {
        let store = AlertStore::default();
        let created = store.add_config(AlertConfigPayload {
            domain: AlertDomain::Market,
            metric: "price".to_string(),
            condition: AlertCondition::Below,
            threshold: 60_000.0,
            target: "BTC".to_string(),
        });

        store.remove_config("not-a-config");
        assert_eq!(store.configs().len(), 1);

        store.remove_config(&created.id);
        assert!(store.configs().is_empty());
    }
}
