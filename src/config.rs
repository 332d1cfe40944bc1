use crate::alerts::{SuppressionPolicy, DEFAULT_HISTORY_CAP};
use crate::errors::{AppError, AppResult};
use crate::notifications::DEFAULT_QUEUE_BOUND;
use crate::pipeline::gates::AuthFallback;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Operator-tunable knobs. Anything not set in the file keeps its default;
/// a missing file is the all-defaults configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    pub alert_history_cap: usize,
    pub notification_bound: usize,
    pub suppression: SuppressionPolicy,
    pub auth_fallback: AuthFallback,
    pub log_filter: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            alert_history_cap: DEFAULT_HISTORY_CAP,
            notification_bound: DEFAULT_QUEUE_BOUND,
            suppression: SuppressionPolicy::None,
            auth_fallback: AuthFallback::Placeholder,
            log_filter: "info".to_string(),
        }
    }
}

pub fn load(data_dir: &Path) -> AppResult<DashboardConfig> {
    let path = data_dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(DashboardConfig::default());
    }

    let parsed = (|| -> anyhow::Result<DashboardConfig> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    })();

    parsed.map_err(|error| AppError::Config(format!("{error:#}")))
}
