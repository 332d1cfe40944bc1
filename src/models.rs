use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Viewer,
    Analyst,
    Operator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Analyst => "analyst",
            Self::Operator => "operator",
            Self::Admin => "admin",
        }
    }

    /// Tier rank; grant sets are cumulative up this order.
    pub fn tier(self) -> u8 {
        match self {
            Self::Viewer => 0,
            Self::Analyst => 1,
            Self::Operator => 2,
            Self::Admin => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "widget:create")]
    WidgetCreate,
    #[serde(rename = "widget:delete")]
    WidgetDelete,
    #[serde(rename = "widget:resize")]
    WidgetResize,
    #[serde(rename = "data:export")]
    DataExport,
    #[serde(rename = "data:import")]
    DataImport,
    #[serde(rename = "alerts:configure")]
    AlertsConfigure,
    #[serde(rename = "alerts:dismiss")]
    AlertsDismiss,
    #[serde(rename = "users:manage")]
    UsersManage,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WidgetCreate => "widget:create",
            Self::WidgetDelete => "widget:delete",
            Self::WidgetResize => "widget:resize",
            Self::DataExport => "data:export",
            Self::DataImport => "data:import",
            Self::AlertsConfigure => "alerts:configure",
            Self::AlertsDismiss => "alerts:dismiss",
            Self::UsersManage => "users:manage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorProfile {
    pub id: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPlacement {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetClass {
    Simple,
    Data,
}

/// Compose-time description of one governed widget slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSpec {
    pub id: String,
    pub name: String,
    pub required_capability: Capability,
    pub class: WidgetClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertDomain {
    Market,
    Weather,
}

impl AlertDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Weather => "weather",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertCondition {
    Above,
    Below,
}

impl AlertCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfig {
    pub id: String,
    pub domain: AlertDomain,
    pub metric: String,
    pub condition: AlertCondition,
    pub threshold: f64,
    pub target: String,
}

/// User-supplied alert rule; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfigPayload {
    pub domain: AlertDomain,
    pub metric: String,
    pub condition: AlertCondition,
    pub threshold: f64,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub id: String,
    pub alert_config_id: String,
    pub message: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub severity: Severity,
    pub created_at: i64,
}

/// One observed subject+value pair from a feed's success payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricObservation {
    pub subject: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultRecord {
    pub widget_name: String,
    pub message: String,
    pub stack: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthEventKind {
    Login,
    Logout,
}

/// Payload broadcast on the cross-tab sync channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthEvent {
    #[serde(rename = "type")]
    pub kind: AuthEventKind,
    pub time: i64,
}

pub fn epoch_ms(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub fn now_ms() -> i64 {
    epoch_ms(Utc::now())
}
