use crate::models::{now_ms, AuthEvent, AuthEventKind, OperatorProfile, Role};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const SYNC_CHANNEL_CAPACITY: usize = 32;

/// Shared broadcast channel standing in for browser-level storage events.
/// Payloads travel as raw JSON so peers tolerate (and log) malformed ones.
#[derive(Clone)]
pub struct AuthSyncChannel {
    tx: broadcast::Sender<serde_json::Value>,
}

impl Default for AuthSyncChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSyncChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SYNC_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: AuthEvent) {
        match serde_json::to_value(event) {
            // Send only fails with no subscribers; that is fine.
            Ok(payload) => {
                let _ = self.tx.send(payload);
            }
            Err(error) => tracing::warn!(%error, "failed to encode auth sync payload"),
        }
    }

    pub fn publish_raw(&self, payload: serde_json::Value) {
        let _ = self.tx.send(payload);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<serde_json::Value> {
        self.tx.subscribe()
    }
}

#[derive(Default)]
struct SessionState {
    profile: Option<OperatorProfile>,
}

/// Read-only session facts for the auth and permission gates, plus the
/// login/logout transitions that broadcast cross-tab events.
#[derive(Clone)]
pub struct SessionManager {
    state: Arc<Mutex<SessionState>>,
    channel: AuthSyncChannel,
}

impl SessionManager {
    pub fn new(channel: AuthSyncChannel) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            channel,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().profile.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.lock().profile.as_ref().map(|profile| profile.role)
    }

    pub fn profile(&self) -> Option<OperatorProfile> {
        self.lock().profile.clone()
    }

    pub fn login(&self, profile: OperatorProfile) {
        tracing::info!(operator = %profile.name, role = %profile.role.as_str(), "session opened");
        self.lock().profile = Some(profile);
        self.channel.publish(AuthEvent {
            kind: AuthEventKind::Login,
            time: now_ms(),
        });
    }

    pub fn logout(&self) {
        self.invalidate();
        self.channel.publish(AuthEvent {
            kind: AuthEventKind::Logout,
            time: now_ms(),
        });
    }

    /// Local invalidation only; does not re-broadcast.
    pub fn invalidate(&self) {
        self.lock().profile = None;
    }

    /// Observes the sync channel: logout forces this session into the
    /// unauthenticated state, login events are informational only.
    pub fn attach_sync(&self) -> JoinHandle<()> {
        let mut rx = self.channel.subscribe();
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                let payload = match rx.recv().await {
                    Ok(payload) => payload,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auth sync receiver lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                match serde_json::from_value::<AuthEvent>(payload) {
                    Ok(event) if event.kind == AuthEventKind::Logout => {
                        tracing::info!("logout observed on sync channel");
                        manager.invalidate();
                    }
                    Ok(_) => {}
                    Err(error) => {
                        tracing::warn!(%error, "ignoring malformed auth sync payload");
                    }
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock")
    }
}
