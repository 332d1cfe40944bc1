use crate::errors::AppResult;
use crate::models::Capability;
use crate::permissions::has_capability;
use crate::pipeline::{ViewBody, Widget, WidgetView};
use crate::session::SessionManager;
use serde::{Deserialize, Serialize};

/// What the auth gate renders for an unauthenticated session. A library core
/// has no router, so the redirect form is surfaced as a typed view for the
/// shell to act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum AuthFallback {
    Placeholder,
    Redirect { target: String },
}

impl Default for AuthFallback {
    fn default() -> Self {
        Self::Placeholder
    }
}

/// Outermost layer: short-circuits to an unauthenticated view and renders
/// nothing beneath. No side effects.
pub struct AuthGate {
    inner: Box<dyn Widget>,
    session: SessionManager,
    fallback: AuthFallback,
}

impl AuthGate {
    pub fn new(inner: Box<dyn Widget>, session: SessionManager, fallback: AuthFallback) -> Self {
        Self {
            inner,
            session,
            fallback,
        }
    }
}

impl Widget for AuthGate {
    fn widget_id(&self) -> &str {
        self.inner.widget_id()
    }

    fn render(&self) -> AppResult<WidgetView> {
        if !self.session.is_authenticated() {
            let body = match &self.fallback {
                AuthFallback::Placeholder => ViewBody::Unauthenticated,
                AuthFallback::Redirect { target } => ViewBody::RedirectToLogin {
                    target: target.clone(),
                },
            };
            return Ok(WidgetView::new(self.inner.widget_id(), body));
        }
        self.inner.render()
    }

    fn mount(&self) {
        self.inner.mount();
    }

    fn unmount(&self) {
        self.inner.unmount();
    }
}

/// Denies with a fixed placeholder when the role's grant set lacks the
/// required capability; an absent role renders nothing at all.
pub struct PermissionGate {
    inner: Box<dyn Widget>,
    session: SessionManager,
    required: Capability,
}

impl PermissionGate {
    pub fn new(inner: Box<dyn Widget>, session: SessionManager, required: Capability) -> Self {
        Self {
            inner,
            session,
            required,
        }
    }
}

impl Widget for PermissionGate {
    fn widget_id(&self) -> &str {
        self.inner.widget_id()
    }

    fn render(&self) -> AppResult<WidgetView> {
        let Some(role) = self.session.role() else {
            return Ok(WidgetView::new(self.inner.widget_id(), ViewBody::Empty));
        };

        if !has_capability(role, self.required) {
            return Ok(WidgetView::new(
                self.inner.widget_id(),
                ViewBody::PermissionDenied,
            ));
        }

        self.inner.render()
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
    use super::{AuthFallback, AuthGate, PermissionGate};
    use crate::models::{Capability, OperatorProfile, Role};
    use crate::pipeline::{ViewBody, Widget, WidgetView};
    use crate::session::{AuthSyncChannel, SessionManager};

    struct StaticWidget;

    impl Widget for StaticWidget {
        fn widget_id(&self) -> &str {
            "news"
        }

        fn render(&self) -> crate::errors::AppResult<WidgetView> {
            Ok(WidgetView::new(
                "news",
                ViewBody::Content {
                    data: serde_json::json!({ "headline": "markets steady" }),
                },
            ))
        }
    }

    fn session_with(role: Option<Role>) -> SessionManager {
        let session = SessionManager::new(AuthSyncChannel::new());
        if let Some(role) = role {
            session.login(OperatorProfile {
                id: "u-1".to_string(),
                name: "casey".to_string(),
                role,
            });
        }
        session
    }

    #[test]
    fn unauthenticated_renders_placeholder_and_nothing_beneath() {
        let gate = AuthGate::new(
            Box::new(StaticWidget),
            session_with(None),
            AuthFallback::Placeholder,
        );
        let view = gate.render().unwrap();
        assert_eq!(view.body, ViewBody::Unauthenticated);
    }

    #[test]
    fn unauthenticated_redirect_fallback_surfaces_target() {
        let gate = AuthGate::new(
            Box::new(StaticWidget),
            session_with(None),
            AuthFallback::Redirect {
                target: "/login".to_string(),
            },
        );
        let view = gate.render().unwrap();
        assert_eq!(
            view.body,
            ViewBody::RedirectToLogin {
                target: "/login".to_string()
            }
        );
    }

    #[test]
    fn authenticated_passes_through_untouched() {
        let gate = AuthGate::new(
            Box::new(StaticWidget),
            session_with(Some(Role::Viewer)),
            AuthFallback::Placeholder,
        );
        assert!(matches!(gate.render().unwrap().body, ViewBody::Content { .. }));
    }

    #[test]
    fn missing_capability_renders_denial_placeholder() {
        let gate = PermissionGate::new(
            Box::new(StaticWidget),
            session_with(Some(Role::Viewer)),
            Capability::DataExport,
        );
        assert_eq!(gate.render().unwrap().body, ViewBody::PermissionDenied);
    }

    #[test]
    fn granted_capability_renders_the_wrapped_widget() {
        let gate = PermissionGate::new(
            Box::new(StaticWidget),
            session_with(Some(Role::Analyst)),
            Capability::DataExport,
        );
        assert!(matches!(gate.render().unwrap().body, ViewBody::Content { .. }));
    }

    #[test]
    fn absent_role_renders_nothing() {
        let session = session_with(None);
        let gate = PermissionGate::new(Box::new(StaticWidget), session, Capability::DataExport);
        assert_eq!(gate.render().unwrap().body, ViewBody::Empty);
    }
}
