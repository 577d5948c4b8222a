//! Route gating on top of [`AuthState`].

use shared::config::SessionConfig;
use tokio::sync::watch;

use crate::auth::AuthState;

/// How a view relates to authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Requires a resolved identity.
    Protected,
    /// Only meaningful signed out, like the login page.
    GuestOnly,
}

/// What a view should do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Resolution in flight: render nothing and do not redirect.
    Pending,
    /// Render the view.
    Render,
    /// Navigate to the given path.
    Redirect(String),
    /// A redirect for this transition was already issued; render nothing.
    Suppressed,
}

/// Paths the guard redirects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPaths {
    /// Login entry point.
    pub login: String,
    /// Protected landing page.
    pub dashboard: String,
}

impl Default for GuardPaths {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for GuardPaths {
    fn from(config: &SessionConfig) -> Self {
        Self {
            login: config.login_path.clone(),
            dashboard: config.dashboard_path.clone(),
        }
    }
}

/// Pure render decision for a view of `kind` under `state`.
#[must_use]
pub fn decide(kind: RouteKind, state: &AuthState, paths: &GuardPaths) -> GuardOutcome {
    if state.is_loading {
        return GuardOutcome::Pending;
    }
    match (kind, state.identity.is_some()) {
        (RouteKind::Protected, true) | (RouteKind::GuestOnly, false) => GuardOutcome::Render,
        (RouteKind::Protected, false) => GuardOutcome::Redirect(paths.login.clone()),
        (RouteKind::GuestOnly, true) => GuardOutcome::Redirect(paths.dashboard.clone()),
    }
}

/// Reactive guard for one view.
///
/// Each state change is re-evaluated. A redirect is handed out once per
/// transition; repeated evaluations of the same state yield
/// [`GuardOutcome::Suppressed`] so a view cannot loop on it.
#[derive(Debug)]
pub struct RouteGuard {
    kind: RouteKind,
    paths: GuardPaths,
    receiver: watch::Receiver<AuthState>,
    redirected: bool,
}

impl RouteGuard {
    /// Guards a view of `kind` over the store's state channel.
    #[must_use]
    pub fn new(kind: RouteKind, paths: GuardPaths, receiver: watch::Receiver<AuthState>) -> Self {
        Self {
            kind,
            paths,
            receiver,
            redirected: false,
        }
    }

    /// Guard for a protected view.
    #[must_use]
    pub fn protected(paths: GuardPaths, receiver: watch::Receiver<AuthState>) -> Self {
        Self::new(RouteKind::Protected, paths, receiver)
    }

    /// Evaluates the latest state.
    pub fn evaluate(&mut self) -> GuardOutcome {
        let outcome = decide(self.kind, &self.receiver.borrow_and_update(), &self.paths);
        match outcome {
            GuardOutcome::Redirect(_) if self.redirected => GuardOutcome::Suppressed,
            GuardOutcome::Redirect(_) => {
                self.redirected = true;
                outcome
            }
            other => {
                self.redirected = false;
                other
            }
        }
    }

    /// Waits for the next state change and evaluates it. `None` once the
    /// store is gone.
    pub async fn changed(&mut self) -> Option<GuardOutcome> {
        self.receiver.changed().await.ok()?;
        Some(self.evaluate())
    }

    /// Waits until the state is no longer loading and returns the decision.
    pub async fn settle(&mut self) -> GuardOutcome {
        loop {
            let outcome = self.evaluate();
            if outcome != GuardOutcome::Pending {
                return outcome;
            }
            if self.receiver.changed().await.is_err() {
                return self.evaluate();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Identity;
    use test_case::test_case;

    fn identity() -> Identity {
        Identity {
            id: "u1".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            role: "admin".into(),
        }
    }

    fn state(loading: bool, signed_in: bool) -> AuthState {
        AuthState {
            identity: signed_in.then(identity),
            is_loading: loading,
        }
    }

    #[test_case(RouteKind::Protected, true, false => GuardOutcome::Pending ; "protected while loading")]
    #[test_case(RouteKind::Protected, true, true => GuardOutcome::Pending ; "protected while re-resolving")]
    #[test_case(RouteKind::Protected, false, false => GuardOutcome::Redirect("/login".into()) ; "protected signed out")]
    #[test_case(RouteKind::Protected, false, true => GuardOutcome::Render ; "protected signed in")]
    #[test_case(RouteKind::GuestOnly, true, false => GuardOutcome::Pending ; "guest while loading")]
    #[test_case(RouteKind::GuestOnly, false, false => GuardOutcome::Render ; "guest signed out")]
    #[test_case(RouteKind::GuestOnly, false, true => GuardOutcome::Redirect("/dashboard".into()) ; "guest signed in")]
    fn decision_table(kind: RouteKind, loading: bool, signed_in: bool) -> GuardOutcome {
        decide(kind, &state(loading, signed_in), &GuardPaths::default())
    }

    #[test]
    fn redirect_is_issued_once_per_transition() {
        let (sender, receiver) = watch::channel(state(false, false));
        let mut guard = RouteGuard::protected(GuardPaths::default(), receiver);

        assert_eq!(guard.evaluate(), GuardOutcome::Redirect("/login".into()));
        assert_eq!(guard.evaluate(), GuardOutcome::Suppressed);

        sender.send_replace(state(true, false));
        assert_eq!(guard.evaluate(), GuardOutcome::Pending);

        sender.send_replace(state(false, false));
        assert_eq!(guard.evaluate(), GuardOutcome::Redirect("/login".into()));
    }

    #[tokio::test]
    async fn settle_waits_out_loading() {
        let (sender, receiver) = watch::channel(state(true, false));
        let mut guard = RouteGuard::protected(GuardPaths::default(), receiver);

        let waiter = tokio::spawn(async move { guard.settle().await });
        tokio::task::yield_now().await;
        sender.send_replace(state(false, true));

        assert_eq!(waiter.await.unwrap(), GuardOutcome::Render);
    }

    #[tokio::test]
    async fn guard_reacts_to_logout() {
        let (sender, receiver) = watch::channel(state(false, true));
        let mut guard = RouteGuard::protected(GuardPaths::default(), receiver);
        assert_eq!(guard.evaluate(), GuardOutcome::Render);

        sender.send_replace(state(false, false));
        assert_eq!(
            guard.changed().await,
            Some(GuardOutcome::Redirect("/login".into()))
        );

        drop(sender);
        assert_eq!(guard.changed().await, None);
    }

    #[test]
    fn paths_follow_session_config() {
        let config = SessionConfig {
            login_path: "/signin".into(),
            dashboard_path: "/admin".into(),
            ..SessionConfig::default()
        };
        let paths = GuardPaths::from(&config);
        assert_eq!(paths.login, "/signin");
        assert_eq!(paths.dashboard, "/admin");
    }
}
