//! Views, navigation signals and the render guard.
//!
//! The core never navigates by itself. It asks a `Navigator` to move to a
//! view (the gateway does this when a session can no longer be renewed), and
//! front ends ask `guard` whether a view may be shown for the current
//! session phase.

use tokio::sync::mpsc;
use tracing::debug;

use crate::auth::SessionPhase;

/// Application views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    SignIn,
    SignUp,
    Dashboard,
    Transactions,
    Categories,
    Budgets,
}

impl Route {
    /// Where authenticated visitors land by default
    pub const DEFAULT_PROTECTED: Route = Route::Dashboard;

    pub const ALL: [Route; 6] = [
        Route::SignIn,
        Route::SignUp,
        Route::Dashboard,
        Route::Transactions,
        Route::Categories,
        Route::Budgets,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::SignIn => "/login",
            Route::SignUp => "/register",
            Route::Dashboard => "/",
            Route::Transactions => "/transactions",
            Route::Categories => "/categories",
            Route::Budgets => "/budgets",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL.into_iter().find(|route| route.path() == normalized)
    }

    /// Entry pages that make no sense once signed in
    pub fn is_public_only(&self) -> bool {
        matches!(self, Route::SignIn | Route::SignUp)
    }

    pub fn is_protected(&self) -> bool {
        !self.is_public_only()
    }
}

/// What a front end should do for a requested view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still resolving; show nothing (or a neutral placeholder)
    Placeholder,
    Redirect(Route),
    Render(Route),
}

pub fn guard(phase: &SessionPhase, requested: Route) -> GuardDecision {
    match phase {
        SessionPhase::Initializing => GuardDecision::Placeholder,
        SessionPhase::Anonymous if requested.is_protected() => {
            GuardDecision::Redirect(Route::SignIn)
        }
        SessionPhase::Authenticated(_) if requested.is_public_only() => {
            GuardDecision::Redirect(Route::DEFAULT_PROTECTED)
        }
        _ => GuardDecision::Render(requested),
    }
}

/// Narrow interface to whatever performs navigation in the front end.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: Route);
}

/// Forwards navigation requests over a channel so the front end can act on
/// them from its own loop.
#[derive(Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn redirect(&self, route: Route) {
        if self.tx.send(route).is_err() {
            debug!(?route, "Navigation receiver dropped, ignoring redirect");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    fn signed_in() -> SessionPhase {
        SessionPhase::Authenticated(Identity {
            id: "u1".to_string(),
            email: "a@b.com".to_string(),
            name: None,
        })
    }

    #[test]
    fn test_initializing_never_redirects() {
        for route in Route::ALL {
            assert_eq!(guard(&SessionPhase::Initializing, route), GuardDecision::Placeholder);
        }
    }

    #[test]
    fn test_anonymous_is_sent_to_sign_in() {
        assert_eq!(
            guard(&SessionPhase::Anonymous, Route::Budgets),
            GuardDecision::Redirect(Route::SignIn)
        );
        assert_eq!(
            guard(&SessionPhase::Anonymous, Route::SignUp),
            GuardDecision::Render(Route::SignUp)
        );
    }

    #[test]
    fn test_authenticated_skips_entry_pages() {
        assert_eq!(
            guard(&signed_in(), Route::SignIn),
            GuardDecision::Redirect(Route::Dashboard)
        );
        assert_eq!(
            guard(&signed_in(), Route::Transactions),
            GuardDecision::Render(Route::Transactions)
        );
    }

    #[test]
    fn test_route_paths_roundtrip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/budgets/"), Some(Route::Budgets));
        assert_eq!(Route::from_path("/settings"), None);
    }

    #[test]
    fn test_channel_navigator_forwards() {
        let (navigator, mut rx) = ChannelNavigator::new();
        navigator.redirect(Route::SignIn);
        assert_eq!(rx.try_recv().unwrap(), Route::SignIn);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_navigator_survives_dropped_receiver() {
        let (navigator, rx) = ChannelNavigator::new();
        drop(rx);
        navigator.redirect(Route::SignIn);
    }
}
