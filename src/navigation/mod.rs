//! Route guarding and navigation.
//!
//! [`guard`] is the pure decision; [`Router`] owns the active route and
//! applies decisions, and [`schedule_redirect`] performs delayed navigation
//! on the async runtime.

pub mod guard;
pub mod routes;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::notify::Notifier;
use crate::session::SessionStore;
pub use guard::{guard, GuardDecision, GuardPolicy, REDIRECT_PARAM};
pub use routes::{ResolvedRoute, RouteMeta, RouteRecord, RouteTable};

const MAX_GUARD_HOPS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Target equals the active route; nothing happened
    Unchanged,
    Entered(String),
    Redirected { requested: String, location: String },
}

/// Anything that can be told to change the active route
pub trait Navigate: Send + Sync {
    fn current_location(&self) -> String;

    fn navigate(&self, location: &str) -> NavigationOutcome;
}

pub struct Router {
    table: RouteTable,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    policy: GuardPolicy,
    current: Mutex<ResolvedRoute>,
}

impl Router {
    pub fn new(
        table: RouteTable,
        session: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
        policy: GuardPolicy,
    ) -> Self {
        Self {
            table,
            session,
            notifier,
            policy,
            current: Mutex::new(ResolvedRoute::start()),
        }
    }

    /// Place the router on `location` without running the guard
    pub fn start_at(self, location: &str) -> Self {
        self.place(location);
        self
    }

    /// Move to `location` without running the guard
    pub fn place(&self, location: &str) {
        *self.current.lock() = self.table.resolve(location);
    }

    pub fn current(&self) -> ResolvedRoute {
        self.current.lock().clone()
    }

    pub fn resolve(&self, location: &str) -> ResolvedRoute {
        self.table.resolve(location)
    }
}

impl Navigate for Router {
    fn current_location(&self) -> String {
        self.current.lock().full_path.clone()
    }

    fn navigate(&self, location: &str) -> NavigationOutcome {
        let mut current = self.current.lock();
        let requested = self.table.resolve(location);
        let mut target = requested.clone();

        for _ in 0..MAX_GUARD_HOPS {
            if target.full_path == current.full_path {
                break;
            }

            let decision = guard(
                &self.policy,
                &target,
                &current,
                self.session.is_authenticated(),
                self.notifier.as_ref(),
            );

            match decision.location() {
                None => {
                    tracing::debug!("Navigated to '{}'", target.full_path);
                    *current = target;
                    return if current.full_path == requested.full_path {
                        NavigationOutcome::Entered(current.full_path.clone())
                    } else {
                        NavigationOutcome::Redirected {
                            requested: requested.full_path,
                            location: current.full_path.clone(),
                        }
                    };
                }
                Some(redirect) => target = self.table.resolve(&redirect),
            }
        }

        if target.full_path == current.full_path && target.full_path != requested.full_path {
            return NavigationOutcome::Redirected {
                requested: requested.full_path,
                location: current.full_path.clone(),
            };
        }
        NavigationOutcome::Unchanged
    }
}

/// Navigate to `location` after `delay`. There is no cancellation; when
/// several are scheduled only the first changes anything.
pub fn schedule_redirect(
    navigator: Arc<dyn Navigate>,
    location: String,
    delay: Duration,
) -> JoinHandle<NavigationOutcome> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        navigator.navigate(&location)
    })
}
