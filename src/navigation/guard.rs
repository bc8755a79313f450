use url::form_urlencoded;

use super::routes::ResolvedRoute;
use crate::config::AuthConfig;
use crate::notify::{Notice, Notifier};

/// Query parameter that carries the originally requested location to login
pub const REDIRECT_PARAM: &str = "redirect";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect {
        path: String,
        query: Vec<(String, String)>,
    },
}

impl GuardDecision {
    /// Rendered redirect target, `None` when the transition proceeds
    pub fn location(&self) -> Option<String> {
        match self {
            GuardDecision::Proceed => None,
            GuardDecision::Redirect { path, query } if query.is_empty() => Some(path.clone()),
            GuardDecision::Redirect { path, query } => {
                let encoded = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(query.iter())
                    .finish();
                Some(format!("{}?{}", path, encoded))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuardPolicy {
    pub login_path: String,
    pub login_required_message: String,
}

impl GuardPolicy {
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            login_path: auth.login_path.clone(),
            login_required_message: auth.login_required_message.clone(),
        }
    }
}

/// Decide a route transition. Synchronous and free of I/O; the only side
/// effect is the login-required notice.
pub fn guard(
    policy: &GuardPolicy,
    to: &ResolvedRoute,
    from: &ResolvedRoute,
    authenticated: bool,
    notifier: &dyn Notifier,
) -> GuardDecision {
    if !to.requires_auth() || authenticated {
        return GuardDecision::Proceed;
    }

    // Bouncing around the login page should not repeat the prompt
    if from.path != policy.login_path {
        notifier.notify(Notice::warning(policy.login_required_message.clone()));
    }

    tracing::debug!("Guard redirecting '{}' to '{}'", to.full_path, policy.login_path);
    GuardDecision::Redirect {
        path: policy.login_path.clone(),
        query: vec![(REDIRECT_PARAM.to_string(), to.full_path.clone())],
    }
}
