use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub envelope: EnvelopeConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Keep a cookie jar across calls (browser `withCredentials`)
    pub with_credentials: bool,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Envelope `code` that marks a successful call; an absent code also succeeds
    pub success_code: i64,
    /// Used when a failure carries no usable message
    pub fallback_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Route path of the login entry point
    pub login_path: String,
    pub unauthorized_message: String,
    pub login_required_message: String,
    pub redirect_delay_ms: u64,
    pub unauthorized_policy: UnauthorizedPolicy,
}

/// What a 401 response removes from the session store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnauthorizedPolicy {
    FullLogout,
    TokenOnly,
}

impl UnauthorizedPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" | "full-logout" => Some(UnauthorizedPolicy::FullLogout),
            "token" | "token-only" => Some(UnauthorizedPolicy::TokenOnly),
            _ => None,
        }
    }
}

pub const DEFAULT_UNAUTHORIZED_MESSAGE: &str = "Invalid username or password, please try again";
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Request failed";
pub const DEFAULT_LOGIN_REQUIRED_MESSAGE: &str = "Please log in first";

impl ClientConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("COURSE_ADMIN_API_BASE_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = env::var("COURSE_ADMIN_API_TIMEOUT_SECS") {
            self.api.timeout_secs = v.parse().unwrap_or(self.api.timeout_secs);
        }
        if let Ok(v) = env::var("COURSE_ADMIN_WITH_CREDENTIALS") {
            self.api.with_credentials = v.parse().unwrap_or(self.api.with_credentials);
        }
        if let Ok(v) = env::var("COURSE_ADMIN_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Envelope overrides
        if let Ok(v) = env::var("COURSE_ADMIN_SUCCESS_CODE") {
            self.envelope.success_code = v.parse().unwrap_or(self.envelope.success_code);
        }

        // Auth overrides
        if let Ok(v) = env::var("COURSE_ADMIN_LOGIN_PATH") {
            self.auth.login_path = v;
        }
        if let Ok(v) = env::var("COURSE_ADMIN_REDIRECT_DELAY_MS") {
            self.auth.redirect_delay_ms = v.parse().unwrap_or(self.auth.redirect_delay_ms);
        }
        if let Ok(v) = env::var("COURSE_ADMIN_UNAUTHORIZED_POLICY") {
            match UnauthorizedPolicy::parse(&v) {
                Some(policy) => self.auth.unauthorized_policy = policy,
                None => tracing::warn!("Ignoring unknown unauthorized policy '{}'", v),
            }
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout_secs: 10,
                with_credentials: true,
                enable_request_logging: true,
            },
            envelope: EnvelopeConfig::default(),
            auth: AuthConfig::default(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout_secs: 10,
                with_credentials: true,
                enable_request_logging: true,
            },
            envelope: EnvelopeConfig::default(),
            auth: AuthConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout_secs: 10,
                with_credentials: true,
                enable_request_logging: false,
            },
            envelope: EnvelopeConfig::default(),
            auth: AuthConfig::default(),
        }
    }

    /// Development preset pointed at a specific server
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.api.base_url = base_url.into();
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.auth.redirect_delay_ms)
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            success_code: 0,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            unauthorized_message: DEFAULT_UNAUTHORIZED_MESSAGE.to_string(),
            login_required_message: DEFAULT_LOGIN_REQUIRED_MESSAGE.to_string(),
            redirect_delay_ms: 1500,
            unauthorized_policy: UnauthorizedPolicy::FullLogout,
        }
    }
}

// Global configuration instance
static CONFIG: Lazy<ClientConfig> = Lazy::new(ClientConfig::from_env);

/// Get the global client configuration
pub fn config() -> &'static ClientConfig {
    &CONFIG
}
