//! Outbound request pipeline.
//!
//! Every API call goes through [`RequestPipeline`]:
//!
//! 1. request phase: ordered [`RequestInterceptor`]s attach headers
//! 2. network round trip
//! 3. 2xx: ordered [`ResponseInterceptor`]s unwrap and validate the envelope
//! 4. otherwise: failure classification, session invalidation on 401
//!
//! Any error is surfaced once through the [`Notifier`] and returned as a
//! [`PipelineError`]. Nothing is retried.

pub mod envelope;
pub mod failure;
pub mod interceptors;
pub mod request;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::{ClientConfig, UnauthorizedPolicy};
use crate::error::{BuildError, PipelineError};
use crate::navigation::{schedule_redirect, GuardPolicy, NavigationOutcome, Navigate, RouteTable, Router};
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::session::SessionStore;
use crate::types::LoginResult;

pub use failure::TransportFailure;
pub use interceptors::{
    PipelineContext, RequestInterceptor, RequestInterceptorBox, ResponseContext, ResponseInterceptor,
    ResponseInterceptorBox,
};
pub use request::{Method, OperationKind, OutgoingRequest, RequestDescriptor};

pub struct RequestPipeline {
    client: reqwest::Client,
    base_url: String,
    ctx: PipelineContext,
    navigator: Arc<dyn Navigate>,
    request_interceptors: Vec<RequestInterceptorBox>,
    response_interceptors: Vec<ResponseInterceptorBox>,
    pending_redirects: Mutex<Vec<JoinHandle<NavigationOutcome>>>,
}

/// Payload of a successful round trip plus the notices held back until the
/// caller's result is known to be `Ok`
struct Delivery {
    payload: Value,
    notices: Vec<Notice>,
}

pub struct RequestPipelineBuilder {
    config: ClientConfig,
    session: Option<Arc<SessionStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigate>>,
    request_interceptors: Vec<RequestInterceptorBox>,
    response_interceptors: Vec<ResponseInterceptorBox>,
    default_interceptors: bool,
}

impl RequestPipelineBuilder {
    pub fn session(mut self, session: Arc<SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Target of the deferred login redirect after a 401
    pub fn navigator(mut self, navigator: Arc<dyn Navigate>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Append a request interceptor after the defaults
    pub fn request_interceptor(mut self, interceptor: RequestInterceptorBox) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Append a response interceptor after the defaults
    pub fn response_interceptor(mut self, interceptor: ResponseInterceptorBox) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    /// Start from empty interceptor lists instead of the defaults
    pub fn without_default_interceptors(mut self) -> Self {
        self.default_interceptors = false;
        self
    }

    pub fn build(self) -> Result<RequestPipeline, BuildError> {
        let base_url = self.config.api.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|source| BuildError::InvalidBaseUrl {
            url: self.config.api.base_url.clone(),
            source,
        })?;

        let client = reqwest::Client::builder()
            .timeout(self.config.request_timeout())
            .cookie_store(self.config.api.with_credentials)
            .build()?;

        let session = self.session.unwrap_or_else(|| Arc::new(SessionStore::in_memory()));
        let notifier: Arc<dyn Notifier> = match self.notifier {
            Some(notifier) => notifier,
            None => Arc::new(TracingNotifier),
        };
        let navigator: Arc<dyn Navigate> = match self.navigator {
            Some(navigator) => navigator,
            None => Arc::new(Router::new(
                RouteTable::admin(),
                session.clone(),
                notifier.clone(),
                GuardPolicy::from_config(&self.config.auth),
            )),
        };

        let (mut request_interceptors, mut response_interceptors) = if self.default_interceptors {
            (
                interceptors::default_request_interceptors(&self.config),
                interceptors::default_response_interceptors(),
            )
        } else {
            (Vec::new(), Vec::new())
        };
        request_interceptors.extend(self.request_interceptors);
        response_interceptors.extend(self.response_interceptors);

        for interceptor in &request_interceptors {
            tracing::debug!("Registered request interceptor '{}'", interceptor.name());
        }
        for interceptor in &response_interceptors {
            tracing::debug!("Registered response interceptor '{}'", interceptor.name());
        }

        Ok(RequestPipeline {
            client,
            base_url,
            ctx: PipelineContext {
                config: self.config,
                session,
                notifier,
            },
            navigator,
            request_interceptors,
            response_interceptors,
            pending_redirects: Mutex::new(Vec::new()),
        })
    }
}

impl RequestPipeline {
    pub fn builder(config: ClientConfig) -> RequestPipelineBuilder {
        RequestPipelineBuilder {
            config,
            session: None,
            notifier: None,
            navigator: None,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
            default_interceptors: true,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.ctx.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.ctx.session
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.ctx.notifier
    }

    pub fn navigator(&self) -> &Arc<dyn Navigate> {
        &self.navigator
    }

    /// Run a call and return the unwrapped payload (`null` when absent)
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Value, PipelineError> {
        let result = self
            .dispatch(descriptor)
            .await
            .map(|delivery| (delivery.payload, delivery.notices));
        self.surface(result)
    }

    /// Run a call and decode the payload into `T`
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<T, PipelineError> {
        let result = self.dispatch(descriptor).await.and_then(|delivery| {
            let value = serde_json::from_value::<T>(delivery.payload).map_err(|e| {
                PipelineError::malformed(format!("unexpected payload for {}: {}", descriptor.path(), e))
            })?;
            Ok((value, delivery.notices))
        });
        self.surface(result)
    }

    /// Run a login/registration call
    pub async fn login(&self, descriptor: &RequestDescriptor) -> Result<LoginResult, PipelineError> {
        if !descriptor.is_authentication() {
            return self.surface::<LoginResult>(Err(PipelineError::malformed(format!(
                "{} is not an authentication call",
                descriptor.path()
            ))));
        }
        self.execute_as::<LoginResult>(descriptor).await
    }

    /// Wait for every login redirect scheduled so far. Returns how many ran.
    ///
    /// Short-lived callers (a CLI process) call this before exiting so the
    /// deferred navigation is not lost with the runtime.
    pub async fn settle_redirects(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending_redirects.lock());
        let mut settled = 0;
        for handle in pending {
            match handle.await {
                Ok(outcome) => {
                    tracing::debug!("Login redirect settled: {:?}", outcome);
                    settled += 1;
                }
                Err(e) => tracing::warn!("Login redirect task failed: {}", e),
            }
        }
        settled
    }

    /// Single notification point: queued notices on success, one error
    /// notice on failure
    fn surface<T>(&self, result: Result<(T, Vec<Notice>), PipelineError>) -> Result<T, PipelineError> {
        match result {
            Ok((value, notices)) => {
                for notice in notices {
                    self.ctx.notifier.notify(notice);
                }
                Ok(value)
            }
            Err(err) => {
                self.ctx.notifier.notify(Notice::error(err.message()));
                Err(err)
            }
        }
    }

    async fn dispatch(&self, descriptor: &RequestDescriptor) -> Result<Delivery, PipelineError> {
        let mut outgoing = OutgoingRequest::new(descriptor);
        for interceptor in &self.request_interceptors {
            interceptor.on_request(&mut outgoing, &self.ctx).await?;
        }

        let url = self.url_for(descriptor.path())?;
        let mut builder = self.client.request(descriptor.method().to_reqwest(), url);
        if !descriptor.query().is_empty() {
            builder = builder.query(descriptor.query());
        }
        if let Some(headers) = outgoing.into_headers() {
            builder = builder.headers(headers);
        }
        if let Some(body) = descriptor.body() {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| PipelineError::transport(format!("Failed to encode request body: {}", e)))?;
            builder = builder.body(bytes);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Err(self.handle_failure(TransportFailure::from_reqwest(&e))),
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => return Err(self.handle_failure(TransportFailure::from_reqwest(&e))),
        };

        if !status.is_success() {
            return Err(self.handle_failure(TransportFailure::from_status(status, &body)));
        }

        let mut ctx = ResponseContext::new(descriptor, status, body);
        for interceptor in &self.response_interceptors {
            interceptor.on_response(&mut ctx, &self.ctx).await?;
        }
        let (payload, notices) = ctx.into_parts();
        Ok(Delivery { payload, notices })
    }

    /// Failure path: 401 invalidates the session and schedules the login
    /// redirect; everything else keeps the most specific message available.
    fn handle_failure(&self, failure: TransportFailure) -> PipelineError {
        if failure.is_unauthorized() {
            let auth = &self.ctx.config.auth;
            let cleared = match auth.unauthorized_policy {
                UnauthorizedPolicy::FullLogout => self.ctx.session.clear_session(),
                UnauthorizedPolicy::TokenOnly => self.ctx.session.clear_token(),
            };
            if let Err(e) = cleared {
                tracing::warn!("Failed to persist session invalidation: {}", e);
            }

            tracing::info!(
                "Authentication failed; redirecting to '{}' in {}ms",
                auth.login_path,
                auth.redirect_delay_ms
            );
            let handle = schedule_redirect(
                self.navigator.clone(),
                auth.login_path.clone(),
                self.ctx.config.redirect_delay(),
            );
            self.pending_redirects.lock().push(handle);

            return PipelineError::authentication_failed(auth.unauthorized_message.clone());
        }

        let message = failure.message(&self.ctx.config.envelope.fallback_message);
        tracing::debug!("Request failed (status {:?}): {}", failure.status, message);
        PipelineError::transport(message)
    }

    fn url_for(&self, path: &str) -> Result<Url, PipelineError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        Url::parse(&joined).map_err(|e| PipelineError::transport(format!("Invalid request URL '{}': {}", joined, e)))
    }
}
