//! Interceptors for the two pipeline phases.
//!
//! Each phase is an ordered list. Interceptors run one after another for a
//! single call; the first `Err` stops the phase and becomes the call's result.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;

use super::envelope::{self, Envelope};
use super::request::{OutgoingRequest, RequestDescriptor};
use crate::config::ClientConfig;
use crate::error::PipelineError;
use crate::notify::{Notice, Notifier};
use crate::session::SessionStore;
use crate::types::{LoginResult, User};

/// Shared collaborators handed to every interceptor
pub struct PipelineContext {
    pub config: ClientConfig,
    pub session: Arc<SessionStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// State of a 2xx response as it moves through the response phase
#[derive(Debug)]
pub struct ResponseContext<'a> {
    pub descriptor: &'a RequestDescriptor,
    pub status: StatusCode,
    pub body: Vec<u8>,
    /// Set once the body has been normalized
    pub envelope: Option<Envelope>,
    /// Replaces the envelope's `data` as the caller-visible value
    pub output: Option<Value>,
    /// Released by the pipeline only once the whole call has succeeded
    pub notices: Vec<Notice>,
}

impl<'a> ResponseContext<'a> {
    pub fn new(descriptor: &'a RequestDescriptor, status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            descriptor,
            status,
            body,
            envelope: None,
            output: None,
            notices: Vec::new(),
        }
    }

    /// Caller-visible value (explicit output, else envelope `data`, else
    /// null) together with the notices held back for success
    pub fn into_parts(self) -> (Value, Vec<Notice>) {
        let value = self
            .output
            .or_else(|| self.envelope.and_then(|e| e.data))
            .unwrap_or(Value::Null);
        (value, self.notices)
    }
}

#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_request(
        &self,
        request: &mut OutgoingRequest<'_>,
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError>;
}

#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_response(
        &self,
        response: &mut ResponseContext<'_>,
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError>;
}

pub type RequestInterceptorBox = Box<dyn RequestInterceptor>;
pub type ResponseInterceptorBox = Box<dyn ResponseInterceptor>;

// ---------------------------------------------------------------------------
// Request phase
// ---------------------------------------------------------------------------

/// JSON content type on mutating methods
pub struct ContentTypeInterceptor;

#[async_trait]
impl RequestInterceptor for ContentTypeInterceptor {
    fn name(&self) -> &'static str {
        "content_type"
    }

    async fn on_request(
        &self,
        request: &mut OutgoingRequest<'_>,
        _ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        if !request.descriptor().method().is_mutating() {
            return Ok(());
        }
        if let Some(headers) = request.headers_mut() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(())
    }
}

/// `Authorization: Bearer <token>` when a session token exists
pub struct BearerAuthInterceptor;

#[async_trait]
impl RequestInterceptor for BearerAuthInterceptor {
    fn name(&self) -> &'static str {
        "bearer_auth"
    }

    async fn on_request(
        &self,
        request: &mut OutgoingRequest<'_>,
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        let Some(token) = ctx.session.token() else {
            return Ok(());
        };
        let Some(headers) = request.headers_mut() else {
            return Ok(());
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => {
                // Send unauthenticated and let the server decide
                tracing::warn!("Session token is not a valid header value, sending without it: {}", e);
            }
        }
        Ok(())
    }
}

/// Debug trace of each outgoing call; header values are never logged
pub struct RequestLogInterceptor;

#[async_trait]
impl RequestInterceptor for RequestLogInterceptor {
    fn name(&self) -> &'static str {
        "request_log"
    }

    async fn on_request(
        &self,
        request: &mut OutgoingRequest<'_>,
        _ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        let descriptor = request.descriptor();
        let header_names: Vec<&str> = request
            .headers()
            .map(|h| h.keys().map(|k| k.as_str()).collect())
            .unwrap_or_default();

        tracing::debug!(
            method = descriptor.method().as_str(),
            path = descriptor.path(),
            query = ?descriptor.query(),
            has_body = descriptor.body().is_some(),
            headers = ?header_names,
            "Outgoing request"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Response phase
// ---------------------------------------------------------------------------

/// Normalizes the body and rejects non-success envelope codes
pub struct EnvelopeInterceptor;

#[async_trait]
impl ResponseInterceptor for EnvelopeInterceptor {
    fn name(&self) -> &'static str {
        "envelope"
    }

    async fn on_response(
        &self,
        response: &mut ResponseContext<'_>,
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        let envelope = envelope::normalize(&response.body)?;

        if !envelope.is_success(ctx.config.envelope.success_code) {
            tracing::debug!(
                "Business error on {} {}: code {:?}",
                response.descriptor.method().as_str(),
                response.descriptor.path(),
                envelope.code
            );
            let message = envelope
                .message()
                .unwrap_or(ctx.config.envelope.fallback_message.as_str());
            return Err(PipelineError::business(message));
        }

        response.envelope = Some(envelope);
        Ok(())
    }
}

/// Login/registration: validates the payload, establishes the session and
/// reshapes the result into `{ message, user, token }`.
///
/// This is the only code path that calls [`SessionStore::set_session`].
pub struct AuthPayloadInterceptor;

impl AuthPayloadInterceptor {
    fn extract(envelope: &Envelope) -> Result<LoginResult, PipelineError> {
        let data = envelope
            .data
            .as_ref()
            .ok_or_else(|| PipelineError::malformed("data is empty"))?;

        let token = data
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PipelineError::malformed("missing token"))?;

        let user = match data.get("user") {
            None | Some(Value::Null) => return Err(PipelineError::malformed("missing user")),
            Some(user) => serde_json::from_value::<User>(user.clone())
                .map_err(|e| PipelineError::malformed(format!("invalid user: {}", e)))?,
        };

        Ok(LoginResult {
            message: envelope.message.clone().unwrap_or_default(),
            user,
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl ResponseInterceptor for AuthPayloadInterceptor {
    fn name(&self) -> &'static str {
        "auth_payload"
    }

    async fn on_response(
        &self,
        response: &mut ResponseContext<'_>,
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        if !response.descriptor.is_authentication() {
            return Ok(());
        }
        let envelope = response
            .envelope
            .as_ref()
            .ok_or_else(|| PipelineError::malformed("response was not unwrapped"))?;

        let result = Self::extract(envelope)?;

        if let Err(e) = ctx.session.set_session(result.user.clone(), result.token.clone()) {
            tracing::warn!("Session established but could not be persisted: {}", e);
        }

        let output = serde_json::to_value(&result)
            .map_err(|e| PipelineError::malformed(format!("failed to encode login result: {}", e)))?;
        response.output = Some(output);
        Ok(())
    }
}

/// Queues the envelope message of create/update/delete calls as a success notice
pub struct MutationNoticeInterceptor;

#[async_trait]
impl ResponseInterceptor for MutationNoticeInterceptor {
    fn name(&self) -> &'static str {
        "mutation_notice"
    }

    async fn on_response(
        &self,
        response: &mut ResponseContext<'_>,
        _ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        let descriptor = response.descriptor;
        if !descriptor.method().is_mutating() || descriptor.is_authentication() {
            return Ok(());
        }
        if let Some(message) = response.envelope.as_ref().and_then(Envelope::message) {
            let notice = Notice::success(message);
            response.notices.push(notice);
        }
        Ok(())
    }
}

pub fn default_request_interceptors(config: &ClientConfig) -> Vec<RequestInterceptorBox> {
    let mut interceptors: Vec<RequestInterceptorBox> =
        vec![Box::new(ContentTypeInterceptor), Box::new(BearerAuthInterceptor)];
    if config.api.enable_request_logging {
        interceptors.push(Box::new(RequestLogInterceptor));
    }
    interceptors
}

pub fn default_response_interceptors() -> Vec<ResponseInterceptorBox> {
    vec![
        Box::new(EnvelopeInterceptor),
        Box::new(AuthPayloadInterceptor),
        Box::new(MutationNoticeInterceptor),
    ]
}
