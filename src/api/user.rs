use crate::error::{PipelineError, StorageError};
use crate::pipeline::{RequestDescriptor, RequestPipeline};
use crate::session::SessionStore;
use crate::types::{LoginForm, LoginResult, RegisterForm};

pub const LOGIN_PATH: &str = "/user/login";
pub const REGISTER_PATH: &str = "/user/register";

/// `POST /user/login`; on success the session holds the returned token
pub async fn login(pipeline: &RequestPipeline, form: &LoginForm) -> Result<LoginResult, PipelineError> {
    tracing::debug!("Logging in '{}'", form.student_id);
    let descriptor = RequestDescriptor::authenticate(LOGIN_PATH, form)?;
    pipeline.login(&descriptor).await
}

/// `POST /user/register`; registration logs the new user in
pub async fn register(pipeline: &RequestPipeline, form: &RegisterForm) -> Result<LoginResult, PipelineError> {
    tracing::debug!("Registering '{}'", form.student_id);
    let descriptor = RequestDescriptor::authenticate(REGISTER_PATH, form)?;
    pipeline.login(&descriptor).await
}

/// Local logout; the server keeps no session to end
pub fn logout(session: &SessionStore) -> Result<(), StorageError> {
    session.clear_session()
}
