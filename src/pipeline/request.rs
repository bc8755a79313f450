use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Create/update/delete style methods
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Method::Get)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// How the response phase treats a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationKind {
    /// Plain resource call: caller receives `data`
    Resource,
    /// Login or registration: payload must carry user and token
    Authenticate,
}

/// What an API wrapper wants sent. Immutable once built; there is no way to
/// attach headers here, authentication is the pipeline's job.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    body: Option<Value>,
    query: Vec<(String, String)>,
    kind: OperationKind,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            kind: OperationKind::Resource,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Login/registration call posting `body`
    pub fn authenticate<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, PipelineError> {
        let mut descriptor = Self::post(path).with_json(body)?;
        descriptor.kind = OperationKind::Authenticate;
        Ok(descriptor)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON payload
    pub fn with_json<B: Serialize>(self, body: &B) -> Result<Self, PipelineError> {
        let value = serde_json::to_value(body)
            .map_err(|e| PipelineError::transport(format!("Failed to encode request body: {}", e)))?;
        Ok(self.with_body(value))
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn is_authentication(&self) -> bool {
        self.kind == OperationKind::Authenticate
    }
}

/// A descriptor on its way out, plus the headers the request phase attaches
#[derive(Debug)]
pub struct OutgoingRequest<'a> {
    descriptor: &'a RequestDescriptor,
    headers: Option<HeaderMap>,
}

impl<'a> OutgoingRequest<'a> {
    pub fn new(descriptor: &'a RequestDescriptor) -> Self {
        Self {
            descriptor,
            headers: Some(HeaderMap::new()),
        }
    }

    /// Outgoing request with no header container; interceptors pass it through
    pub fn without_headers(descriptor: &'a RequestDescriptor) -> Self {
        Self { descriptor, headers: None }
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        self.descriptor
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    pub fn headers_mut(&mut self) -> Option<&mut HeaderMap> {
        self.headers.as_mut()
    }

    pub(crate) fn into_headers(self) -> Option<HeaderMap> {
        self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_get_is_non_mutating() {
        assert!(!Method::Get.is_mutating());
        for method in [Method::Post, Method::Put, Method::Patch, Method::Delete] {
            assert!(method.is_mutating(), "{}", method.as_str());
        }
    }

    #[test]
    fn authenticate_descriptor_posts_json_body() {
        let descriptor =
            RequestDescriptor::authenticate("/user/login", &json!({"student_id": "s1"})).unwrap();

        assert_eq!(descriptor.method(), Method::Post);
        assert!(descriptor.is_authentication());
        assert_eq!(descriptor.body(), Some(&json!({"student_id": "s1"})));
    }

    #[test]
    fn query_pairs_keep_insertion_order() {
        let descriptor = RequestDescriptor::get("/class/list")
            .with_query("page", 2)
            .with_query("page_size", 20);

        assert_eq!(
            descriptor.query(),
            &[
                ("page".to_string(), "2".to_string()),
                ("page_size".to_string(), "20".to_string())
            ]
        );
        assert_eq!(descriptor.kind(), OperationKind::Resource);
    }
}
