#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router as HttpRouter};
use serde_json::{json, Value};

use course_admin_client::config::{ClientConfig, UnauthorizedPolicy};
use course_admin_client::navigation::{GuardPolicy, NavigationOutcome, Navigate, RouteTable, Router};
use course_admin_client::notify::{NoticeLevel, RecordingNotifier};
use course_admin_client::pipeline::RequestPipeline;
use course_admin_client::session::SessionStore;
use course_admin_client::types::User;

pub const VALID_TOKEN: &str = "tok-1";
pub const REDIRECT_DELAY_MS: u64 = 40;

/// Stub API server bound to a free local port for the lifetime of the test
pub struct StubServer {
    pub port: u16,
    pub base_url: String,
}

impl StubServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind stub server")?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, app()).await;
        });

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
        })
    }
}

fn envelope(code: i64, message: &str, data: Value) -> Response {
    Json(json!({ "code": code, "message": message, "data": data })).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn sample_user(student_id: &str) -> Value {
    json!({ "id": 1, "student_id": student_id, "name": "Alice" })
}

fn sample_class(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "class_name": name,
        "created_at": "2024-03-01 10:00:00",
        "updated_at": "2024-03-01 10:00:00"
    })
}

async fn login(Json(body): Json<Value>) -> Response {
    let student_id = body["student_id"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();

    match (student_id.as_str(), password) {
        ("s1", "pw") => envelope(
            0,
            "Login successful",
            json!({ "user": sample_user("s1"), "token": VALID_TOKEN }),
        ),
        ("notoken", _) => envelope(0, "Login successful", json!({ "user": sample_user("notoken") })),
        ("nouser", _) => envelope(0, "Login successful", json!({ "token": VALID_TOKEN })),
        _ => envelope(1, "Wrong student ID or password", Value::Null),
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    let student_id = body["student_id"].as_str().unwrap_or_default();
    if student_id == "taken" {
        return envelope(1, "Student ID already registered", Value::Null);
    }
    envelope(
        0,
        "Registration successful",
        json!({
            "user": { "id": 2, "student_id": student_id, "name": body["name"] },
            "token": "tok-new"
        }),
    )
}

async fn class_list(Query(params): Query<HashMap<String, String>>) -> Response {
    let page: i64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let page_size: i64 = params.get("page_size").and_then(|p| p.parse().ok()).unwrap_or(10);
    envelope(
        0,
        "ok",
        json!({
            "total": 42,
            "list": [sample_class(page * 100 + page_size, &format!("Class page {}", page))]
        }),
    )
}

async fn class_add(Json(body): Json<Value>) -> Response {
    match body["class_name"].as_str() {
        Some(name) if !name.is_empty() => envelope(0, "Class created", sample_class(7, name)),
        _ => Json(json!({ "code": 1001 })).into_response(),
    }
}

async fn class_edit(Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    let name = body["class_name"].as_str().unwrap_or_default();
    envelope(0, "Class updated", sample_class(id, name))
}

async fn class_delete(Path(id): Path<i64>) -> Response {
    if id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "class not found" }))).into_response();
    }
    Json(json!({ "code": 0, "message": "Class deleted" })).into_response()
}

async fn teacher_list(headers: HeaderMap) -> Response {
    if bearer(&headers).as_deref() != Some(VALID_TOKEN) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "token expired" }))).into_response();
    }
    envelope(
        0,
        "ok",
        json!([
            { "id": 1, "name": "Dr. Smith", "title": "Professor", "email": "smith@example.edu" },
            { "id": 2, "name": "Ms. Lee", "title": "Lecturer", "email": "lee@example.edu" }
        ]),
    )
}

async fn echo_headers(headers: HeaderMap) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null)
    };
    envelope(
        0,
        "ok",
        json!({ "authorization": header("authorization"), "content_type": header("content-type") }),
    )
}

fn app() -> HttpRouter {
    HttpRouter::new()
        .route("/user/login", post(login))
        .route("/user/register", post(register))
        .route("/class/list", get(class_list))
        .route("/class/add", post(class_add))
        .route("/class/:id", put(class_edit).delete(class_delete))
        .route("/api/teacher/list", get(teacher_list))
        .route("/echo/headers", get(echo_headers).post(echo_headers))
        .route(
            "/fail/unauthorized",
            get(|| async { StatusCode::UNAUTHORIZED }),
        )
        .route(
            "/fail/error-field",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "database unavailable", "message": "ignored" })),
                )
            }),
        )
        .route(
            "/fail/message-field",
            get(|| async { (StatusCode::BAD_REQUEST, Json(json!({ "message": "page out of range" }))) }),
        )
        .route(
            "/fail/empty",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route("/fail/not-json", get(|| async { "<html>maintenance</html>" }))
        .route("/fail/bare-null", get(|| async { Json(Value::Null) }))
        .route(
            "/fail/business-silent",
            get(|| async { Json(json!({ "code": 5, "data": null })) }),
        )
        .route(
            "/class/add-wrong-shape",
            post(|| async { Json(json!({ "code": 0, "message": "Class created", "data": { "id": "x" } })) }),
        )
        .route(
            "/ok/message-only",
            get(|| async { Json(json!({ "code": 0, "message": "pong" })) }),
        )
}

/// Router wrapper that counts how many navigations were requested
pub struct CountingNavigator {
    inner: Router,
    calls: AtomicUsize,
}

impl CountingNavigator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Navigate for CountingNavigator {
    fn current_location(&self) -> String {
        self.inner.current_location()
    }

    fn navigate(&self, location: &str) -> NavigationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.navigate(location)
    }
}

/// A pipeline wired against the stub server with observable collaborators
pub struct Harness {
    pub server: StubServer,
    pub pipeline: RequestPipeline,
    pub session: Arc<SessionStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<CountingNavigator>,
}

impl Harness {
    pub async fn new() -> Result<Self> {
        Self::with_config(|_| {}).await
    }

    pub async fn with_policy(policy: UnauthorizedPolicy) -> Result<Self> {
        Self::with_config(|config| config.auth.unauthorized_policy = policy).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut ClientConfig)) -> Result<Self> {
        let server = StubServer::spawn().await?;
        let mut config = ClientConfig::for_base_url(server.base_url.clone());
        config.auth.redirect_delay_ms = REDIRECT_DELAY_MS;
        config.api.timeout_secs = 5;
        customize(&mut config);

        let session = Arc::new(SessionStore::in_memory());
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(CountingNavigator {
            inner: Router::new(
                RouteTable::admin(),
                session.clone(),
                notifier.clone(),
                GuardPolicy::from_config(&config.auth),
            )
            .start_at("/app/class"),
            calls: AtomicUsize::new(0),
        });

        let pipeline = RequestPipeline::builder(config)
            .session(session.clone())
            .notifier(notifier.clone())
            .navigator(navigator.clone())
            .build()?;

        Ok(Self {
            server,
            pipeline,
            session,
            notifier,
            navigator,
        })
    }

    pub fn sign_in(&self) {
        self.session
            .set_session(
                serde_json::from_value::<User>(sample_user("s1")).expect("sample user"),
                VALID_TOKEN.to_string(),
            )
            .expect("in-memory session write");
    }

    pub fn errors(&self) -> usize {
        self.notifier.count(NoticeLevel::Error)
    }

    /// Wait past the configured redirect delay
    pub async fn settle(&self) {
        tokio::time::sleep(std::time::Duration::from_millis(REDIRECT_DELAY_MS * 4)).await;
    }
}
