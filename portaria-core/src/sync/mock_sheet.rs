//! In-process stand-in for the spreadsheet webhook, used by tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

#[derive(Clone)]
pub struct MockSheet {
    pub snapshot: Arc<Mutex<Value>>,
    pub pull_status: Arc<Mutex<StatusCode>>,
    pub pushes: Arc<Mutex<Vec<Value>>>,
    pub push_content_types: Arc<Mutex<Vec<String>>>,
    pub pull_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl MockSheet {
    pub fn new(snapshot: Value) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(snapshot)),
            pull_status: Arc::new(Mutex::new(StatusCode::OK)),
            pushes: Arc::new(Mutex::new(Vec::new())),
            push_content_types: Arc::new(Mutex::new(Vec::new())),
            pull_queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_pull_status(&self, status: StatusCode) {
        *self.pull_status.lock().unwrap() = status;
    }

    pub fn pushes(&self) -> Vec<Value> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn pull_count(&self) -> usize {
        self.pull_queries.lock().unwrap().len()
    }

    /// Serves the mock on an ephemeral port and returns the webhook URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/exec", get(pull).post(push))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/exec", addr)
    }
}

async fn pull(
    State(sheet): State<MockSheet>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    sheet.pull_queries.lock().unwrap().push(query);

    let status = *sheet.pull_status.lock().unwrap();
    if !status.is_success() {
        return status.into_response();
    }

    let snapshot = sheet.snapshot.lock().unwrap().clone();
    Json(snapshot).into_response()
}

async fn push(State(sheet): State<MockSheet>, headers: HeaderMap, body: String) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    sheet.push_content_types.lock().unwrap().push(content_type);

    let value = serde_json::from_str(&body).unwrap_or(Value::String(body));
    sheet.pushes.lock().unwrap().push(value);

    StatusCode::OK
}
