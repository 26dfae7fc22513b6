#![allow(dead_code)]

use async_trait::async_trait;
use fbimport::gateway::{DashboardApi, DashboardRequest, GraphApi, UpstreamError};
use fbimport::importer::FB_EVENT_FIELDS;
use fbimport::{Importer, Session, Signal};
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

pub const SOURCE: &str = "mypage";
pub const CSRF: &str = "csrf-token";

fn not_found(what: &str) -> UpstreamError {
    UpstreamError::new(
        Some(404),
        json!({ "error": { "message": format!("no fake response for {what}") } }),
    )
}

/// Graph gateway answering from a path -> response table.
#[derive(Default)]
pub struct FakeGraph {
    responses: Mutex<HashMap<String, Result<Value, UpstreamError>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGraph {
    pub fn respond(&self, path: &str, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Ok(body));
    }

    pub fn fail(&self, path: &str, status: u16, body: Value) {
        self.responses.lock().unwrap().insert(
            path.to_string(),
            Err(UpstreamError::new(Some(status), body)),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphApi for FakeGraph {
    async fn get(&self, path: &str) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push(path.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(not_found(path)))
    }
}

/// Dashboard gateway answering from a (method, path) -> response table.
#[derive(Default)]
pub struct FakeDashboard {
    responses: Mutex<HashMap<(Method, String), Result<Value, UpstreamError>>>,
    calls: Mutex<Vec<DashboardRequest>>,
}

impl FakeDashboard {
    pub fn respond(&self, method: Method, path: &str, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Ok(body));
    }

    pub fn fail(&self, method: Method, path: &str, status: u16, body: Value) {
        self.responses.lock().unwrap().insert(
            (method, path.to_string()),
            Err(UpstreamError::new(Some(status), body)),
        );
    }

    pub fn calls(&self) -> Vec<DashboardRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DashboardApi for FakeDashboard {
    async fn send(&self, request: DashboardRequest) -> Result<Value, UpstreamError> {
        let key = (request.method.clone(), request.path.clone());
        self.calls.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(not_found(&format!("{} {}", key.0, key.1))))
    }
}

pub struct Harness {
    pub graph: Arc<FakeGraph>,
    pub dashboard: Arc<FakeDashboard>,
    pub importer: Importer,
    pub signals: broadcast::Receiver<Signal>,
}

impl Harness {
    pub fn new() -> Self {
        let graph = Arc::new(FakeGraph::default());
        let dashboard = Arc::new(FakeDashboard::default());
        let session = Session::new(Some(CSRF.to_string()));
        let signals = session.subscribe();
        let importer = Importer::new(session, graph.clone(), dashboard.clone());
        Self {
            graph,
            dashboard,
            importer,
            signals,
        }
    }

    pub fn session(&self) -> &Session {
        self.importer.session()
    }

    /// Signals emitted since the last drain.
    pub fn drain_signals(&mut self) -> Vec<Signal> {
        let mut signals = Vec::new();
        while let Ok(signal) = self.signals.try_recv() {
            signals.push(signal);
        }
        signals
    }
}

pub fn first_page_path() -> String {
    format!("/{SOURCE}/posts?fields=link&pretty=0")
}

pub fn batch_path(ids: &[&str]) -> String {
    format!(
        "/?ids={}&fields={}&pretty=0",
        ids.join(","),
        FB_EVENT_FIELDS.join(",")
    )
}

pub fn single_path(fbid: &str) -> String {
    format!("/{fbid}?fields={}&pretty=0", FB_EVENT_FIELDS.join(","))
}

pub fn posts<S: AsRef<str>>(links: &[S], next: Option<&str>) -> Value {
    let data: Vec<Value> = links
        .iter()
        .map(|l| json!({ "link": l.as_ref(), "id": "post" }))
        .collect();
    match next {
        Some(next) => json!({ "data": data, "paging": { "next": next } }),
        None => json!({ "data": data }),
    }
}

pub fn event_link(fbid: &str) -> String {
    format!("https://www.facebook.com/events/{fbid}/")
}
