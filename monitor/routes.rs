use std::io::Cursor;

use chrono::Local;
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use crate::state::{SharedState, Snapshot};

/// A response before it is turned into a `tiny_http::Response`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub location: Option<&'static str>,
    pub stale: bool,
    pub body: String,
}

impl Reply {
    fn json(status: u16, body: String) -> Reply {
        Reply { status, content_type: "application/json", location: None, stale: false, body }
    }

    fn text(status: u16, body: impl Into<String>) -> Reply {
        Reply { status, content_type: "text/plain; charset=utf-8", location: None, stale: false, body: body.into() }
    }

    fn redirect(location: &'static str) -> Reply {
        Reply { status: 303, content_type: "text/plain", location: Some(location), stale: false, body: String::new() }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let mut headers: Vec<Header> = Vec::new();
        headers.extend(Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()).ok());
        if let Some(location) = self.location {
            headers.extend(Header::from_bytes(&b"Location"[..], location.as_bytes()).ok());
        }
        if self.stale {
            headers.extend(Header::from_bytes(&b"X-Progress-Stale"[..], &b"true"[..]).ok());
        }
        let bytes = self.body.into_bytes();
        let len = bytes.len();
        Response::new(StatusCode(self.status), headers, Cursor::new(bytes), Some(len), None)
    }
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

pub fn dispatch(request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split('?').next().unwrap_or_default();

    let reply = route(&method, path, &state);
    debug!(%method, path, status = reply.status, "request");

    if let Err(e) = request.respond(reply.into_response()) {
        warn!(error = %e, "failed to send response");
    }
}

pub fn route(method: &Method, path: &str, state: &SharedState) -> Reply {
    if *method != Method::Get {
        return Reply::text(405, "405 Method Not Allowed");
    }
    match path {
        "/" => Reply::redirect("/progress"),
        "/progress" => progress(state),
        "/progress/summary" => summary(state),
        "/health" => health(state),
        _ => Reply::text(404, "404 Not Found"),
    }
}

fn snapshot(state: &SharedState) -> Snapshot {
    match state.lock() {
        Ok(mut guard) => guard.snapshot(),
        Err(poisoned) => poisoned.into_inner().snapshot(),
    }
}

fn progress(state: &SharedState) -> Reply {
    let (record, stale) = match snapshot(state) {
        Snapshot::Fresh(r) => (r, false),
        Snapshot::Stale(r) => (r, true),
        Snapshot::Idle => return Reply::json(404, json!({ "status": "idle" }).to_string()),
        Snapshot::Unavailable(reason) => {
            return Reply::json(503, json!({ "status": "unavailable", "error": reason }).to_string())
        }
    };
    match serde_json::to_string_pretty(&record) {
        Ok(body) => Reply { stale, ..Reply::json(200, body) },
        Err(e) => Reply::json(500, json!({ "error": e.to_string() }).to_string()),
    }
}

fn summary(state: &SharedState) -> Reply {
    match snapshot(state) {
        Snapshot::Fresh(r) => Reply::text(200, r.summary()),
        Snapshot::Stale(r) => Reply { stale: true, ..Reply::text(200, r.summary()) },
        Snapshot::Idle => Reply::text(404, "idle - no training run recorded"),
        Snapshot::Unavailable(reason) => Reply::text(503, format!("unavailable - {reason}")),
    }
}

fn health(state: &SharedState) -> Reply {
    let progress_file = match state.lock() {
        Ok(guard) => guard.store.path().display().to_string(),
        Err(poisoned) => poisoned.into_inner().store.path().display().to_string(),
    };
    let body = json!({
        "status": "healthy",
        "progress_file": progress_file,
        "timestamp": Local::now().naive_local(),
    });
    Reply::json(200, body.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use emotion_net::progress::{JsonFileStore, ModelInfo, ProgressRecord, ProgressStore};

    use super::*;
    use crate::state::MonitorState;

    fn state_for(path: &std::path::Path) -> SharedState {
        Arc::new(Mutex::new(MonitorState::new(JsonFileStore::new(path))))
    }

    #[test]
    fn missing_file_is_idle() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(&dir.path().join("training_progress.json"));

        let reply = route(&Method::Get, "/progress", &state);
        assert_eq!(reply.status, 404);
        assert_eq!(reply.body, r#"{"status":"idle"}"#);
    }

    #[test]
    fn serves_last_good_document_while_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training_progress.json");
        let state = state_for(&path);

        let record = ProgressRecord { total_epochs: 20, ..ProgressRecord::default() };
        JsonFileStore::new(&path).save(&record).unwrap();
        let fresh = route(&Method::Get, "/progress", &state);
        assert_eq!(fresh.status, 200);
        assert!(!fresh.stale);

        std::fs::write(&path, "{ \"status\": \"trai").unwrap();
        let stale = route(&Method::Get, "/progress", &state);
        assert_eq!(stale.status, 200);
        assert!(stale.stale);
        let parsed: ProgressRecord = serde_json::from_str(&stale.body).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn corrupt_file_without_cache_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training_progress.json");
        std::fs::write(&path, "not json").unwrap();
        let state = state_for(&path);

        assert_eq!(route(&Method::Get, "/progress", &state).status, 503);
        assert_eq!(route(&Method::Get, "/progress/summary", &state).status, 503);
    }

    #[test]
    fn summary_health_and_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training_progress.json");
        let start = chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let record = ProgressRecord::started(start, 5, ModelInfo::default());
        JsonFileStore::new(&path).save(&record).unwrap();
        let state = state_for(&path);

        let summary = route(&Method::Get, "/progress/summary", &state);
        assert_eq!(summary.status, 200);
        assert!(summary.body.starts_with("training - epoch 0/5"));

        let health = route(&Method::Get, "/health", &state);
        let value: serde_json::Value = serde_json::from_str(&health.body).unwrap();
        assert_eq!(value["status"], "healthy");
        assert!(value["progress_file"].as_str().unwrap().ends_with("training_progress.json"));
        assert!(value["timestamp"].is_string());

        let root = route(&Method::Get, "/", &state);
        assert_eq!(root.status, 303);
        assert_eq!(root.location, Some("/progress"));

        assert_eq!(route(&Method::Get, "/nope", &state).status, 404);
        assert_eq!(route(&Method::Post, "/progress", &state).status, 405);
    }
}
