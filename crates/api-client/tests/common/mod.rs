//! Shared helpers for the integration tests

#![allow(dead_code)]

use api_client::{ApiClient, ClientConfig, MemorySessionStore, Session, SessionEvent};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use wiremock::MockServer;

static TRACING: Once = Once::new();

/// Install a test subscriber once. Set `TEST_LOG` to see client logs.
pub fn init_tracing() {
    TRACING.call_once(|| {
        if std::env::var("TEST_LOG").is_ok() {
            let filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("api_client=debug"));
            tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
        }
    });
}

/// Client pointed at the mock server with a short timeout
pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri()).with_timeout(Duration::from_secs(5))
}

/// Client holding `session` in memory
pub fn client_with_session(server: &MockServer, session: Option<Session>) -> ApiClient {
    init_tracing();
    let store = match session {
        Some(session) => MemorySessionStore::with_session(session),
        None => MemorySessionStore::new(),
    };
    ApiClient::new(config(server), Arc::new(store)).unwrap()
}

/// Collect every session event the client emits
pub fn record_events(client: &ApiClient) -> Arc<Mutex<Vec<SessionEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    client.on_session_event(move |event| sink.lock().unwrap().push(event));
    events
}

/// Authorization header of a recorded request
pub fn authorization(request: &wiremock::Request) -> Option<String> {
    request
        .headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
