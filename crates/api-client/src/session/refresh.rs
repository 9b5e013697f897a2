//! Single-flight session refresh
//!
//! When several requests are rejected with 401 at the same time, only one
//! call to the refresh endpoint is made. The first caller spawns the refresh
//! on the runtime and everyone, the first caller included, awaits a shared
//! handle to that task and sees the same outcome. Dropping a waiter never
//! stops the refresh. The coordinator performs the store writes and emits the
//! `Refreshed`/`Expired` events itself, so a storm of rejected requests
//! produces exactly one of each side effect.

use super::{Session, SessionEvent, SessionListeners, SessionStore, SessionStoreError};
use crate::error::{ApiError, Result};
use crate::http::{ApiRequest, Attempt, HttpClient};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Body of the refresh and logout endpoints
#[derive(Debug, Serialize)]
pub(crate) struct RefreshTokenBody<'a> {
    pub(crate) refresh_token: &'a str,
}

/// Refresh endpoint response, flat or inside `{data: ...}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(alias = "access_token")]
    access_token: String,
    #[serde(default, alias = "refresh_token")]
    refresh_token: Option<String>,
}

/// Outcome shared by every waiter of one refresh
#[derive(Debug, Clone)]
enum RefreshOutcome {
    Renewed(Session),
    Expired,
    StoreFailed(String),
    Interrupted(String),
}

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// A refresh, keyed by the access token it replaces
struct InFlight {
    replaces: String,
    task: AbortHandle,
    future: SharedRefresh,
}

/// What the client should do after a 401
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Renewal {
    /// Retry the request with this access token
    Token(String),
    /// No refresh token is stored; surface the 401 unchanged
    NoRefreshToken,
}

/// Coordinates token refresh so that at most one refresh call is in flight
pub struct RefreshCoordinator {
    http: HttpClient,
    store: Arc<dyn SessionStore>,
    listeners: SessionListeners,
    in_flight: Mutex<Option<InFlight>>,
}

impl RefreshCoordinator {
    pub(crate) fn new(
        http: HttpClient,
        store: Arc<dyn SessionStore>,
        listeners: SessionListeners,
    ) -> Self {
        Self { http, store, listeners, in_flight: Mutex::new(None) }
    }

    /// Obtain a usable access token after `rejected` was refused with 401.
    ///
    /// - If the stored token differs from the rejected one, another request
    ///   already renewed the session: that token is returned without a
    ///   refresh call.
    /// - If no refresh token is stored, [`Renewal::NoRefreshToken`] tells the
    ///   caller to surface the original 401, unless a refresh already ran for
    ///   the rejected token, in which case its outcome is shared.
    /// - Otherwise the caller joins (or starts) the single in-flight refresh.
    ///   A failed refresh clears the session and yields
    ///   [`ApiError::SessionExpired`].
    pub(crate) async fn renew(&self, rejected: Option<&str>) -> Result<Renewal> {
        let session = self.store.get().await?;

        if let Some(current) = session.as_ref().and_then(Session::bearer) {
            if Some(current) != rejected {
                debug!("Session already renewed by another request");
                return Ok(Renewal::Token(current.to_string()));
            }
        }

        let outcome = match session.filter(|s| s.refresh().is_some()) {
            Some(session) => self.join_or_start(session).await,
            None => match self.flight_for(rejected) {
                // The refresh for this token already ended the session
                Some(flight) => flight.await,
                None => return Ok(Renewal::NoRefreshToken),
            },
        };

        match outcome {
            RefreshOutcome::Renewed(renewed) => Ok(Renewal::Token(renewed.access_token)),
            RefreshOutcome::Expired => Err(ApiError::SessionExpired),
            RefreshOutcome::StoreFailed(reason) => {
                Err(ApiError::Storage(SessionStoreError::Unavailable(reason)))
            }
            RefreshOutcome::Interrupted(reason) => Err(ApiError::RefreshInterrupted(reason)),
        }
    }

    /// Whether a refresh is currently running
    pub fn is_refreshing(&self) -> bool {
        self.in_flight
            .lock()
            .as_ref()
            .map(|flight| !flight.task.is_finished())
            .unwrap_or(false)
    }

    fn flight_for(&self, rejected: Option<&str>) -> Option<SharedRefresh> {
        let rejected = rejected?;
        self.in_flight
            .lock()
            .as_ref()
            .filter(|flight| flight.replaces == rejected)
            .map(|flight| flight.future.clone())
    }

    fn join_or_start(&self, session: Session) -> SharedRefresh {
        let mut slot = self.in_flight.lock();

        if let Some(flight) = slot.as_ref() {
            // A running refresh is always joined. A finished one is reused
            // only by callers that read the same stale token before it
            // completed; anything else gets a fresh refresh.
            if !flight.task.is_finished() || flight.replaces == session.access_token {
                return flight.future.clone();
            }
        }

        let replaces = session.access_token.clone();
        let handle = tokio::spawn(Self::refresh(
            self.http.clone(),
            self.store.clone(),
            self.listeners.clone(),
            session,
        ));
        let task = handle.abort_handle();
        let future = async move {
            handle.await.unwrap_or_else(|err| {
                warn!(error = %err, "Session refresh task failed");
                RefreshOutcome::Interrupted(err.to_string())
            })
        }
        .boxed()
        .shared();

        *slot = Some(InFlight { replaces, task, future: future.clone() });
        future
    }

    async fn refresh(
        http: HttpClient,
        store: Arc<dyn SessionStore>,
        listeners: SessionListeners,
        session: Session,
    ) -> RefreshOutcome {
        info!("Refreshing session");

        let request = ApiRequest::post(http.config().refresh_path.clone())
            .anonymous()
            .json_body(&RefreshTokenBody { refresh_token: &session.refresh_token });

        let result = match request {
            Ok(request) => http.execute::<RefreshResponse>(&request, None, Attempt::First).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(response) if !response.data.access_token.is_empty() => {
                let data = response.data;
                let renewed = session.renewed(data.access_token, data.refresh_token);
                if let Err(err) = store.set(renewed.clone()).await {
                    warn!(error = %err, "Failed to persist refreshed session");
                    return RefreshOutcome::StoreFailed(err.to_string());
                }
                info!("Session refreshed");
                listeners.emit(SessionEvent::Refreshed);
                RefreshOutcome::Renewed(renewed)
            }
            other => {
                match other {
                    Ok(_) => warn!("Refresh response carried no access token; ending session"),
                    Err(err) => warn!(error = %err, "Session refresh failed; ending session"),
                }
                if let Err(err) = store.clear().await {
                    warn!(error = %err, "Failed to clear expired session");
                }
                listeners.emit(SessionEvent::Expired);
                RefreshOutcome::Expired
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ClientConfig;
    use crate::session::{MemorySessionStore, MockSessionStore};

    fn coordinator(store: Arc<dyn SessionStore>) -> RefreshCoordinator {
        // Nothing listens here; tests below never reach the network.
        let http = HttpClient::new(ClientConfig::new("http://127.0.0.1:9")).unwrap();
        RefreshCoordinator::new(http, store, SessionListeners::default())
    }

    #[tokio::test]
    async fn test_no_session_means_no_refresh_token() {
        let coordinator = coordinator(Arc::new(MemorySessionStore::new()));
        let renewal = coordinator.renew(Some("stale")).await.unwrap();
        assert_eq!(renewal, Renewal::NoRefreshToken);
    }

    #[tokio::test]
    async fn test_empty_refresh_token_means_no_refresh_token() {
        let store = MemorySessionStore::with_session(Session::new("stale", ""));
        let coordinator = coordinator(Arc::new(store));
        let renewal = coordinator.renew(Some("stale")).await.unwrap();
        assert_eq!(renewal, Renewal::NoRefreshToken);
    }

    #[tokio::test]
    async fn test_newer_stored_token_is_reused() {
        let store = MemorySessionStore::with_session(Session::new("fresh", "refresh"));
        let coordinator = coordinator(Arc::new(store));

        let renewal = coordinator.renew(Some("stale")).await.unwrap();
        assert_eq!(renewal, Renewal::Token("fresh".to_string()));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_request_sent_without_token_uses_stored_one() {
        let store = MemorySessionStore::with_session(Session::new("fresh", "refresh"));
        let coordinator = coordinator(Arc::new(store));

        let renewal = coordinator.renew(None).await.unwrap();
        assert_eq!(renewal, Renewal::Token("fresh".to_string()));
    }

    #[tokio::test]
    async fn test_store_read_failure_propagates() {
        let mut store = MockSessionStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|| Err(SessionStoreError::Unavailable("disk gone".to_string())));

        let coordinator = coordinator(Arc::new(store));
        let err = coordinator.renew(Some("stale")).await.unwrap_err();
        assert!(matches!(err, ApiError::Storage(SessionStoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_panicking_refresh_task_is_reported() {
        let mut store = MockSessionStore::new();
        store.expect_get().returning(|| Ok(Some(Session::new("stale", "refresh"))));
        store.expect_clear().returning(|| panic!("store poisoned"));

        let coordinator = coordinator(Arc::new(store));
        let err = coordinator.renew(Some("stale")).await.unwrap_err();

        assert!(matches!(err, ApiError::RefreshInterrupted(_)));
        assert!(!coordinator.is_refreshing());
    }

    #[test]
    fn test_refresh_body_uses_snake_case_key() {
        let body = serde_json::to_value(RefreshTokenBody { refresh_token: "r" }).unwrap();
        assert_eq!(body, serde_json::json!({"refresh_token": "r"}));
    }

    #[test]
    fn test_refresh_response_shapes() {
        let flat: RefreshResponse =
            crate::envelope::decode(r#"{"accessToken":"a","refreshToken":"r"}"#).unwrap();
        assert_eq!(flat.access_token, "a");
        assert_eq!(flat.refresh_token.as_deref(), Some("r"));

        let wrapped: RefreshResponse =
            crate::envelope::decode(r#"{"data":{"accessToken":"a"}}"#).unwrap();
        assert_eq!(wrapped.access_token, "a");
        assert!(wrapped.refresh_token.is_none());
    }
}
