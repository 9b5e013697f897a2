//! ApiClient - authenticated client for the Faith backend
//!
//! The client wraps the HTTP transport with bearer-token injection and
//! transparent session renewal:
//!
//! 1. The stored access token (if any) is attached to every authenticated
//!    request.
//! 2. A 401 on the first attempt asks the [`RefreshCoordinator`] for a new
//!    token. Concurrent 401s share a single refresh call.
//! 3. The request is re-issued exactly once with the new token. A second
//!    401 is returned to the caller as-is.
//! 4. If the refresh fails the session is cleared, listeners receive
//!    [`SessionEvent::Expired`] and the caller gets
//!    [`ApiError::SessionExpired`].
//!
//! Network errors and non-401 statuses are returned untouched.
//!
//! # Example
//!
//! ```rust,no_run
//! use api_client::{ApiClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::in_memory(ClientConfig::from_env())?;
//!
//!     client.auth().login("amina@example.com", "password").await?;
//!     let surahs = client.quran().surahs().await?;
//!     println!("{} surahs", surahs.len());
//!
//!     Ok(())
//! }
//! ```

use crate::error::{ApiError, Result};
use crate::http::{ApiRequest, ApiResponse, Attempt, ClientConfig, HttpClient};
use crate::services::{AuthApi, CalendarApi, ContentApi, DhikrApi, PrayerApi, QuranApi};
use crate::session::{
    KvSessionStore, MemorySessionStore, RefreshCoordinator, Renewal, Session, SessionEvent,
    SessionListeners, SessionStore,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use storage::DeviceStore;
use tracing::debug;

struct ClientInner {
    http: HttpClient,
    store: Arc<dyn SessionStore>,
    refresher: RefreshCoordinator,
    listeners: SessionListeners,
}

/// Authenticated API client
///
/// Clone is cheap; clones share the transport, the session store and the
/// in-flight refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    /// Create a client over an injected session store
    pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        let http = HttpClient::new(config)?;
        let listeners = SessionListeners::default();
        let refresher = RefreshCoordinator::new(http.clone(), store.clone(), listeners.clone());

        Ok(Self { inner: Arc::new(ClientInner { http, store, refresher, listeners }) })
    }

    /// Create a client whose session lives only in memory
    pub fn in_memory(config: ClientConfig) -> Result<Self> {
        Self::new(config, Arc::new(MemorySessionStore::new()))
    }

    /// Create a client whose session is persisted in the device store
    pub fn persistent(config: ClientConfig, device: DeviceStore) -> Result<Self> {
        Self::new(config, Arc::new(KvSessionStore::new(device)))
    }

    /// Register a callback for session events
    pub fn on_session_event<F>(&self, callback: F)
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.add(Arc::new(callback));
    }

    /// Get the transport configuration
    pub fn config(&self) -> &ClientConfig {
        self.inner.http.config()
    }

    /// Get the session store
    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    /// Get the refresh coordinator
    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.inner.refresher
    }

    /// Get the stored session
    pub async fn session(&self) -> Result<Option<Session>> {
        Ok(self.inner.store.get().await?)
    }

    /// Whether an access token is stored
    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.session().await?.map(|s| s.bearer().is_some()).unwrap_or(false))
    }

    /// Send a request, renewing the session once on 401
    pub async fn send<T>(&self, request: ApiRequest) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        if !request.authenticated {
            return self.inner.http.execute(&request, None, Attempt::First).await;
        }

        let session = self.inner.store.get().await?;
        let bearer = session.as_ref().and_then(|s| s.bearer()).map(str::to_string);

        match self.inner.http.execute(&request, bearer.as_deref(), Attempt::First).await {
            Err(err) if err.is_unauthorized() => {
                debug!(path = %request.path, "Request rejected with 401");
                match self.inner.refresher.renew(bearer.as_deref()).await? {
                    Renewal::Token(token) => {
                        self.inner.http.execute(&request, Some(&token), Attempt::Retry).await
                    }
                    Renewal::NoRefreshToken => Err(err),
                }
            }
            other => other,
        }
    }

    /// GET `path` and decode the body
    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send(ApiRequest::get(path)).await.map(|r| r.data)
    }

    /// GET `path` with query parameters and decode the body
    pub async fn get_with<T, K, V>(&self, path: &str, params: &[(K, V)]) -> Result<T>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
        V: ToString,
    {
        let request = params
            .iter()
            .fold(ApiRequest::get(path), |request, (key, value)| {
                request.param(key.as_ref(), value.to_string())
            });
        self.send(request).await.map(|r| r.data)
    }

    /// POST a JSON body to `path` and decode the response
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::post(path).json_body(body)?).await.map(|r| r.data)
    }

    /// PUT a JSON body to `path` and decode the response
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::put(path).json_body(body)?).await.map(|r| r.data)
    }

    /// PATCH a JSON body to `path` and decode the response
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::patch(path).json_body(body)?).await.map(|r| r.data)
    }

    /// DELETE `path` and decode the response
    pub async fn delete<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send(ApiRequest::delete(path)).await.map(|r| r.data)
    }

    /// Auth endpoints
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Islamic calendar endpoints
    pub fn calendar(&self) -> CalendarApi<'_> {
        CalendarApi::new(self)
    }

    /// Daily content endpoints
    pub fn content(&self) -> ContentApi<'_> {
        ContentApi::new(self)
    }

    /// Prayer endpoints
    pub fn prayers(&self) -> PrayerApi<'_> {
        PrayerApi::new(self)
    }

    /// Quran endpoints
    pub fn quran(&self) -> QuranApi<'_> {
        QuranApi::new(self)
    }

    /// Dhikr endpoints
    pub fn dhikr(&self) -> DhikrApi<'_> {
        DhikrApi::new(self)
    }

    /// Issue a request once with an explicit bearer, bypassing renewal
    pub(crate) async fn send_once<T>(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.inner.http.execute(request, bearer, Attempt::First).await
    }

    /// Store a new session and announce it
    pub(crate) async fn establish_session(&self, session: Session) -> Result<()> {
        self.inner.store.set(session).await?;
        self.inner.listeners.emit(SessionEvent::Created);
        Ok(())
    }

    /// Remove the session without announcing anything
    pub(crate) async fn clear_session(&self) -> Result<()> {
        self.inner.store.clear().await.map_err(ApiError::from)
    }

    /// Remove the session and announce the logout
    pub(crate) async fn end_session(&self) -> Result<()> {
        self.clear_session().await?;
        self.inner.listeners.emit(SessionEvent::LoggedOut);
        Ok(())
    }
}
