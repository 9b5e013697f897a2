//! Session management
//!
//! This module implements the client's session state:
//! - the [`Session`] token pair
//! - the injectable [`SessionStore`] persistence seam, with an in-memory and
//!   a key-value implementation
//! - session events delivered to registered listeners
//! - single-flight token refresh ([`RefreshCoordinator`])
//!
//! # Example
//!
//! ```rust
//! use api_client::session::{MemorySessionStore, Session, SessionStore};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemorySessionStore::new();
//! store.set(Session::new("access", "refresh")).await?;
//!
//! let session = store.get().await?.unwrap();
//! assert_eq!(session.bearer(), Some("access"));
//! # Ok(())
//! # }
//! ```

mod refresh;

pub use refresh::RefreshCoordinator;
pub(crate) use refresh::{RefreshTokenBody, Renewal};

use async_trait::async_trait;
use parking_lot::RwLock as SyncRwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use storage::{DeviceStore, KvError};
use thiserror::Error;
use tokio::sync::RwLock;

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Errors that can occur while persisting the session
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Key-value store error
    #[error("Key-value store error: {0}")]
    Kv(#[from] KvError),

    /// Store could not be reached or was left inconsistent
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for session store operations
pub type Result<T> = std::result::Result<T, SessionStoreError>;

/// Access/refresh token pair
///
/// An empty token is treated as absent. `Debug` output never contains the
/// token values.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Short-lived bearer credential
    pub access_token: String,
    /// Longer-lived credential exchanged for a new access token
    pub refresh_token: String,
}

impl Session {
    /// Create a session from a token pair
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }

    /// Access token to send as a bearer, if any
    pub fn bearer(&self) -> Option<&str> {
        Some(self.access_token.as_str()).filter(|t| !t.is_empty())
    }

    /// Refresh token, if any
    pub fn refresh(&self) -> Option<&str> {
        Some(self.refresh_token.as_str()).filter(|t| !t.is_empty())
    }

    /// Session after a refresh: new access token, and the rotated refresh
    /// token when the backend issued one
    pub fn renewed(&self, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token: refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| self.refresh_token.clone()),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |present: bool| if present { "<redacted>" } else { "<none>" };
        f.debug_struct("Session")
            .field("access_token", &redact(self.bearer().is_some()))
            .field("refresh_token", &redact(self.refresh().is_some()))
            .finish()
    }
}

/// Persistence seam for the session
///
/// Writes are last-write-wins; implementations need no transactional
/// guarantees.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session
    async fn get(&self) -> Result<Option<Session>>;

    /// Replace the stored session
    async fn set(&self, session: Session) -> Result<()>;

    /// Remove both tokens
    async fn clear(&self) -> Result<()>;
}

/// In-process session store
#[derive(Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `session`
    pub fn with_session(session: Session) -> Self {
        Self { session: RwLock::new(Some(session)) }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn set(&self, session: Session) -> Result<()> {
        *self.session.write().await = Some(session);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.session.write().await = None;
        Ok(())
    }
}

/// Session store persisted in the device scope of the key-value store
///
/// The tokens are kept as two plain string values under
/// [`ACCESS_TOKEN_KEY`] and [`REFRESH_TOKEN_KEY`].
#[derive(Clone)]
pub struct KvSessionStore {
    device: DeviceStore,
}

impl KvSessionStore {
    /// Create a store on top of a device store
    pub fn new(device: DeviceStore) -> Self {
        Self { device }
    }
}

#[async_trait]
impl SessionStore for KvSessionStore {
    async fn get(&self) -> Result<Option<Session>> {
        let access: Option<String> = self.device.get(ACCESS_TOKEN_KEY)?;
        let refresh: Option<String> = self.device.get(REFRESH_TOKEN_KEY)?;

        Ok(match (access, refresh) {
            (None, None) => None,
            (access, refresh) => {
                Some(Session::new(access.unwrap_or_default(), refresh.unwrap_or_default()))
            }
        })
    }

    async fn set(&self, session: Session) -> Result<()> {
        let device = self.device.clone();
        write_blocking(move || {
            device.set(ACCESS_TOKEN_KEY, &session.access_token)?;
            match session.refresh() {
                Some(refresh) => device.set(REFRESH_TOKEN_KEY, refresh)?,
                None => {
                    device.remove(REFRESH_TOKEN_KEY)?;
                }
            }
            device.flush()?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        let device = self.device.clone();
        write_blocking(move || {
            device.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])?;
            device.flush()?;
            Ok(())
        })
        .await
    }
}

/// Run a write and its flush on the blocking thread pool
async fn write_blocking<F>(write: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(write)
        .await
        .map_err(|err| SessionStoreError::Unavailable(err.to_string()))?
}

// =============================================================================
// Session Events
// =============================================================================

/// Session lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Session created (login, registration or OTP verification)
    Created,
    /// Access token renewed through the refresh endpoint
    Refreshed,
    /// Refresh failed; the session was cleared and the user must log in again
    Expired,
    /// User logged out
    LoggedOut,
}

/// Callback invoked on session events
pub type SessionListener = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// Registered session listeners, shared between the client and the
/// refresh coordinator
#[derive(Clone, Default)]
pub(crate) struct SessionListeners {
    inner: Arc<SyncRwLock<Vec<SessionListener>>>,
}

impl SessionListeners {
    pub(crate) fn add(&self, listener: SessionListener) {
        self.inner.write().push(listener);
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        let listeners = self.inner.read().clone();
        for listener in listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use storage::{KvConfig, KvStore};

    fn kv_store() -> KvSessionStore {
        KvSessionStore::new(DeviceStore::new(KvStore::in_memory().unwrap()))
    }

    #[test]
    fn test_session_accessors() {
        let session = Session::new("access", "refresh");
        assert_eq!(session.bearer(), Some("access"));
        assert_eq!(session.refresh(), Some("refresh"));

        let empty = Session::new("", "");
        assert!(empty.bearer().is_none());
        assert!(empty.refresh().is_none());
    }

    #[test]
    fn test_renewed_keeps_refresh_token_unless_rotated() {
        let session = Session::new("old", "refresh-1");

        let kept = session.renewed("new".to_string(), None);
        assert_eq!(kept, Session::new("new", "refresh-1"));

        let rotated = session.renewed("new".to_string(), Some("refresh-2".to_string()));
        assert_eq!(rotated, Session::new("new", "refresh-2"));

        let blank = session.renewed("new".to_string(), Some(String::new()));
        assert_eq!(blank.refresh_token, "refresh-1");
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", Session::new("secret-access", "secret-refresh"));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let json = serde_json::to_value(Session::new("a", "r")).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.get().await.unwrap().is_none());

        store.set(Session::new("a", "r")).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(Session::new("a", "r")));

        store.set(Session::new("b", "r")).await.unwrap();
        assert_eq!(store.get().await.unwrap().unwrap().access_token, "b");

        store.clear().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_kv_store_roundtrip_and_clear() {
        let store = kv_store();
        assert!(store.get().await.unwrap().is_none());

        store.set(Session::new("a", "r")).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(Session::new("a", "r")));

        store.clear().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_kv_store_uses_fixed_keys() {
        let kv = KvStore::in_memory().unwrap();
        let store = KvSessionStore::new(DeviceStore::new(kv.clone()));

        store.set(Session::new("a", "r")).await.unwrap();

        let access: Option<String> = kv.get("device:accessToken").unwrap();
        let refresh: Option<String> = kv.get("device:refreshToken").unwrap();
        assert_eq!(access.as_deref(), Some("a"));
        assert_eq!(refresh.as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn test_kv_store_partial_state() {
        let kv = KvStore::in_memory().unwrap();
        let device = DeviceStore::new(kv);
        device.set(REFRESH_TOKEN_KEY, "r").unwrap();

        let session = KvSessionStore::new(device).get().await.unwrap().unwrap();
        assert!(session.bearer().is_none());
        assert_eq!(session.refresh(), Some("r"));
    }

    #[tokio::test]
    async fn test_kv_store_set_without_refresh_removes_old_one() {
        let store = kv_store();
        store.set(Session::new("a", "r")).await.unwrap();
        store.set(Session::new("b", "")).await.unwrap();

        let session = store.get().await.unwrap().unwrap();
        assert_eq!(session.bearer(), Some("b"));
        assert!(session.refresh().is_none());
    }

    #[tokio::test]
    async fn test_kv_store_writes_are_durable_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let open = || {
            let config = KvConfig::new(dir.path().join("device.db")).flush_every_ms(None);
            KvSessionStore::new(DeviceStore::new(KvStore::open(config).unwrap()))
        };

        {
            let store = open();
            store.set(Session::new("a", "r")).await.unwrap();
        }
        assert_eq!(open().get().await.unwrap(), Some(Session::new("a", "r")));

        {
            let store = open();
            store.clear().await.unwrap();
        }
        assert!(open().get().await.unwrap().is_none());
    }

    #[test]
    fn test_listeners_receive_events_in_order() {
        let listeners = SessionListeners::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        listeners.add(Arc::new(move |event| sink.lock().unwrap().push(event)));

        listeners.emit(SessionEvent::Created);
        listeners.emit(SessionEvent::Expired);

        assert_eq!(*seen.lock().unwrap(), vec![SessionEvent::Created, SessionEvent::Expired]);
    }
}
