//! Faith backend API client
//!
//! This crate provides the authenticated HTTP client used by the Faith
//! Companion apps: bearer-token injection, transparent session refresh on
//! 401 with single-flight coordination, a pluggable session store, and typed
//! wrappers for the auth, calendar, prayer, Quran and dhikr endpoints.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod envelope;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
pub mod session;

pub use client::ApiClient;
pub use error::{ApiError, Result};
pub use http::{ApiRequest, ApiResponse, Attempt, ClientConfig, HttpClient, HttpMethod};
pub use session::{
    KvSessionStore, MemorySessionStore, RefreshCoordinator, Session, SessionEvent,
    SessionListener, SessionStore, SessionStoreError,
};
