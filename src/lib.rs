//! Faith Companion client
//!
//! Entry point that re-exports the workspace crates: the authenticated
//! [`api_client`] and the device [`storage`] it persists sessions in.

#![warn(missing_docs)]

pub use api_client;
pub use storage;

pub use api_client::{ApiClient, ApiError, ClientConfig, Session, SessionEvent};
