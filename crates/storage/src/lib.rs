//! Storage layer for Faith Companion
//!
//! This crate provides the persisted key-value store that holds the
//! client's device-level state (the session tokens).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;

pub use kv::{DeviceStore, KvConfig, KvError, KvStore};
