//! Typed endpoint groups
//!
//! Each service borrows the [`ApiClient`](crate::ApiClient) and issues its
//! requests through [`ApiClient::send`](crate::ApiClient::send), so bearer
//! injection and session renewal apply to every call.

mod auth;
mod calendar;
mod content;
mod dhikr;
mod prayers;
mod quran;

pub use auth::AuthApi;
pub use calendar::{CalendarApi, DEFAULT_UPCOMING_DAYS};
pub use content::{ContentApi, DEFAULT_HISTORY_LIMIT};
pub use dhikr::DhikrApi;
pub use prayers::PrayerApi;
pub use quran::QuranApi;

/// Prefix of the Islamic content endpoints
pub(crate) const ISLAM_PREFIX: &str = "/api/v1/islam";
