//! Backend data types
//!
//! These mirror the JSON returned by the Faith backend (camelCase field
//! names). Optional fields default when the backend omits them.

use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Auth
// =============================================================================

/// Authenticated user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Full name given at registration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Response of login, registration and OTP verification
///
/// The user may arrive as `user` or as `data` next to the tokens.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Access token
    pub access_token: String,
    /// Refresh token
    #[serde(default)]
    pub refresh_token: String,
    /// Authenticated user
    #[serde(default, alias = "data")]
    pub user: Option<User>,
}

impl AuthResponse {
    /// Token pair to store
    pub fn session(&self) -> Session {
        Session::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

// =============================================================================
// Prayers
// =============================================================================

/// Daily prayer times for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerTimes {
    /// Date the times apply to
    pub date: String,
    /// Time of each prayer
    pub timings: Timings,
    /// Calculation metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PrayerMeta>,
}

/// Prayer times, keyed by prayer name as the backend sends them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timings {
    /// Dawn prayer
    pub fajr: String,
    /// Midday prayer
    pub dhuhr: String,
    /// Afternoon prayer
    pub asr: String,
    /// Sunset prayer
    pub maghrib: String,
    /// Night prayer
    pub isha: String,
    /// Sunrise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<String>,
    /// Sunset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<String>,
}

/// How prayer times were calculated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerMeta {
    /// Latitude
    pub latitude: f64,
    /// Longitude
    pub longitude: f64,
    /// IANA timezone
    pub timezone: String,
    /// Calculation method
    pub method: String,
}

/// When a prayer was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrayerStatus {
    /// Within its time window
    OnTime,
    /// After its preferred window
    Late,
    /// Made up later
    Qada,
}

/// Logged prayer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerLog {
    /// Log id
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Prayer name
    pub prayer_name: String,
    /// Date the prayer belongs to
    pub date: String,
    /// Status
    pub status: PrayerStatus,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregated prayer statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerStats {
    /// All logged prayers
    pub total_prayers: u32,
    /// Prayers logged on time
    pub on_time_prayers: u32,
    /// Prayers logged late
    pub late_prayers: u32,
    /// Prayers made up
    pub qada_prayers: u32,
    /// Current streak in days
    pub current_streak: u32,
    /// Longest streak in days
    pub longest_streak: u32,
    /// Share of completed prayers
    pub completion_rate: f64,
}

// =============================================================================
// Calendar
// =============================================================================

/// Date in the Hijri calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HijriDate {
    /// Day of month
    pub day: u32,
    /// Month (1-12)
    pub month: u32,
    /// Year
    pub year: i32,
    /// Month name
    pub month_name: String,
    /// Month name in Arabic
    #[serde(default)]
    pub month_name_arabic: String,
    /// Display form
    #[serde(default)]
    pub formatted: String,
}

/// Date in the Gregorian calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GregorianDate {
    /// Day of month
    pub day: u32,
    /// Month (1-12)
    pub month: u32,
    /// Year
    pub year: i32,
    /// Display form
    #[serde(default)]
    pub formatted: String,
}

/// The same day in both calendars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDate {
    /// Hijri date
    pub hijri: HijriDate,
    /// Gregorian date
    pub gregorian: GregorianDate,
}

/// Islamic calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslamicEvent {
    /// Event id
    pub id: String,
    /// Name
    pub name: String,
    /// Name in Arabic
    #[serde(default)]
    pub name_arabic: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Hijri month
    pub hijri_month: u32,
    /// Hijri day
    pub hijri_day: u32,
    /// Significance
    #[serde(default)]
    pub significance: String,
}

// =============================================================================
// Quran
// =============================================================================

/// Where a surah was revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevelationPlace {
    /// Makkah
    Makkah,
    /// Madinah
    Madinah,
}

/// Quran chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Surah {
    /// Surah number
    pub id: u32,
    /// Name
    pub name: String,
    /// Name in Arabic
    #[serde(default)]
    pub name_arabic: String,
    /// Transliterated name
    #[serde(default)]
    pub name_transliteration: String,
    /// Revelation place
    pub revelation_place: RevelationPlace,
    /// Number of verses
    pub verses_count: u32,
}

/// Surah with its verses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurahDetail {
    /// Surah metadata
    #[serde(flatten)]
    pub surah: Surah,
    /// Verses, in order
    #[serde(default)]
    pub verses: Vec<Verse>,
}

/// Quran verse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    /// Verse id
    pub id: u32,
    /// Surah number
    pub surah_id: u32,
    /// Verse number within the surah
    pub verse_number: u32,
    /// Arabic text
    pub text_arabic: String,
    /// Translation
    #[serde(default)]
    pub text_translation: String,
    /// Transliteration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_transliteration: Option<String>,
}

/// Saved verse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Bookmark id
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Surah number
    pub surah_id: u32,
    /// Verse number
    pub verse_number: u32,
    /// Personal note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Dhikr
// =============================================================================

/// Dhikr counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhikrCounter {
    /// Counter id
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Name
    pub name: String,
    /// Name in Arabic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_arabic: Option<String>,
    /// Current count
    pub count: u32,
    /// Target count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_count: Option<u32>,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Period a dhikr goal covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPeriod {
    /// One day
    Daily,
    /// One week
    Weekly,
    /// One month
    Monthly,
}

/// Dhikr goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhikrGoal {
    /// Goal id
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Counter the goal tracks
    pub counter_id: String,
    /// Target count
    pub target_count: u32,
    /// Period
    pub period: GoalPeriod,
    /// Period start
    pub start_date: String,
    /// Period end
    pub end_date: String,
    /// Progress so far
    #[serde(default)]
    pub current_count: u32,
    /// Whether the target was reached
    #[serde(default)]
    pub completed: bool,
}

// =============================================================================
// Daily Content
// =============================================================================

/// Faith a piece of daily content belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaithType {
    /// Hinduism
    Hindu,
    /// Islam
    Muslim,
    /// Christianity
    Christian,
    /// Jainism
    Jain,
    /// Sikhism
    Sikh,
    /// Buddhism
    Buddhist,
}

impl FaithType {
    /// Wire name, as used in query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            FaithType::Hindu => "hindu",
            FaithType::Muslim => "muslim",
            FaithType::Christian => "christian",
            FaithType::Jain => "jain",
            FaithType::Sikh => "sikh",
            FaithType::Buddhist => "buddhist",
        }
    }
}

impl fmt::Display for FaithType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day's verse, audio, wisdom and image for a faith
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyContent {
    /// Content id
    pub id: String,
    /// Day the content is for (`YYYY-MM-DD`)
    pub date: String,
    /// Faith
    pub faith: FaithType,
    /// Verse of the day
    pub verse: ContentVerse,
    /// Recitation
    pub audio: AudioContent,
    /// Reflection
    pub wisdom: WisdomContent,
    /// Illustration
    pub image: ImageContent,
}

/// Scripture passage in daily content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentVerse {
    /// Passage text
    pub text: String,
    /// Scripture and reference
    pub source: String,
    /// Language code of the text
    pub language: String,
}

/// Audio recitation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioContent {
    /// Audio file URL
    pub url: String,
    /// Length in seconds
    pub duration: f64,
    /// Narration voice
    pub voice_profile: String,
}

/// Wisdom text with an optional ritual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WisdomContent {
    /// Heading
    pub title: String,
    /// Body text
    pub description: String,
    /// Suggested practice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ritual: Option<String>,
}

/// Image with alt text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Image URL
    pub url: String,
    /// Alt text
    pub alt: String,
}
