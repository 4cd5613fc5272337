//! Profile popup state
//!
//! Tracks which tab is shown and the extra data fetched while the popup is
//! open. Fetch failures are logged and leave the previous data in place.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::api::{ApiError, Credentials, HistoryRecord, ProfileApi, UserIdentity, UserProfile};

/// `Oct 19, 2026, 07:42 PM`
pub const TIMESTAMP_FORMAT: &str = "%b %-d, %Y, %I:%M %p";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileTab {
    #[default]
    Profile,
    History,
}

impl ProfileTab {
    pub fn title(&self) -> &'static str {
        match self {
            ProfileTab::Profile => "Account Details",
            ProfileTab::History => "History",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfilePanel {
    open: bool,
    tab: ProfileTab,
    profile: Option<UserProfile>,
    history: Vec<HistoryRecord>,
}

impl ProfilePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close the popup. Fetched data is kept for the next opening.
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn select(&mut self, tab: ProfileTab) {
        self.tab = tab;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn tab(&self) -> ProfileTab {
        self.tab
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn created_at(&self) -> Option<&str> {
        self.profile.as_ref()?.created_at.as_deref()
    }

    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    /// Profile fields are fetched whenever the popup is open
    pub fn wants_profile(&self) -> bool {
        self.open
    }

    /// History is fetched only while its tab is shown
    pub fn wants_history(&self) -> bool {
        self.open && self.tab == ProfileTab::History
    }

    pub fn apply_profile(&mut self, outcome: Result<UserProfile, ApiError>) {
        match outcome {
            Ok(profile) => self.profile = Some(profile),
            Err(e) => tracing::error!("Error fetching user data: {}", e),
        }
    }

    pub fn apply_history(&mut self, outcome: Result<Vec<HistoryRecord>, ApiError>) {
        match outcome {
            Ok(history) => self.history = history,
            Err(e) => tracing::error!("Error fetching review expressions: {}", e),
        }
    }

    /// Fetch whatever the current open/tab state calls for
    pub async fn refresh<A: ProfileApi + ?Sized>(&mut self, api: &A, credentials: &Credentials) {
        if self.wants_profile() {
            let outcome = api.profile(credentials).await;
            self.apply_profile(outcome);
        }
        if self.wants_history() {
            let outcome = api.history(credentials).await;
            self.apply_history(outcome);
        }
    }
}

/// Name shown in the popup header
pub fn display_name(user: Option<&UserIdentity>) -> &str {
    match user {
        Some(user) if !user.name.is_empty() => &user.name,
        _ => "User",
    }
}

/// Avatar letter: first letter of the name, else of the email, else `U`
pub fn avatar_initial(user: Option<&UserIdentity>) -> char {
    user.and_then(|u| u.name.chars().next().or_else(|| u.email.chars().next()))
        .unwrap_or('U')
}

/// Render a backend timestamp in local time
pub fn format_timestamp(raw: &str) -> String {
    format_timestamp_in(raw, &Local)
}

/// Render a backend timestamp in `tz`
///
/// Accepts RFC 3339 and naive ISO 8601 (taken as UTC). Anything else is
/// returned as is.
pub fn format_timestamp_in<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()));

    match parsed {
        Ok(utc) => utc.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}
