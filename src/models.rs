use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog record as returned by the backend. Timestamps stay strings on the
/// wire: the backend emits naive `isoformat()` datetimes without an offset,
/// so they are parsed lazily where a comparison is actually needed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub pages: Option<i64>,
    pub published_year: Option<i64>,
    pub is_available: bool,
    #[serde(default)]
    pub borrowed_until: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Book {
    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.borrowed_until.as_deref().and_then(parse_server_datetime)
    }

    /// A lapsed due date marks the book overdue. Display-only; the server
    /// flag is never corrected by a write-back.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date() {
            Some(due) => due < now,
            None => false,
        }
    }

    /// Derived flag recomputed at every render site: the server may still
    /// report a book as borrowed after its due date has lapsed.
    pub fn actually_available(&self, now: DateTime<Utc>) -> bool {
        self.is_available || self.is_overdue(now)
    }

    pub fn status_label(&self, now: DateTime<Utc>) -> String {
        if self.actually_available(now) {
            return "利用可能".to_string();
        }
        match self.due_date() {
            Some(due) => format!("貸出中 (返却予定: {})", due.format("%Y/%m/%d")),
            None => "貸出中".to_string(),
        }
    }
}

/// Create/update request body. Blank optional fields are omitted entirely
/// rather than sent as null.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: User,
}

fn parse_server_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(value.with_timezone(&Utc));
    }
    // Naive timestamps from the backend are in UTC.
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|value| value.and_utc())
}
