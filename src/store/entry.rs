/// Entry definitions for tracking a URL from submission to completion
///
/// An entry is created pending and receives exactly one terminal write.
use crate::fetcher::FetchOutcome;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Durable identity of a stored entry
///
/// Ids are handed out in increasing order, so ordering by id is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(u64);

impl EntryId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// Submitted, fetch not yet finished
    Pending,

    /// A response was received and its body read within limits
    Success,

    /// The fetch failed; see the entry's `error`
    Failed,
}

impl FetchStatus {
    /// Returns true once the entry has received its single terminal write
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One URL's lifecycle record, serialized as a `FetchResult` on the wire
#[derive(Debug, Clone, Serialize)]
pub struct FetchEntry {
    #[serde(skip)]
    pub id: EntryId,

    pub url: String,

    pub status: FetchStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    pub content_length: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_duration"
    )]
    pub duration: Option<Duration>,

    #[serde(skip_serializing_if = "is_zero")]
    pub redirect_count: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
}

impl FetchEntry {
    /// Creates a pending entry
    pub fn pending(id: EntryId, url: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            url: url.into(),
            status: FetchStatus::Pending,
            content: None,
            content_length: 0,
            status_code: None,
            error: None,
            fetched_at: None,
            created_at,
            duration: None,
            redirect_count: 0,
            final_url: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FetchStatus::Pending
    }

    /// Age of the entry at `now`; entries stamped in the future count as new
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Writes the terminal outcome into this entry
    ///
    /// Identity fields (`id`, `url`, `created_at`) are never touched.
    pub(crate) fn apply(&mut self, outcome: FetchOutcome) {
        self.status_code = outcome.status_code;
        self.redirect_count = outcome.redirect_count;
        self.final_url = outcome.final_url;
        self.duration = Some(outcome.duration);
        self.fetched_at = Some(outcome.fetched_at);

        match outcome.body {
            Ok(body) => {
                self.status = FetchStatus::Success;
                self.content_length = body.len();
                self.content = Some(body);
                self.error = None;
            }
            Err(err) => {
                self.status = FetchStatus::Failed;
                self.content_length = 0;
                self.content = None;
                self.error = Some(err.to_string());
            }
        }
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn serialize_duration<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match duration {
        Some(d) => serializer.serialize_str(&format!("{:?}", d)),
        None => serializer.serialize_none(),
    }
}
