use crate::FetchError;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Result of a single fetch, success or failure
///
/// Whatever was learned before a failure (status code, redirect count, final
/// URL) is kept alongside the error.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Body text on success, the failure reason otherwise
    pub body: Result<String, FetchError>,

    /// Status of the last response received, if any
    pub status_code: Option<u16>,

    /// Redirect hops followed
    pub redirect_count: u32,

    /// URL of the last response received, after redirects
    pub final_url: Option<String>,

    /// Time spent on the fetch
    pub duration: Duration,

    /// When the fetch finished
    pub fetched_at: DateTime<Utc>,
}

impl FetchOutcome {
    pub fn success(
        status_code: u16,
        body: impl Into<String>,
        final_url: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            body: Ok(body.into()),
            status_code: Some(status_code),
            redirect_count: 0,
            final_url: Some(final_url.into()),
            duration,
            fetched_at: Utc::now(),
        }
    }

    pub fn failure(error: FetchError, duration: Duration) -> Self {
        Self {
            body: Err(error),
            status_code: None,
            redirect_count: 0,
            final_url: None,
            duration,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_redirects(mut self, redirect_count: u32) -> Self {
        self.redirect_count = redirect_count;
        self
    }

    pub fn is_success(&self) -> bool {
        self.body.is_ok()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.body.as_ref().err()
    }
}
