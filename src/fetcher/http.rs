use crate::fetcher::{Fetch, FetchOptions, FetchOutcome};
use crate::FetchError;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::LOCATION;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::{Duration, Instant};
use url::Url;

/// Upper bound on connection establishment, never above the total timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client for the given fetch options
///
/// Redirects are disabled at the client level and followed by [`HttpFetcher`],
/// which lets it count hops. The user agent is installed as a default header,
/// so it is sent on the initial request and on every followed redirect.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use url_harvest::fetcher::{build_http_client, FetchOptions};
///
/// let options = FetchOptions {
///     timeout: Duration::from_secs(30),
///     max_redirects: 10,
///     max_content_bytes: 10 * 1024 * 1024,
///     user_agent: "URL-Fetch-Service/1.0".to_string(),
/// };
///
/// let client = build_http_client(&options).unwrap();
/// ```
pub fn build_http_client(options: &FetchOptions) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(options.user_agent.clone())
        .timeout(options.timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(options.timeout))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// What a fetch learned before it finished or failed
#[derive(Debug, Default)]
struct Progress {
    redirect_count: u32,
    status_code: Option<u16>,
    final_url: Option<String>,
}

/// Fetch executor backed by a real HTTP client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    options: FetchOptions,
}

impl HttpFetcher {
    pub fn new(options: FetchOptions) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&options)?;
        Ok(Self { client, options })
    }

    /// Sends the GET and follows redirects, recording progress as it goes
    ///
    /// # Request Flow
    ///
    /// 1. Parse the URL; only http and https are fetched
    /// 2. Send GET
    /// 3. On 301/302/303/307/308 with a Location header, follow it
    ///    - At most `max_redirects` hops; the next redirect fails the fetch
    ///    - A redirect without Location is treated as the final response
    /// 4. Read the body through the size cap
    async fn follow(&self, url: &str, progress: &mut Progress) -> Result<String, FetchError> {
        let mut current = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !matches!(current.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                current.scheme()
            )));
        }

        loop {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(FetchError::from_transport)?;

            progress.status_code = Some(response.status().as_u16());
            progress.final_url = Some(response.url().to_string());

            match redirect_target(&response) {
                Some(next) => {
                    if progress.redirect_count >= self.options.max_redirects {
                        return Err(FetchError::RedirectLimit {
                            max: self.options.max_redirects,
                        });
                    }
                    progress.redirect_count += 1;
                    tracing::trace!("Redirect {} from {} to {}", progress.redirect_count, current, next);
                    current = next;
                }
                None => return read_capped(response, self.options.max_content_bytes).await,
            }
        }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let started = Instant::now();

        if url.trim().is_empty() {
            return FetchOutcome::failure(FetchError::EmptyUrl, started.elapsed());
        }

        let mut progress = Progress::default();
        let bounded = tokio::time::timeout(self.options.timeout, self.follow(url, &mut progress)).await;
        let body = bounded.unwrap_or(Err(FetchError::Timeout));
        let duration = started.elapsed();

        match &body {
            Ok(content) => tracing::debug!(
                "Successfully fetched {} (status: {:?}, size: {} bytes, redirects: {}, duration: {:?})",
                url,
                progress.status_code,
                content.len(),
                progress.redirect_count,
                duration
            ),
            Err(e) => tracing::debug!("Failed to fetch {}: {}", url, e),
        }

        FetchOutcome {
            body,
            status_code: progress.status_code,
            redirect_count: progress.redirect_count,
            final_url: progress.final_url,
            duration,
            fetched_at: Utc::now(),
        }
    }
}

/// Returns where a redirect response points, resolved against its URL
fn redirect_target(response: &Response) -> Option<Url> {
    let is_redirect = matches!(
        response.status(),
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    );
    if !is_redirect {
        return None;
    }

    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    response.url().join(location).ok()
}

/// Reads a response body, failing once `limit` bytes have been read
async fn read_capped(mut response: Response, limit: u64) -> Result<String, FetchError> {
    let mut body: Vec<u8> = Vec::new();

    while let Some(chunk) = response.chunk().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::BodyRead(e.to_string())
        }
    })? {
        let remaining = usize::try_from(limit.saturating_sub(body.len() as u64)).unwrap_or(usize::MAX);
        body.extend_from_slice(&chunk[..chunk.len().min(remaining)]);

        if body.len() as u64 >= limit {
            return Err(FetchError::BodyTooLarge { limit });
        }
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
