use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are not applied here; see [`load_effective_config`].
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use url_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Fetch timeout: {}s", config.fetch.timeout_secs);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so operators can tell which configuration a process runs with.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Resolves the configuration the process will actually run with
///
/// Starts from the file at `path` (or the built-in defaults when no path is
/// given), layers the process environment on top, and validates the result.
/// The returned hash is `None` when no file was used.
pub fn load_effective_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;

    Ok((config, hash))
}

/// Applies environment-style overrides to a configuration
///
/// `lookup` maps a variable name to its value. Empty values are ignored, and a
/// value that fails to parse is logged and leaves the field unchanged.
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(address) = get("SERVER_ADDRESS") {
        config.server.address = normalize_address(&address);
    }

    override_secs(&get, "FETCH_TIMEOUT", &mut config.fetch.timeout_secs);
    override_parsed(&get, "MAX_REDIRECTS", &mut config.fetch.max_redirects);
    override_parsed(&get, "MAX_CONTENT_SIZE", &mut config.fetch.max_content_size);
    override_parsed(
        &get,
        "MAX_CONCURRENT_FETCHES",
        &mut config.fetch.max_concurrent_fetches,
    );

    override_parsed(&get, "RATE_LIMIT_REQUESTS", &mut config.rate_limit.requests);
    override_secs(&get, "RATE_LIMIT_WINDOW", &mut config.rate_limit.window_secs);
    override_parsed(&get, "RATE_LIMIT_BURST", &mut config.rate_limit.burst);

    override_secs(&get, "RESULT_TTL", &mut config.retention.ttl_secs);
    override_secs(
        &get,
        "CLEANUP_INTERVAL",
        &mut config.retention.cleanup_interval_secs,
    );
    override_parsed(
        &get,
        "MAX_RESULTS_IN_MEMORY",
        &mut config.retention.max_results,
    );
}

fn override_parsed<T, G>(get: &G, key: &str, field: &mut T)
where
    T: FromStr + std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *field = value,
            Err(_) => tracing::warn!(
                "Invalid value for {}: {}, using {}",
                key,
                raw,
                field
            ),
        }
    }
}

fn override_secs<G>(get: &G, key: &str, field: &mut u64)
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(key) {
        match parse_duration(&raw) {
            // Sub-second remainders round up so "500ms" never collapses to zero
            Some(d) => *field = d.as_secs() + u64::from(d.subsec_nanos() > 0),
            None => tracing::warn!(
                "Invalid duration for {}: {}, using {}s",
                key,
                raw,
                field
            ),
        }
    }
}

/// An address given as ":8080" binds every interface
fn normalize_address(address: &str) -> String {
    let address = address.trim();
    match address.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => address.to_string(),
    }
}

/// Parses a duration such as `500ms`, `30s`, `10m`, `1h`, or bare seconds
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);
    let value: u64 = number.parse().ok()?;

    match unit.trim() {
        "" | "s" => Some(Duration::from_secs(value)),
        "ms" => Some(Duration::from_millis(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        "h" => value.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}

/// Formats a duration the way [`parse_duration`] reads it back
///
/// Used for human-facing values such as the rate-limit window header.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if duration.subsec_nanos() != 0 {
        format!("{}ms", duration.as_millis())
    } else if secs != 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs != 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
