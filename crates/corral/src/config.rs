//! Pool and connection configuration.

use std::time::Duration;

use crate::error::PoolError;

/// Default number of connections in the pool.
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Environment variable holding the database URL.
pub const ENV_URL: &str = "DB_URL";
/// Environment variable holding the database user name.
pub const ENV_USER: &str = "DB_USER";
/// Environment variable holding the database password.
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
/// Environment variable overriding the pool size.
pub const ENV_POOL_SIZE: &str = "DB_POOL_SIZE";

/// Configuration for the connection pool.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future minor versions without breaking changes. Use the builder
/// pattern methods or [`Default::default()`] to construct instances.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Number of connections the pool opens at construction and keeps for
    /// its entire lifetime. The pool never grows or shrinks.
    pub size: u32,

    /// Deadline for [`Pool::acquire`] when the pool is exhausted.
    ///
    /// `None` (the default) blocks indefinitely until a connection is
    /// returned. Production deployments should set a deadline so callers
    /// are not stuck forever behind a leaked checkout.
    ///
    /// [`Pool::acquire`]: crate::Pool::acquire
    pub acquire_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
            acquire_timeout: None,
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of connections in the pool.
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Set the acquisition deadline.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Read the pool configuration from the environment.
    ///
    /// Honors [`ENV_POOL_SIZE`]; an absent or unparseable value falls back
    /// to [`DEFAULT_POOL_SIZE`].
    #[must_use]
    pub fn from_env() -> Self {
        let size = std::env::var(ENV_POOL_SIZE)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_POOL_SIZE);
        Self::new().size(size)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.size == 0 {
            return Err(PoolError::Configuration(
                "pool size must be greater than 0".into(),
            ));
        }
        if let Some(timeout) = self.acquire_timeout {
            if timeout.is_zero() {
                return Err(PoolError::Configuration(
                    "acquire_timeout must be non-zero; omit it to wait indefinitely".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Connection settings consumed by a [`Connect`] factory.
///
/// The pool itself never interprets these; they are plumbed through to
/// whatever driver the factory wraps.
///
/// [`Connect`]: crate::Connect
#[derive(Clone)]
#[non_exhaustive]
pub struct ConnectOptions {
    /// Database URL, e.g. `postgres://localhost:5432/flights`.
    pub url: String,
    /// User name for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

impl ConnectOptions {
    /// Create connection options for the given URL with empty credentials.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: String::new(),
            password: String::new(),
        }
    }

    /// Set the user name.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Read connection options from the environment.
    ///
    /// Returns `None` if [`ENV_URL`] is unset; [`ENV_USER`] and
    /// [`ENV_PASSWORD`] default to empty strings.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = std::env::var(ENV_URL).ok()?;
        let username = std::env::var(ENV_USER).unwrap_or_default();
        let password = std::env::var(ENV_PASSWORD).unwrap_or_default();
        Some(Self::new(url).username(username).password(password))
    }
}

// Credentials must not leak into logs.
impl std::fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
