//! Handler configuration.
//!
//! `HandlerConfig` controls how a [`ResponseHandler`](crate::net::ResponseHandler) treats the
//! responses it is given: which content types are trusted, how large each body chunk is, and
//! whether the body is also kept in memory.
//!
//! `HandlerConfig` provides sensible defaults via [`Default`] and a fluent
//! [`HandlerConfig::builder()`] for customization with validation.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use gosub_net::config::{HandlerConfig, DEFAULT_BUFFER_SIZE};
//! let cfg = HandlerConfig::default();
//! assert_eq!(cfg.buffer_size, DEFAULT_BUFFER_SIZE);
//! assert!(cfg.allowed_content_types.is_none());
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use gosub_net::config::HandlerConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = HandlerConfig::builder()
//!     .allowed_content_types(["image/.*", "application/octet-stream"])
//!     .buffer_size(64 * 1024)
//!     .collect_body(true)
//!     .build()?; // returns Result<HandlerConfig, ConfigError>
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `allowed_content_types`: Optional list of regular expressions. A response is accepted when
//!   its `Content-Type` fully matches one of them. `None` accepts every content type.
//! - `buffer_size`: Size in bytes of a single body chunk (default: 1 MiB).
//! - `collect_body`: Keep the received bytes and hand them back on success/failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default chunk size (1 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Largest chunk size accepted by the builder (64 MiB)
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub allowed_content_types: Option<Vec<String>>,
    pub buffer_size: usize,
    pub collect_body: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            allowed_content_types: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            collect_body: false,
        }
    }
}

impl HandlerConfig {
    pub fn builder() -> HandlerConfigBuilder {
        HandlerConfigBuilder::default()
    }

    /// Validates a config that did not come from the builder (ie: deserialized from disk).
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(self)
    }
}

/// Builder for [`HandlerConfig`].
#[derive(Debug, Clone, Default)]
pub struct HandlerConfigBuilder {
    inner: HandlerConfig,
}

impl HandlerConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut HandlerConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn allowed_content_types<I, S>(self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns.into_iter().map(Into::into).collect();
        self.map(|c| c.allowed_content_types = Some(patterns))
    }
    pub fn allow_all_content_types(self) -> Self { self.map(|c| c.allowed_content_types = None) }
    pub fn buffer_size(self, size: usize) -> Self { self.map(|c| c.buffer_size = size) }
    pub fn collect_body(self, on: bool) -> Self { self.map(|c| c.collect_body = on) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut HandlerConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<HandlerConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroBufferSize,
    BufferTooLarge { size: usize, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroBufferSize => write!(f, "buffer_size must be at least 1"),
            ConfigError::BufferTooLarge { size, max } => {
                write!(f, "buffer_size {size} is larger than the maximum of {max}")
            }
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate(c: &HandlerConfig) -> Result<(), ConfigError> {
    if c.buffer_size == 0 {
        return Err(ConfigError::ZeroBufferSize);
    }
    if c.buffer_size > MAX_BUFFER_SIZE {
        return Err(ConfigError::BufferTooLarge {
            size: c.buffer_size,
            max: MAX_BUFFER_SIZE,
        });
    }
    Ok(())
}
