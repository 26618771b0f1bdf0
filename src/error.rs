//! Error types for the tiercache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned when a caller violates a precondition (zero
//!   budget, zero slot capacity, bad image size) or when a storage tier cannot
//!   be set up. Runtime storage I/O never surfaces here; it degrades to
//!   `false` / `None` results instead.
//! - [`ConfigError`]: Returned when a configuration value cannot be parsed and
//!   has no sensible default to fall back to.
//!
//! ## Example Usage
//!
//! ```
//! use tiercache::error::CacheError;
//! use tiercache::policy::FifoPolicy;
//! use tiercache::cache::BoundedCache;
//! use tiercache::image::StoreImage;
//! use tiercache::traits::DataCache;
//!
//! let cache: BoundedCache<StoreImage, FifoPolicy> = BoundedCache::new(1024).unwrap();
//!
//! // A zero budget is rejected without touching the cache
//! let err = cache.set_max_cache_size(0).unwrap_err();
//! assert!(matches!(err, CacheError::InvalidArgument(_)));
//! assert_eq!(cache.max_cache_size(), 1024);
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache and storage construction or configuration calls.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A required argument was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A storage tier could not be prepared on disk.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be turned into a cache.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CacheError {
    /// Creates an [`CacheError::InvalidArgument`] with the given description.
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when a configuration value is malformed.
///
/// Carries the offending key and a human-readable description.
///
/// # Example
///
/// ```
/// use tiercache::config::CacheConfig;
///
/// let err = CacheConfig::from_vars([("IMAGE_CACHE_SIZE", "lots")]).unwrap_err();
/// assert!(err.to_string().contains("IMAGE_CACHE_SIZE"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    key: String,
    message: String,
}

impl ConfigError {
    /// Creates a new `ConfigError` for `key`.
    #[inline]
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns the configuration key that failed.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- CacheError -------------------------------------------------------

    #[test]
    fn invalid_argument_display_shows_message() {
        let err = CacheError::invalid_argument("cache size must be positive");
        assert_eq!(
            err.to_string(),
            "invalid argument: cache size must be positive"
        );
    }

    #[test]
    fn io_display_includes_path() {
        let err = CacheError::Io {
            path: PathBuf::from("/nope/images"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/nope/images"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn io_exposes_source() {
        use std::error::Error as _;
        let err = CacheError::Io {
            path: PathBuf::from("x"),
            source: std::io::Error::other("boom"),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn config_error_converts_transparently() {
        let err: CacheError = ConfigError::new("IMAGE_CACHE_SIZE", "not a number").into();
        assert_eq!(
            err.to_string(),
            "invalid value for IMAGE_CACHE_SIZE: not a number"
        );
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_accessors() {
        let err = ConfigError::new("k", "m");
        assert_eq!(err.key(), "k");
        assert_eq!(err.message(), "m");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("k", "x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<CacheError>();
        assert_error::<ConfigError>();
    }
}
