//! Configuration for the image cache.
//!
//! Values come either from a `serde` source (a config file section) or from
//! `IMAGE_*` environment variables. Mode names are matched exactly; an
//! unknown name falls back to the mode's default rather than failing, so a
//! typo in a deployment degrades to the standard setup instead of refusing
//! to start. Numbers that do not parse are reported as [`ConfigError`].
//!
//! | Variable              | Field                 | Default        |
//! |-----------------------|-----------------------|----------------|
//! | `IMAGE_CACHE_MODE`    | `caching_mode`        | `LFU`          |
//! | `IMAGE_CACHE_SIZE`    | `cache_size`          | 10 MiB         |
//! | `IMAGE_STORAGE_MODE`  | `storage_mode`        | `Drive`        |
//! | `IMAGE_STORAGE_RULE`  | `storage_rule`        | `All`          |
//! | `IMAGE_WORKING_DIR`   | `working_dir`         | `images`       |
//! | `IMAGE_MAX_ON_DRIVE`  | `max_images_on_drive` | 10             |

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::image::StoreImage;
use crate::rules;
use crate::store::limited::DEFAULT_MAX_FILES_ON_DRIVE;

/// Default cache budget in bytes.
pub const DEFAULT_CACHE_SIZE: u64 = 10 * 1024 * 1024;

/// Default directory for the disk tier.
pub const DEFAULT_WORKING_DIR: &str = "images";

pub const ENV_CACHE_MODE: &str = "IMAGE_CACHE_MODE";
pub const ENV_CACHE_SIZE: &str = "IMAGE_CACHE_SIZE";
pub const ENV_STORAGE_MODE: &str = "IMAGE_STORAGE_MODE";
pub const ENV_STORAGE_RULE: &str = "IMAGE_STORAGE_RULE";
pub const ENV_WORKING_DIR: &str = "IMAGE_WORKING_DIR";
pub const ENV_MAX_ON_DRIVE: &str = "IMAGE_MAX_ON_DRIVE";

/// Every variable [`CacheConfig::from_env`] reads.
pub const ENV_KEYS: [&str; 6] = [
    ENV_CACHE_MODE,
    ENV_CACHE_SIZE,
    ENV_STORAGE_MODE,
    ENV_STORAGE_RULE,
    ENV_WORKING_DIR,
    ENV_MAX_ON_DRIVE,
];

/// Implements name lookup with default fallback, `Display` and the string
/// conversions serde uses for a mode enum.
macro_rules! named_mode {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every mode, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Configuration name of this mode.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }

            /// Looks up a mode by exact name, falling back to the default.
            pub fn from_name(name: &str) -> Self {
                match name {
                    $($name => $ty::$variant,)+
                    other => {
                        let fallback = $ty::default();
                        warn!(
                            "Unknown {} {:?}, using {}",
                            stringify!($ty),
                            other,
                            fallback.as_str()
                        );
                        fallback
                    },
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<String> for $ty {
            fn from(name: String) -> Self {
                $ty::from_name(&name)
            }
        }

        impl From<$ty> for String {
            fn from(mode: $ty) -> Self {
                mode.as_str().to_owned()
            }
        }
    };
}

/// Which eviction policy the image cache uses, or none at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CachingMode {
    Fifo,
    Lifo,
    Rr,
    #[default]
    Lfu,
    Lru,
    Mru,
    /// Caching disabled; every request goes to storage.
    None,
}

named_mode!(CachingMode {
    Fifo => "FIFO",
    Lifo => "LIFO",
    Rr => "RR",
    Lfu => "LFU",
    Lru => "LRU",
    Mru => "MRU",
    None => "Disabled",
});

/// Which disk tier backs the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageMode {
    #[default]
    Drive,
    /// At most `max_images_on_drive` files.
    DriveLimited,
}

named_mode!(StorageMode {
    Drive => "Drive",
    DriveLimited => "Drive-Limited",
});

/// Which images are written to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageRule {
    #[default]
    All,
    FullSizeImg,
}

named_mode!(StorageRule {
    All => "All",
    FullSizeImg => "Full-size-images",
});

impl StorageRule {
    /// Evaluates the rule for `image`.
    pub fn accepts(&self, image: &StoreImage) -> bool {
        match self {
            StorageRule::All => rules::store_all(image),
            StorageRule::FullSizeImg => rules::store_full_size_images(image),
        }
    }
}

/// Settings for [`build_image_cache`](crate::builder::build_image_cache).
///
/// # Example
///
/// ```
/// use tiercache::config::{CacheConfig, CachingMode, StorageMode};
///
/// let config = CacheConfig::from_vars([
///     ("IMAGE_CACHE_MODE", "LRU"),
///     ("IMAGE_CACHE_SIZE", "2048"),
///     ("IMAGE_STORAGE_MODE", "Drive-Limited"),
/// ])
/// .unwrap();
///
/// assert_eq!(config.caching_mode, CachingMode::Lru);
/// assert_eq!(config.cache_size, 2048);
/// assert_eq!(config.storage_mode, StorageMode::DriveLimited);
/// assert_eq!(config.max_images_on_drive, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub caching_mode: CachingMode,
    /// Cache budget in bytes.
    pub cache_size: u64,
    pub storage_mode: StorageMode,
    pub storage_rule: StorageRule,
    pub working_dir: PathBuf,
    /// Slot count for [`StorageMode::DriveLimited`].
    pub max_images_on_drive: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            caching_mode: CachingMode::default(),
            cache_size: DEFAULT_CACHE_SIZE,
            storage_mode: StorageMode::default(),
            storage_rule: StorageRule::default(),
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            max_images_on_drive: DEFAULT_MAX_FILES_ON_DRIVE,
        }
    }
}

impl CacheConfig {
    /// Builds a config from `(key, value)` pairs, ignoring unrelated keys.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key {
                ENV_CACHE_MODE => config.caching_mode = CachingMode::from_name(value),
                ENV_CACHE_SIZE => config.cache_size = parse_positive(key, value)?,
                ENV_STORAGE_MODE => config.storage_mode = StorageMode::from_name(value),
                ENV_STORAGE_RULE => config.storage_rule = StorageRule::from_name(value),
                ENV_WORKING_DIR => {
                    if value.is_empty() {
                        return Err(ConfigError::new(key, "path is empty"));
                    }
                    config.working_dir = PathBuf::from(value);
                },
                ENV_MAX_ON_DRIVE => config.max_images_on_drive = parse_positive(key, value)?,
                _ => {},
            }
        }
        Ok(config)
    }

    /// Reads the `IMAGE_*` variables of the current process.
    ///
    /// Other variables are never looked at. A value that is not valid UTF-8
    /// is reported as a [`ConfigError`] for its key.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Result<Self, ConfigError> {
        let mut vars = Vec::with_capacity(ENV_KEYS.len());
        for key in ENV_KEYS {
            let Some(raw) = lookup(key) else {
                continue;
            };
            let value = raw
                .into_string()
                .map_err(|raw| ConfigError::new(key, format!("{raw:?} is not valid UTF-8")))?;
            vars.push((key, value));
        }
        Self::from_vars(vars)
    }

    /// Checks the numeric fields, which `serde` input does not constrain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_size == 0 {
            return Err(ConfigError::new(ENV_CACHE_SIZE, "must be positive"));
        }
        if self.max_images_on_drive == 0 {
            return Err(ConfigError::new(ENV_MAX_ON_DRIVE, "must be positive"));
        }
        Ok(())
    }
}

impl fmt::Display for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "caching mode {}, cache size {} bytes, storage mode {}, storage rule {}, working dir {}",
            self.caching_mode,
            self.cache_size,
            self.storage_mode,
            self.storage_rule,
            self.working_dir.display()
        )?;
        if self.storage_mode == StorageMode::DriveLimited {
            write!(f, ", max {} images on drive", self.max_images_on_drive)?;
        }
        Ok(())
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::new(key, "must be positive")),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::new(key, format!("{value:?} is not a number: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageSize;

    mod mode_names {
        use super::*;

        #[test]
        fn names_round_trip() {
            for mode in CachingMode::ALL {
                assert_eq!(CachingMode::from_name(mode.as_str()), *mode);
            }
            for mode in StorageMode::ALL {
                assert_eq!(StorageMode::from_name(mode.as_str()), *mode);
            }
            for rule in StorageRule::ALL {
                assert_eq!(StorageRule::from_name(rule.as_str()), *rule);
            }
        }

        #[test]
        fn unknown_names_fall_back_to_default() {
            assert_eq!(CachingMode::from_name("lru"), CachingMode::Lfu);
            assert_eq!(CachingMode::from_name(""), CachingMode::Lfu);
            assert_eq!(StorageMode::from_name("Tape"), StorageMode::Drive);
            assert_eq!(StorageRule::from_name("Some"), StorageRule::All);
        }

        #[test]
        fn disabled_is_none() {
            assert_eq!(CachingMode::from_name("Disabled"), CachingMode::None);
            assert_eq!(CachingMode::None.to_string(), "Disabled");
        }

        #[test]
        fn storage_rule_accepts() {
            let icon = StoreImage::new(1, vec![0], ImageSize::ICON);
            assert!(StorageRule::All.accepts(&icon));
            assert!(!StorageRule::FullSizeImg.accepts(&icon));
        }
    }

    mod from_vars {
        use super::*;

        #[test]
        fn empty_input_gives_defaults() {
            let config = CacheConfig::from_vars(Vec::<(String, String)>::new()).unwrap();
            assert_eq!(config, CacheConfig::default());
            assert_eq!(config.cache_size, 10 * 1024 * 1024);
            assert_eq!(config.working_dir, PathBuf::from("images"));
        }

        #[test]
        fn reads_every_key() {
            let config = CacheConfig::from_vars([
                ("IMAGE_CACHE_MODE", "MRU"),
                ("IMAGE_CACHE_SIZE", " 4096 "),
                ("IMAGE_STORAGE_MODE", "Drive-Limited"),
                ("IMAGE_STORAGE_RULE", "Full-size-images"),
                ("IMAGE_WORKING_DIR", "/var/cache/img"),
                ("IMAGE_MAX_ON_DRIVE", "3"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap();
            assert_eq!(config.caching_mode, CachingMode::Mru);
            assert_eq!(config.cache_size, 4096);
            assert_eq!(config.storage_mode, StorageMode::DriveLimited);
            assert_eq!(config.storage_rule, StorageRule::FullSizeImg);
            assert_eq!(config.working_dir, PathBuf::from("/var/cache/img"));
            assert_eq!(config.max_images_on_drive, 3);
        }

        #[test]
        fn bad_numbers_name_the_key() {
            let err = CacheConfig::from_vars([("IMAGE_MAX_ON_DRIVE", "ten")]).unwrap_err();
            assert_eq!(err.key(), "IMAGE_MAX_ON_DRIVE");

            let err = CacheConfig::from_vars([("IMAGE_CACHE_SIZE", "0")]).unwrap_err();
            assert_eq!(err.key(), "IMAGE_CACHE_SIZE");

            let err = CacheConfig::from_vars([("IMAGE_CACHE_SIZE", "-5")]).unwrap_err();
            assert!(err.message().contains("not a number"));
        }

        #[test]
        fn empty_working_dir_is_rejected() {
            assert!(CacheConfig::from_vars([("IMAGE_WORKING_DIR", "  ")]).is_err());
        }
    }

    mod from_env {
        use super::*;

        #[cfg(unix)]
        fn non_utf8() -> OsString {
            use std::os::unix::ffi::OsStringExt;
            OsString::from_vec(b"f\xffo".to_vec())
        }

        #[test]
        fn reads_only_known_keys() {
            let seen = std::cell::RefCell::new(Vec::new());
            let config = CacheConfig::from_lookup(|key| {
                seen.borrow_mut().push(key.to_owned());
                match key {
                    ENV_CACHE_MODE => Some("FIFO".into()),
                    ENV_MAX_ON_DRIVE => Some("4".into()),
                    _ => None,
                }
            })
            .unwrap();
            assert_eq!(*seen.borrow(), ENV_KEYS);
            assert_eq!(config.caching_mode, CachingMode::Fifo);
            assert_eq!(config.max_images_on_drive, 4);
            assert_eq!(config.cache_size, DEFAULT_CACHE_SIZE);
        }

        #[cfg(unix)]
        #[test]
        fn non_utf8_value_is_a_config_error() {
            let err = CacheConfig::from_lookup(|key| (key == ENV_WORKING_DIR).then(non_utf8))
                .unwrap_err();
            assert_eq!(err.key(), ENV_WORKING_DIR);
            assert!(err.message().contains("UTF-8"));
        }

        #[cfg(unix)]
        #[test]
        fn unrelated_non_utf8_variable_is_ignored() {
            std::env::set_var("TIERCACHE_TEST_BINARY_VAR", non_utf8());
            let result = std::panic::catch_unwind(CacheConfig::from_env);
            std::env::remove_var("TIERCACHE_TEST_BINARY_VAR");

            assert!(matches!(result, Ok(Ok(_))));
        }
    }

    mod serde_support {
        use super::*;

        #[test]
        fn missing_fields_take_defaults() {
            let config: CacheConfig =
                serde_json::from_str(r#"{ "caching_mode": "RR", "cache_size": 512 }"#).unwrap();
            assert_eq!(config.caching_mode, CachingMode::Rr);
            assert_eq!(config.cache_size, 512);
            assert_eq!(config.storage_mode, StorageMode::Drive);
        }

        #[test]
        fn unknown_mode_string_falls_back() {
            let config: CacheConfig =
                serde_json::from_str(r#"{ "caching_mode": "ARC" }"#).unwrap();
            assert_eq!(config.caching_mode, CachingMode::Lfu);
        }

        #[test]
        fn serializes_mode_names() {
            let json = serde_json::to_value(CacheConfig::default()).unwrap();
            assert_eq!(json["caching_mode"], "LFU");
            assert_eq!(json["storage_rule"], "All");
        }

        #[test]
        fn validate_catches_zero_sizes() {
            let config: CacheConfig = serde_json::from_str(r#"{ "cache_size": 0 }"#).unwrap();
            assert!(config.validate().is_err());
            assert!(CacheConfig::default().validate().is_ok());
        }
    }

    #[test]
    fn display_mentions_limit_only_for_limited_drive() {
        let mut config = CacheConfig::default();
        assert!(!config.to_string().contains("images on drive"));
        config.storage_mode = StorageMode::DriveLimited;
        assert!(config.to_string().contains("max 10 images on drive"));
    }
}
