// ==============================================
// CONFIGURED IMAGE CACHE TESTS (integration)
// ==============================================
//
// Builds the image cache from configuration variables and drives it the way
// the image provider does: resolve an id, load it, and generate plus save on
// a miss.

use std::path::Path;
use std::sync::Arc;

use tiercache::builder::{build_image_cache, ImageCache, StorageTier};
use tiercache::config::{CacheConfig, CachingMode, StorageMode, StorageRule};
use tiercache::error::CacheError;
use tiercache::image::{ImageDb, ImageKey, ImageSize, StoreImage};
use tiercache::store::DataStorage;
use tiercache::traits::{Cachable, DataCache};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(dir: &Path, vars: &[(&str, &str)]) -> CacheConfig {
    let dir = dir.to_string_lossy().into_owned();
    let mut all = vec![("IMAGE_WORKING_DIR", dir.as_str())];
    all.extend_from_slice(vars);
    CacheConfig::from_vars(all).unwrap()
}

/// Minimal stand-in for the image provider.
struct Provider {
    cache: ImageCache,
    db: Arc<ImageDb>,
    next_id: u64,
}

impl Provider {
    fn new(config: &CacheConfig) -> Self {
        let db = Arc::new(ImageDb::new());
        let cache = build_image_cache(config, Arc::clone(&db)).unwrap();
        Self {
            cache,
            db,
            next_id: 1,
        }
    }

    /// Returns the image and whether it had to be generated.
    fn get(&mut self, key: ImageKey, size: ImageSize) -> (StoreImage, bool) {
        if let Some(id) = self.db.image_id(&key, size) {
            if let Some(found) = self.cache.load_data(id) {
                return (found, false);
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        let len = size.pixel_count() as usize / 100;
        let image = StoreImage::new(id, vec![(id % 251) as u8; len], size);
        self.db.set_image_mapping(key, id, size);
        assert!(self.cache.save_data(&image));
        (image, true)
    }
}

mod provider_flow {
    use super::*;

    #[test]
    fn second_request_is_served_from_cache() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let mut provider = Provider::new(&config(dir.path(), &[]));

        let (first, generated) = provider.get(ImageKey::Product(42), ImageSize::PREVIEW);
        assert!(generated);
        let (second, generated) = provider.get(ImageKey::Product(42), ImageSize::PREVIEW);
        assert!(!generated);
        assert_eq!(first.bytes(), second.bytes());
        assert_eq!(provider.cache.metrics().hits, 1);
    }

    #[test]
    fn evicted_image_comes_back_from_disk() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        // Room for one FULL image (900 bytes) at a time
        let mut provider = Provider::new(&config(dir.path(), &[("IMAGE_CACHE_SIZE", "1000")]));

        let (a, _) = provider.get(ImageKey::Product(1), ImageSize::FULL);
        let (_, _) = provider.get(ImageKey::Product(2), ImageSize::FULL);
        assert!(!provider.cache.data_is_in_cache(a.id()));

        let (again, generated) = provider.get(ImageKey::Product(1), ImageSize::FULL);
        assert!(!generated);
        assert_eq!(again.bytes(), a.bytes());
        assert_eq!(again.size(), ImageSize::FULL);
        assert!(provider.cache.data_is_in_cache(a.id()));
    }

    #[test]
    fn disabled_cache_still_persists() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let mut provider = Provider::new(&config(dir.path(), &[("IMAGE_CACHE_MODE", "Disabled")]));
        assert!(!provider.cache.is_enabled());

        let (image, _) = provider.get(ImageKey::from("logo"), ImageSize::LOGO);
        let (_, generated) = provider.get(ImageKey::from("logo"), ImageSize::LOGO);
        assert!(!generated);
        assert!(dir.path().join(image.id().to_string()).is_file());
    }

    #[test]
    fn full_size_rule_regenerates_scaled_images() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let mut provider = Provider::new(&config(
            dir.path(),
            &[
                ("IMAGE_STORAGE_RULE", "Full-size-images"),
                ("IMAGE_CACHE_SIZE", "920"),
            ],
        ));

        let (icon, _) = provider.get(ImageKey::Product(5), ImageSize::ICON);
        assert!(!provider.cache.storage().data_exists(icon.id()));
        let (full, _) = provider.get(ImageKey::Product(5), ImageSize::FULL);
        assert!(provider.cache.storage().data_exists(full.id()));

        // Icon (40 bytes) and full image (900 bytes) do not fit together
        assert!(!provider.cache.data_is_in_cache(icon.id()));
        let (_, generated) = provider.get(ImageKey::Product(5), ImageSize::ICON);
        assert!(generated);
    }
}

mod configuration {
    use super::*;

    #[test]
    fn limited_drive_from_vars() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(
            dir.path(),
            &[
                ("IMAGE_CACHE_MODE", "FIFO"),
                ("IMAGE_STORAGE_MODE", "Drive-Limited"),
                ("IMAGE_MAX_ON_DRIVE", "3"),
            ],
        );
        assert_eq!(cfg.caching_mode, CachingMode::Fifo);
        assert_eq!(cfg.storage_mode, StorageMode::DriveLimited);

        let cache = build_image_cache(&cfg, Arc::new(ImageDb::new())).unwrap();
        assert_eq!(cache.policy_name(), "FIFO");
        match cache.storage() {
            StorageTier::DriveLimited(s) => {
                assert_eq!(s.max_files_on_drive(), 3);
                assert_eq!(s.working_dir(), dir.path());
            },
            other => panic!("unexpected tier {other:?}"),
        }
    }

    #[test]
    fn unknown_names_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(
            dir.path(),
            &[
                ("IMAGE_CACHE_MODE", "ARC"),
                ("IMAGE_STORAGE_MODE", "Tape"),
                ("IMAGE_STORAGE_RULE", "Some"),
            ],
        );
        assert_eq!(cfg.caching_mode, CachingMode::Lfu);
        assert_eq!(cfg.storage_mode, StorageMode::Drive);
        assert_eq!(cfg.storage_rule, StorageRule::All);
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        let err = CacheConfig::from_vars([("IMAGE_CACHE_SIZE", "-5")]).unwrap_err();
        assert_eq!(err.key(), "IMAGE_CACHE_SIZE");

        let dir = tempfile::tempdir().unwrap();
        let cfg = CacheConfig {
            working_dir: dir.path().to_path_buf(),
            cache_size: 0,
            ..CacheConfig::default()
        };
        let err = build_image_cache(&cfg, Arc::new(ImageDb::new())).unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));
    }

    #[test]
    fn working_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let cfg = CacheConfig {
            working_dir: nested.clone(),
            ..CacheConfig::default()
        };
        build_image_cache(&cfg, Arc::new(ImageDb::new())).unwrap();
        assert!(nested.is_dir());
    }
}
