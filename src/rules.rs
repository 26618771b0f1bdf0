//! Admission and storage predicates.
//!
//! Caches and stores take any `Fn(&T) -> bool`; these are the ones the image
//! service ships with.

use crate::image::{ImageSize, StoreImage};

/// Caching rule accepting every item.
#[inline]
pub fn cache_all<T>(_item: &T) -> bool {
    true
}

/// Storage rule accepting every item.
#[inline]
pub fn store_all<T>(_item: &T) -> bool {
    true
}

/// Storage rule accepting only full-size images.
///
/// Scaled variants are cheap to regenerate from the full-size original, so
/// only the original goes to disk.
#[inline]
pub fn store_full_size_images(image: &StoreImage) -> bool {
    image.size() == ImageSize::FULL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_all_rules() {
        assert!(cache_all(&1u8));
        assert!(store_all(&"anything"));
    }

    #[test]
    fn full_size_rule_checks_size_only() {
        let full = StoreImage::new(1, vec![0; 4], ImageSize::FULL);
        let icon = StoreImage::new(2, vec![0; 4], ImageSize::ICON);
        let same_dims = StoreImage::new(3, vec![], ImageSize::new(300, 300).unwrap());
        assert!(store_full_size_images(&full));
        assert!(!store_full_size_images(&icon));
        assert!(store_full_size_images(&same_dims));
    }
}
