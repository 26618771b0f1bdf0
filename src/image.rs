//! Image items and the directory that names them.
//!
//! The cache itself only knows numeric ids. This module supplies the concrete
//! item the image service caches and the lookup tables that turn a product
//! or web-UI asset plus a target size into such an id.
//!
//! ```text
//!   ImageKey::Product(42) ─┐
//!                          ├─► ImageDb ──► image id ──► Cache::load_data(id)
//!   ImageSize::ICON ───────┘        │
//!                                   └──► image_size(id) ──► ImageCodec::decode
//! ```

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::CacheError;
use crate::store::traits::ItemCodec;
use crate::traits::Cachable;

// ---------------------------------------------------------------------------
// ImageSize
// ---------------------------------------------------------------------------

/// Width and height of an image in pixels, both non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    width: u32,
    height: u32,
}

impl ImageSize {
    pub const ICON: ImageSize = ImageSize::preset(64, 64);
    pub const PORTRAIT: ImageSize = ImageSize::preset(160, 240);
    pub const LOGO: ImageSize = ImageSize::preset(400, 310);
    pub const MAIN_IMAGE: ImageSize = ImageSize::preset(450, 450);
    pub const PREVIEW: ImageSize = ImageSize::preset(64, 64);
    pub const RECOMMENDATION: ImageSize = ImageSize::preset(125, 125);
    /// Size of the original product images.
    pub const FULL: ImageSize = ImageSize::preset(300, 300);
    pub const ERROR: ImageSize = ImageSize::preset(600, 400);
    pub const INDEX: ImageSize = ImageSize::preset(600, 450);

    const fn preset(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Creates a size, rejecting a zero dimension.
    pub fn new(width: u32, height: u32) -> Result<Self, CacheError> {
        if width == 0 || height == 0 {
            return Err(CacheError::invalid_argument(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ImageSize {
    type Err = CacheError;

    /// Parses `"<width>x<height>"`, tolerating surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CacheError::invalid_argument(format!("malformed image size {s:?}"));
        let (w, h) = s.trim().split_once('x').ok_or_else(malformed)?;
        let width = w.trim().parse::<u32>().map_err(|_| malformed())?;
        let height = h.trim().parse::<u32>().map_err(|_| malformed())?;
        Self::new(width, height)
    }
}

// ---------------------------------------------------------------------------
// StoreImage
// ---------------------------------------------------------------------------

/// Encoded image bytes plus the size they were rendered at.
///
/// Cloning shares the byte buffer. Equality is by id.
#[derive(Debug, Clone)]
pub struct StoreImage {
    id: u64,
    data: Arc<[u8]>,
    size: ImageSize,
}

impl StoreImage {
    pub fn new(id: u64, data: impl Into<Arc<[u8]>>, size: ImageSize) -> Self {
        Self {
            id,
            data: data.into(),
            size,
        }
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Encoded image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the encoded bytes.
    pub fn data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }
}

impl Cachable for StoreImage {
    #[inline]
    fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    fn byte_size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl PartialEq for StoreImage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StoreImage {}

// ---------------------------------------------------------------------------
// ImageKey / ImageDb
// ---------------------------------------------------------------------------

/// Logical name of an image family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageKey {
    /// Product picture, keyed by product id.
    Product(u64),
    /// Static web-UI asset, keyed by name.
    WebUi(String),
}

impl From<u64> for ImageKey {
    fn from(product_id: u64) -> Self {
        ImageKey::Product(product_id)
    }
}

impl From<&str> for ImageKey {
    fn from(name: &str) -> Self {
        ImageKey::WebUi(name.to_owned())
    }
}

#[derive(Debug, Default)]
struct ImageDbInner {
    products: FxHashMap<u64, FxHashMap<u64, ImageSize>>,
    webui: FxHashMap<String, FxHashMap<u64, ImageSize>>,
    sizes: FxHashMap<u64, ImageSize>,
}

impl ImageDbInner {
    fn family(&self, key: &ImageKey) -> Option<&FxHashMap<u64, ImageSize>> {
        match key {
            ImageKey::Product(id) => self.products.get(id),
            ImageKey::WebUi(name) => self.webui.get(name),
        }
    }

    fn family_mut(&mut self, key: ImageKey) -> &mut FxHashMap<u64, ImageSize> {
        match key {
            ImageKey::Product(id) => self.products.entry(id).or_default(),
            ImageKey::WebUi(name) => self.webui.entry(name).or_default(),
        }
    }
}

/// Thread-safe directory mapping `(key, size)` to image ids and ids to sizes.
///
/// # Example
///
/// ```
/// use tiercache::image::{ImageDb, ImageKey, ImageSize};
///
/// let db = ImageDb::new();
/// db.set_image_mapping(ImageKey::Product(7), 1001, ImageSize::FULL);
/// db.set_image_mapping(ImageKey::Product(7), 1002, ImageSize::ICON);
///
/// assert_eq!(db.image_id(&ImageKey::Product(7), ImageSize::ICON), Some(1002));
/// assert_eq!(db.image_size(1001), Some(ImageSize::FULL));
/// assert_eq!(db.image_id(&"logo".into(), ImageSize::LOGO), None);
/// ```
#[derive(Debug, Default)]
pub struct ImageDb {
    inner: RwLock<ImageDbInner>,
}

impl ImageDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_image_id(&self, key: &ImageKey, size: ImageSize) -> bool {
        self.image_id(key, size).is_some()
    }

    /// Id of the image of family `key` rendered at `size`.
    pub fn image_id(&self, key: &ImageKey, size: ImageSize) -> Option<u64> {
        let inner = self.inner.read();
        let id = inner
            .family(key)?
            .iter()
            .find(|(_, s)| **s == size)
            .map(|(&id, _)| id);
        id
    }

    pub fn image_size(&self, image_id: u64) -> Option<ImageSize> {
        self.inner.read().sizes.get(&image_id).copied()
    }

    /// Registers `image_id` as the `size` rendering of family `key`.
    pub fn set_image_mapping(&self, key: ImageKey, image_id: u64, size: ImageSize) {
        let mut inner = self.inner.write();
        inner.family_mut(key).insert(image_id, size);
        inner.sizes.insert(image_id, size);
    }

    /// Records the size of `image_id` without attaching it to a family.
    pub fn set_image_size(&self, image_id: u64, size: ImageSize) {
        self.inner.write().sizes.insert(image_id, size);
    }

    /// Forgets `image_id` everywhere it is mapped.
    pub fn remove_image_mapping(&self, image_id: u64) {
        let mut inner = self.inner.write();
        inner.products.retain(|_, family| {
            family.remove(&image_id);
            !family.is_empty()
        });
        inner.webui.retain(|_, family| {
            family.remove(&image_id);
            !family.is_empty()
        });
        inner.sizes.remove(&image_id);
    }

    /// Number of ids with a known size.
    pub fn len(&self) -> usize {
        self.inner.read().sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// ImageCodec
// ---------------------------------------------------------------------------

/// Disk codec for [`StoreImage`]: files hold the raw encoded bytes and the
/// size is recovered from the [`ImageDb`].
#[derive(Debug, Clone)]
pub struct ImageCodec {
    db: Arc<ImageDb>,
}

impl ImageCodec {
    pub fn new(db: Arc<ImageDb>) -> Self {
        Self { db }
    }
}

impl ItemCodec<StoreImage> for ImageCodec {
    fn encode<'a>(&self, item: &'a StoreImage) -> Cow<'a, [u8]> {
        Cow::Borrowed(item.bytes())
    }

    fn decode(&self, id: u64, bytes: Vec<u8>) -> Option<StoreImage> {
        let size = self.db.image_size(id)?;
        Some(StoreImage::new(id, bytes, size))
    }
}
