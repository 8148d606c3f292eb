//! Perceptual hashing of decoded frames.
//!
//! The hash is treated as an opaque function: frames that look alike map
//! to the same value, and the same frame always maps to the same value.
//! Only exact equality of the rendered hash is used for grouping.

use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig, ImageHash};

/// Side length of the hash grid (8x8 = 64 bits).
const HASH_SIZE: u32 = 8;

/// Computes pHash-style hashes (DCT preprocessing, median threshold).
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
}

impl PerceptualHasher {
    /// Create a hasher with the pHash configuration.
    #[must_use]
    pub fn new() -> Self {
        let hasher = HasherConfig::new()
            .hash_size(HASH_SIZE, HASH_SIZE)
            .hash_alg(HashAlg::Median)
            .preproc_dct()
            .to_hasher();
        Self { hasher }
    }

    /// Hash a decoded frame.
    #[must_use]
    pub fn hash_image(&self, frame: &DynamicImage) -> ImageHash {
        self.hasher.hash_image(frame)
    }

    /// Hash a decoded frame and render it as lowercase hex.
    #[must_use]
    pub fn hash_hex(&self, frame: &DynamicImage) -> String {
        to_hex(self.hash_image(frame).as_bytes())
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PerceptualHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerceptualHasher")
            .field("hash_size", &HASH_SIZE)
            .finish()
    }
}

/// Render bytes as lowercase hex.
///
/// # Examples
///
/// ```
/// use vidupe::scanner::perceptual::to_hex;
///
/// assert_eq!(to_hex(&[0x0f, 0xa0]), "0fa0");
/// ```
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
