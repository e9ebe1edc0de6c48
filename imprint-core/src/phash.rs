//! Perceptual hashing for raster images.
//!
//! Four independent 64-bit hashes are computed per image: average (mean),
//! difference (gradient), DCT perceptual, and an HSV color-distribution hash.
//! No hash depends on another and nothing is combined at this stage;
//! combination happens per-field at comparison time.

use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig};
use serde::{Deserialize, Serialize};

use crate::error::{ImprintError, Result};

/// Fixed hash size in bytes (64 bits = 8 bytes).
pub const IMAGE_HASH_SIZE: usize = 8;

/// Width of a hash token in hexadecimal characters.
pub const IMAGE_HASH_HEX_WIDTH: usize = IMAGE_HASH_SIZE * 2;

/// A fixed-width 64-bit image hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHash64([u8; IMAGE_HASH_SIZE]);

impl ImageHash64 {
    pub fn new(bytes: [u8; IMAGE_HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IMAGE_HASH_SIZE] {
        &self.0
    }

    /// Render as a fixed-width lowercase hex token.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a fixed-width hex token.
    pub fn from_hex(token: &str) -> Result<Self> {
        if token.len() != IMAGE_HASH_HEX_WIDTH {
            return Err(ImprintError::MalformedIdentifier(format!(
                "hash token {token:?} is not {IMAGE_HASH_HEX_WIDTH} hex characters"
            )));
        }
        let bytes = hex::decode(token).map_err(|e| {
            ImprintError::MalformedIdentifier(format!("hash token {token:?} is not hex: {e}"))
        })?;
        let mut hash = [0u8; IMAGE_HASH_SIZE];
        hash.copy_from_slice(&bytes);
        Ok(Self(hash))
    }

    /// Number of differing bits between two hashes.
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Similarity percentage: `100 - hamming_distance`. This is the
    /// perceptual-hash metric family and is not numerically comparable with
    /// fuzzy-digest percentages.
    pub fn similarity(&self, other: &Self) -> u32 {
        100u32.saturating_sub(self.hamming_distance(other))
    }
}

impl std::fmt::Display for ImageHash64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The four independent perceptual hashes of one image, in embedding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptualHashSet {
    pub average: ImageHash64,
    pub difference: ImageHash64,
    pub perceptual: ImageHash64,
    pub color: ImageHash64,
}

impl PerceptualHashSet {
    /// Compute all four hashes for a decoded image.
    pub fn compute(image: &DynamicImage) -> Result<Self> {
        Ok(Self {
            average: algorithm_hash(image, HashAlg::Mean, false)?,
            difference: algorithm_hash(image, HashAlg::Gradient, false)?,
            perceptual: algorithm_hash(image, HashAlg::Mean, true)?,
            color: color_hash(image),
        })
    }
}

fn algorithm_hash(image: &DynamicImage, alg: HashAlg, dct: bool) -> Result<ImageHash64> {
    let mut config = HasherConfig::new().hash_alg(alg).hash_size(8, 8);
    if dct {
        config = config.preproc_dct();
    }
    let hash = config.to_hasher().hash_image(image);

    let bytes: [u8; IMAGE_HASH_SIZE] = hash.as_bytes().try_into().map_err(|_| {
        ImprintError::Image(format!(
            "unexpected hash width {} for {alg:?}",
            hash.as_bytes().len()
        ))
    })?;
    Ok(ImageHash64::new(bytes))
}

/// HSV color-distribution hash.
///
/// Pixels are bucketed into a 4x4x4 hue/saturation/value grid; a bit is set
/// for every bucket whose occupancy exceeds the mean occupancy. Similar color
/// palettes produce similar bit patterns regardless of composition.
fn color_hash(image: &DynamicImage) -> ImageHash64 {
    let rgb = image.to_rgb8();
    let mut buckets = [0u64; 64];

    for pixel in rgb.pixels() {
        let (h, s, v) = rgb_to_hsv(pixel.0[0], pixel.0[1], pixel.0[2]);
        let hi = ((h / 90.0) as usize).min(3);
        let si = ((s * 4.0) as usize).min(3);
        let vi = ((v * 4.0) as usize).min(3);
        buckets[hi * 16 + si * 4 + vi] += 1;
    }

    let total: u64 = buckets.iter().sum();
    let mut hash = [0u8; IMAGE_HASH_SIZE];
    for (i, count) in buckets.iter().enumerate() {
        // Bucket is "hot" when it holds more than an even 1/64 share.
        if count * 64 > total {
            hash[i / 8] |= 1 << (7 - (i % 8));
        }
    }

    ImageHash64::new(hash)
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };

    (h, s, max)
}
