//! Video frame type

use crate::SourceError;
use image::RgbImage;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (milliseconds, monotonically increasing per source)
    pub captured_at_ms: u64,
    /// Frame sequence number
    pub sequence: u64,
}

impl Frame {
    /// Create a new frame from raw RGB data
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        captured_at_ms: u64,
        sequence: u64,
    ) -> Result<Self, SourceError> {
        if width == 0 || height == 0 {
            return Err(SourceError::Dimensions { width, height });
        }
        let expected = Self::expected_len(width, height);
        if data.len() != expected {
            return Err(SourceError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            captured_at_ms,
            sequence,
        })
    }

    /// Create a frame from a decoded image
    pub fn from_image(image: RgbImage, captured_at_ms: u64, sequence: u64) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            captured_at_ms,
            sequence,
        }
    }

    fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }

    /// Whether the pixel buffer matches the declared dimensions
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == Self::expected_len(self.width, self.height)
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data.get(idx..idx + 3).map(|p| [p[0], p[1], p[2]])
    }

    /// Smaller of the two frame dimensions
    pub fn min_dimension(&self) -> u32 {
        self.width.min(self.height)
    }

    /// View the frame as an `image` buffer
    pub fn to_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }
}
