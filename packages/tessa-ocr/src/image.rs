use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::region::Region;

/// Rejections raised before an image ever reaches a worker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("image dimensions must be positive (width={width}, height={height})")]
    ZeroDimension { width: u32, height: u32 },
    #[error("unsupported pixel depth of {0} bytes (expected 1, 3 or 4)")]
    UnsupportedPixelDepth(u32),
    #[error(
        "image dimensions overflowed (width={width}, height={height}, bytes_per_pixel={bytes_per_pixel})"
    )]
    Overflow {
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
    },
    #[error("pixel buffer length {provided} is smaller than width * height * bytes_per_pixel ({required})")]
    InsufficientData { provided: usize, required: usize },
    #[error("region {region:?} lies outside the {width}x{height} image")]
    RegionOutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },
}

/// Raw, tightly packed pixel buffer plus the metadata the engine needs.
///
/// The buffer is reference counted so requests can be handed to a blocking
/// task without copying pixels.
#[derive(Clone)]
pub struct Image {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
}

impl Image {
    pub fn new(
        data: impl Into<Arc<[u8]>>,
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
    ) -> Result<Self, InputError> {
        let data = data.into();
        if width == 0 || height == 0 {
            return Err(InputError::ZeroDimension { width, height });
        }
        if !matches!(bytes_per_pixel, 1 | 3 | 4) {
            return Err(InputError::UnsupportedPixelDepth(bytes_per_pixel));
        }

        let overflow = InputError::Overflow {
            width,
            height,
            bytes_per_pixel,
        };
        // The native API takes every dimension as a C int.
        let line = width
            .checked_mul(bytes_per_pixel)
            .filter(|line| i32::try_from(*line).is_ok() && i32::try_from(height).is_ok())
            .ok_or_else(|| overflow.clone())?;
        let required = (line as usize)
            .checked_mul(height as usize)
            .ok_or(overflow)?;
        if data.len() < required {
            return Err(InputError::InsufficientData {
                provided: data.len(),
                required,
            });
        }

        Ok(Self {
            data,
            width,
            height,
            bytes_per_pixel,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.bytes_per_pixel
    }

    pub fn bytes_per_line(&self) -> u32 {
        self.width * self.bytes_per_pixel
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes_per_pixel", &self.bytes_per_pixel)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_gray_image() {
        let img = Image::new(vec![255u8; 12], 4, 3, 1).unwrap();
        assert_eq!(img.bytes_per_line(), 4);
        assert_eq!(img.data().len(), 12);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let err = Image::new(vec![0u8; 10], 2, 2, 3).unwrap_err();
        assert_eq!(
            err,
            InputError::InsufficientData {
                provided: 10,
                required: 12
            }
        );
    }

    #[test]
    fn test_bad_depth_and_dimensions() {
        assert_eq!(
            Image::new(vec![0u8; 8], 2, 2, 2).unwrap_err(),
            InputError::UnsupportedPixelDepth(2)
        );
        assert!(matches!(
            Image::new(Vec::new(), 0, 5, 1),
            Err(InputError::ZeroDimension { .. })
        ));
        assert!(matches!(
            Image::new(vec![0u8; 4], u32::MAX, 1, 4),
            Err(InputError::Overflow { .. })
        ));
    }

    #[test]
    fn test_clone_shares_pixels() {
        let img = Image::new(vec![7u8; 16], 4, 4, 1).unwrap();
        let copy = img.clone();
        assert!(std::ptr::eq(img.data().as_ptr(), copy.data().as_ptr()));
    }
}
