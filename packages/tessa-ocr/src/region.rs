use serde::{Deserialize, Serialize};

use crate::image::{Image, InputError};

/// Rectangular sub-area of an image, in pixels.
///
/// A region only restricts recognition when `x` and `y` are non-negative and
/// both dimensions are positive. Anything else, including [`Region::WHOLE_IMAGE`],
/// means the entire image is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub const WHOLE_IMAGE: Region = Region {
        x: -1,
        y: -1,
        width: -1,
        height: -1,
    };

    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_applicable(&self) -> bool {
        self.x >= 0 && self.y >= 0 && self.width > 0 && self.height > 0
    }

    /// Returns the region to hand to the engine, or `None` for the whole image.
    pub fn effective(self) -> Option<Region> {
        self.is_applicable().then_some(self)
    }

    /// Rejects applicable regions that reach past the image edges.
    pub fn check_within(&self, image: &Image) -> Result<(), InputError> {
        if !self.is_applicable() {
            return Ok(());
        }
        let right = i64::from(self.x) + i64::from(self.width);
        let bottom = i64::from(self.y) + i64::from(self.height);
        if right > i64::from(image.width()) || bottom > i64::from(image.height()) {
            return Err(InputError::RegionOutOfBounds {
                region: *self,
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(())
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::WHOLE_IMAGE
    }
}
