use tessa_ocr::{Image, InputError, Region};

/// One image to read, optionally restricted to a region.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    image: Image,
    region: Region,
}

impl OcrRequest {
    pub fn new(image: Image) -> Self {
        Self {
            image,
            region: Region::WHOLE_IMAGE,
        }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Checks the request before any worker is touched. Yields the region to
    /// apply, `None` meaning the whole image.
    pub(crate) fn validate(&self) -> Result<Option<Region>, InputError> {
        self.region.check_within(&self.image)?;
        Ok(self.region.effective())
    }
}

impl From<Image> for OcrRequest {
    fn from(image: Image) -> Self {
        Self::new(image)
    }
}
