use tracing::debug;

use crate::engine::{OcrError, OcrWorker, WorkerFactory};
use crate::image::Image;
use crate::options::OcrOptions;
use crate::region::Region;

use super::ffi::Handle;

pub struct TesseractWorker {
    handle: Handle,
    pixels_per_inch: u32,
}

impl TesseractWorker {
    pub fn new() -> Result<Self, OcrError> {
        Ok(Self {
            handle: Handle::create()?,
            pixels_per_inch: OcrOptions::default().pixels_per_inch,
        })
    }

    fn read(&mut self, image: &Image, region: Option<Region>) -> Result<String, OcrError> {
        self.handle.set_image(
            image.data(),
            image.width(),
            image.height(),
            image.bytes_per_pixel(),
            image.bytes_per_line(),
        )?;
        self.handle.set_source_resolution(self.pixels_per_inch)?;
        if let Some(r) = region {
            self.handle.set_rectangle(r.x, r.y, r.width, r.height);
        }
        self.handle.utf8_text()
    }
}

impl OcrWorker for TesseractWorker {
    fn configure(&mut self, options: &OcrOptions) -> Result<(), OcrError> {
        debug!(language = %options.language, oem = options.engine_mode.code(), "initializing tesseract");
        self.handle.init(
            options.data_path.as_deref(),
            &options.language,
            options.engine_mode.code(),
        )?;
        self.handle
            .set_page_seg_mode(options.page_segmentation.code());
        // Unset lists are written too, otherwise a previous request's list sticks.
        self.handle.set_variable(
            "tessedit_char_whitelist",
            options.whitelist.as_deref().unwrap_or(""),
        )?;
        self.handle.set_variable(
            "tessedit_char_blacklist",
            options.blacklist.as_deref().unwrap_or(""),
        )?;
        self.handle
            .set_variable("classify_bln_numeric_mode", if options.numeric { "1" } else { "0" })?;
        if let Some(path) = options.config_path.as_deref() {
            self.handle.read_config_file(path)?;
        }
        self.pixels_per_inch = options.pixels_per_inch;
        Ok(())
    }

    fn recognize(&mut self, image: &Image, region: Option<Region>) -> Result<String, OcrError> {
        let result = self.read(image, region);
        // Drops the engine's pointer into `image` before the borrow ends.
        self.handle.clear();
        result
    }
}

/// Factory handing out fresh, unconfigured Tesseract handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct TesseractFactory;

impl WorkerFactory for TesseractFactory {
    type Worker = TesseractWorker;

    fn create(&self) -> Result<TesseractWorker, OcrError> {
        TesseractWorker::new()
    }
}
