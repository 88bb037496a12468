pub mod engine;
pub mod image;
pub mod options;
pub mod region;

#[cfg(feature = "tesseract")]
pub mod tesseract;

pub use engine::{OcrError, OcrWorker, WorkerFactory};
pub use image::{Image, InputError};
pub use options::{EngineMode, OcrOptions, PageSegmentation};
pub use region::Region;

#[cfg(feature = "tesseract")]
pub use tesseract::{TesseractFactory, TesseractWorker};
