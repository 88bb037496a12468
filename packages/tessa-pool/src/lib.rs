//! # tessa-pool
//!
//! Shares a small number of expensive, single-threaded OCR engine handles
//! between any number of concurrent callers.
//!
//! - **Bounded**: at most `ceiling` workers exist; the ceiling can be changed
//!   at runtime.
//! - **One request per worker**: a worker is only ever in one caller's hands.
//! - **Sticky configuration**: a worker is only re-initialised when the
//!   options it last applied differ from the request's.
//! - **Blocking and async**: [`OcrPool::process_blocking`] and
//!   [`OcrPool::process`] share one checkout path.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tessa_pool::prelude::*;
//!
//! let pool = OcrPool::with_settings(TesseractFactory, PoolSettings::from_env()?)?;
//! let image = Image::new(pixels, width, height, 1)?;
//! let text = pool.process(OcrRequest::new(image)).await?;
//! pool.shutdown().await;
//! ```

pub mod channel;
pub mod error;
pub mod pool;
pub mod request;
pub mod service;
pub mod settings;

pub use channel::{Closed, IdleChannel, PutError};
pub use error::PoolError;
pub use pool::{OcrPool, PoolStats};
pub use request::OcrRequest;
pub use service::OcrService;
pub use settings::{PoolSettings, SettingsError, DEFAULT_CEILING};

pub use tessa_ocr::{
    EngineMode, Image, InputError, OcrError, OcrOptions, OcrWorker, PageSegmentation, Region,
    WorkerFactory,
};
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CancellationToken, EngineMode, Image, InputError, OcrError, OcrOptions, OcrPool, OcrRequest,
        OcrService, OcrWorker, PageSegmentation, PoolError, PoolSettings, PoolStats, Region,
        WorkerFactory,
    };

    #[cfg(feature = "tesseract")]
    pub use tessa_ocr::{TesseractFactory, TesseractWorker};
}
