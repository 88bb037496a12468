use thiserror::Error;

use crate::image::Image;
use crate::options::OcrOptions;
use crate::region::Region;

/// Failures reported by the native engine for a single request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OcrError {
    #[error("error while creating engine: {0}")]
    Create(String),
    #[error("error while initializing engine: {0}")]
    Configure(String),
    #[error("error while setting subject image: {0}")]
    SetImage(String),
    #[error("error while setting resolution: {0}")]
    SetResolution(String),
    #[error("error while performing OCR: {0}")]
    Recognize(String),
}

/// One native engine instance.
///
/// Implementations own exactly one engine handle, release it in `Drop`, and
/// are only ever driven by one caller at a time, so every method takes
/// `&mut self`. Both calls block.
pub trait OcrWorker: Send + 'static {
    /// Applies `options` to the engine. This is the expensive step (model
    /// loading); callers skip it when the options have not changed.
    fn configure(&mut self, options: &OcrOptions) -> Result<(), OcrError>;

    /// Reads the text in `image`, restricted to `region` when one is given.
    fn recognize(&mut self, image: &Image, region: Option<Region>) -> Result<String, OcrError>;
}

/// Creates workers on demand.
pub trait WorkerFactory: Send + Sync + 'static {
    type Worker: OcrWorker;

    /// Called with the pool's bookkeeping locked, from async callers too.
    /// Keep it cheap and leave model loading to
    /// [`OcrWorker::configure`], which runs off the async executor.
    fn create(&self) -> Result<Self::Worker, OcrError>;
}

impl<W, F> WorkerFactory for F
where
    W: OcrWorker,
    F: Fn() -> Result<W, OcrError> + Send + Sync + 'static,
{
    type Worker = W;

    fn create(&self) -> Result<W, OcrError> {
        self()
    }
}
