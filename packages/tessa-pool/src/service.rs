use async_trait::async_trait;
use tessa_ocr::WorkerFactory;

use crate::error::PoolError;
use crate::pool::OcrPool;
use crate::request::OcrRequest;

/// Object-safe entry point for code that only needs to read text.
#[async_trait]
pub trait OcrService: Send + Sync {
    async fn recognize(&self, request: OcrRequest) -> Result<String, PoolError>;
}

#[async_trait]
impl<F: WorkerFactory> OcrService for OcrPool<F> {
    async fn recognize(&self, request: OcrRequest) -> Result<String, PoolError> {
        self.process(request).await
    }
}
