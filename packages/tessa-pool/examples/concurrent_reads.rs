//! Drives a pool of simulated workers with a burst of concurrent reads.
//!
//! ```sh
//! RUST_LOG=tessa_pool=debug cargo run -p tessa-pool --example concurrent_reads
//! ```

use std::time::Duration;

use anyhow::Result;
use tessa_pool::prelude::*;
use tracing_subscriber::EnvFilter;

/// Pretends to read text by reporting the image geometry after a short pause.
struct SleepyWorker {
    language: String,
}

impl OcrWorker for SleepyWorker {
    fn configure(&mut self, options: &OcrOptions) -> Result<(), OcrError> {
        self.language = options.language.clone();
        Ok(())
    }

    fn recognize(&mut self, image: &Image, region: Option<Region>) -> Result<String, OcrError> {
        std::thread::sleep(Duration::from_millis(40));
        let (w, h) = region
            .map(|r| (r.width as u32, r.height as u32))
            .unwrap_or((image.width(), image.height()));
        Ok(format!("[{}] {}x{}", self.language, w, h))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = PoolSettings::from_env()?;
    let pool = OcrPool::with_settings(
        || -> Result<SleepyWorker, OcrError> {
            Ok(SleepyWorker {
                language: String::new(),
            })
        },
        settings,
    )?;

    let image = Image::new(vec![255u8; 640 * 480], 640, 480, 1)?;
    let mut handles = Vec::new();
    for i in 0..24 {
        let pool = pool.clone();
        let mut request = OcrRequest::new(image.clone());
        if i % 3 == 0 {
            request = request.with_region(Region::new(0, 0, 320, 40));
        }
        handles.push(tokio::spawn(async move { pool.process(request).await }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        println!("read {i:2}: {}", handle.await??);
    }
    println!("{}", serde_json::to_string_pretty(&pool.stats())?);

    pool.set_ceiling(2)?;
    println!("after shrink: {:?}", pool.stats());

    pool.shutdown().await;
    println!("after shutdown: {:?}", pool.stats());
    Ok(())
}
