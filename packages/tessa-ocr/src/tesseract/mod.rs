//! Binding to the Tesseract C API. Requires libtesseract at link time.

mod ffi;
mod worker;

pub use worker::{TesseractFactory, TesseractWorker};
