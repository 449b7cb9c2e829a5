//! GDAL-backed implementation of [`terramosaic_core::RasterDriver`] (§6 / C15).
//!
//! Pixel I/O, creation, and metadata operations are all synchronous GDAL calls. This crate
//! has no async runtime dependency of its own: the reader pool and orchestrator in
//! `terramosaic_core` are the ones that run these calls inside `tokio::task::spawn_blocking`
//! to keep the runtime responsive.

mod gdal_driver;

pub use gdal_driver::{GdalDriver, creation_options_for};
