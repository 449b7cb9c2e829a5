//! In-memory test doubles for the engine's external collaborators.
//!
//! Grounded in the teacher's mock/dummy source pattern (`MockImageSource`/
//! `DummyImageSource`): a lightweight stand-in that implements the real trait so the engine's
//! own logic — planning, concurrency, merge semantics — can be exercised deterministically
//! and without any real raster library installed.

mod mock_driver;
pub use mock_driver::{MockDriver, MockRasterData, f32_data};
