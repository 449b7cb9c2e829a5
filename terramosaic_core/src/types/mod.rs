//! Shared value types that flow through the mosaic pipeline.

mod block_spec;
pub use block_spec::*;

mod geo_bbox;
pub use geo_bbox::*;

mod limited_cache;
pub use limited_cache::*;

mod model;
pub use model::*;
