//! Encoding direction.
//!
//! - [`Packer`] - Packs values into pooled buffers

mod engine;
mod writer;

pub use engine::Packer;
