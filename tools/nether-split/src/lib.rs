//! nether-split library
//!
//! Splits the external binary buffers of a glTF document into chunks no larger
//! than a given size, rewriting `buffers` and `bufferViews` to match.

pub mod document;
pub mod error;
pub mod index;
pub mod materialize;
pub mod packer;
pub mod split;

pub use document::{Buffer, BufferView, Document};
pub use error::{Result, SplitError};
pub use index::ViewIndex;
pub use materialize::{chunk_uri, materialize, Outcome};
pub use packer::{pack_buffer, Chunk, Slice};
pub use split::{split_document, split_file, BufferReport, SplitOptions, SplitReport};
