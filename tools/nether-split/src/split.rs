//! Whole-document splitting pipeline
//!
//! Buffers are processed strictly in document order: chunk indices for a
//! buffer start right after the chunks emitted for every earlier buffer.

use std::path::Path;

use crate::document::Document;
use crate::error::Result;
use crate::index::ViewIndex;
use crate::materialize::{materialize, Outcome};
use crate::packer::pack_buffer;

/// Options for a split run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitOptions {
    /// Maximum chunk size in bytes; 0 puts every view in its own chunk
    pub size_limit: u64,
    /// Pretty-print the rewritten document
    pub pretty: bool,
}

/// Result of splitting one original buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferReport {
    pub buffer: usize,
    /// Global index of the buffer's first chunk
    pub first_chunk: usize,
    pub chunks: usize,
    pub outcome: Outcome,
}

/// Summary of a split run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub buffers: Vec<BufferReport>,
}

impl SplitReport {
    /// Number of buffers in the rewritten document
    pub fn total_chunks(&self) -> usize {
        self.buffers.iter().map(|b| b.chunks).sum()
    }

    /// Number of original buffers that were written out as several files
    pub fn split_count(&self) -> usize {
        self.buffers
            .iter()
            .filter(|b| matches!(b.outcome, Outcome::Split(_)))
            .count()
    }
}

/// Split every buffer of `doc`, writing chunk files under `base_dir`.
///
/// On success `doc.buffers` holds the flattened chunk list and every view has
/// been re-pointed into it. On error `doc` may be partially updated and must
/// not be saved; chunk files already written stay on disk.
pub fn split_document(doc: &mut Document, base_dir: &Path, size_limit: u64) -> Result<SplitReport> {
    let index = ViewIndex::build(&doc.buffer_views, doc.buffers.len())?;

    let mut out_buffers = Vec::new();
    let mut report = SplitReport::default();

    for (buffer_idx, buffer) in doc.buffers.iter().enumerate() {
        tracing::debug!("Processing buffer {} [{:?}]", buffer_idx, buffer);

        let first_chunk = out_buffers.len();
        let mut chunks = pack_buffer(
            buffer_idx,
            buffer,
            &mut doc.buffer_views,
            index.views_of(buffer_idx),
            first_chunk,
            size_limit,
        )?;
        let outcome = materialize(base_dir, buffer_idx, buffer, &mut chunks)?;

        report.buffers.push(BufferReport {
            buffer: buffer_idx,
            first_chunk,
            chunks: chunks.len(),
            outcome,
        });
        out_buffers.extend(chunks.into_iter().map(|c| c.buffer));
    }

    doc.buffers = out_buffers;
    Ok(report)
}

/// Split the buffers of the `.gltf` file at `path` and rewrite it in place.
///
/// Buffer uris are resolved relative to the document's directory. The
/// document is only rewritten after every buffer succeeded.
pub fn split_file(path: &Path, options: &SplitOptions) -> Result<SplitReport> {
    tracing::info!("Parsing {:?}...", path);
    let mut doc = Document::load(path)?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let report = split_document(&mut doc, base_dir, options.size_limit)?;

    tracing::info!("Saving {:?}...", path);
    doc.save(path, options.pretty)?;
    Ok(report)
}
