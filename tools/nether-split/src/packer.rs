//! Chunk packing
//!
//! Greedy, single pass, order preserving. Views are walked in ascending
//! `byteOffset` order and appended to the tail chunk until the next view would
//! push it past the size limit. No attempt is made to find the tightest
//! packing: a small trailing view never moves back into an earlier chunk.

use crate::document::{Buffer, BufferView};
use crate::error::{Result, SplitError};

/// Original byte range of one view inside the source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub source_offset: u64,
    pub length: u64,
}

/// A new buffer produced by splitting an original one.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Global index in the rewritten buffer list
    pub index: usize,
    /// Buffer record for this chunk; `byte_length` is the sum of its views
    pub buffer: Buffer,
    /// Source ranges of the assigned views, in packed order
    pub slices: Vec<Slice>,
}

impl Chunk {
    fn new(prototype: &Buffer, index: usize) -> Self {
        Self {
            index,
            buffer: prototype.empty_copy(),
            slices: Vec::new(),
        }
    }

    pub fn byte_length(&self) -> u64 {
        self.buffer.byte_length
    }

    /// Append a view at the current end of the chunk and re-point it here
    fn push(&mut self, view: &mut BufferView) {
        self.slices.push(Slice {
            source_offset: view.offset(),
            length: view.byte_length,
        });
        view.buffer = self.index;
        view.byte_offset = Some(self.buffer.byte_length);
        self.buffer.byte_length += view.byte_length;
    }

    /// True when every slice already sits at its packed offset in the source,
    /// i.e. the first `byte_length` bytes of the source are this chunk verbatim.
    /// Empty slices own no bytes and never count as misplaced.
    pub fn is_in_place(&self) -> bool {
        let mut packed = 0;
        for slice in self.slices.iter().filter(|s| s.length > 0) {
            if slice.source_offset != packed {
                return false;
            }
            packed += slice.length;
        }
        true
    }
}

/// Pack the views of one buffer into chunks.
///
/// * `buffer_idx` - index of `buffer` in the original document (for errors)
/// * `views` - every view in the document; only `members` are touched
/// * `members` - indices of the views referencing `buffer`, in document order
/// * `base_index` - number of chunks already emitted for earlier buffers
/// * `size_limit` - maximum chunk size in bytes, or 0 for one view per chunk
///
/// Always returns at least one chunk. A buffer without views becomes a single
/// empty chunk. All validation happens before any view is modified.
pub fn pack_buffer(
    buffer_idx: usize,
    buffer: &Buffer,
    views: &mut [BufferView],
    members: &[usize],
    base_index: usize,
    size_limit: u64,
) -> Result<Vec<Chunk>> {
    tracing::debug!("Collecting chunks for buffer {}...", buffer_idx);

    if buffer.uri.is_none() {
        tracing::error!(
            "Failed to split buffer {} [{:?}]. Missing uri.",
            buffer_idx,
            buffer
        );
        return Err(SplitError::MissingSource { buffer: buffer_idx });
    }

    let mut order = members.to_vec();
    order.sort_by_key(|&v| views[v].offset());

    for &view_idx in &order {
        let view = &views[view_idx];
        if view.end().map_or(true, |end| end > buffer.byte_length) {
            tracing::error!(
                "Failed to split buffer {}. BufferView {} [{:?}] exceeds the buffer.",
                buffer_idx,
                view_idx,
                view
            );
            return Err(SplitError::ViewOutOfBounds {
                view: view_idx,
                buffer: buffer_idx,
                offset: view.offset(),
                length: view.byte_length,
                buffer_length: buffer.byte_length,
            });
        }
        if size_limit > 0 && view.byte_length > size_limit {
            tracing::error!(
                "Failed to split buffer {}. Size limit ({}) is less than view {}'s size ({}).",
                buffer_idx,
                size_limit,
                view_idx,
                view.byte_length
            );
            return Err(SplitError::LimitTooSmall {
                buffer: buffer_idx,
                view: view_idx,
                limit: size_limit,
                size: view.byte_length,
            });
        }
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    for view_idx in order {
        let view = &mut views[view_idx];

        let needs_new_chunk = match chunks.last() {
            None => true,
            Some(_) if size_limit == 0 => true,
            Some(tail) => tail.byte_length() + view.byte_length > size_limit,
        };
        if needs_new_chunk {
            chunks.push(Chunk::new(buffer, base_index + chunks.len()));
            tracing::debug!("Adding new chunk {}", base_index + chunks.len() - 1);
        }

        // Just pushed or already present
        if let Some(tail) = chunks.last_mut() {
            tail.push(view);
            tracing::debug!("Adding view {} to chunk {}", view_idx, tail.index);
        }
    }

    if chunks.is_empty() {
        chunks.push(Chunk::new(buffer, base_index));
    }

    tracing::debug!("{} chunks collected.", chunks.len());
    Ok(chunks)
}
