//! Chunk materialization: writing packed chunks to disk
//!
//! Chunk files are named `<stem>_<index><ext>` next to the original binary.
//! Existing files with the same name are overwritten without warning.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::document::Buffer;
use crate::error::{Result, SplitError};
use crate::packer::{Chunk, Slice};

/// What happened to an original buffer's file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Single chunk already laid out like the source; nothing written
    Untouched,
    /// Single chunk whose views had gaps; compacted under the same uri
    Compacted,
    /// Split into this many chunk files; original removed
    Split(usize),
}

/// Derive a chunk uri by inserting `_<index>` before the extension.
///
/// `models/mesh.bin` -> `models/mesh_1.bin`
pub fn chunk_uri(uri: &str, index: usize) -> String {
    let (dir, file) = match uri.rfind('/') {
        Some(pos) => uri.split_at(pos + 1),
        None => ("", uri),
    };
    let (stem, ext) = match file.rfind('.') {
        Some(pos) if pos > 0 => file.split_at(pos),
        _ => (file, ""),
    };
    format!("{dir}{stem}_{index}{ext}")
}

/// Write `chunks` (the packer's output for `original`) to disk.
///
/// Relative uris are resolved against `base_dir`, normally the directory
/// holding the `.gltf` file. When more than one chunk exists each chunk's uri
/// and name gain a positional suffix and the original file is deleted.
/// Partially written chunk files are left behind on error.
pub fn materialize(
    base_dir: &Path,
    buffer_idx: usize,
    original: &Buffer,
    chunks: &mut [Chunk],
) -> Result<Outcome> {
    let uri = original
        .uri
        .as_deref()
        .ok_or(SplitError::MissingSource { buffer: buffer_idx })?;
    let source_path = base_dir.join(uri);

    if let [chunk] = &*chunks {
        if chunk.is_in_place() {
            tracing::debug!("Buffer {} fits the limit. Nothing to save.", buffer_idx);
            return Ok(Outcome::Untouched);
        }
        compact_in_place(&source_path, &chunk.slices)?;
        tracing::info!(
            "Buffer {} fits the limit; compacted {:?} to {} bytes",
            buffer_idx,
            source_path,
            chunk.byte_length()
        );
        return Ok(Outcome::Compacted);
    }

    tracing::debug!("Saving {} chunks of buffer {}...", chunks.len(), buffer_idx);
    {
        let file = File::open(&source_path).map_err(|e| SplitError::io(&source_path, e))?;
        let mut source = SourceReader::new(BufReader::new(file), &source_path);

        for (chunk_idx, chunk) in chunks.iter_mut().enumerate() {
            let suffix = format!("_{chunk_idx}");
            let new_uri = chunk_uri(uri, chunk_idx);
            if let Some(name) = chunk.buffer.name.as_mut() {
                name.push_str(&suffix);
            }

            let chunk_path = base_dir.join(&new_uri);
            tracing::debug!(
                "Saving chunk {} ({} bytes) to {:?}",
                chunk.index,
                chunk.byte_length(),
                chunk_path
            );
            write_chunk(&mut source, &chunk_path, &chunk.slices)?;
            chunk.buffer.uri = Some(new_uri);
        }
    }

    fs::remove_file(&source_path).map_err(|e| {
        tracing::error!(
            "Chunks written, but failed to remove original {:?}: {}",
            source_path,
            e
        );
        SplitError::io(&source_path, e)
    })?;

    tracing::info!(
        "Split buffer {} ({:?}) into {} chunks",
        buffer_idx,
        uri,
        chunks.len()
    );
    Ok(Outcome::Split(chunks.len()))
}

/// Rewrite `path` so it holds exactly `slices`, back to back.
fn compact_in_place(path: &Path, slices: &[Slice]) -> Result<()> {
    let tmp_path = temp_sibling(path);
    let written = File::open(path)
        .map_err(|e| SplitError::io(path, e))
        .and_then(|file| {
            let mut source = SourceReader::new(BufReader::new(file), path);
            write_chunk(&mut source, &tmp_path, slices)
        })
        .and_then(|()| fs::rename(&tmp_path, path).map_err(|e| SplitError::io(path, e)));

    if written.is_err() && tmp_path.exists() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            tracing::warn!("Failed to remove temporary file {:?}: {}", tmp_path, e);
        }
    }
    written
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".split-tmp");
    path.with_file_name(name)
}

fn write_chunk<R: Read + Seek>(
    source: &mut SourceReader<'_, R>,
    chunk_path: &Path,
    slices: &[Slice],
) -> Result<()> {
    let file = File::create(chunk_path).map_err(|e| SplitError::io(chunk_path, e))?;
    let mut writer = BufWriter::new(file);
    for slice in slices {
        source.copy_slice(*slice, &mut writer, chunk_path)?;
    }
    writer.flush().map_err(|e| SplitError::io(chunk_path, e))
}

/// Sequential reader over the source buffer that only seeks across gaps
struct SourceReader<'a, R> {
    inner: R,
    path: &'a Path,
    position: u64,
}

impl<'a, R: Read + Seek> SourceReader<'a, R> {
    fn new(inner: R, path: &'a Path) -> Self {
        Self {
            inner,
            path,
            position: 0,
        }
    }

    fn copy_slice<W: Write>(&mut self, slice: Slice, out: &mut W, out_path: &Path) -> Result<()> {
        if slice.source_offset != self.position {
            self.inner
                .seek(SeekFrom::Start(slice.source_offset))
                .map_err(|e| SplitError::io(self.path, e))?;
            self.position = slice.source_offset;
        }

        let mut limited = (&mut self.inner).take(slice.length);
        let copied = io::copy(&mut limited, out).map_err(|e| SplitError::io(out_path, e))?;
        self.position += copied;

        if copied < slice.length {
            return Err(SplitError::io(
                self.path,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "expected {} bytes at offset {}, file ended after {}",
                        slice.length, slice.source_offset, copied
                    ),
                ),
            ));
        }
        Ok(())
    }
}
