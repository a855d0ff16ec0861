//! BufferView lookup grouped by owning buffer

use crate::document::BufferView;
use crate::error::{Result, SplitError};

/// View indices bucketed by the buffer they reference.
///
/// Each bucket keeps the views in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewIndex {
    buckets: Vec<Vec<usize>>,
}

impl ViewIndex {
    /// Build the index for a document with `buffer_count` buffers.
    ///
    /// Fails if any view points past the end of the buffer list.
    pub fn build(views: &[BufferView], buffer_count: usize) -> Result<Self> {
        let mut buckets = vec![Vec::new(); buffer_count];
        for (view_idx, view) in views.iter().enumerate() {
            let bucket = buckets
                .get_mut(view.buffer)
                .ok_or(SplitError::DanglingView {
                    view: view_idx,
                    buffer: view.buffer,
                })?;
            bucket.push(view_idx);
        }
        Ok(Self { buckets })
    }

    /// Indices of the views referencing `buffer` (empty if none)
    pub fn views_of(&self, buffer: usize) -> &[usize] {
        self.buckets.get(buffer).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(buffer: usize) -> BufferView {
        BufferView {
            buffer,
            byte_length: 4,
            byte_offset: None,
            byte_stride: None,
            target: None,
            name: None,
            extensions: None,
            extras: None,
        }
    }

    #[test]
    fn test_groups_preserve_order() {
        let views = vec![view(1), view(0), view(1), view(0), view(1)];
        let index = ViewIndex::build(&views, 3).unwrap();

        assert_eq!(index.views_of(0), &[1, 3]);
        assert_eq!(index.views_of(1), &[0, 2, 4]);
        assert!(index.views_of(2).is_empty());
    }

    #[test]
    fn test_every_view_in_one_bucket() {
        let views = vec![view(0), view(2), view(1), view(2)];
        let index = ViewIndex::build(&views, 3).unwrap();

        let mut all: Vec<usize> = (0..3).flat_map(|b| index.views_of(b).to_vec()).collect();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_dangling_view_rejected() {
        let views = vec![view(0), view(5)];
        let err = ViewIndex::build(&views, 1).unwrap_err();
        assert!(matches!(
            err,
            SplitError::DanglingView { view: 1, buffer: 5 }
        ));
    }

    #[test]
    fn test_unknown_buffer_is_empty() {
        let index = ViewIndex::build(&[], 0).unwrap();
        assert!(index.views_of(7).is_empty());
    }
}
