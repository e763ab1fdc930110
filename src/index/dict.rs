//! Field dictionary cursors.

use parking_lot::RwLockReadGuard;

use crate::engine::{DictEntry, IndexReader};
use crate::error::Result;
use crate::index::IndexState;

/// Iterator over the terms of one field, in term order.
///
/// The cursor holds the index's read lock until it is closed or dropped, so
/// [`Index::close`](crate::index::Index::close) waits for every open cursor.
pub struct FieldDict<'a> {
    _state: RwLockReadGuard<'a, IndexState>,
    reader: Box<dyn IndexReader>,
    entries: std::vec::IntoIter<DictEntry>,
    closed: bool,
}

impl<'a> FieldDict<'a> {
    pub(crate) fn new(
        state: RwLockReadGuard<'a, IndexState>,
        reader: Box<dyn IndexReader>,
        entries: Vec<DictEntry>,
    ) -> Self {
        FieldDict {
            _state: state,
            reader,
            entries: entries.into_iter(),
            closed: false,
        }
    }

    /// Release the reader and the index lock.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.reader.close()
    }
}

impl Iterator for FieldDict<'_> {
    type Item = DictEntry;

    fn next(&mut self) -> Option<DictEntry> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl Drop for FieldDict<'_> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.reader.close() {
                log::warn!("error closing field dictionary reader: {e}");
            }
        }
    }
}
