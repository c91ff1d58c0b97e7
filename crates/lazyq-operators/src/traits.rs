//! Source and cursor contracts.
//!
//! A `Source` is opened once per enumeration and hands back a fresh pull
//! iterator. Operators never touch an upstream until `open` is called, which
//! only happens when a consumer first advances.

use lazyq_core::{Entry, EntryIter, Result, Value};

pub trait Source {
    fn open(&self) -> Result<EntryIter>;

    /// Whether every `open` replays the same elements from the beginning.
    fn is_resettable(&self) -> bool {
        true
    }
}

/// External pull iterator in move-next / current / key style.
pub trait Cursor {
    fn move_next(&mut self) -> Result<bool>;

    fn current(&self) -> Result<Value>;

    fn key(&self) -> Result<Value>;

    /// Release resources held by the cursor. Called at most once, either on
    /// exhaustion or when the adapter wrapping the cursor is dropped.
    fn close(&mut self) {}
}

/// Adapts a `Cursor` to an `EntryIter`.
pub(crate) struct CursorIter<C: Cursor> {
    cursor: C,
    closed: bool,
}

impl<C: Cursor> CursorIter<C> {
    pub(crate) fn new(cursor: C) -> Self {
        Self {
            cursor,
            closed: false,
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.cursor.close();
        }
    }

    fn pull(&mut self) -> Result<Option<Entry>> {
        if !self.cursor.move_next()? {
            return Ok(None);
        }
        Ok(Some(Entry {
            key: self.cursor.key()?,
            value: self.cursor.current()?,
        }))
    }
}

impl<C: Cursor> Iterator for CursorIter<C> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        match self.pull() {
            Ok(Some(e)) => Some(Ok(e)),
            Ok(None) => {
                self.close();
                None
            }
            Err(e) => {
                self.close();
                Some(Err(e))
            }
        }
    }
}

impl<C: Cursor> Drop for CursorIter<C> {
    fn drop(&mut self) {
        self.close();
    }
}
