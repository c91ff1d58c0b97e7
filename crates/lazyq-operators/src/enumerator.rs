//! Cursor over one enumeration of an `Enumerable`.

use lazyq_core::{Entry, EntryIter, Error, Result, Value};

use crate::enumerable::Enumerable;
use crate::traits::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Unstarted,
    Iterating,
    Exhausted,
}

/// `Unstarted -> Iterating -> Exhausted`, with `reset` back to `Unstarted`
/// for resettable sources. Once exhausted, `move_next` keeps returning
/// `false` and never touches the source again.
pub struct Enumerator {
    seq: Enumerable,
    iter: Option<EntryIter>,
    current: Option<Entry>,
    state: CursorState,
}

impl Enumerator {
    pub fn new(seq: Enumerable) -> Self {
        Self {
            seq,
            iter: None,
            current: None,
            state: CursorState::Unstarted,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn move_next(&mut self) -> Result<bool> {
        if self.state == CursorState::Exhausted {
            return Ok(false);
        }
        if self.iter.is_none() {
            match self.seq.open() {
                Ok(it) => self.iter = Some(it),
                Err(e) => {
                    self.finish();
                    return Err(e);
                }
            }
        }
        let next = self.iter.as_mut().and_then(|it| it.next());
        match next {
            Some(Ok(entry)) => {
                self.current = Some(entry);
                self.state = CursorState::Iterating;
                Ok(true)
            }
            Some(Err(e)) => {
                self.finish();
                Err(e)
            }
            None => {
                self.finish();
                Ok(false)
            }
        }
    }

    fn finish(&mut self) {
        self.iter = None;
        self.current = None;
        self.state = CursorState::Exhausted;
    }

    pub fn entry(&self) -> Result<&Entry> {
        match (&self.state, &self.current) {
            (CursorState::Iterating, Some(e)) => Ok(e),
            _ => Err(Error::NoCurrent),
        }
    }

    pub fn current(&self) -> Result<Value> {
        Ok(self.entry()?.value.clone())
    }

    pub fn key(&self) -> Result<Value> {
        Ok(self.entry()?.key.clone())
    }

    pub fn reset(&mut self) -> Result<()> {
        if self.state != CursorState::Unstarted && !self.seq.is_resettable() {
            return Err(Error::Unsupported(
                "cannot reset an enumeration over a single-pass source".into(),
            ));
        }
        self.iter = None;
        self.current = None;
        self.state = CursorState::Unstarted;
        Ok(())
    }

    /// Release the underlying iterator early. The enumerator behaves as
    /// exhausted afterwards.
    pub fn dispose(&mut self) {
        self.finish();
    }
}

impl Iterator for Enumerator {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.move_next() {
            Ok(true) => self.current.clone().map(Ok),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl Cursor for Enumerator {
    fn move_next(&mut self) -> Result<bool> {
        Enumerator::move_next(self)
    }

    fn current(&self) -> Result<Value> {
        Enumerator::current(self)
    }

    fn key(&self) -> Result<Value> {
        Enumerator::key(self)
    }

    fn close(&mut self) {
        self.dispose();
    }
}
