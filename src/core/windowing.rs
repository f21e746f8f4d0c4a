//! Window management for grouping records into fixed-count windows.
//!
//! Records are buffered in arrival order until the configured window size is
//! reached, at which point the buffer is sealed into a [`Window`] and a fresh
//! buffer starts. Partial buffers are never sealed implicitly.

use crate::error::SchemaMismatch;
use crate::source::types::{FieldValue, Record, Schema};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// A sealed, immutable batch of records.
#[derive(Debug, Clone)]
pub struct Window {
    sequence: u64,
    first_offset: u64,
    schema: Arc<Schema>,
    records: Vec<Record>,
}

impl Window {
    /// Sequence index of this window (0 for the first window of a run).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Stream offset of the first record in this window.
    pub fn first_offset(&self) -> u64 {
        self.first_offset
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Records in arrival order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one column across the window, preserving record order.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Option<&'a FieldValue>> + 'a {
        self.records.iter().map(move |r| r.get(name))
    }
}

/// Buffers records and seals a [`Window`] every `window_size` records.
pub struct WindowAccumulator {
    /// Records per sealed window
    window_size: NonZeroUsize,
    /// Column set fixed by the first record ever offered
    schema: Option<Arc<Schema>>,
    /// Records of the window being filled
    buffer: Vec<Record>,
    /// Offset of the next accepted record
    next_offset: u64,
    /// Sequence index of the next sealed window
    next_sequence: u64,
}

impl WindowAccumulator {
    /// Create a new accumulator for the given window size.
    pub fn new(window_size: NonZeroUsize) -> Self {
        Self {
            window_size,
            schema: None,
            buffer: Vec::with_capacity(window_size.get()),
            next_offset: 0,
            next_sequence: 0,
        }
    }

    /// Offer the next record.
    ///
    /// Returns the sealed window once the buffer reaches the window size.
    /// A record whose columns differ from the established schema is rejected
    /// and the accumulator is left untouched.
    pub fn offer(&mut self, record: Record) -> Result<Option<Window>, SchemaMismatch> {
        match &self.schema {
            Some(schema) if !schema.matches(&record) => {
                let (missing, extra) = schema.diff(&record);
                return Err(SchemaMismatch { missing, extra });
            }
            Some(_) => {}
            None => self.schema = Some(Arc::new(Schema::of(&record))),
        }

        self.buffer.push(record);
        self.next_offset += 1;

        if self.buffer.len() == self.window_size.get() {
            Ok(self.seal())
        } else {
            Ok(None)
        }
    }

    /// Seal whatever is buffered, even if the window is not full.
    ///
    /// Only used when the caller opted into flushing partial windows at
    /// end of stream.
    pub fn flush(&mut self) -> Option<Window> {
        self.seal()
    }

    /// Drop the partially filled buffer, returning how many records were discarded.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }

    /// Number of records waiting in the current buffer.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn window_size(&self) -> usize {
        self.window_size.get()
    }

    /// The schema, once the first record has been seen.
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_deref()
    }

    /// Number of windows sealed so far.
    pub fn windows_sealed(&self) -> u64 {
        self.next_sequence
    }

    fn seal(&mut self) -> Option<Window> {
        if self.buffer.is_empty() {
            return None;
        }
        let schema = self.schema.clone()?;

        let records = std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.window_size.get()),
        );
        let window = Window {
            sequence: self.next_sequence,
            first_offset: self.next_offset - records.len() as u64,
            schema,
            records,
        };
        self.next_sequence += 1;

        Some(window)
    }
}
